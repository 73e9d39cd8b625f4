//! Provider-neutral social login contract.
//!
//! A [`SocialProvider`] turns the browser redirect dance into four calls: an authorize URL,
//! a code exchange, a profile lookup, and a mapping into [`SocialUser`]. The provided
//! [`user`](SocialProvider::user) method strings those together for a callback handler.

pub mod session;
pub mod user;

pub use session::*;
pub use user::*;

// self
use crate::{
	_prelude::*,
	auth::Token,
	oauth::AccessTokenResponse,
	obs::{FlowKind, FlowSpan},
	provider::ProviderDescriptor,
};

/// Boxed, `Send` future returned by [`SocialProvider`] methods.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Contract every social login provider implements.
pub trait SocialProvider
where
	Self: Send + Sync,
{
	/// Validated endpoint metadata for the provider.
	fn descriptor(&self) -> &ProviderDescriptor;

	/// Name the provider is registered under.
	fn name(&self) -> &str {
		&self.descriptor().id
	}

	/// Browser redirect URL carrying `state`.
	fn authorization_url(&self, state: &str) -> Url;

	/// Exchanges an authorization code for tokens.
	fn exchange_code<'a>(&'a self, code: &'a str) -> ProviderFuture<'a, AccessTokenResponse>;

	/// Fetches the raw profile of the user `access_token` belongs to.
	fn fetch_user<'a>(&'a self, access_token: &'a str) -> ProviderFuture<'a, RawProfile>;

	/// Maps a raw profile onto a [`SocialUser`].
	fn map_user(&self, raw: RawProfile) -> SocialUser;

	/// Obtains new token material from a refresh token.
	fn refresh_token<'a>(&'a self, refresh_token: &'a str) -> ProviderFuture<'a, Token>;

	/// Generates a fresh `state` and the authorize URL carrying it.
	fn start_authorization(&self) -> AuthorizationSession {
		let _guard = FlowSpan::new(FlowKind::Authorization, "start_authorization").entered();
		let state = generate_state();
		let authorize_url = self.authorization_url(&state);

		AuthorizationSession::new(state, authorize_url)
	}

	/// Completes a callback: exchanges `code`, fetches and maps the profile, and attaches the
	/// token material to the user.
	fn user<'a>(&'a self, code: &'a str) -> ProviderFuture<'a, SocialUser> {
		Box::pin(async move {
			let response = self.exchange_code(code).await?;
			let token = Token::from_response(
				&response,
				None,
				self.descriptor().quirks.scope_delimiter,
			);
			let raw = self.fetch_user(token.access_token.expose()).await?;

			Ok(self.map_user(raw).with_token(token))
		})
	}
}
