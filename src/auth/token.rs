//! Token material handed to hosts after an exchange or refresh.

pub mod secret;

// crates.io
use oauth2::TokenResponse;
// self
use crate::{
	_prelude::*,
	auth::{scope, token::secret::TokenSecret},
};

/// Access/refresh token pair plus the expiry and granted scopes reported by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	/// Access token secret.
	pub access_token: TokenSecret,
	/// Refresh token secret, when one was issued or carried over.
	pub refresh_token: Option<TokenSecret>,
	/// Lifetime of the access token in seconds, when reported.
	pub expires_in: Option<u64>,
	/// Granted scopes split on the provider delimiter.
	pub scopes: Vec<String>,
}
impl Token {
	/// Creates a token with only an access secret.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: None,
			expires_in: None,
			scopes: Vec::new(),
		}
	}

	/// Sets the refresh secret.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(refresh_token));

		self
	}

	/// Sets the lifetime in seconds.
	pub fn with_expires_in(mut self, seconds: u64) -> Self {
		self.expires_in = Some(seconds);

		self
	}

	/// Sets the granted scopes.
	pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
		self.scopes = scopes;

		self
	}

	/// Builds a token from a token endpoint response.
	///
	/// `fallback_refresh` is used when the response carries no `refresh_token`, and the
	/// granted `scope` string is split on `delimiter` (an absent scope counts as `""`).
	pub fn from_response<R>(response: &R, fallback_refresh: Option<&str>, delimiter: char) -> Self
	where
		R: TokenResponse,
	{
		let refresh_token = response
			.refresh_token()
			.map(|token| token.secret().as_str())
			.or(fallback_refresh)
			.map(TokenSecret::new);

		Self {
			access_token: TokenSecret::new(response.access_token().secret().as_str()),
			refresh_token,
			expires_in: response.expires_in().map(|lifetime| lifetime.as_secs()),
			scopes: scope::split_granted(&granted_scope(response), delimiter),
		}
	}
}

// `oauth2` splits the raw `scope` value on single spaces, so joining with a space restores the
// string exactly as the provider sent it.
fn granted_scope<R>(response: &R) -> String
where
	R: TokenResponse,
{
	response
		.scopes()
		.map(|scopes| scopes.iter().map(|scope| scope.as_str()).collect::<Vec<_>>().join(" "))
		.unwrap_or_default()
}
