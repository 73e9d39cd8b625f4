//! Walks through a Linear login: print the authorize URL, then exchange the callback code for
//! the viewer profile.
//!
//! Set `LINEAR_CLIENT_ID`, `LINEAR_CLIENT_SECRET`, and `LINEAR_REDIRECT_URI`, then run once to
//! get the URL. Run again with `LINEAR_CODE` and `LINEAR_STATE` from the callback query to
//! finish the login.

// std
use std::env;
// crates.io
use color_eyre::{Result, eyre::eyre};
// self
use oauth2_linear::{
	LinearProvider,
	auth::ScopeList,
	social::{AuthorizationSession, SocialProvider},
	url::Url,
};

fn var(name: &str) -> Result<String> {
	env::var(name).map_err(|_| eyre!("Set `{name}` before running this demo."))
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let redirect_uri = Url::parse(&var("LINEAR_REDIRECT_URI")?)?;
	let provider =
		LinearProvider::new(var("LINEAR_CLIENT_ID")?, var("LINEAR_CLIENT_SECRET")?, &redirect_uri)?
			.with_scopes(ScopeList::new(["read"])?)
			.with_parameters([("prompt", "consent")]);
	let (Ok(code), Ok(state)) = (env::var("LINEAR_CODE"), env::var("LINEAR_STATE")) else {
		let session = provider.start_authorization();

		println!("Send your user to {}.", session.authorize_url);
		println!("Store state `{}` and rerun with LINEAR_CODE and LINEAR_STATE.", session.state);

		return Ok(());
	};
	// Stand-in for the session persisted before the redirect.
	let stored = AuthorizationSession::new(state.clone(), provider.authorization_url(&state));

	stored.validate_state(&state)?;

	let user = provider.user(&code).await?;

	println!(
		"Signed in {} <{}>.",
		user.name.as_deref().unwrap_or("?"),
		user.email.as_deref().unwrap_or("?")
	);
	println!("Profile id: {}.", user.id.as_deref().unwrap_or("?"));

	if let Some(token) = user.token {
		println!("Granted scopes: {:?}.", token.scopes);
		println!("Refresh token issued: {}.", token.refresh_token.is_some());
	}

	Ok(())
}
