//! Login session state carried across the authorize redirect.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::_prelude::*;

const STATE_LEN: usize = 40;

/// Redirect metadata returned by [`SocialProvider::start_authorization`].
///
/// Hosts keep the `state` between the redirect and the callback, then check the returned
/// value with [`validate_state`](AuthorizationSession::validate_state).
///
/// [`SocialProvider::start_authorization`]: crate::social::SocialProvider::start_authorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationSession {
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Authorize URL to send the end-user to.
	pub authorize_url: Url,
}
impl AuthorizationSession {
	/// Pairs a state value with the URL that carries it.
	pub fn new(state: String, authorize_url: Url) -> Self {
		Self { state, authorize_url }
	}

	/// Validates the returned `state` parameter after the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state { Ok(()) } else { Err(Error::InvalidState) }
	}
}

/// Generates a random alphanumeric `state` value.
pub fn generate_state() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}
