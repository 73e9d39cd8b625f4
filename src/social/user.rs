//! Raw provider profiles and the normalized user handed to hosts.

// self
use crate::{_prelude::*, auth::Token};

/// Untyped profile record exactly as the provider returned it.
///
/// Keys are a subset of the requested fields and any of them may be missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawProfile(JsonMap<String, JsonValue>);
impl RawProfile {
	/// Wraps a JSON object.
	pub fn new(fields: JsonMap<String, JsonValue>) -> Self {
		Self(fields)
	}

	/// Returns the raw value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&JsonValue> {
		self.0.get(key)
	}

	/// Renders a scalar field as text.
	///
	/// Strings are returned verbatim, numbers and booleans use their JSON text, and `null`,
	/// arrays, objects, or a missing key yield `None`.
	pub fn get_str(&self, key: &str) -> Option<String> {
		match self.0.get(key)? {
			JsonValue::String(value) => Some(value.clone()),
			value @ (JsonValue::Number(_) | JsonValue::Bool(_)) => Some(value.to_string()),
			_ => None,
		}
	}

	/// Number of fields in the record.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if the record has no fields.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Borrows the underlying JSON object.
	pub fn as_map(&self) -> &JsonMap<String, JsonValue> {
		&self.0
	}
}
impl From<JsonMap<String, JsonValue>> for RawProfile {
	fn from(value: JsonMap<String, JsonValue>) -> Self {
		Self(value)
	}
}

/// Provider-neutral user produced by a completed login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialUser {
	/// Provider-side user identifier.
	pub id: Option<String>,
	/// Display name.
	pub name: Option<String>,
	/// Primary email address.
	pub email: Option<String>,
	/// Avatar image URL.
	pub avatar: Option<String>,
	/// Profile record the user was mapped from.
	pub raw: RawProfile,
	/// Token material, attached once the code exchange completed.
	pub token: Option<Token>,
}
impl SocialUser {
	/// Creates a user without token material.
	pub fn new(raw: RawProfile) -> Self {
		Self { id: None, name: None, email: None, avatar: None, raw, token: None }
	}

	/// Attaches token material.
	pub fn with_token(mut self, token: Token) -> Self {
		self.token = Some(token);

		self
	}
}
