//! Requested scope lists and granted-scope parsing.

// std
use std::slice::Iter;
// crates.io
use serde::{Deserializer, de::Error as DeError};
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain whitespace or the delimiter used to join them.
	#[error("Scope contains a reserved character: {scope}.")]
	ReservedCharacter {
		/// The offending scope string.
		scope: String,
	},
}

/// Ordered, de-duplicated list of scopes requested during authorization.
///
/// Unlike a normalized set, the list keeps the caller's order so the `scope` parameter
/// reads exactly as configured (`read,write` stays `read,write`). Duplicate entries are
/// dropped after their first occurrence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ScopeList(Vec<String>);
impl ScopeList {
	/// Creates a validated scope list from any iterator.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut list = Vec::new();

		for scope in scopes {
			let owned: String = scope.into();

			if owned.is_empty() {
				return Err(ScopeValidationError::Empty);
			}
			if owned.chars().any(|c| c.is_whitespace() || c == ',') {
				return Err(ScopeValidationError::ReservedCharacter { scope: owned });
			}
			if !list.contains(&owned) {
				list.push(owned);
			}
		}

		Ok(Self(list))
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are requested.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the list contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.iter().any(|candidate| candidate == scope)
	}

	/// Iterator over scopes in request order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Joins the scopes with the provider's delimiter, or `None` when nothing is requested.
	pub fn join(&self, delimiter: char) -> Option<String> {
		if self.0.is_empty() {
			return None;
		}

		let mut buf = String::new();

		for (idx, value) in self.0.iter().enumerate() {
			if idx > 0 {
				buf.push(delimiter);
			}

			buf.push_str(value);
		}

		Some(buf)
	}

	/// Returns the underlying slice of scope strings.
	pub fn as_slice(&self) -> &[String] {
		&self.0
	}
}
impl<'a> IntoIterator for &'a ScopeList {
	type IntoIter = Iter<'a, String>;
	type Item = &'a String;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}
impl TryFrom<Vec<String>> for ScopeList {
	type Error = ScopeValidationError;

	fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl Display for ScopeList {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0.join(" "))
	}
}
impl<'de> Deserialize<'de> for ScopeList {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		ScopeList::new(values).map_err(DeError::custom)
	}
}

/// Splits a granted `scope` string on `delimiter` without dropping empty segments.
///
/// An empty input therefore yields a single empty entry; hosts comparing granted scopes
/// rely on that shape.
pub fn split_granted(raw: &str, delimiter: char) -> Vec<String> {
	raw.split(delimiter).map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scope_list_keeps_order_and_drops_duplicates() {
		let scopes = ScopeList::new(["write", "read", "write"])
			.expect("Scope list with duplicates should be valid.");

		assert_eq!(scopes.iter().collect::<Vec<_>>(), vec!["write", "read"]);
		assert_eq!(scopes.join(','), Some("write,read".into()));
		assert_eq!(scopes.join(' '), Some("write read".into()));
		assert!(scopes.contains("read"));
		assert!(!scopes.contains("admin"));
	}

	#[test]
	fn scope_list_rejects_reserved_characters() {
		assert_eq!(ScopeList::new([""]), Err(ScopeValidationError::Empty));
		assert!(matches!(
			ScopeList::new(["read,write"]),
			Err(ScopeValidationError::ReservedCharacter { .. })
		));
		assert!(ScopeList::new(["contains space"]).is_err());
	}

	#[test]
	fn empty_list_has_no_joined_form() {
		assert_eq!(ScopeList::default().join(','), None);
	}

	#[test]
	fn granted_scopes_split_on_delimiter() {
		assert_eq!(split_granted("read,write", ','), vec!["read", "write"]);
		assert_eq!(split_granted("read write", ','), vec!["read write"]);
		assert_eq!(split_granted("", ','), vec![String::new()]);
	}

	#[test]
	fn deserialization_validates_entries() {
		let scopes: ScopeList =
			serde_json::from_str("[\"read\",\"issues:create\"]").expect("Scopes should parse.");

		assert_eq!(scopes.len(), 2);
		assert!(serde_json::from_str::<ScopeList>("[\"\"]").is_err());
	}
}
