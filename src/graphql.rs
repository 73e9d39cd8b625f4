//! GraphQL request and response shapes for the viewer profile lookup.

// self
use crate::{_prelude::*, error::ProfileError};

/// Builds `{ viewer { <fields> } }` from the requested profile fields.
///
/// Fields are joined with single spaces and passed through untouched, so nested selections
/// such as `organization { name }` are allowed.
pub fn viewer_query<I, S>(fields: I) -> String
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let selection =
		fields.into_iter().map(|field| field.as_ref().to_owned()).collect::<Vec<_>>();

	format!("{{ viewer {{ {} }} }}", selection.join(" "))
}

/// JSON body POSTed to a GraphQL endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GraphQlRequest {
	/// Query document.
	pub query: String,
}
impl GraphQlRequest {
	/// Wraps a query document.
	pub fn new(query: impl Into<String>) -> Self {
		Self { query: query.into() }
	}

	/// Encodes the request as a JSON body.
	pub fn to_body(&self) -> Result<Vec<u8>, ProfileError> {
		serde_json::to_vec(self).map_err(ProfileError::Encode)
	}
}

/// Top-level GraphQL response envelope.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GraphQlResponse {
	/// `data` payload; absent or `null` when the query failed.
	#[serde(default)]
	pub data: Option<JsonValue>,
	/// `errors` payload; `null` counts as absent.
	#[serde(default)]
	pub errors: Option<JsonValue>,
}
impl GraphQlResponse {
	/// Decodes a response body, reporting the JSON path on failure.
	pub fn from_slice(body: &[u8]) -> Result<Self, ProfileError> {
		let de = &mut serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(de).map_err(|source| ProfileError::Decode { source })
	}

	/// Returns true if the response carries a non-null `errors` entry.
	pub fn has_errors(&self) -> bool {
		self.errors.is_some()
	}

	/// Joins the `message` of every reported error with `; `.
	///
	/// Entries without a string `message` are rendered as their JSON text.
	pub fn error_messages(&self) -> String {
		match self.errors.as_ref() {
			Some(JsonValue::Array(entries)) =>
				entries.iter().map(error_message).collect::<Vec<_>>().join("; "),
			Some(other) => error_message(other),
			None => String::new(),
		}
	}

	/// Takes `data.viewer` when it is an object; anything else yields an empty map.
	pub fn into_viewer(self) -> JsonMap<String, JsonValue> {
		match self.data {
			Some(JsonValue::Object(mut data)) => match data.remove("viewer") {
				Some(JsonValue::Object(viewer)) => viewer,
				_ => JsonMap::new(),
			},
			_ => JsonMap::new(),
		}
	}
}

fn error_message(entry: &JsonValue) -> String {
	match entry.get("message") {
		Some(JsonValue::String(message)) => message.clone(),
		_ => entry.to_string(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn viewer_query_joins_fields_with_spaces() {
		assert_eq!(
			viewer_query(["id", "name", "email", "avatarUrl"]),
			"{ viewer { id name email avatarUrl } }"
		);
		assert_eq!(
			viewer_query(vec!["id".to_owned(), "organization { name }".to_owned()]),
			"{ viewer { id organization { name } } }"
		);
	}

	#[test]
	fn request_body_is_a_query_object() {
		let body = GraphQlRequest::new("{ viewer { id } }")
			.to_body()
			.expect("GraphQL request should encode.");

		assert_eq!(body, br#"{"query":"{ viewer { id } }"}"#.to_vec());
	}

	#[test]
	fn viewer_is_extracted_from_data() {
		let response =
			GraphQlResponse::from_slice(br#"{"data":{"viewer":{"id":"u1","name":"Ada"}}}"#)
				.expect("Viewer response should decode.");

		assert!(!response.has_errors());

		let viewer = response.into_viewer();

		assert_eq!(viewer.get("id"), Some(&JsonValue::from("u1")));
		assert_eq!(viewer.len(), 2);
	}

	#[test]
	fn null_errors_are_treated_as_absent() {
		let response =
			GraphQlResponse::from_slice(br#"{"data":{"viewer":{"id":"u1"}},"errors":null}"#)
				.expect("Response with null errors should decode.");

		assert!(!response.has_errors());
	}

	#[test]
	fn missing_or_malformed_viewer_yields_empty_map() {
		let bodies: [&[u8]; 4] =
			[br#"{"data":{}}"#, br#"{"data":null}"#, br#"{"data":{"viewer":[1]}}"#, b"{}"];

		for body in bodies {
			let response = GraphQlResponse::from_slice(body).expect("Envelope should decode.");

			assert!(response.into_viewer().is_empty());
		}
	}

	#[test]
	fn error_messages_are_joined() {
		let response = GraphQlResponse::from_slice(
			br#"{"errors":[{"message":"Authentication required"},{"extensions":{"code":"X"}}]}"#,
		)
		.expect("Error response should decode.");

		assert!(response.has_errors());
		assert_eq!(
			response.error_messages(),
			r#"Authentication required; {"extensions":{"code":"X"}}"#
		);
	}

	#[test]
	fn undecodable_body_reports_decode_error() {
		let err = GraphQlResponse::from_slice(b"<html>").expect_err("HTML must not decode.");

		assert!(matches!(err, ProfileError::Decode { .. }));
	}
}
