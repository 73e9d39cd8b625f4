//! Service credentials resolved by the host, keyed by provider name.
//!
//! The shape mirrors a typical `services` configuration block:
//!
//! ```json
//! {
//! 	"linear": {
//! 		"client_id": "client-id",
//! 		"client_secret": "client-secret",
//! 		"redirect": "https://example.com/auth/linear/callback",
//! 		"scopes": ["read", "write"]
//! 	}
//! }
//! ```

// self
use crate::{_prelude::*, auth::ScopeList, error::ConfigError};

/// Credentials and overrides for a single provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: String,
	/// Callback URL registered with the provider; `redirect` is accepted as an alias.
	#[serde(alias = "redirect")]
	pub redirect_uri: Url,
	/// Requested scopes; the provider default applies when absent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scopes: Option<ScopeList>,
	/// Requested profile fields; the provider default applies when absent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fields: Option<Vec<String>>,
}
impl ServiceConfig {
	/// Creates a configuration with provider-default scopes and fields.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		redirect_uri: Url,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			redirect_uri,
			scopes: None,
			fields: None,
		}
	}

	/// Overrides the requested scopes.
	pub fn with_scopes(mut self, scopes: ScopeList) -> Self {
		self.scopes = Some(scopes);

		self
	}

	/// Overrides the requested profile fields.
	pub fn with_fields<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.fields = Some(fields.into_iter().map(Into::into).collect());

		self
	}
}
impl Debug for ServiceConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ServiceConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("redirect_uri", &self.redirect_uri.as_str())
			.field("scopes", &self.scopes)
			.field("fields", &self.fields)
			.finish()
	}
}

/// All configured services, keyed by provider name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServicesConfig(BTreeMap<String, ServiceConfig>);
impl ServicesConfig {
	/// Parses a JSON object of services, reporting the failing path on error.
	pub fn from_json(raw: &str) -> Result<Self> {
		let de = &mut serde_json::Deserializer::from_str(raw);

		serde_path_to_error::deserialize(de)
			.map_err(|source| ConfigError::ServicesParse { source }.into())
	}

	/// Adds or replaces the configuration for `name`.
	pub fn with_service(mut self, name: impl Into<String>, config: ServiceConfig) -> Self {
		self.0.insert(name.into(), config);

		self
	}

	/// Looks up the configuration for `name`.
	pub fn get(&self, name: &str) -> Option<&ServiceConfig> {
		self.0.get(name)
	}

	/// Looks up the configuration for `name`, failing when it is missing.
	pub fn require(&self, name: &str) -> Result<&ServiceConfig> {
		self.get(name).ok_or_else(|| ConfigError::MissingService { name: name.to_owned() }.into())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn redirect_alias_and_optional_overrides_parse() {
		let services = ServicesConfig::from_json(
			r#"{"linear":{"client_id":"id","client_secret":"s3cr3t-value","redirect":"http://localhost/callback","fields":["id","name"]}}"#,
		)
		.expect("Services configuration should parse.");
		let linear = services.require("linear").expect("Linear service should be configured.");

		assert_eq!(linear.redirect_uri.as_str(), "http://localhost/callback");
		assert_eq!(linear.fields.as_deref(), Some(&["id".to_owned(), "name".to_owned()][..]));
		assert!(linear.scopes.is_none());
		assert!(!format!("{linear:?}").contains("s3cr3t-value"));
	}

	#[test]
	fn parse_failures_report_the_path() {
		let err = ServicesConfig::from_json(
			r#"{"linear":{"client_id":"id","client_secret":"secret","redirect_uri":"not a url"}}"#,
		)
		.expect_err("Relative redirect URIs must be rejected.");

		assert!(err.to_string().contains("linear.redirect_uri"), "{err}");

		let err = ServicesConfig::from_json(
			r#"{"linear":{"client_id":"id","client_secret":"s","redirect_uri":"https://a.b/c","scopes":[""]}}"#,
		)
		.expect_err("Empty scopes must be rejected.");

		assert!(err.to_string().contains("linear.scopes"), "{err}");
	}

	#[test]
	fn missing_services_are_reported_by_name() {
		let err = ServicesConfig::default()
			.require("linear")
			.expect_err("Empty configuration has no services.");

		assert!(matches!(
			err,
			Error::Config(ConfigError::MissingService { ref name }) if name == "linear"
		));
	}
}
