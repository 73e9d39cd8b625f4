#![cfg(feature = "reqwest")]

// self
use oauth2_linear::{
	config::ServicesConfig,
	error::{ConfigError, Error},
	linear,
	registry::ProviderRegistry,
};

const SERVICES: &str = r#"{
	"linear": {
		"client_id": "client-id",
		"client_secret": "client-secret",
		"redirect": "https://app.example.com/auth/linear/callback",
		"scopes": ["read", "write"],
		"fields": ["id", "email"]
	}
}"#;

fn registry() -> ProviderRegistry {
	let registry = ProviderRegistry::default();

	linear::register(&registry).expect("Linear provider should register.");

	registry
}

#[test]
fn registered_driver_uses_service_configuration() {
	let registry = registry();
	let services = ServicesConfig::from_json(SERVICES).expect("Services fixture should parse.");
	let provider = registry.driver("linear", &services).expect("Linear driver should build.");
	let url = provider.authorization_url("state-123");
	let query = url.query().expect("Authorization URL should carry a query string.");

	assert_eq!(registry.names(), vec!["linear"]);
	assert_eq!(provider.name(), "linear");
	assert_eq!(url.host_str(), Some("linear.app"));
	assert!(query.contains("client_id=client-id"));
	assert!(query.contains("scope=read%2Cwrite"));
	assert!(query.contains("state=state-123"));
}

#[test]
fn clones_share_registrations() {
	let registry = ProviderRegistry::default();
	let handle = registry.clone();

	linear::register(&registry).expect("Linear provider should register.");

	assert!(handle.contains("linear"));
}

#[test]
fn unknown_provider_is_reported() {
	let services = ServicesConfig::from_json(SERVICES).expect("Services fixture should parse.");
	let err = registry()
		.driver("github", &services)
		.err()
		.expect("Unregistered providers must be rejected.");

	assert!(matches!(err, Error::UnknownProvider { ref name } if name == "github"));
}

#[test]
fn missing_service_entry_is_a_config_error() {
	let services = ServicesConfig::from_json("{}").expect("Empty services should parse.");
	let err = registry()
		.driver("linear", &services)
		.err()
		.expect("Missing service configuration must be rejected.");

	assert!(matches!(
		err,
		Error::Config(ConfigError::MissingService { ref name }) if name == "linear"
	));
}
