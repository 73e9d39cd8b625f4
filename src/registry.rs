//! Named provider registry used by hosts to resolve a social login driver.

// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	config::{ServiceConfig, ServicesConfig},
	error::ConfigError,
	social::SocialProvider,
};

/// Builds a provider from its service configuration.
pub type ProviderFactory =
	Arc<dyn Fn(&ServiceConfig) -> Result<Box<dyn SocialProvider>> + Send + Sync>;

type FactoryMap = Arc<RwLock<HashMap<ProviderId, ProviderFactory>>>;

/// Thread-safe map from provider name to factory.
///
/// Clones share the same underlying map, so a registry handed to request handlers sees
/// providers registered later.
#[derive(Clone, Default)]
pub struct ProviderRegistry(FactoryMap);
impl ProviderRegistry {
	/// Registers `factory` under `name`, replacing any previous registration.
	pub fn extend<F>(&self, name: &str, factory: F) -> Result<&Self>
	where
		F: 'static + Fn(&ServiceConfig) -> Result<Box<dyn SocialProvider>> + Send + Sync,
	{
		let id = ProviderId::new(name).map_err(ConfigError::from)?;

		self.0.write().insert(id, Arc::new(factory));

		Ok(self)
	}

	/// Returns true if a factory is registered under `name`.
	pub fn contains(&self, name: &str) -> bool {
		self.0.read().contains_key(name)
	}

	/// Registered provider names in sorted order.
	pub fn names(&self) -> Vec<String> {
		let mut names = self.0.read().keys().map(ToString::to_string).collect::<Vec<_>>();

		names.sort();

		names
	}

	/// Builds the provider registered under `name` from the matching entry in `services`.
	pub fn driver(
		&self,
		name: &str,
		services: &ServicesConfig,
	) -> Result<Box<dyn SocialProvider>> {
		let factory = self
			.0
			.read()
			.get(name)
			.cloned()
			.ok_or_else(|| Error::UnknownProvider { name: name.to_owned() })?;

		factory(services.require(name)?)
	}
}
impl Debug for ProviderRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ProviderRegistry").field(&self.names()).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn unknown_providers_and_invalid_names_are_rejected() {
		let registry = ProviderRegistry::default();
		let err = registry
			.driver("linear", &ServicesConfig::default())
			.err()
			.expect("Empty registry cannot resolve providers.");

		assert!(matches!(err, Error::UnknownProvider { ref name } if name == "linear"));

		let err = registry
			.extend("Linear App", |_| Err(Error::InvalidState))
			.err()
			.expect("Provider names must be valid identifiers.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidIdentifier(_))));
		assert!(registry.names().is_empty());
	}

	#[test]
	fn clones_share_registrations() {
		let registry = ProviderRegistry::default();
		let shared = registry.clone();

		registry
			.extend("custom", |_| Err(Error::InvalidState))
			.expect("Valid provider names should register.");

		assert!(shared.contains("custom"));
		assert_eq!(shared.names(), vec!["custom".to_owned()]);
	}
}
