//! Linear (`linear.app`) social login provider.
//!
//! [`LinearProvider`] composes an [`OAuth2Facade`] for the token endpoint and reads the
//! signed-in user through Linear's GraphQL `viewer` query. Profile failures collapse into an
//! empty record unless [`ProfileErrorPolicy::Propagate`] is selected.

// self
#[cfg(feature = "reqwest")]
use crate::{
	config::ServiceConfig,
	http::ReqwestHttpClient,
	oauth::{ReqwestFacade, ReqwestTransportErrorMapper},
	registry::ProviderRegistry,
};
use crate::{
	_prelude::*,
	auth::{ProviderId, ScopeList, Token},
	error::{ConfigError, ProfileError},
	graphql::{self, GraphQlRequest, GraphQlResponse},
	oauth::{AccessTokenResponse, OAuth2Facade},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{
		ClientAuthMethod, DefaultProviderStrategy, GrantType, ProviderDescriptor,
		ProviderErrorContext, ProviderErrorKind, ProviderQuirks, ProviderStrategy,
	},
	social::{ProviderFuture, RawProfile, SocialProvider, SocialUser},
};

/// Name the provider registers under.
pub const PROVIDER_NAME: &str = "linear";
/// Browser-facing authorize endpoint.
pub const AUTHORIZE_URL: &str = "https://linear.app/oauth/authorize";
/// Token endpoint for code exchanges and refreshes.
pub const TOKEN_URL: &str = "https://api.linear.app/oauth/token";
/// GraphQL endpoint serving the `viewer` profile.
pub const GRAPHQL_URL: &str = "https://api.linear.app/graphql";
/// Delimiter used to join requested scopes and split granted ones.
pub const SCOPE_DELIMITER: char = ',';
/// Scopes requested when none are configured.
pub const DEFAULT_SCOPES: [&str; 1] = ["read"];
/// Profile fields requested when none are configured.
pub const DEFAULT_FIELDS: [&str; 4] = ["id", "name", "email", "avatarUrl"];

/// Descriptor for the public Linear endpoints.
pub fn descriptor() -> Result<ProviderDescriptor> {
	descriptor_with_endpoints(
		Url::parse(AUTHORIZE_URL).map_err(|source| ConfigError::InvalidDescriptor { source })?,
		Url::parse(TOKEN_URL).map_err(|source| ConfigError::InvalidDescriptor { source })?,
		Url::parse(GRAPHQL_URL).map_err(|source| ConfigError::InvalidDescriptor { source })?,
	)
}

/// Descriptor with Linear's grants and quirks pointed at custom endpoints.
pub fn descriptor_with_endpoints(
	authorization: Url,
	token: Url,
	profile: Url,
) -> Result<ProviderDescriptor> {
	let id = ProviderId::new(PROVIDER_NAME).map_err(ConfigError::from)?;
	let descriptor = ProviderDescriptor::builder(id)
		.authorization_endpoint(authorization)
		.token_endpoint(token)
		.profile_endpoint(profile)
		.support_grants([GrantType::AuthorizationCode, GrantType::RefreshToken])
		.preferred_client_auth_method(ClientAuthMethod::ClientSecretPost)
		.quirks(ProviderQuirks { scope_delimiter: SCOPE_DELIMITER })
		.build()
		.map_err(ConfigError::from)?;

	Ok(descriptor)
}

/// Registers the reqwest-backed provider as `linear`.
#[cfg(feature = "reqwest")]
pub fn register(registry: &ProviderRegistry) -> Result<()> {
	registry.extend(PROVIDER_NAME, |config| {
		Ok(Box::new(LinearProvider::from_config(config)?) as Box<dyn SocialProvider>)
	})?;

	Ok(())
}

/// Token strategy that adds `grant_type=authorization_code` to code exchanges.
#[derive(Debug, Default)]
pub struct LinearStrategy;
impl ProviderStrategy for LinearStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		DefaultProviderStrategy.classify_token_error(ctx)
	}

	fn augment_token_request(&self, grant: GrantType, form: &mut BTreeMap<String, String>) {
		if grant == GrantType::AuthorizationCode {
			form.insert("grant_type".into(), grant.as_str().into());
		}
	}
}

/// How [`LinearProvider::fetch_user`](SocialProvider::fetch_user) treats profile failures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileErrorPolicy {
	/// Non-2xx statuses, transport failures, malformed bodies, and GraphQL `errors` all
	/// yield an empty profile.
	#[default]
	Collapse,
	/// The same failures are returned as errors.
	Propagate,
}

/// Linear social login provider.
pub struct LinearProvider<F> {
	descriptor: ProviderDescriptor,
	profile_endpoint: Url,
	facade: F,
	strategy: LinearStrategy,
	scopes: ScopeList,
	fields: Vec<String>,
	parameters: Vec<(String, String)>,
	profile_error_policy: ProfileErrorPolicy,
}
impl<F> LinearProvider<F>
where
	F: OAuth2Facade,
{
	/// Builds a provider around an existing facade.
	///
	/// The descriptor must declare a profile endpoint and enable the authorization code grant.
	pub fn from_facade(descriptor: ProviderDescriptor, facade: F) -> Result<Self> {
		if !descriptor.supports(GrantType::AuthorizationCode) {
			return Err(ConfigError::UnsupportedGrant {
				descriptor: descriptor.id.to_string(),
				grant: GrantType::AuthorizationCode.as_str(),
			}
			.into());
		}

		let profile_endpoint = descriptor.endpoints.profile.clone().ok_or_else(|| {
			ConfigError::MissingProfileEndpoint { descriptor: descriptor.id.to_string() }
		})?;
		let scopes = ScopeList::new(DEFAULT_SCOPES).map_err(ConfigError::from)?;

		Ok(Self {
			descriptor,
			profile_endpoint,
			facade,
			strategy: LinearStrategy,
			scopes,
			fields: DEFAULT_FIELDS.iter().map(|field| (*field).to_owned()).collect(),
			parameters: Vec::new(),
			profile_error_policy: ProfileErrorPolicy::default(),
		})
	}

	/// Replaces the requested scopes; an empty list drops `scope` from the authorize URL.
	pub fn with_scopes(mut self, scopes: ScopeList) -> Self {
		self.scopes = scopes;

		self
	}

	/// Replaces the requested profile fields.
	pub fn with_fields<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.fields = fields.into_iter().map(Into::into).collect();

		self
	}

	/// Appends extra authorize URL parameters, kept in insertion order.
	pub fn with_parameters<I, K, V>(mut self, parameters: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.parameters
			.extend(parameters.into_iter().map(|(key, value)| (key.into(), value.into())));

		self
	}

	/// Selects how profile failures are reported.
	pub fn with_profile_error_policy(mut self, policy: ProfileErrorPolicy) -> Self {
		self.profile_error_policy = policy;

		self
	}

	/// Requested scopes.
	pub fn scopes(&self) -> &ScopeList {
		&self.scopes
	}

	/// Requested profile fields.
	pub fn fields(&self) -> &[String] {
		&self.fields
	}

	/// Active profile error policy.
	pub fn profile_error_policy(&self) -> ProfileErrorPolicy {
		self.profile_error_policy
	}

	/// Underlying OAuth collaborator.
	pub fn facade(&self) -> &F {
		&self.facade
	}

	/// GraphQL document sent to the profile endpoint for the current fields.
	pub fn viewer_query(&self) -> String {
		graphql::viewer_query(&self.fields)
	}

	/// Form fields posted when exchanging `code`.
	pub fn token_fields(&self, code: &str) -> BTreeMap<String, String> {
		let mut form = self.facade.token_fields(code);

		self.strategy.augment_token_request(GrantType::AuthorizationCode, &mut form);

		form
	}

	async fn request_profile(&self, access_token: &str) -> Result<RawProfile> {
		let body = GraphQlRequest::new(self.viewer_query()).to_body()?;
		let response = self
			.facade
			.send_json(FlowKind::Profile, &self.profile_endpoint, access_token, body)
			.await?;
		let status = response.status();

		if !status.is_success() {
			return Err(ProfileError::Status { status: status.as_u16() }.into());
		}

		let envelope = GraphQlResponse::from_slice(response.body())?;

		if envelope.has_errors() {
			return Err(ProfileError::GraphQl { messages: envelope.error_messages() }.into());
		}

		Ok(RawProfile::new(envelope.into_viewer()))
	}

	async fn request_refresh(&self, refresh_token: &str) -> Result<Token> {
		if !self.descriptor.supports(GrantType::RefreshToken) {
			return Err(ConfigError::UnsupportedGrant {
				descriptor: self.descriptor.id.to_string(),
				grant: GrantType::RefreshToken.as_str(),
			}
			.into());
		}

		let response = self.facade.refresh_token(&self.strategy, refresh_token).await?;

		Ok(Token::from_response(
			&response,
			Some(refresh_token),
			self.descriptor.quirks.scope_delimiter,
		))
	}
}
#[cfg(feature = "reqwest")]
impl LinearProvider<ReqwestFacade> {
	/// Builds a provider for the public Linear endpoints over a fresh reqwest client.
	pub fn new(
		client_id: impl AsRef<str>,
		client_secret: impl AsRef<str>,
		redirect_uri: &Url,
	) -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::from)?;

		Self::from_http_client(
			descriptor()?,
			client_id.as_ref(),
			client_secret.as_ref(),
			redirect_uri,
			ReqwestHttpClient::with_client(client),
		)
	}

	/// Builds a provider for `descriptor` over a caller-supplied reqwest client.
	pub fn from_http_client(
		descriptor: ProviderDescriptor,
		client_id: &str,
		client_secret: &str,
		redirect_uri: &Url,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		let facade = ReqwestFacade::from_descriptor(
			&descriptor,
			client_id,
			client_secret,
			redirect_uri,
			http_client,
			ReqwestTransportErrorMapper,
		)?;

		Self::from_facade(descriptor, facade)
	}

	/// Builds a provider from a host service configuration.
	pub fn from_config(config: &ServiceConfig) -> Result<Self> {
		let mut provider =
			Self::new(&config.client_id, &config.client_secret, &config.redirect_uri)?;

		if let Some(scopes) = config.scopes.clone() {
			provider = provider.with_scopes(scopes);
		}
		if let Some(fields) = config.fields.clone() {
			provider = provider.with_fields(fields);
		}

		Ok(provider)
	}
}
impl<F> SocialProvider for LinearProvider<F>
where
	F: OAuth2Facade,
{
	fn descriptor(&self) -> &ProviderDescriptor {
		&self.descriptor
	}

	fn authorization_url(&self, state: &str) -> Url {
		let _guard = FlowSpan::new(FlowKind::Authorization, "authorization_url").entered();
		let scope = self.scopes.join(self.descriptor.quirks.scope_delimiter);

		obs::record_flow_outcome(FlowKind::Authorization, FlowOutcome::Success);

		self.facade.build_auth_url_from_base(
			&self.descriptor.endpoints.authorization,
			scope.as_deref(),
			state,
			&self.parameters,
		)
	}

	fn exchange_code<'a>(&'a self, code: &'a str) -> ProviderFuture<'a, AccessTokenResponse> {
		let span = FlowSpan::new(FlowKind::AuthorizationCode, "exchange_code");

		Box::pin(span.instrument(async move {
			obs::record_flow_outcome(FlowKind::AuthorizationCode, FlowOutcome::Attempt);

			let form = self.token_fields(code);
			let result = self.facade.exchange_code(&self.strategy, code, form).await;

			record_result(FlowKind::AuthorizationCode, &result);

			result
		}))
	}

	fn fetch_user<'a>(&'a self, access_token: &'a str) -> ProviderFuture<'a, RawProfile> {
		let span = FlowSpan::new(FlowKind::Profile, "fetch_user");

		Box::pin(span.instrument(async move {
			obs::record_flow_outcome(FlowKind::Profile, FlowOutcome::Attempt);

			let result = self.request_profile(access_token).await;

			record_result(FlowKind::Profile, &result);

			match (result, self.profile_error_policy) {
				(Err(err), ProfileErrorPolicy::Collapse) => {
					obs::warn_collapsed(FlowKind::Profile, &err);

					Ok(RawProfile::default())
				},
				(result, _) => result,
			}
		}))
	}

	fn map_user(&self, raw: RawProfile) -> SocialUser {
		SocialUser {
			id: raw.get_str("id"),
			name: raw.get_str("name"),
			email: raw.get_str("email"),
			avatar: raw.get_str("avatarUrl"),
			raw,
			token: None,
		}
	}

	fn refresh_token<'a>(&'a self, refresh_token: &'a str) -> ProviderFuture<'a, Token> {
		let span = FlowSpan::new(FlowKind::Refresh, "refresh_token");

		Box::pin(span.instrument(async move {
			obs::record_flow_outcome(FlowKind::Refresh, FlowOutcome::Attempt);

			let result = self.request_refresh(refresh_token).await;

			record_result(FlowKind::Refresh, &result);

			result
		}))
	}
}
impl<F> Debug for LinearProvider<F> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LinearProvider")
			.field("descriptor", &self.descriptor.id)
			.field("scopes", &self.scopes)
			.field("fields", &self.fields)
			.field("parameters", &self.parameters)
			.field("profile_error_policy", &self.profile_error_policy)
			.finish_non_exhaustive()
	}
}

fn record_result<T>(kind: FlowKind, result: &Result<T>) {
	let outcome = if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure };

	obs::record_flow_outcome(kind, outcome);
}
