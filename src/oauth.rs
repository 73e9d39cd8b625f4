//! OAuth 2.0 collaborator consumed by provider adapters.
//!
//! [`OAuth2Facade`] covers the generic half of a social provider: authorize URLs built from a
//! base endpoint, the `authorization_code` and `refresh_token` token calls, and bearer JSON
//! POSTs for profile lookups. [`BasicFacade`] implements it on top of the `oauth2` crate and a
//! [`ProviderHttpClient`].

pub use oauth2;

// crates.io
use oauth2::{
	AsyncHttpClient, AuthType, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet,
	EndpointSet, HttpClientError, HttpResponse, RedirectUrl, RefreshToken, RequestTokenError,
	TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;
use crate::{
	_prelude::*,
	error::{ConfigError, TransientError, TransportError},
	http::{ProviderHttpClient, ResponseMetadata, ResponseMetadataSlot},
	obs::FlowKind,
	provider::{
		ClientAuthMethod, GrantType, ProviderDescriptor, ProviderErrorContext, ProviderErrorKind,
		ProviderStrategy,
	},
};

/// Successful token endpoint response handed back to hosts.
pub type AccessTokenResponse = BasicTokenResponse;
/// Boxed, `Send` future returned by [`OAuth2Facade`] methods.
pub type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

// Form fields the `oauth2` request builders already send.
const OWNED_FORM_FIELDS: [&str; 6] =
	["client_id", "client_secret", "code", "grant_type", "redirect_uri", "refresh_token"];

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		kind: FlowKind,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		kind: FlowKind,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(kind, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(kind, meta, message),
			_ => map_generic_transport_error(kind, meta, "unknown failure"),
		}
	}
}

/// Generic OAuth 2.0 behavior a provider adapter composes with.
pub trait OAuth2Facade
where
	Self: Send + Sync,
{
	/// Configured client identifier.
	fn client_id(&self) -> &str;

	/// Configured redirect URI.
	fn redirect_uri(&self) -> &Url;

	/// Builds the browser redirect for `base`.
	///
	/// Query order is `client_id`, `redirect_uri`, `scope` (skipped when `None`),
	/// `response_type=code`, `state`, then `extra` in the given order.
	fn build_auth_url_from_base(
		&self,
		base: &Url,
		scope: Option<&str>,
		state: &str,
		extra: &[(String, String)],
	) -> Url {
		let mut url = base.clone();

		{
			let mut pairs = url.query_pairs_mut();

			pairs
				.append_pair("client_id", self.client_id())
				.append_pair("redirect_uri", self.redirect_uri().as_str());

			if let Some(scope) = scope {
				pairs.append_pair("scope", scope);
			}

			pairs.append_pair("response_type", "code").append_pair("state", state);

			for (key, value) in extra {
				pairs.append_pair(key, value);
			}
		}

		url
	}

	/// Base token form for an authorization code: `client_id`, `client_secret`, `code`, and
	/// `redirect_uri`.
	fn token_fields(&self, code: &str) -> BTreeMap<String, String>;

	/// Exchanges `code` at the token endpoint, sending any `form` entries the OAuth request
	/// does not already carry as extra parameters.
	fn exchange_code<'a>(
		&'a self,
		strategy: &'a dyn ProviderStrategy,
		code: &'a str,
		form: BTreeMap<String, String>,
	) -> FacadeFuture<'a, AccessTokenResponse>;

	/// Runs the `refresh_token` grant.
	fn refresh_token<'a>(
		&'a self,
		strategy: &'a dyn ProviderStrategy,
		refresh_token: &'a str,
	) -> FacadeFuture<'a, AccessTokenResponse>;

	/// POSTs a JSON `body` to `endpoint` with a bearer token and returns the raw response.
	///
	/// Non-success statuses are returned as responses; only transport failures error.
	fn send_json<'a>(
		&'a self,
		kind: FlowKind,
		endpoint: &'a Url,
		bearer: &'a str,
		body: Vec<u8>,
	) -> FacadeFuture<'a, HttpResponse>;
}

/// [`BasicFacade`] over the reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestFacade = BasicFacade<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// [`OAuth2Facade`] backed by the `oauth2` crate.
pub struct BasicFacade<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	client_secret: ClientSecret,
	redirect_uri: Url,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> BasicFacade<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds a facade from a validated descriptor and client credentials.
	pub fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: &str,
		redirect_uri: &Url,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let redirect_url = RedirectUrl::new(redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidRedirect { source })?;
		let client_secret = ClientSecret::new(client_secret.to_owned());
		let mut oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_token_uri(token_url)
			.set_client_secret(client_secret.clone())
			.set_redirect_uri(redirect_url);

		if matches!(descriptor.preferred_client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self {
			oauth_client,
			client_secret,
			redirect_uri: redirect_uri.clone(),
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
		})
	}
}
impl<C, M> OAuth2Facade for BasicFacade<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn client_id(&self) -> &str {
		self.oauth_client.client_id().as_str()
	}

	fn redirect_uri(&self) -> &Url {
		&self.redirect_uri
	}

	fn token_fields(&self, code: &str) -> BTreeMap<String, String> {
		BTreeMap::from([
			("client_id".to_owned(), self.client_id().to_owned()),
			("client_secret".to_owned(), self.client_secret.secret().to_owned()),
			("code".to_owned(), code.to_owned()),
			("redirect_uri".to_owned(), self.redirect_uri.to_string()),
		])
	}

	fn exchange_code<'a>(
		&'a self,
		strategy: &'a dyn ProviderStrategy,
		code: &'a str,
		form: BTreeMap<String, String>,
	) -> FacadeFuture<'a, AccessTokenResponse> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let mut request =
				self.oauth_client.exchange_code(AuthorizationCode::new(code.to_owned()));

			for (key, value) in extra_form_fields(&form) {
				request = request.add_extra_param(key, value);
			}

			request.request_async(&instrumented).await.map_err(|err| {
				map_request_error(
					strategy,
					GrantType::AuthorizationCode,
					meta.take(),
					err,
					self.error_mapper.as_ref(),
				)
			})
		})
	}

	fn refresh_token<'a>(
		&'a self,
		strategy: &'a dyn ProviderStrategy,
		refresh_token: &'a str,
	) -> FacadeFuture<'a, AccessTokenResponse> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let refresh_secret = RefreshToken::new(refresh_token.to_owned());
			let mut form = BTreeMap::new();

			strategy.augment_token_request(GrantType::RefreshToken, &mut form);

			let mut request = self.oauth_client.exchange_refresh_token(&refresh_secret);

			for (key, value) in extra_form_fields(&form) {
				request = request.add_extra_param(key, value);
			}

			request.request_async(&instrumented).await.map_err(|err| {
				map_request_error(
					strategy,
					GrantType::RefreshToken,
					meta.take(),
					err,
					self.error_mapper.as_ref(),
				)
			})
		})
	}

	fn send_json<'a>(
		&'a self,
		kind: FlowKind,
		endpoint: &'a Url,
		bearer: &'a str,
		body: Vec<u8>,
	) -> FacadeFuture<'a, HttpResponse> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let request = Request::builder()
				.method(Method::POST)
				.uri(endpoint.as_str())
				.header(AUTHORIZATION, format!("Bearer {bearer}"))
				.header(CONTENT_TYPE, "application/json")
				.header(ACCEPT, "application/json")
				.body(body)
				.map_err(ConfigError::from)?;
			let instrumented = self.http_client.with_metadata(meta.clone());

			instrumented.call(request).await.map_err(|err| {
				self.error_mapper.map_transport_error(kind, meta.take().as_ref(), err)
			})
		})
	}
}

fn extra_form_fields(form: &BTreeMap<String, String>) -> impl Iterator<Item = (&String, &String)> {
	form.iter().filter(|(key, _)| !OWNED_FORM_FIELDS.contains(&key.as_str()))
}

fn flow_for(grant: GrantType) -> FlowKind {
	match grant {
		GrantType::AuthorizationCode => FlowKind::AuthorizationCode,
		GrantType::RefreshToken => FlowKind::Refresh,
	}
}

fn map_request_error<E, M>(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(strategy, grant, response, meta_ref),
		RequestTokenError::Request(error) =>
			mapper.map_transport_error(flow_for(grant), meta_ref, error),
		RequestTokenError::Parse(source, _body) =>
			TransientError::TokenResponseParse { source, status: meta_status(meta_ref) }.into(),
		RequestTokenError::Other(message) => TransientError::Endpoint {
			message: format!("token endpoint answered with {message}"),
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn map_server_response_error(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let code = response.error().as_ref().to_owned();
	let mut ctx = ProviderErrorContext::new(grant).with_oauth_error(code.clone());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	let reason = response.error_description().cloned().unwrap_or(code);

	match strategy.classify_token_error(&ctx) {
		ProviderErrorKind::InvalidGrant => Error::InvalidGrant { reason },
		ProviderErrorKind::InvalidClient => Error::InvalidClient { reason },
		ProviderErrorKind::InsufficientScope => Error::InsufficientScope { reason },
		ProviderErrorKind::Transient => TransientError::Endpoint {
			message: reason,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(kind: FlowKind, meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::Endpoint {
			message: format!("request timed out during the {kind} flow"),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}

	TransportError::from(err).into()
}

#[cfg(feature = "reqwest")]
fn map_generic_transport_error(
	kind: FlowKind,
	meta: Option<&ResponseMetadata>,
	message: impl Display,
) -> Error {
	TransientError::Endpoint {
		message: format!("HTTP client failed during the {kind} flow: {message}"),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::auth::ProviderId;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Facade fixture URL should parse.")
	}

	fn facade() -> ReqwestFacade {
		let descriptor = ProviderDescriptor::builder(
			ProviderId::new("fixture").expect("Fixture provider id should be valid."),
		)
		.authorization_endpoint(url("https://example.com/oauth/authorize"))
		.token_endpoint(url("https://api.example.com/oauth/token"))
		.support_grant(GrantType::AuthorizationCode)
		.preferred_client_auth_method(ClientAuthMethod::ClientSecretPost)
		.build()
		.expect("Fixture descriptor should build.");

		ReqwestFacade::from_descriptor(
			&descriptor,
			"client-id",
			"client-secret",
			&url("http://localhost/callback"),
			ReqwestHttpClient::default(),
			ReqwestTransportErrorMapper,
		)
		.expect("Facade should build from a valid descriptor.")
	}

	#[test]
	fn auth_url_keeps_parameter_order() {
		let url = facade().build_auth_url_from_base(
			&url("https://example.com/oauth/authorize"),
			Some("read,write"),
			"xyz",
			&[("prompt".into(), "consent".into())],
		);

		assert_eq!(
			url.as_str(),
			"https://example.com/oauth/authorize?client_id=client-id&redirect_uri=http%3A%2F%2Flocalhost%2Fcallback&scope=read%2Cwrite&response_type=code&state=xyz&prompt=consent"
		);
	}

	#[test]
	fn auth_url_skips_missing_scope() {
		let url = facade().build_auth_url_from_base(
			&url("https://example.com/oauth/authorize"),
			None,
			"xyz",
			&[],
		);

		assert!(url.query_pairs().all(|(key, _)| key != "scope"));
	}

	#[test]
	fn token_fields_carry_client_credentials() {
		let fields = facade().token_fields("the-code");

		assert_eq!(fields.get("client_id").map(String::as_str), Some("client-id"));
		assert_eq!(fields.get("client_secret").map(String::as_str), Some("client-secret"));
		assert_eq!(fields.get("code").map(String::as_str), Some("the-code"));
		assert_eq!(
			fields.get("redirect_uri").map(String::as_str),
			Some("http://localhost/callback")
		);
		assert!(!fields.contains_key("grant_type"));
	}

	#[test]
	fn owned_fields_are_not_sent_twice() {
		let form = BTreeMap::from([
			("grant_type".to_owned(), "authorization_code".to_owned()),
			("code".to_owned(), "abc".to_owned()),
			("audience".to_owned(), "linear".to_owned()),
		]);
		let extras = extra_form_fields(&form).map(|(key, _)| key.as_str()).collect::<Vec<_>>();

		assert_eq!(extras, vec!["audience"]);
	}
}
