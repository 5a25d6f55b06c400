// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthUrl, AuthorizationCode, Client, ClientSecret, EndpointNotSet, EndpointSet,
	ExtraTokenFields, HttpClientError, PkceCodeVerifier, RedirectUrl, RequestTokenError,
	ResourceOwnerPassword, ResourceOwnerUsername, Scope, StandardRevocableToken,
	StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRequestTokenError, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse, BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	api::{ApiClient, ApiFuture, AuthorizationArtifact},
	auth::{AuthParameters, ConnectionId, Credentials, TokenSecret},
	config::WebAuthConfig,
	error::{ApiError, ConfigError, TransientError, TransportError},
	http::{HttpTransport, ResponseMetadata, ResponseMetadataSlot},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

type IdTokenResponse = StandardTokenResponse<IdTokenFields, BasicTokenType>;
type UnconfiguredClient = Client<
	BasicErrorResponse,
	IdTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
>;
type ConfiguredClient = Client<
	BasicErrorResponse,
	IdTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;

/// OpenID Connect addition to the standard token response.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IdTokenFields {
	/// Raw ID token, when the `openid` scope was granted.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<String>,
}
impl ExtraTokenFields for IdTokenFields {}

/// Maps HTTP transport failures into [`ApiError`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> ApiError;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> ApiError {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => transient(
				meta,
				format!("HTTP client error occurred while calling the token endpoint: {message}"),
			),
			_ => transient(meta, "HTTP client error occurred while calling the token endpoint"),
		}
	}
}

/// Token endpoint client built from a [`WebAuthConfig`].
#[cfg(feature = "reqwest")]
pub type ReqwestApiClient = OAuth2ApiClient<ReqwestTransport, ReqwestErrorMapper>;

/// [`ApiClient`] that talks to the configured token endpoint through the `oauth2` crate.
///
/// Authorization codes are redeemed with the redirect URI and PKCE verifier captured by
/// the web strategy. Password logins send the connection name as the `realm` parameter.
pub struct OAuth2ApiClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredClient,
	transport: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> OAuth2ApiClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_transport(
		config: &WebAuthConfig,
		transport: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Self {
		let oauth_client = UnconfiguredClient::new(oauth2::ClientId::new(
			config.client_id.to_string(),
		))
		.set_auth_uri(AuthUrl::from_url(config.endpoints.authorize.clone()))
		.set_token_uri(TokenUrl::from_url(config.endpoints.token.clone()))
		.set_redirect_uri(RedirectUrl::from_url(config.redirect_uri.clone()));

		Self { oauth_client, transport: transport.into(), error_mapper: error_mapper.into() }
	}

	/// Attaches a client secret for confidential clients.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.oauth_client = self.oauth_client.set_client_secret(ClientSecret::new(secret.into()));

		self
	}
}
#[cfg(feature = "reqwest")]
impl OAuth2ApiClient<ReqwestTransport, ReqwestErrorMapper> {
	/// Creates a client with its own reqwest transport.
	pub fn new(config: &WebAuthConfig) -> Self {
		Self::with_transport(config, ReqwestTransport::default(), ReqwestErrorMapper)
	}
}
impl<C, M> ApiClient for OAuth2ApiClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange<'a>(
		&'a self,
		artifact: &'a AuthorizationArtifact,
		_connection: &'a ConnectionId,
		parameters: &'a AuthParameters,
	) -> ApiFuture<'a, Credentials> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let handle = self.transport.with_metadata(meta.clone());
			let redirect = RedirectUrl::from_url(artifact.redirect_uri.clone());
			let mut request = self
				.oauth_client
				.exchange_code(AuthorizationCode::new(artifact.code.expose().to_owned()))
				.set_redirect_uri(Cow::Owned(redirect));

			if let Some(verifier) = &artifact.code_verifier {
				request =
					request.set_pkce_verifier(PkceCodeVerifier::new(verifier.expose().to_owned()));
			}
			if let Some(audience) = parameters.audience() {
				request = request.add_extra_param("audience", audience.to_owned());
			}
			if let Some(scope) = parameters.scope() {
				request = request.add_extra_param("scope", scope.to_owned());
			}

			let response = request
				.request_async(&handle)
				.await
				.map_err(|err| map_request_error(meta.take(), err, self.error_mapper.as_ref()))?;

			map_token_response(response)
		})
	}

	fn login_with_password<'a>(
		&'a self,
		connection: &'a ConnectionId,
		username: &'a str,
		password: &'a TokenSecret,
		parameters: &'a AuthParameters,
	) -> ApiFuture<'a, Credentials> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let handle = self.transport.with_metadata(meta.clone());
			let username = ResourceOwnerUsername::new(username.to_owned());
			let password = ResourceOwnerPassword::new(password.expose().to_owned());
			let mut request = self
				.oauth_client
				.exchange_password(&username, &password)
				.add_extra_param("realm", connection.to_string());

			if let Some(scope) = parameters.scope() {
				for value in scope.split_whitespace() {
					request = request.add_scope(Scope::new(value.to_owned()));
				}
			}
			for (key, value) in parameters.forwardable() {
				if key != "scope" && key != "state" {
					request = request.add_extra_param(key.to_owned(), value.to_owned());
				}
			}

			let response = request
				.request_async(&handle)
				.await
				.map_err(|err| map_request_error(meta.take(), err, self.error_mapper.as_ref()))?;

			map_token_response(response)
		})
	}
}
impl<C, M> Debug for OAuth2ApiClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2ApiClient")
			.field("client_id", &self.oauth_client.client_id().as_str())
			.field("token_endpoint", &self.oauth_client.token_uri().as_str())
			.finish()
	}
}

fn map_token_response(response: IdTokenResponse) -> Result<Credentials, ApiError> {
	let mut builder = Credentials::builder()
		.access_token(response.access_token().secret().to_owned())
		.token_type(AsRef::<str>::as_ref(response.token_type()));

	if let Some(expires_in) = response.expires_in() {
		let secs =
			i64::try_from(expires_in.as_secs()).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

		builder = builder.expires_in(Duration::seconds(secs));
	}
	if let Some(refresh) = response.refresh_token() {
		builder = builder.refresh_token(refresh.secret().to_owned());
	}
	if let Some(id_token) = &response.extra_fields().id_token {
		builder = builder.id_token(id_token.to_owned());
	}
	if let Some(scopes) = response.scopes() {
		let granted = scopes.iter().map(|scope| scope.as_str()).collect::<Vec<_>>().join(" ");

		builder = builder.scope(granted);
	}

	builder.build().map_err(|err| ConfigError::from(err).into())
}

fn map_request_error<E, M>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> ApiError
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response(response, meta_ref),
		RequestTokenError::Request(error) => mapper.map_transport_error(meta_ref, error),
		RequestTokenError::Parse(source, _body) =>
			TransientError::TokenResponseParse { source, status: meta_status(meta_ref) }.into(),
		RequestTokenError::Other(message) => transient(meta_ref, message),
	}
}

/// Provider error categories derived from an OAuth error response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ErrorKind {
	InvalidGrant,
	AccessDenied,
	InvalidClient,
	InvalidScope,
	Transient,
}

fn map_server_response(response: BasicErrorResponse, meta: Option<&ResponseMetadata>) -> ApiError {
	let code = response.error().as_ref();
	let reason = match response.error_description() {
		Some(description) => format!("{code} ({description})"),
		None => code.to_owned(),
	};

	match classify(code, meta_status(meta)) {
		ErrorKind::InvalidGrant => ApiError::InvalidGrant { reason },
		ErrorKind::AccessDenied => ApiError::AccessDenied { reason },
		ErrorKind::InvalidClient => ApiError::InvalidClient { reason },
		ErrorKind::InvalidScope => ApiError::InvalidScope { reason },
		ErrorKind::Transient => transient(meta, reason),
	}
}

fn classify(code: &str, status: Option<u16>) -> ErrorKind {
	match code.to_ascii_lowercase().as_str() {
		"invalid_grant" | "invalid_request" => ErrorKind::InvalidGrant,
		"access_denied" | "unauthorized" => ErrorKind::AccessDenied,
		"invalid_client" | "unauthorized_client" => ErrorKind::InvalidClient,
		"invalid_scope" | "insufficient_scope" => ErrorKind::InvalidScope,
		"temporarily_unavailable" | "server_error" => ErrorKind::Transient,
		_ => match status {
			Some(400 | 404 | 410) => ErrorKind::InvalidGrant,
			Some(401) => ErrorKind::InvalidClient,
			Some(403) => ErrorKind::InvalidScope,
			_ => ErrorKind::Transient,
		},
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> ApiError {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::TokenEndpoint {
			message: "Request timed out while calling the token endpoint".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}

	TransportError::from(err).into()
}

fn transient(meta: Option<&ResponseMetadata>, message: impl Into<String>) -> ApiError {
	TransientError::TokenEndpoint {
		message: message.into(),
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
