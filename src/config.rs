//! Identity-provider tenant configuration shared by every strategy.
//!
//! [`WebAuthConfig`] describes where the hosted login page and token endpoint live, which
//! client is asking, and where the provider redirects back to. Configs are validated once,
//! at build or load time, so strategies can treat them as trusted data.

// self
use crate::{_prelude::*, auth::ClientId, error::ConfigError};

const DEFAULT_SCOPE: &str = "openid";

/// Endpoint pair used by the web flow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
	/// Hosted login page (`/authorize`).
	pub authorize: Url,
	/// Token endpoint used to redeem authorization codes and passwords.
	pub token: Url,
}

/// Validated tenant configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAuthConfig {
	/// OAuth client identifier.
	pub client_id: ClientId,
	/// Provider endpoints.
	pub endpoints: Endpoints,
	/// Callback URL the provider redirects to; may use an app-specific scheme.
	pub redirect_uri: Url,
	/// Scope requested when the caller does not provide one.
	#[serde(default = "default_scope")]
	pub default_scope: String,
	/// Sends a PKCE `S256` challenge with every authorize request.
	#[serde(default = "default_pkce")]
	pub pkce: bool,
}
impl WebAuthConfig {
	/// Creates a builder that derives endpoints from the tenant domain.
	pub fn builder(domain: Url, client_id: ClientId) -> WebAuthConfigBuilder {
		WebAuthConfigBuilder::new(domain, client_id)
	}

	/// Decodes and validates a JSON configuration document.
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		let de = &mut serde_json::Deserializer::from_str(json);
		let config: Self = serde_path_to_error::deserialize(de)?;

		config.validate()?;

		Ok(config)
	}

	/// Returns `true` when `url` targets the configured callback (query and fragment ignored).
	pub fn is_callback(&self, url: &Url) -> bool {
		url.scheme() == self.redirect_uri.scheme()
			&& url.host_str() == self.redirect_uri.host_str()
			&& url.port_or_known_default() == self.redirect_uri.port_or_known_default()
			&& url.path() == self.redirect_uri.path()
	}

	fn validate(&self) -> Result<(), ConfigError> {
		validate_endpoint("authorize", &self.endpoints.authorize)?;
		validate_endpoint("token", &self.endpoints.token)?;

		Ok(())
	}
}

/// Builder for [`WebAuthConfig`].
#[derive(Debug)]
pub struct WebAuthConfigBuilder {
	domain: Url,
	client_id: ClientId,
	authorize_endpoint: Option<Url>,
	token_endpoint: Option<Url>,
	redirect_uri: Option<Url>,
	default_scope: String,
	pkce: bool,
}
impl WebAuthConfigBuilder {
	fn new(domain: Url, client_id: ClientId) -> Self {
		Self {
			domain,
			client_id,
			authorize_endpoint: None,
			token_endpoint: None,
			redirect_uri: None,
			default_scope: DEFAULT_SCOPE.into(),
			pkce: true,
		}
	}

	/// Overrides the authorize endpoint (defaults to `{domain}/authorize`).
	pub fn authorize_endpoint(mut self, url: Url) -> Self {
		self.authorize_endpoint = Some(url);

		self
	}

	/// Overrides the token endpoint (defaults to `{domain}/oauth/token`).
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the callback URL.
	pub fn redirect_uri(mut self, url: Url) -> Self {
		self.redirect_uri = Some(url);

		self
	}

	/// Overrides the default scope.
	pub fn default_scope(mut self, scope: impl Into<String>) -> Self {
		self.default_scope = scope.into();

		self
	}

	/// Enables or disables PKCE.
	pub fn pkce(mut self, enabled: bool) -> Self {
		self.pkce = enabled;

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<WebAuthConfig, ConfigError> {
		let authorize = match self.authorize_endpoint {
			Some(url) => url,
			None => join_endpoint(&self.domain, "authorize", "authorize")?,
		};
		let token = match self.token_endpoint {
			Some(url) => url,
			None => join_endpoint(&self.domain, "token", "oauth/token")?,
		};
		let redirect_uri = self.redirect_uri.ok_or(ConfigError::MissingRedirectUri)?;
		let config = WebAuthConfig {
			client_id: self.client_id,
			endpoints: Endpoints { authorize, token },
			redirect_uri,
			default_scope: self.default_scope,
			pkce: self.pkce,
		};

		config.validate()?;

		Ok(config)
	}
}

fn join_endpoint(domain: &Url, name: &'static str, path: &str) -> Result<Url, ConfigError> {
	domain.join(path).map_err(|source| ConfigError::InvalidEndpoint { endpoint: name, source })
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	if url.scheme() != "https" {
		Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}

fn default_scope() -> String {
	DEFAULT_SCOPE.into()
}

fn default_pkce() -> bool {
	true
}
