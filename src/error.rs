//! Error taxonomy delivered through the failure callback of every strategy.
//!
//! Nothing in this crate panics across the strategy boundary: each terminal failure becomes
//! one [`Error`] value handed to `on_failure` (or returned from `start` when the call itself
//! is rejected).

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical authentication error surfaced to callers.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The flow was aborted before credentials were obtained.
	#[error("Authentication was cancelled because {0}.")]
	Cancelled(CancellationReason),
	/// The redirect did not carry a usable authorization artifact.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// The API client failed to exchange the artifact for credentials.
	#[error("Credential exchange failed: {0}")]
	Exchange(
		#[from]
		#[source]
		ApiError,
	),
	/// The login surface could not be loaded (network failure while presenting).
	#[error("Login surface failed to load: {message}.")]
	Presentation {
		/// Presenter-supplied failure description.
		message: String,
	},
	/// The strategy was driven in a way its lifecycle forbids.
	#[error(transparent)]
	Usage(#[from] UsageError),
}
impl Error {
	/// Returns `true` when the flow ended through any cancellation path.
	pub fn is_cancellation(&self) -> bool {
		matches!(self, Self::Cancelled(_))
	}
}
impl From<CancellationReason> for Error {
	fn from(reason: CancellationReason) -> Self {
		Self::Cancelled(reason)
	}
}

/// Why a flow ended without credentials.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CancellationReason {
	/// The user closed the login surface.
	#[error("the user dismissed the login surface")]
	UserDismissed,
	/// The orchestrator called `cancel`.
	#[error("the caller cancelled the flow")]
	Caller,
	/// The identity provider redirected back with an `error` parameter.
	#[error("the identity provider returned `{error}`")]
	Provider {
		/// OAuth `error` code from the redirect.
		error: String,
		/// Optional `error_description` from the redirect.
		description: Option<String>,
	},
}

/// Redirect artifacts that cannot be redeemed.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ProtocolError {
	/// The callback URL carried no `code` parameter.
	#[error("Redirect is missing the authorization code.")]
	MissingCode,
	/// The callback URL carried no `state` parameter.
	#[error("Redirect is missing the state parameter.")]
	MissingState,
	/// The returned `state` does not match the one sent with the authorize request.
	#[error("Redirect state does not match the authorize request.")]
	StateMismatch,
}

/// Lifecycle violations reported by [`Authenticable::start`](crate::strategy::Authenticable::start).
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum UsageError {
	/// `start` was called while a flow is already in flight.
	#[error("Strategy has already been started.")]
	AlreadyStarted,
	/// `start` was called after the strategy reached a terminal state.
	#[error("Strategy has already completed; create a new instance per attempt.")]
	AlreadyCompleted,
}

/// Failures raised by the API client collaborator.
#[derive(Debug, ThisError)]
pub enum ApiError {
	/// Local configuration problem while building the request.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; the caller may retry with a fresh strategy.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Identity provider rejected the grant (bad or reused code, wrong password).
	#[error("Identity provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// The user or a rule on the provider refused the login.
	#[error("Identity provider denied access: {reason}.")]
	AccessDenied {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or the client is not allowed to use the grant.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Requested scopes were refused.
	#[error("Requested scopes were refused: {reason}.")]
	InvalidScope {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// The client does not implement the requested operation.
	#[error("API client does not support {operation}.")]
	Unsupported {
		/// Operation label.
		operation: &'static str,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// An endpoint could not be derived from the configured domain.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidEndpoint {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// No redirect URI was configured.
	#[error("A redirect URI is required.")]
	MissingRedirectUri,
	/// Configuration JSON could not be decoded.
	#[error("Configuration JSON is invalid.")]
	Json(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Credentials builder validation failed.
	#[error("Unable to build credentials.")]
	CredentialsBuild(#[from] crate::auth::CredentialsBuilderError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry with a new attempt).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token endpoint returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn exchange_error_exposes_api_error_as_source() {
		let err = Error::from(ApiError::InvalidGrant { reason: "code already used".into() });

		assert!(matches!(err, Error::Exchange(ApiError::InvalidGrant { .. })));
		assert!(err.to_string().contains("code already used"));

		let source =
			StdError::source(&err).expect("Exchange errors should expose the API error as source.");

		assert!(source.to_string().contains("rejected the grant"));
	}

	#[test]
	fn cancellation_reasons_render_in_messages() {
		let err = Error::from(CancellationReason::Provider {
			error: "access_denied".into(),
			description: None,
		});

		assert!(err.is_cancellation());
		assert_eq!(
			err.to_string(),
			"Authentication was cancelled because the identity provider returned `access_denied`."
		);
		assert!(!Error::from(ProtocolError::MissingCode).is_cancellation());
	}
}
