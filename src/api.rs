//! API client collaborator: redeems authorization artifacts and passwords for credentials.
//!
//! Strategies only see [`ApiClient`]. The orchestrator owns the client and shares it with
//! every strategy as `Arc<dyn ApiClient>`, so a strategy finishing never tears it down.
//! [`OAuth2ApiClient`] is the bundled implementation on top of the `oauth2` crate.

mod oauth;

pub use oauth::*;

// self
use crate::{
	_prelude::*,
	auth::{AuthParameters, ConnectionId, Credentials, TokenSecret},
	error::ApiError,
};

/// Boxed future returned by [`ApiClient`] operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + 'a + Send>>;

/// Exchanges login artifacts for [`Credentials`].
///
/// Implementations are invoked from whichever task resumes the flow, so they must be
/// `Send + Sync`. They must not retry on their own; retry policy belongs to the caller.
pub trait ApiClient
where
	Self: Send + Sync,
{
	/// Redeems an authorization code captured from the redirect.
	///
	/// `connection` and `parameters` are the ones the login started with. The code already
	/// binds them on the provider side, so implementations may use them only as hints (the
	/// bundled client echoes `audience` and `scope`).
	fn exchange<'a>(
		&'a self,
		artifact: &'a AuthorizationArtifact,
		connection: &'a ConnectionId,
		parameters: &'a AuthParameters,
	) -> ApiFuture<'a, Credentials>;

	/// Authenticates a username/password pair against a database connection.
	///
	/// The default implementation reports [`ApiError::Unsupported`].
	fn login_with_password<'a>(
		&'a self,
		connection: &'a ConnectionId,
		username: &'a str,
		password: &'a TokenSecret,
		parameters: &'a AuthParameters,
	) -> ApiFuture<'a, Credentials> {
		let _ = (connection, username, password, parameters);

		Box::pin(async { Err(ApiError::Unsupported { operation: "password login" }) })
	}
}

/// Authorization code plus what is needed to redeem it.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationArtifact {
	/// Authorization code from the callback URL.
	pub code: TokenSecret,
	/// Redirect URI sent with the authorize request; must be echoed at the token endpoint.
	pub redirect_uri: Url,
	/// PKCE verifier matching the challenge sent with the authorize request.
	pub code_verifier: Option<TokenSecret>,
}
impl Debug for AuthorizationArtifact {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationArtifact")
			.field("code", &"<redacted>")
			.field("redirect_uri", &self.redirect_uri)
			.field("code_verifier", &self.code_verifier.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}
