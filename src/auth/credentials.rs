//! Credentials issued at the end of a successful flow.

// self
use crate::{_prelude::*, auth::secret::TokenSecret};

/// Errors produced by [`CredentialsBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CredentialsBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when the relative expiry is zero or negative.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
}

/// Normalized success payload handed to `on_success`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	/// Access token secret.
	pub access_token: TokenSecret,
	/// Token type reported by the identity provider (usually `bearer`).
	pub token_type: String,
	/// OpenID Connect ID token, when the `openid` scope was granted.
	pub id_token: Option<TokenSecret>,
	/// Refresh token, when `offline_access` was granted.
	pub refresh_token: Option<TokenSecret>,
	/// Absolute expiry of the access token, when the provider reported one.
	pub expires_at: Option<OffsetDateTime>,
	/// Space-delimited scope actually granted, when it differs from the request.
	pub scope: Option<String>,
}
impl Credentials {
	/// Returns a builder for assembling credentials from a token response.
	pub fn builder() -> CredentialsBuilder {
		CredentialsBuilder::default()
	}

	/// Returns `true` if the access token has expired at the provided instant.
	///
	/// Credentials without an expiry never expire from the crate's point of view.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.field("scope", &self.scope)
			.finish()
	}
}

/// Builder for [`Credentials`].
#[derive(Clone, Debug, Default)]
pub struct CredentialsBuilder {
	access_token: Option<TokenSecret>,
	token_type: Option<String>,
	id_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
	scope: Option<String>,
}
impl CredentialsBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Overrides the token type (defaults to `bearer`).
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Provides the OpenID Connect ID token.
	pub fn id_token(mut self, token: impl Into<String>) -> Self {
		self.id_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the instant the tokens were issued (defaults to now).
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets the relative lifetime of the access token.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Records the granted scope.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Consumes the builder and produces [`Credentials`].
	pub fn build(self) -> Result<Credentials, CredentialsBuilderError> {
		let access_token =
			self.access_token.ok_or(CredentialsBuilderError::MissingAccessToken)?;
		let expires_at = match self.expires_in {
			Some(delta) if !delta.is_positive() =>
				return Err(CredentialsBuilderError::NonPositiveExpiresIn),
			Some(delta) => Some(self.issued_at.unwrap_or_else(OffsetDateTime::now_utc) + delta),
			None => None,
		};

		Ok(Credentials {
			access_token,
			token_type: self.token_type.unwrap_or_else(|| "bearer".into()),
			id_token: self.id_token,
			refresh_token: self.refresh_token,
			expires_at,
			scope: self.scope,
		})
	}
}
