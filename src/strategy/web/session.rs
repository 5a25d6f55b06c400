// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	api::AuthorizationArtifact,
	auth::{AuthParameters, ConnectionId, TokenSecret},
	config::WebAuthConfig,
	error::{CancellationReason, ProtocolError},
};

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;

/// Supported PKCE challenge methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Per-attempt authorize request: the URL to present plus what validates the callback.
#[derive(Clone)]
pub struct LoginSession {
	/// Opaque value that must round-trip through the redirect.
	pub state: String,
	/// Fully-formed authorize URL handed to the presenter.
	pub authorize_url: Url,
	redirect_uri: Url,
	pkce: Option<PkcePair>,
}
impl LoginSession {
	/// Builds the authorize request for `connection`.
	///
	/// A caller-supplied `state` parameter is reused; otherwise a random one is generated.
	pub fn new(
		config: &WebAuthConfig,
		connection: &ConnectionId,
		parameters: &AuthParameters,
	) -> Self {
		let state = parameters.state().map_or_else(|| random_string(STATE_LEN), str::to_owned);
		let pkce = config.pkce.then(PkcePair::generate);
		let authorize_url = build_authorize_url(config, connection, parameters, &state, pkce.as_ref());

		Self { state, authorize_url, redirect_uri: config.redirect_uri.clone(), pkce }
	}

	/// PKCE code challenge, when PKCE is enabled.
	pub fn code_challenge(&self) -> Option<&str> {
		self.pkce.as_ref().map(|pkce| pkce.challenge.as_str())
	}

	/// Extracts the authorization artifact from a callback URL.
	///
	/// `state` is verified before anything else is trusted, so a forged redirect cannot end
	/// the flow with a provider error. Checks run in order: mismatched `state`, provider
	/// `error` (which must carry the `state`), missing `code`, missing `state`.
	pub fn capture(&self, callback: &Url) -> Result<AuthorizationArtifact> {
		let mut code = None;
		let mut state = None;
		let mut error = None;
		let mut description = None;

		for (key, value) in callback.query_pairs() {
			match key.as_ref() {
				"code" => code = Some(value.into_owned()),
				"state" => state = Some(value.into_owned()),
				"error" => error = Some(value.into_owned()),
				"error_description" => description = Some(value.into_owned()),
				_ => {},
			}
		}

		if state.as_ref().is_some_and(|state| *state != self.state) {
			return Err(ProtocolError::StateMismatch.into());
		}
		if let Some(error) = error {
			state.ok_or(ProtocolError::MissingState)?;

			return Err(CancellationReason::Provider { error, description }.into());
		}

		let code = code.filter(|value| !value.is_empty()).ok_or(ProtocolError::MissingCode)?;

		state.ok_or(ProtocolError::MissingState)?;

		Ok(AuthorizationArtifact {
			code: TokenSecret::new(code),
			redirect_uri: self.redirect_uri.clone(),
			code_verifier: self.pkce.as_ref().map(|pkce| TokenSecret::new(pkce.verifier.clone())),
		})
	}
}
impl Debug for LoginSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginSession")
			.field("state", &self.state)
			.field("authorize_url", &self.authorize_url)
			.field("redirect_uri", &self.redirect_uri)
			.field("code_challenge", &self.code_challenge())
			.finish()
	}
}

#[derive(Clone)]
struct PkcePair {
	verifier: String,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkcePair {
	fn generate() -> Self {
		let verifier = random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 }
	}
}

fn build_authorize_url(
	config: &WebAuthConfig,
	connection: &ConnectionId,
	parameters: &AuthParameters,
	state: &str,
	pkce: Option<&PkcePair>,
) -> Url {
	let mut url = config.endpoints.authorize.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", &config.client_id);
	pairs.append_pair("redirect_uri", config.redirect_uri.as_str());
	pairs.append_pair("connection", connection);
	pairs.append_pair("scope", parameters.scope().unwrap_or(&config.default_scope));
	pairs.append_pair("state", state);

	if let Some(pkce) = pkce {
		pairs.append_pair("code_challenge", &pkce.challenge);
		pairs.append_pair("code_challenge_method", pkce.method.as_str());
	}

	for (key, value) in parameters.forwardable() {
		if key != "scope" && key != "state" {
			pairs.append_pair(key, value);
		}
	}

	drop(pairs);

	url
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	let digest = Sha256::digest(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(digest)
}
