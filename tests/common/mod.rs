#![allow(dead_code)]

// std
use std::{
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use futures::{StreamExt, channel::oneshot, stream};
// self
use idp_webauth::{
	api::{ApiClient, ApiFuture, AuthorizationArtifact},
	auth::{AuthParameters, ClientId, ConnectionId, Credentials, TokenSecret},
	config::WebAuthConfig,
	error::{ApiError, Error},
	present::{Presenter, RedirectStream},
	strategy::AuthCallbacks,
	url::Url,
};

pub const REDIRECT_URI: &str = "com.example.app://tenant.example.com/ios/callback";

pub fn url(value: &str) -> Url {
	Url::parse(value).expect("URL fixture should parse.")
}

pub fn connection(name: &str) -> ConnectionId {
	ConnectionId::new(name).expect("Connection fixture should be valid.")
}

pub fn test_config() -> WebAuthConfig {
	WebAuthConfig::builder(
		url("https://tenant.example.com"),
		ClientId::new("client-1").expect("Client fixture should be valid."),
	)
	.redirect_uri(url(REDIRECT_URI))
	.build()
	.expect("Config fixture should build.")
}

/// Callback URL as the provider would produce it.
pub fn callback(query: &str) -> Url {
	url(&format!("{REDIRECT_URI}?{query}"))
}

pub fn credentials(access_token: &str) -> Credentials {
	Credentials::builder()
		.access_token(access_token)
		.id_token("header.payload.signature")
		.build()
		.expect("Credentials fixture should build.")
}

type Responder = Box<dyn Fn() -> Result<Credentials, ApiError> + Send + Sync>;

/// Scripted [`ApiClient`] that records what it was asked to redeem.
pub struct StaticApiClient {
	responder: Responder,
	calls: AtomicUsize,
	last_artifact: Mutex<Option<AuthorizationArtifact>>,
	last_username: Mutex<Option<String>>,
	gate: Mutex<Option<oneshot::Receiver<()>>>,
}
impl StaticApiClient {
	pub fn succeeding(access_token: &'static str) -> Self {
		Self::responding(move || Ok(credentials(access_token)))
	}

	pub fn failing(error: fn() -> ApiError) -> Self {
		Self::responding(move || Err(error()))
	}

	fn responding(
		responder: impl 'static + Fn() -> Result<Credentials, ApiError> + Send + Sync,
	) -> Self {
		Self {
			responder: Box::new(responder),
			calls: AtomicUsize::new(0),
			last_artifact: Mutex::new(None),
			last_username: Mutex::new(None),
			gate: Mutex::new(None),
		}
	}

	/// Holds every exchange until the returned sender fires (or is dropped).
	pub fn gated(self) -> (Self, oneshot::Sender<()>) {
		let (tx, rx) = oneshot::channel();

		*self.gate.lock().expect("Gate lock should not be poisoned.") = Some(rx);

		(self, tx)
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn last_artifact(&self) -> Option<AuthorizationArtifact> {
		self.last_artifact.lock().expect("Artifact lock should not be poisoned.").clone()
	}

	pub fn last_username(&self) -> Option<String> {
		self.last_username.lock().expect("Username lock should not be poisoned.").clone()
	}

	async fn respond(&self) -> Result<Credentials, ApiError> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let gate = self.gate.lock().expect("Gate lock should not be poisoned.").take();

		if let Some(gate) = gate {
			let _ = gate.await;
		}

		(self.responder)()
	}
}
impl ApiClient for StaticApiClient {
	fn exchange<'a>(
		&'a self,
		artifact: &'a AuthorizationArtifact,
		_connection: &'a ConnectionId,
		_parameters: &'a AuthParameters,
	) -> ApiFuture<'a, Credentials> {
		Box::pin(async move {
			*self.last_artifact.lock().expect("Artifact lock should not be poisoned.") =
				Some(artifact.clone());

			self.respond().await
		})
	}

	fn login_with_password<'a>(
		&'a self,
		_connection: &'a ConnectionId,
		username: &'a str,
		_password: &'a TokenSecret,
		_parameters: &'a AuthParameters,
	) -> ApiFuture<'a, Credentials> {
		Box::pin(async move {
			*self.last_username.lock().expect("Username lock should not be poisoned.") =
				Some(username.to_owned());

			self.respond().await
		})
	}
}

/// Records every callback invocation.
#[derive(Clone, Default)]
pub struct CallbackRecorder {
	successes: Arc<Mutex<Vec<Credentials>>>,
	failures: Arc<Mutex<Vec<Error>>>,
}
impl CallbackRecorder {
	pub fn callbacks(&self) -> AuthCallbacks {
		let successes = self.successes.clone();
		let failures = self.failures.clone();

		AuthCallbacks::new(
			move |credentials| {
				successes.lock().expect("Recorder lock should not be poisoned.").push(credentials)
			},
			move |err| failures.lock().expect("Recorder lock should not be poisoned.").push(err),
		)
	}

	pub fn successes(&self) -> Vec<Credentials> {
		self.successes.lock().expect("Recorder lock should not be poisoned.").clone()
	}

	pub fn failure_count(&self) -> usize {
		self.failures.lock().expect("Recorder lock should not be poisoned.").len()
	}

	pub fn total(&self) -> usize {
		self.successes().len() + self.failure_count()
	}

	/// Removes and returns the single recorded failure.
	pub fn take_failure(&self) -> Error {
		let mut failures = self.failures.lock().expect("Recorder lock should not be poisoned.");

		assert_eq!(failures.len(), 1, "Exactly one failure should be recorded.");

		failures.remove(0)
	}
}

/// Presenter whose surface closes immediately without reporting anything.
#[derive(Default)]
pub struct VanishingPresenter {
	dismissals: AtomicUsize,
}
impl VanishingPresenter {
	pub fn dismissals(&self) -> usize {
		self.dismissals.load(Ordering::SeqCst)
	}
}
impl Presenter for VanishingPresenter {
	fn present(&self, _url: Url) -> RedirectStream {
		stream::empty().boxed()
	}

	fn dismiss(&self) {
		self.dismissals.fetch_add(1, Ordering::SeqCst);
	}
}

/// Polls `condition` until it holds, failing the test after about two seconds.
pub async fn wait_until(condition: impl Fn() -> bool) {
	for _ in 0..400 {
		if condition() {
			return;
		}

		tokio::time::sleep(Duration::from_millis(5)).await;
	}

	panic!("Condition was not reached in time.");
}

#[cfg(feature = "reqwest")]
pub mod http {
	// crates.io
	use httpmock::MockServer;
	// self
	use super::{REDIRECT_URI, url};
	use idp_webauth::{
		api::{OAuth2ApiClient, ReqwestApiClient, ReqwestErrorMapper},
		auth::ClientId,
		config::WebAuthConfig,
		http::ReqwestTransport,
		reqwest::Client,
	};

	/// Config whose endpoints point at the mock server.
	pub fn mock_config(server: &MockServer) -> WebAuthConfig {
		WebAuthConfig::builder(
			url(&server.url("/")),
			ClientId::new("client-it").expect("Client fixture should be valid."),
		)
		.redirect_uri(url(REDIRECT_URI))
		.build()
		.expect("Mock config should build.")
	}

	/// API client that accepts the self-signed certificates produced by `httpmock`.
	pub fn mock_api_client(config: &WebAuthConfig) -> ReqwestApiClient {
		let client = Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		OAuth2ApiClient::with_transport(
			config,
			ReqwestTransport::with_client(client),
			ReqwestErrorMapper,
		)
	}
}
