//! Orchestrator that picks a strategy per connection and drives one login at a time.
//!
//! The orchestrator is the long-lived owner of the [`ApiClient`] and [`WebAuthConfig`];
//! strategies are built fresh for every attempt and dropped once their result arrives.
//! Connections with a registered [`StrategyFactory`] (native SDK bridges, for instance)
//! use it; every other connection falls back to the hosted web page.

// crates.io
use futures::{
	future::{self, Either},
	stream::{self, StreamExt},
};
// self
use crate::{
	_prelude::*,
	api::ApiClient,
	auth::{AuthParameters, ConnectionId, Credentials, TokenSecret},
	config::WebAuthConfig,
	error::CancellationReason,
	present::{Presenter, RedirectStream},
	strategy::{AuthCallbacks, Authenticable, FlowState, ResourceOwnerStrategy, WebAuthStrategy},
};
#[cfg(feature = "reqwest")] use crate::api::ReqwestApiClient;

/// Inputs for building one strategy instance.
#[derive(Clone, Debug)]
pub struct StrategyRequest {
	/// Connection the strategy is bound to.
	pub connection: ConnectionId,
	/// Caller-supplied protocol parameters.
	pub parameters: Option<AuthParameters>,
}

/// Builds a strategy for one attempt.
pub trait StrategyFactory
where
	Self: Send + Sync,
{
	/// Creates an idle strategy that owns `callbacks`.
	fn create(&self, request: StrategyRequest, callbacks: AuthCallbacks) -> Arc<dyn Authenticable>;
}

/// Default factory producing [`WebAuthStrategy`] instances.
#[derive(Clone)]
pub struct WebAuthFactory {
	api: Arc<dyn ApiClient>,
	config: Arc<WebAuthConfig>,
}
impl WebAuthFactory {
	/// Shares the API client and config with every strategy it builds.
	pub fn new(api: Arc<dyn ApiClient>, config: Arc<WebAuthConfig>) -> Self {
		Self { api, config }
	}
}
impl StrategyFactory for WebAuthFactory {
	fn create(&self, request: StrategyRequest, callbacks: AuthCallbacks) -> Arc<dyn Authenticable> {
		Arc::new(WebAuthStrategy::new(
			self.api.clone(),
			self.config.clone(),
			request.connection,
			request.parameters,
			callbacks,
		))
	}
}
impl Debug for WebAuthFactory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("WebAuthFactory").field("config", &self.config).finish()
	}
}

/// Entry point for hosts: one instance per tenant, shared behind `Arc`.
pub struct Authenticator {
	api: Arc<dyn ApiClient>,
	config: Arc<WebAuthConfig>,
	factories: HashMap<ConnectionId, Arc<dyn StrategyFactory>>,
	fallback: Arc<dyn StrategyFactory>,
	active: Mutex<Option<Arc<dyn Authenticable>>>,
	flow_guard: AsyncMutex<()>,
}
impl Authenticator {
	/// Creates an orchestrator whose unregistered connections use the web flow.
	pub fn new(api: Arc<dyn ApiClient>, config: WebAuthConfig) -> Self {
		let config = Arc::new(config);
		let fallback = Arc::new(WebAuthFactory::new(api.clone(), config.clone()));

		Self {
			api,
			config,
			factories: HashMap::new(),
			fallback,
			active: Mutex::new(None),
			flow_guard: AsyncMutex::new(()),
		}
	}

	/// Creates an orchestrator backed by the bundled reqwest token client.
	#[cfg(feature = "reqwest")]
	pub fn from_config(config: WebAuthConfig) -> Self {
		let api = Arc::new(ReqwestApiClient::new(&config));

		Self::new(api, config)
	}

	/// Routes `connection` to `factory`, returning the factory it replaces.
	pub fn register(
		&mut self,
		connection: ConnectionId,
		factory: Arc<dyn StrategyFactory>,
	) -> Option<Arc<dyn StrategyFactory>> {
		self.factories.insert(connection, factory)
	}

	/// Returns `true` when `connection` has a dedicated factory.
	pub fn supports(&self, connection: &str) -> bool {
		self.factories.contains_key(connection)
	}

	/// Shared tenant configuration.
	pub fn config(&self) -> &WebAuthConfig {
		&self.config
	}

	/// State of the flow currently in flight, if any.
	pub fn active_state(&self) -> Option<FlowState> {
		self.active.lock().as_ref().map(|strategy| strategy.state())
	}

	/// Runs one login for `connection` and returns the delivered result.
	///
	/// Concurrent calls queue behind the flow in progress.
	pub async fn authenticate(
		&self,
		connection: ConnectionId,
		parameters: Option<AuthParameters>,
		presenter: Arc<dyn Presenter>,
	) -> Result<Credentials> {
		let factory = self.factories.get(&connection).unwrap_or(&self.fallback).clone();
		let request = StrategyRequest { connection, parameters };

		self.drive(move |callbacks| factory.create(request, callbacks), presenter).await
	}

	/// Runs a resource-owner password login against a database connection.
	pub async fn login_with_password(
		&self,
		connection: ConnectionId,
		username: impl Into<String>,
		password: TokenSecret,
		parameters: Option<AuthParameters>,
	) -> Result<Credentials> {
		let api = self.api.clone();
		let username = username.into();

		self.drive(
			move |callbacks| {
				Arc::new(ResourceOwnerStrategy::new(
					api, connection, username, password, parameters, callbacks,
				))
			},
			Arc::new(Headless),
		)
		.await
	}

	/// Cancels the flow in flight. Returns `false` when nothing was running.
	pub fn cancel(&self) -> bool {
		let active = self.active.lock().clone();

		match active {
			Some(strategy) => {
				strategy.cancel();

				true
			},
			None => false,
		}
	}

	async fn drive<F>(&self, build: F, presenter: Arc<dyn Presenter>) -> Result<Credentials>
	where
		F: FnOnce(AuthCallbacks) -> Arc<dyn Authenticable> + Send,
	{
		let _flow = self.flow_guard.lock().await;
		let (callbacks, receiver) = AuthCallbacks::channel();
		let strategy = build(callbacks);

		*self.active.lock() = Some(strategy.clone());

		let _active = ActiveSlot(&self.active);

		// A delivered result ends the wait even if the strategy keeps its `start` future busy.
		let start = strategy.start(presenter);
		let delivered = match future::select(start, Box::pin(receiver.recv())).await {
			Either::Left((started, delivered)) => {
				started?;

				delivered.await
			},
			Either::Right((delivered, _)) => delivered,
		};

		// A strategy that drops its callbacks without delivering counts as cancelled.
		delivered.unwrap_or_else(|| Err(CancellationReason::Caller.into()))
	}
}
impl Debug for Authenticator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authenticator")
			.field("config", &self.config)
			.field("registered", &self.factories.keys().collect::<Vec<_>>())
			.field("active", &self.active_state())
			.finish()
	}
}

struct ActiveSlot<'a>(&'a Mutex<Option<Arc<dyn Authenticable>>>);
impl Drop for ActiveSlot<'_> {
	fn drop(&mut self) {
		self.0.lock().take();
	}
}

/// Presenter for flows that never show a surface.
struct Headless;
impl Presenter for Headless {
	fn present(&self, _url: Url) -> RedirectStream {
		stream::empty().boxed()
	}

	fn dismiss(&self) {}
}
