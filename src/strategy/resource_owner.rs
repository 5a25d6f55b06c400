//! Username/password login against a database connection, with no login surface.

// crates.io
use futures::future::{self, Either};
// self
use crate::{
	_prelude::*,
	api::ApiClient,
	auth::{AuthParameters, ConnectionId, TokenSecret},
	present::Presenter,
	strategy::{AuthCallbacks, Authenticable, FlowCore, FlowState, StrategyFuture, StrategyKind},
};

/// Resource-owner password strategy.
///
/// Goes straight from `Idle` to `Exchanging`; the presenter passed to `start` is never used.
pub struct ResourceOwnerStrategy {
	api: Arc<dyn ApiClient>,
	connection: ConnectionId,
	username: String,
	password: TokenSecret,
	parameters: AuthParameters,
	core: FlowCore,
}
impl ResourceOwnerStrategy {
	/// Creates an idle strategy for `username` on `connection`.
	pub fn new(
		api: Arc<dyn ApiClient>,
		connection: ConnectionId,
		username: impl Into<String>,
		password: TokenSecret,
		parameters: Option<AuthParameters>,
		callbacks: AuthCallbacks,
	) -> Self {
		let core = FlowCore::new(StrategyKind::ResourceOwner, &connection, callbacks);

		Self {
			api,
			connection,
			username: username.into(),
			password,
			parameters: parameters.unwrap_or_default(),
			core,
		}
	}

	async fn run(&self) -> Result<()> {
		self.core.begin(FlowState::Exchanging, None)?;

		let settled = self.core.settled();
		let login = self.api.login_with_password(
			&self.connection,
			&self.username,
			&self.password,
			&self.parameters,
		);

		if let Either::Left((result, _)) = future::select(login, settled).await {
			self.core.finish(result.map_err(Error::from));
		}

		Ok(())
	}
}
impl Authenticable for ResourceOwnerStrategy {
	fn kind(&self) -> StrategyKind {
		StrategyKind::ResourceOwner
	}

	fn connection(&self) -> &ConnectionId {
		&self.connection
	}

	fn state(&self) -> FlowState {
		self.core.state()
	}

	fn start(&self, _presenter: Arc<dyn Presenter>) -> StrategyFuture<'_> {
		Box::pin(self.core.instrument(self.run()))
	}

	fn cancel(&self) {
		self.core.cancel();
	}
}
impl Debug for ResourceOwnerStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ResourceOwnerStrategy")
			.field("connection", &self.connection)
			.field("username", &self.username)
			.field("password", &self.password)
			.field("core", &self.core)
			.finish()
	}
}
