//! Browser-hosted login: present the authorize page, capture the callback, exchange the code.

mod session;

pub use session::*;

// crates.io
use futures::{
	StreamExt,
	future::{self, Either},
};
// self
use crate::{
	_prelude::*,
	api::ApiClient,
	auth::{AuthParameters, ConnectionId},
	config::WebAuthConfig,
	error::CancellationReason,
	present::{Presenter, RedirectEvent},
	strategy::{AuthCallbacks, Authenticable, FlowCore, FlowState, StrategyFuture, StrategyKind},
};

/// Web-view strategy for one connection and one attempt.
///
/// `Idle → Presenting → Exchanging → Succeeded | Failed`; dismissal, provider errors and
/// cancellation jump straight to `Failed`. The API client and config are shared with the
/// orchestrator and outlive the strategy.
pub struct WebAuthStrategy {
	api: Arc<dyn ApiClient>,
	config: Arc<WebAuthConfig>,
	connection: ConnectionId,
	parameters: AuthParameters,
	core: FlowCore,
}
impl WebAuthStrategy {
	/// Creates an idle strategy. `None` parameters behave like an empty set.
	pub fn new(
		api: Arc<dyn ApiClient>,
		config: Arc<WebAuthConfig>,
		connection: ConnectionId,
		parameters: Option<AuthParameters>,
		callbacks: AuthCallbacks,
	) -> Self {
		let core = FlowCore::new(StrategyKind::Web, &connection, callbacks);

		Self {
			api,
			config,
			connection,
			parameters: parameters.unwrap_or_default(),
			core,
		}
	}

	/// Parameters forwarded with the authorize request.
	pub fn parameters(&self) -> &AuthParameters {
		&self.parameters
	}

	async fn run(&self, presenter: Arc<dyn Presenter>) -> Result<()> {
		let session = LoginSession::new(&self.config, &self.connection, &self.parameters);

		self.core.begin(FlowState::Presenting, Some(presenter.clone()))?;

		if self.core.state() != FlowState::Presenting {
			return Ok(());
		}

		let mut settled = self.core.settled();
		let mut events = presenter.present(session.authorize_url.clone());

		// A cancel that landed while the surface was coming up dismissed nothing visible.
		if self.core.state() != FlowState::Presenting {
			presenter.dismiss();

			return Ok(());
		}

		let artifact = loop {
			let event = match future::select(events.next(), &mut settled).await {
				Either::Left((event, _)) => event,
				Either::Right(_) => return Ok(()),
			};

			// Cancelled while the surface was up; the result is already delivered.
			if self.core.state() != FlowState::Presenting {
				return Ok(());
			}

			let url = match event {
				Some(RedirectEvent::Redirect(url)) => url,
				Some(RedirectEvent::Dismissed) | None => {
					self.core.finish(Err(CancellationReason::UserDismissed.into()));

					return Ok(());
				},
				Some(RedirectEvent::Failed { message }) => {
					self.core.finish(Err(Error::Presentation { message }));

					return Ok(());
				},
			};

			if !self.config.is_callback(&url) {
				continue;
			}

			match session.capture(&url) {
				Ok(artifact) => break artifact,
				Err(err) => {
					self.core.finish(Err(err));

					return Ok(());
				},
			}
		};

		drop(events);

		if !self.core.advance(FlowState::Presenting, FlowState::Exchanging) {
			return Ok(());
		}

		let exchange = self.api.exchange(&artifact, &self.connection, &self.parameters);

		// Losing to `settled` drops the pending exchange; its late result is never observed.
		if let Either::Left((result, _)) = future::select(exchange, settled).await {
			self.core.finish(result.map_err(Error::from));
		}

		Ok(())
	}
}
impl Authenticable for WebAuthStrategy {
	fn kind(&self) -> StrategyKind {
		StrategyKind::Web
	}

	fn connection(&self) -> &ConnectionId {
		&self.connection
	}

	fn state(&self) -> FlowState {
		self.core.state()
	}

	fn start(&self, presenter: Arc<dyn Presenter>) -> StrategyFuture<'_> {
		Box::pin(self.core.instrument(self.run(presenter)))
	}

	fn cancel(&self) {
		self.core.cancel();
	}
}
impl Debug for WebAuthStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("WebAuthStrategy")
			.field("connection", &self.connection)
			.field("parameters", &self.parameters)
			.field("core", &self.core)
			.finish()
	}
}
