//! The authentication capability shared by every login mechanism.
//!
//! An orchestrator holds strategies as `Arc<dyn Authenticable>` and drives them the same
//! way regardless of mechanism: build one per attempt with its [`AuthCallbacks`], call
//! [`Authenticable::start`], optionally [`Authenticable::cancel`]. Each strategy delivers
//! exactly one terminal result.
//!
//! Exactly-once delivery is structural. The callbacks are `FnOnce` closures handed over by
//! value at construction and parked in a single slot inside [`FlowCore`]; whichever path
//! reaches the slot first (redirect handling, exchange completion, cancellation) takes the
//! closures out and every later path finds the slot empty.

pub mod resource_owner;
pub mod web;

pub use resource_owner::ResourceOwnerStrategy;
pub use web::WebAuthStrategy;

pub use crate::obs::StrategyKind;

// crates.io
use futures::channel::oneshot;
// self
use crate::{
	_prelude::*,
	auth::{ConnectionId, Credentials},
	error::{CancellationReason, UsageError},
	obs::{self, FlowOutcome, FlowSpan, Traced},
	present::Presenter,
};

/// Terminal result of one flow.
pub type AuthResult = Result<Credentials>;

/// Boxed future returned by [`Authenticable::start`].
pub type StrategyFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a + Send>>;

/// Uniform contract implemented by every login mechanism.
pub trait Authenticable
where
	Self: Send + Sync,
{
	/// Mechanism label used for logs and metrics.
	fn kind(&self) -> StrategyKind;

	/// Connection this instance is bound to.
	fn connection(&self) -> &ConnectionId;

	/// Current lifecycle state.
	fn state(&self) -> FlowState;

	/// Runs the flow to its terminal state.
	///
	/// Resolves to `Ok(())` once a callback has fired, including the failure callback fired
	/// by [`Authenticable::cancel`]; pending presentation or exchange work is abandoned at
	/// that point. Resolves to `Err(Error::Usage(..))` without touching the presenter or the
	/// callbacks when the instance was already started.
	fn start(&self, presenter: Arc<dyn Presenter>) -> StrategyFuture<'_>;

	/// Requests early termination.
	///
	/// In flight, this fires the failure callback with
	/// [`CancellationReason::Caller`] and dismisses the surface. Before `start` or after
	/// completion it does nothing.
	fn cancel(&self);
}

/// Lifecycle of a strategy instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowState {
	/// Constructed, not started.
	Idle,
	/// Login surface shown, waiting for the user or a redirect.
	Presenting,
	/// Artifact captured, waiting for the API client.
	Exchanging,
	/// Success callback delivered.
	Succeeded,
	/// Failure callback delivered.
	Failed,
}
impl FlowState {
	/// Returns `true` for [`FlowState::Succeeded`] and [`FlowState::Failed`].
	pub const fn is_terminal(self) -> bool {
		matches!(self, FlowState::Succeeded | FlowState::Failed)
	}

	/// Returns `true` while a flow is in flight.
	pub const fn is_active(self) -> bool {
		matches!(self, FlowState::Presenting | FlowState::Exchanging)
	}
}

type SuccessFn = Box<dyn FnOnce(Credentials) + Send>;
type FailureFn = Box<dyn FnOnce(Error) + Send>;

/// Success and failure callbacks, consumed by exactly one delivery.
pub struct AuthCallbacks {
	on_success: SuccessFn,
	on_failure: FailureFn,
}
impl AuthCallbacks {
	/// Bundles a success and a failure callback.
	pub fn new(
		on_success: impl 'static + FnOnce(Credentials) + Send,
		on_failure: impl 'static + FnOnce(Error) + Send,
	) -> Self {
		Self { on_success: Box::new(on_success), on_failure: Box::new(on_failure) }
	}

	/// Callbacks that forward the result into a single-use channel.
	pub fn channel() -> (Self, AuthReceiver) {
		let (tx, rx) = oneshot::channel::<AuthResult>();
		let tx = Arc::new(Mutex::new(Some(tx)));
		let failure_tx = tx.clone();
		let callbacks = Self::new(
			move |credentials| {
				if let Some(tx) = tx.lock().take() {
					let _ = tx.send(Ok(credentials));
				}
			},
			move |err| {
				if let Some(tx) = failure_tx.lock().take() {
					let _ = tx.send(Err(err));
				}
			},
		);

		(callbacks, AuthReceiver(rx))
	}

	/// Invokes the callback matching `result`.
	pub fn deliver(self, result: AuthResult) {
		match result {
			Ok(credentials) => (self.on_success)(credentials),
			Err(err) => (self.on_failure)(err),
		}
	}
}
impl Debug for AuthCallbacks {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("AuthCallbacks(..)")
	}
}

/// Receiving half of [`AuthCallbacks::channel`].
#[derive(Debug)]
pub struct AuthReceiver(oneshot::Receiver<AuthResult>);
impl AuthReceiver {
	/// Waits for the result; `None` if the strategy was dropped without delivering.
	pub async fn recv(self) -> Option<AuthResult> {
		self.0.await.ok()
	}

	/// Returns the result if it has already been delivered.
	pub fn try_recv(&mut self) -> Option<AuthResult> {
		self.0.try_recv().ok().flatten()
	}
}

/// State machine and callback slot shared by the bundled strategies.
///
/// Every transition happens under one lock; callbacks and `dismiss` run after the lock is
/// released so they may re-enter the strategy (e.g. call `cancel`) safely. Work that must
/// stop once the flow settles races against [`FlowCore::settled`].
pub struct FlowCore {
	kind: StrategyKind,
	span: FlowSpan,
	inner: Mutex<CoreState>,
}
impl FlowCore {
	/// Creates an idle core for one attempt against `connection`, owning `callbacks`.
	pub fn new(kind: StrategyKind, connection: &ConnectionId, callbacks: AuthCallbacks) -> Self {
		Self {
			kind,
			span: FlowSpan::new(kind, connection),
			inner: Mutex::new(CoreState {
				state: FlowState::Idle,
				callbacks: Some(callbacks),
				presenter: None,
				watchers: Vec::new(),
			}),
		}
	}

	/// Current lifecycle state.
	pub fn state(&self) -> FlowState {
		self.inner.lock().state
	}

	/// Runs `fut` inside this attempt's span.
	pub fn instrument<Fut>(&self, fut: Fut) -> Traced<Fut>
	where
		Fut: Future,
	{
		self.span.instrument(fut)
	}

	/// Resolves once a terminal result has been delivered, whichever path delivered it.
	pub fn settled(&self) -> oneshot::Receiver<()> {
		let (tx, rx) = oneshot::channel();
		let mut inner = self.inner.lock();

		if inner.state.is_terminal() {
			let _ = tx.send(());
		} else {
			inner.watchers.push(tx);
		}

		rx
	}

	/// Moves `Idle` to `next`, remembering the presenter to dismiss later.
	pub fn begin(
		&self,
		next: FlowState,
		presenter: Option<Arc<dyn Presenter>>,
	) -> Result<(), UsageError> {
		{
			let mut inner = self.inner.lock();

			match inner.state {
				FlowState::Idle => {},
				state if state.is_terminal() => return Err(UsageError::AlreadyCompleted),
				_ => return Err(UsageError::AlreadyStarted),
			}

			inner.state = next;
			inner.presenter = presenter;
		}

		obs::record_transition(self.kind, FlowState::Idle, next);
		obs::record_flow_outcome(self.kind, FlowOutcome::Attempt);

		Ok(())
	}

	/// Moves `from` to `to`; returns `false` if the flow already left `from`.
	///
	/// Leaving [`FlowState::Presenting`] dismisses the surface.
	pub fn advance(&self, from: FlowState, to: FlowState) -> bool {
		let presenter = {
			let mut inner = self.inner.lock();

			if inner.state != from {
				return false;
			}

			inner.state = to;

			if from == FlowState::Presenting { inner.presenter.take() } else { None }
		};

		obs::record_transition(self.kind, from, to);

		if let Some(presenter) = presenter {
			presenter.dismiss();
		}

		true
	}

	/// Delivers `result` if no terminal result was delivered yet.
	///
	/// Returns `false` when another path already completed the flow; `result` is then
	/// dropped.
	pub fn finish(&self, result: AuthResult) -> bool {
		let to = if result.is_ok() { FlowState::Succeeded } else { FlowState::Failed };
		let (from, callbacks, presenter, watchers) = {
			let mut inner = self.inner.lock();

			if !inner.state.is_active() {
				return false;
			}

			let Some(callbacks) = inner.callbacks.take() else {
				return false;
			};
			let from = inner.state;

			inner.state = to;

			(from, callbacks, inner.presenter.take(), std::mem::take(&mut inner.watchers))
		};

		obs::record_transition(self.kind, from, to);
		let outcome = FlowOutcome::of(&result);

		obs::record_flow_outcome(self.kind, outcome);
		self.span.record_outcome(outcome);

		if let Some(presenter) = presenter {
			presenter.dismiss();
		}

		callbacks.deliver(result);

		for watcher in watchers {
			let _ = watcher.send(());
		}

		true
	}

	/// Cancels an in-flight flow; no-op when idle or terminal.
	pub fn cancel(&self) -> bool {
		self.finish(Err(CancellationReason::Caller.into()))
	}
}
impl Debug for FlowCore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FlowCore").field("kind", &self.kind).field("state", &self.state()).finish()
	}
}

struct CoreState {
	state: FlowState,
	callbacks: Option<AuthCallbacks>,
	presenter: Option<Arc<dyn Presenter>>,
	watchers: Vec<oneshot::Sender<()>>,
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::present::ChannelPresenter;

	fn counting_callbacks() -> (AuthCallbacks, Arc<AtomicUsize>, Arc<AtomicUsize>) {
		let successes = Arc::new(AtomicUsize::new(0));
		let failures = Arc::new(AtomicUsize::new(0));
		let (s, f) = (successes.clone(), failures.clone());
		let callbacks = AuthCallbacks::new(
			move |_| {
				s.fetch_add(1, Ordering::SeqCst);
			},
			move |_| {
				f.fetch_add(1, Ordering::SeqCst);
			},
		);

		(callbacks, successes, failures)
	}

	fn connection() -> ConnectionId {
		ConnectionId::new("google-oauth2").expect("Connection fixture should be valid.")
	}

	fn credentials() -> Credentials {
		Credentials::builder().access_token("abc").build().expect("Credentials should build.")
	}

	#[test]
	fn cancel_is_a_noop_when_idle_or_terminal() {
		let (callbacks, successes, failures) = counting_callbacks();
		let core = FlowCore::new(StrategyKind::Web, &connection(), callbacks);

		assert!(!core.cancel());
		assert_eq!(core.state(), FlowState::Idle);

		core.begin(FlowState::Exchanging, None).expect("Idle core should start.");

		assert!(core.finish(Ok(credentials())));
		assert!(!core.cancel());
		assert_eq!(core.state(), FlowState::Succeeded);
		assert_eq!(successes.load(Ordering::SeqCst), 1);
		assert_eq!(failures.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn first_completion_wins() {
		let (callbacks, successes, failures) = counting_callbacks();
		let core = FlowCore::new(StrategyKind::ResourceOwner, &connection(), callbacks);

		core.begin(FlowState::Exchanging, None).expect("Idle core should start.");

		assert!(core.cancel());
		assert!(!core.finish(Ok(credentials())));
		assert_eq!(core.state(), FlowState::Failed);
		assert_eq!(successes.load(Ordering::SeqCst), 0);
		assert_eq!(failures.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn begin_rejects_restarts() {
		let (callbacks, _, failures) = counting_callbacks();
		let core = FlowCore::new(StrategyKind::Web, &connection(), callbacks);

		core.begin(FlowState::Presenting, None).expect("Idle core should start.");

		assert_eq!(core.begin(FlowState::Presenting, None), Err(UsageError::AlreadyStarted));

		core.cancel();

		assert_eq!(core.begin(FlowState::Presenting, None), Err(UsageError::AlreadyCompleted));
		assert_eq!(failures.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn leaving_presentation_dismisses_once() {
		let (callbacks, ..) = counting_callbacks();
		let core = FlowCore::new(StrategyKind::Web, &connection(), callbacks);
		let (presenter, _sender) = ChannelPresenter::new();

		core.begin(FlowState::Presenting, Some(Arc::new(presenter.clone())))
			.expect("Idle core should start.");

		assert!(core.advance(FlowState::Presenting, FlowState::Exchanging));
		assert!(!core.advance(FlowState::Presenting, FlowState::Exchanging));
		assert!(core.finish(Ok(credentials())));
		assert_eq!(presenter.dismissals(), 1);
	}

	#[tokio::test]
	async fn settled_fires_on_cancel_and_after_the_fact() {
		let (callbacks, ..) = counting_callbacks();
		let core = FlowCore::new(StrategyKind::Web, &connection(), callbacks);
		let mut pending = core.settled();

		core.begin(FlowState::Exchanging, None).expect("Idle core should start.");

		assert_eq!(pending.try_recv(), Ok(None));
		assert!(core.cancel());
		assert_eq!(pending.await, Ok(()));
		assert_eq!(core.settled().await, Ok(()));
	}

	#[tokio::test]
	async fn channel_callbacks_deliver_once() {
		let (callbacks, receiver) = AuthCallbacks::channel();

		callbacks.deliver(Err(CancellationReason::UserDismissed.into()));

		let result = receiver.recv().await.expect("Channel should carry the delivered result.");

		assert!(matches!(result, Err(Error::Cancelled(CancellationReason::UserDismissed))));
	}

	#[tokio::test]
	async fn dropped_callbacks_close_the_channel() {
		let (callbacks, mut receiver) = AuthCallbacks::channel();

		assert!(receiver.try_recv().is_none());

		drop(callbacks);

		assert!(receiver.recv().await.is_none());
	}
}
