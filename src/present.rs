//! Presentation seam: the surface that renders the hosted login page.
//!
//! The crate never draws anything. A host implements [`Presenter`] on top of its web view
//! (or a system browser plus a loopback listener) and reports navigation back as a stream
//! of [`RedirectEvent`]s. [`ChannelPresenter`] is a ready-made bridge for hosts whose
//! navigation callbacks arrive on another thread or event loop.

// crates.io
use futures::{
	StreamExt,
	channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
	stream::{self, BoxStream},
};
// self
use crate::_prelude::*;

/// Stream of navigation events produced while the login page is shown.
pub type RedirectStream = BoxStream<'static, RedirectEvent>;

/// Navigation outcome observed by the presentation surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RedirectEvent {
	/// The surface navigated to `url` (possibly the configured callback).
	Redirect(Url),
	/// The user closed the surface.
	Dismissed,
	/// The surface failed to load a page.
	Failed {
		/// Host-supplied failure description.
		message: String,
	},
}

/// Renders a login URL and reports navigation until dismissed.
pub trait Presenter
where
	Self: Send + Sync,
{
	/// Shows `url` and returns the navigation events it produces.
	///
	/// The stream ends when the surface goes away; an ended stream without a callback
	/// redirect is treated as a user dismissal.
	fn present(&self, url: Url) -> RedirectStream;

	/// Tears the surface down. Must be idempotent.
	fn dismiss(&self);
}

/// [`Presenter`] backed by an unbounded channel.
///
/// The paired [`RedirectSender`] is handed to whatever observes navigation (web view
/// delegate, loopback HTTP listener, test harness). Events sent before `present` is called
/// are buffered.
#[derive(Clone, Debug)]
pub struct ChannelPresenter {
	inner: Arc<Mutex<ChannelState>>,
}
impl ChannelPresenter {
	/// Creates a presenter and the sender that feeds it.
	pub fn new() -> (Self, RedirectSender) {
		let (tx, rx) = mpsc::unbounded();
		let state =
			ChannelState { closer: tx.clone(), events: Some(rx), presented: Vec::new(), dismissals: 0 };

		(Self { inner: Arc::new(Mutex::new(state)) }, RedirectSender(tx))
	}

	/// URLs passed to [`Presenter::present`], in call order.
	pub fn presented(&self) -> Vec<Url> {
		self.inner.lock().presented.clone()
	}

	/// Number of [`Presenter::dismiss`] calls observed.
	pub fn dismissals(&self) -> usize {
		self.inner.lock().dismissals
	}
}
impl Presenter for ChannelPresenter {
	fn present(&self, url: Url) -> RedirectStream {
		let mut state = self.inner.lock();

		state.presented.push(url);

		match state.events.take() {
			Some(rx) => rx.boxed(),
			// The channel is single-use; a second presentation sees an already-closed surface.
			None => stream::empty().boxed(),
		}
	}

	fn dismiss(&self) {
		let mut state = self.inner.lock();

		state.dismissals += 1;
		state.closer.close_channel();
	}
}

#[derive(Debug)]
struct ChannelState {
	closer: UnboundedSender<RedirectEvent>,
	events: Option<UnboundedReceiver<RedirectEvent>>,
	presented: Vec<Url>,
	dismissals: usize,
}

/// Host-side handle that reports navigation to a [`ChannelPresenter`].
#[derive(Clone, Debug)]
pub struct RedirectSender(UnboundedSender<RedirectEvent>);
impl RedirectSender {
	/// Sends a raw event. Returns `false` once the surface has been dismissed.
	pub fn send(&self, event: RedirectEvent) -> bool {
		self.0.unbounded_send(event).is_ok()
	}

	/// Reports a navigation to `url`.
	pub fn redirect(&self, url: Url) -> bool {
		self.send(RedirectEvent::Redirect(url))
	}

	/// Reports that the user closed the surface.
	pub fn dismissed(&self) -> bool {
		self.send(RedirectEvent::Dismissed)
	}

	/// Reports a page load failure.
	pub fn failed(&self, message: impl Into<String>) -> bool {
		self.send(RedirectEvent::Failed { message: message.into() })
	}
}
