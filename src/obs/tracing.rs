// self
use crate::{
	_prelude::*,
	obs::{FlowOutcome, StrategyKind},
	strategy::FlowState,
};

/// Future returned by [`FlowSpan::instrument`]; plain `F` without the `tracing` feature.
#[cfg(feature = "tracing")]
pub type Traced<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`]; plain `F` without the `tracing` feature.
#[cfg(not(feature = "tracing"))]
pub type Traced<F> = F;

/// `idp_webauth.flow` span covering one `start` call.
///
/// Carries `strategy` and `connection` from creation; `outcome` is filled in once the flow
/// delivers its result.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens the span for one attempt against `connection`.
	pub fn new(kind: StrategyKind, connection: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self {
				span: tracing::info_span!(
					"idp_webauth.flow",
					strategy = kind.as_str(),
					connection,
					outcome = tracing::field::Empty,
				),
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, connection);

			Self {}
		}
	}

	/// Runs `fut` inside the span.
	pub fn instrument<Fut>(&self, fut: Fut) -> Traced<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			tracing::Instrument::instrument(fut, self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Stamps the delivered outcome onto the span.
	pub fn record_outcome(&self, outcome: FlowOutcome) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", outcome.as_str());
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = outcome;
		}
	}
}

/// Logs a state change at `debug` (no-op without the `tracing` feature).
pub fn record_transition(kind: StrategyKind, from: FlowState, to: FlowState) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(strategy = kind.as_str(), ?from, ?to, "flow transition");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, from, to);
	}
}
