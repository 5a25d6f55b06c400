//! Optional observability helpers for strategy flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run every flow inside a span named `idp_webauth.flow` carrying the
//!   `strategy` and `connection` fields plus the delivered `outcome`, with `debug` events
//!   for each state transition.
//! - Enable `metrics` to increment the `idp_webauth_flow_total` counter for every
//!   attempt/success/failure/cancellation, labeled by `strategy` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Login mechanisms implemented behind [`Authenticable`](crate::strategy::Authenticable).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
	/// Browser-hosted login page.
	Web,
	/// Username/password exchange without a surface.
	ResourceOwner,
	/// Host-provided native SDK flow.
	Native,
}
impl StrategyKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StrategyKind::Web => "web",
			StrategyKind::ResourceOwner => "resource_owner",
			StrategyKind::Native => "native",
		}
	}
}
impl Display for StrategyKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// `start` accepted.
	Attempt,
	/// Success callback delivered.
	Success,
	/// Failure callback delivered with a non-cancellation error.
	Failure,
	/// Failure callback delivered with a cancellation error.
	Cancelled,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
			FlowOutcome::Cancelled => "cancelled",
		}
	}

	/// Classifies a terminal result.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => FlowOutcome::Success,
			Err(err) if err.is_cancellation() => FlowOutcome::Cancelled,
			Err(_) => FlowOutcome::Failure,
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
