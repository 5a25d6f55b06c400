// self
use crate::obs::{FlowOutcome, StrategyKind};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: StrategyKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"idp_webauth_flow_total",
			"strategy" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_flow_outcome_without_recorder_is_silent() {
		record_flow_outcome(StrategyKind::Native, FlowOutcome::Cancelled);
	}
}
