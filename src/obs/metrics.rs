// self
use crate::obs::{Operation, OperationOutcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_operation_outcome(op: Operation, outcome: OperationOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"exchange_broker_op_total",
			"op" => op.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (op, outcome);
	}
}

/// Publishes the limiter's current budget estimate (when enabled).
pub fn record_rate_budget(remaining: f64) {
	#[cfg(feature = "metrics")]
	{
		metrics::gauge!("exchange_broker_rate_limit_remaining").set(remaining);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = remaining;
	}
}
