// self
use crate::{_prelude::*, limit::RateLimitState, obs::Operation};

/// Future returned by [`OperationSpan::instrument`]; the input future itself when tracing
/// is off.
#[cfg(feature = "tracing")]
pub type Traced<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`OperationSpan::instrument`]; the input future itself when tracing
/// is off.
#[cfg(not(feature = "tracing"))]
pub type Traced<F> = F;

/// `exchange_broker.op` span carrying the operation and the call site.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Opens the span for `op` at `stage`.
	pub fn new(op: Operation, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self { span: tracing::info_span!("exchange_broker.op", op = op.as_str(), stage) }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, stage);

			Self {}
		}
	}

	/// Runs `fut` inside the span; the span is re-entered on every poll.
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
}

pub(crate) fn trace_budget_wait(floor: f64, deficit: f64) {
	#[cfg(feature = "tracing")]
	tracing::debug!(floor, deficit, "Rate budget below floor; polling.");
	#[cfg(not(feature = "tracing"))]
	let _ = (floor, deficit);
}

pub(crate) fn trace_budget_exhausted(floor: f64, attempts: u32) {
	#[cfg(feature = "tracing")]
	tracing::warn!(floor, attempts, "Rate budget never cleared the floor.");
	#[cfg(not(feature = "tracing"))]
	let _ = (floor, attempts);
}

pub(crate) fn trace_budget_reconciled(state: &RateLimitState) {
	#[cfg(feature = "tracing")]
	tracing::debug!(
		limit = state.limit,
		remaining = state.remaining,
		reset_at = state.reset_at,
		"Rate budget reconciled from response headers."
	);
	#[cfg(not(feature = "tracing"))]
	let _ = state;
}

pub(crate) fn trace_refill_panicked(e: &tokio::task::JoinError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(error = %e, "Rate budget refill task panicked; refilling stopped.");
	#[cfg(not(feature = "tracing"))]
	let _ = e;
}

pub(crate) fn trace_cursor_miss(symbol: &str, table: &str, replayed: usize) {
	#[cfg(feature = "tracing")]
	tracing::debug!(symbol, table, replayed, "Stream cursor not found; replaying snapshot.");
	#[cfg(not(feature = "tracing"))]
	let _ = (symbol, table, replayed);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn event_helpers_run_with_or_without_tracing() {
		let span = OperationSpan::new(Operation::Throttle, "event_helpers");

		span.instrument(async {
			trace_budget_wait(10., 2.);
			trace_cursor_miss("XBTUSD", "trade", 3);
		})
		.await;
	}

	#[tokio::test]
	async fn instrumented_requests_keep_their_output() {
		let span = OperationSpan::new(Operation::Request, "make_request");
		let body = span.instrument(async { serde_json::json!({ "ordStatus": "New" }) }).await;

		assert_eq!(body["ordStatus"], "New");
	}
}
