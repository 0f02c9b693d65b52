//! Client-side rate budget: refill, server reconciliation, and the `acquire` gate.
//!
//! The limiter keeps an estimate of how many requests the exchange still permits. Every
//! attempt charges one unit up front, before the outcome is known, so concurrent callers
//! under-spend rather than over-spend. A [`RefillTask`] adds `limit / window` units on a
//! fixed cadence and every response overwrites the counters from its `x-ratelimit-*`
//! headers.

pub mod poll;
pub mod refill;
pub mod state;

pub use poll::*;
pub use refill::*;
pub use state::*;

// self
use crate::{_prelude::*, http::HttpResponse, obs};

/// Number of refill steps it takes to restore a full budget.
pub const DEFAULT_REFILL_WINDOW: f64 = 60.;

/// Result of a non-mutating budget check.
#[derive(Clone, Debug, PartialEq)]
pub enum RateLimitDecision {
	/// The budget exceeds the floor; the request may proceed.
	Allow,
	/// The budget is at or below the floor.
	Delay(RetryDirective),
}

/// Advises callers when to check again after a [`RateLimitDecision::Delay`].
#[derive(Clone, Debug, PartialEq)]
pub struct RetryDirective {
	/// Suggested wait before the next check.
	pub recommended_backoff: Duration,
	/// Units of budget missing before the floor is exceeded.
	pub deficit: f64,
}

/// Shared rate budget guarded by a single lock so the three counters move together.
#[derive(Debug)]
pub struct RateLimiter {
	state: Mutex<RateLimitState>,
	poll: PollPolicy,
	window: f64,
}
impl RateLimiter {
	/// Creates a limiter primed to let exactly one bootstrap request through.
	pub fn new(poll: PollPolicy, window: f64) -> Self {
		Self { state: Mutex::new(RateLimitState::default()), poll, window }
	}

	/// Replaces the current counters.
	pub fn with_state(self, state: RateLimitState) -> Self {
		*self.state.lock() = state;

		self
	}

	/// Returns a copy of the current counters.
	pub fn snapshot(&self) -> RateLimitState {
		*self.state.lock()
	}

	/// Polling policy applied by [`RateLimiter::acquire`].
	pub fn poll_policy(&self) -> PollPolicy {
		self.poll
	}

	/// Overwrites one counter; malformed or sub-one values fall back to the field default.
	pub fn set_rate_limit(&self, field: RateLimitField, value: impl Display) {
		let remaining = {
			let mut state = self.state.lock();

			state.set(field, &value.to_string());

			state.remaining
		};

		obs::record_rate_budget(remaining);
	}

	/// Reconciles every counter from a response, regardless of its status.
	pub fn reconcile(&self, response: &HttpResponse) {
		let state = {
			let mut state = self.state.lock();

			state.reconcile(response);

			*state
		};

		obs::trace_budget_reconciled(&state);
		obs::record_rate_budget(state.remaining);
	}

	/// Applies one refill step.
	pub fn refill(&self) {
		let remaining = {
			let mut state = self.state.lock();

			state.refill(self.window);

			state.remaining
		};

		obs::record_rate_budget(remaining);
	}

	/// Checks whether the budget currently exceeds `floor` without charging it.
	pub fn evaluate(&self, floor: f64) -> RateLimitDecision {
		let remaining = self.state.lock().remaining;

		if remaining > floor {
			RateLimitDecision::Allow
		} else {
			RateLimitDecision::Delay(RetryDirective {
				recommended_backoff: self.poll.interval,
				deficit: floor - remaining,
			})
		}
	}

	/// Charges one attempt, then waits until the budget exceeds `floor`.
	///
	/// `floor` is the minimum budget the caller needs left after its own charge; a negative
	/// floor passes immediately while the budget is non-negative. Fails with
	/// [`Error::ExhaustedRetries`] once the poll policy is spent.
	pub async fn acquire(&self, floor: f64) -> Result<()> {
		let remaining = {
			let mut state = self.state.lock();

			state.consume();

			state.remaining
		};

		obs::record_rate_budget(remaining);

		let mut schedule = self.poll.schedule();

		loop {
			let directive = match self.evaluate(floor) {
				RateLimitDecision::Allow => return Ok(()),
				RateLimitDecision::Delay(directive) => directive,
			};

			match schedule.next_step() {
				PollStep::Wait(delay) => {
					if schedule.attempts() == 1 {
						obs::trace_budget_wait(floor, directive.deficit);
					}

					tokio::time::sleep(delay).await;
				},
				PollStep::Exhausted { attempts } => {
					obs::trace_budget_exhausted(floor, attempts);

					return Err(Error::ExhaustedRetries { attempts, floor });
				},
			}
		}
	}
}
impl Default for RateLimiter {
	fn default() -> Self {
		Self::new(PollPolicy::default(), DEFAULT_REFILL_WINDOW)
	}
}
