//! Bounded polling schedule used while waiting for budget headroom.

// self
use crate::_prelude::*;

/// Delay between budget checks and the number of checks allowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
	/// Delay before each re-check.
	pub interval: Duration,
	/// Re-checks allowed after the initial one.
	pub max_polls: u32,
}
impl PollPolicy {
	/// Default delay between checks.
	pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(250);
	/// Default number of re-checks (about 100 seconds in total).
	pub const DEFAULT_MAX_POLLS: u32 = 400;

	/// Starts a fresh schedule for one acquisition.
	pub fn schedule(&self) -> PollSchedule {
		PollSchedule { policy: *self, attempts: 0 }
	}

	/// Worst-case time spent waiting before the schedule is exhausted.
	pub fn budget(&self) -> Duration {
		self.interval.saturating_mul(self.max_polls)
	}
}
impl Default for PollPolicy {
	fn default() -> Self {
		Self { interval: Self::DEFAULT_INTERVAL, max_polls: Self::DEFAULT_MAX_POLLS }
	}
}

/// Next move of a [`PollSchedule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollStep {
	/// Sleep for the duration, then check again.
	Wait(Duration),
	/// Retry budget is spent.
	Exhausted {
		/// Number of re-checks performed.
		attempts: u32,
	},
}

/// Retry state machine for one acquisition: attempt count, delay, terminal exhaustion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollSchedule {
	policy: PollPolicy,
	attempts: u32,
}
impl PollSchedule {
	/// Re-checks issued so far.
	pub fn attempts(&self) -> u32 {
		self.attempts
	}

	/// Advances the schedule after a failed check.
	pub fn next_step(&mut self) -> PollStep {
		if self.attempts >= self.policy.max_polls {
			return PollStep::Exhausted { attempts: self.attempts };
		}

		self.attempts += 1;

		PollStep::Wait(self.policy.interval)
	}
}
