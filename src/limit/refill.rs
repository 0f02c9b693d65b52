//! Background task that replenishes the rate budget on a fixed cadence.

// crates.io
use tokio::{
	task::{JoinError, JoinHandle},
	time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
// self
use crate::{_prelude::*, limit::RateLimiter, obs};

/// Lifecycle handle for the refill loop.
///
/// Dropping the handle cancels the loop; [`RefillTask::shutdown`] also waits for it to exit.
#[derive(Debug)]
pub struct RefillTask {
	token: CancellationToken,
	handle: JoinHandle<()>,
}
impl RefillTask {
	/// Spawns the loop on the current Tokio runtime. The first refill happens one cadence
	/// after spawning.
	pub fn spawn(limiter: Arc<RateLimiter>, cadence: Duration) -> Self {
		let token = CancellationToken::new();
		let cancelled = token.clone();
		let handle = tokio::spawn(async move {
			let mut ticker = time::interval_at(Instant::now() + cadence, cadence);

			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

			loop {
				tokio::select! {
					_ = cancelled.cancelled() => break,
					_ = ticker.tick() => limiter.refill(),
				}
			}
		});

		Self { token, handle }
	}

	/// Returns `true` until the loop has exited.
	pub fn is_running(&self) -> bool {
		!self.handle.is_finished()
	}

	/// Cancels the loop and waits for it to exit. A panic inside the loop is reported
	/// through the `tracing` feature rather than propagated.
	pub async fn shutdown(mut self) {
		self.token.cancel();

		if let Err(e) = (&mut self.handle).await {
			report_exit(&e);
		}
	}
}
impl Drop for RefillTask {
	fn drop(&mut self) {
		self.token.cancel();
	}
}

fn report_exit(e: &JoinError) {
	if e.is_panic() {
		obs::trace_refill_panicked(e);
	}
}
