//! Server clock estimation from a single bootstrap sample.
//!
//! The offset is sampled once and never recomputed, so drift after bootstrap is accepted.
//! Before a sample exists every reading falls back to local time.

// crates.io
use time::{Duration as TimeDuration, format_description::well_known::Rfc3339};
// self
use crate::{_prelude::*, error::TransportError};

/// Field of the API root response carrying the server time.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Fixed offset between the local clock and the exchange clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServerClock {
	offset: TimeDuration,
}
impl ServerClock {
	/// Derives the offset from a local reading taken after the server produced `server`.
	pub fn from_sample(local: OffsetDateTime, server: OffsetDateTime) -> Self {
		Self { offset: local - server }
	}

	/// Local time minus server time at sampling.
	pub fn offset(&self) -> TimeDuration {
		self.offset
	}

	/// Estimated current server time.
	pub fn now(&self) -> OffsetDateTime {
		self.at(OffsetDateTime::now_utc())
	}

	/// Server time corresponding to the local instant `local`.
	pub fn at(&self, local: OffsetDateTime) -> OffsetDateTime {
		local - self.offset
	}
}

/// Single-flight holder of the bootstrap sample.
#[derive(Debug, Default)]
pub struct ClockSync {
	clock: OnceCell<ServerClock>,
}
impl ClockSync {
	/// Returns the sampled clock, if bootstrap completed.
	pub fn clock(&self) -> Option<ServerClock> {
		self.clock.get().copied()
	}

	/// Estimated server time, or local time before bootstrap.
	pub fn now(&self) -> OffsetDateTime {
		match self.clock.get() {
			Some(clock) => clock.now(),
			None => OffsetDateTime::now_utc(),
		}
	}

	/// Samples the server clock once.
	///
	/// Concurrent callers share one in-flight sample; once it succeeds later calls return
	/// the stored clock without invoking `sample`. A failed sample leaves the holder empty
	/// so the next call tries again.
	pub async fn sync_with<F, Fut>(&self, sample: F) -> Result<ServerClock>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<OffsetDateTime>>,
	{
		self.clock
			.get_or_try_init(|| async move {
				let server = sample().await?;

				Ok::<_, Error>(ServerClock::from_sample(OffsetDateTime::now_utc(), server))
			})
			.await
			.copied()
	}
}

/// Extracts the server time from an API root response.
///
/// Accepts epoch milliseconds or an RFC 3339 string.
pub fn parse_server_timestamp(body: &JsonValue) -> Result<OffsetDateTime, TransportError> {
	let unexpected = |message: &str| TransportError::UnexpectedBody { message: message.into() };

	match body.get(TIMESTAMP_FIELD) {
		Some(JsonValue::Number(number)) => {
			let millis = number
				.as_i64()
				.or_else(|| number.as_f64().map(|value| value as i64))
				.ok_or_else(|| unexpected("`timestamp` is not a finite number"))?;

			OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
				.map_err(|_| unexpected("`timestamp` is out of range"))
		},
		Some(JsonValue::String(text)) => OffsetDateTime::parse(text, &Rfc3339)
			.map_err(|_| unexpected("`timestamp` is not an RFC 3339 string")),
		_ => Err(unexpected("`timestamp` is missing")),
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn offset_is_local_minus_server() {
		let clock = ServerClock::from_sample(
			datetime!(2024-01-01 00:00:05 UTC),
			datetime!(2024-01-01 00:00:00 UTC),
		);

		assert_eq!(clock.offset(), TimeDuration::seconds(5));
		assert_eq!(clock.at(datetime!(2024-01-01 00:01:05 UTC)), datetime!(2024-01-01 00:01:00 UTC));
	}

	#[test]
	fn parses_millis_and_rfc3339() {
		let millis = serde_json::json!({ "name": "BitMEX API", "timestamp": 1_700_000_000_123_i64 });
		let text = serde_json::json!({ "timestamp": "2023-11-14T22:13:20.123Z" });

		assert_eq!(
			parse_server_timestamp(&millis).expect("Millisecond timestamps should parse."),
			datetime!(2023-11-14 22:13:20.123 UTC)
		);
		assert_eq!(
			parse_server_timestamp(&text).expect("RFC 3339 timestamps should parse."),
			datetime!(2023-11-14 22:13:20.123 UTC)
		);
	}

	#[test]
	fn missing_timestamp_is_an_unexpected_body() {
		let err = parse_server_timestamp(&serde_json::json!({ "name": "BitMEX API" }))
			.expect_err("A body without `timestamp` must be rejected.");

		assert!(matches!(err, TransportError::UnexpectedBody { .. }));
	}

	#[tokio::test]
	async fn sync_is_single_flight() {
		let sync = ClockSync::default();
		let counter = AtomicUsize::new(0);
		let samples = &counter;
		let sample = || async move {
			samples.fetch_add(1, Ordering::SeqCst);
			tokio::task::yield_now().await;

			Ok(OffsetDateTime::now_utc() - TimeDuration::seconds(30))
		};
		let (a, b) = tokio::join!(sync.sync_with(sample), sync.sync_with(sample));
		let a = a.expect("First sync should succeed.");
		let b = b.expect("Second sync should share the first sample.");

		assert_eq!(a, b);
		assert_eq!(counter.load(Ordering::SeqCst), 1);
		assert!(a.offset() >= TimeDuration::seconds(30));
		assert!(sync.now() < OffsetDateTime::now_utc() - TimeDuration::seconds(29));
	}

	#[tokio::test]
	async fn failed_sync_can_be_retried() {
		let sync = ClockSync::default();
		let err = sync
			.sync_with(|| async {
				Err(TransportError::UnexpectedBody { message: "boom".into() }.into())
			})
			.await
			.expect_err("A failing sample must surface its error.");

		assert!(matches!(err, Error::Transport(_)));
		assert!(sync.clock().is_none());

		sync.sync_with(|| async { Ok(OffsetDateTime::now_utc()) })
			.await
			.expect("A later sample should succeed.");

		assert!(sync.clock().is_some());
	}
}
