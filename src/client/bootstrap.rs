// self
use crate::{
	_prelude::*,
	client::{ExchangeClient, Verb},
	clock::{self, ServerClock},
	http::ExchangeHttpClient,
	limit::RefillTask,
	obs::{self, Operation, OperationOutcome, OperationSpan},
};

/// Floor used by the clock sample; passes on the primed budget of one.
pub const BOOTSTRAP_FLOOR: f64 = -1.;

impl<C> ExchangeClient<C>
where
	C: ?Sized + ExchangeHttpClient,
{
	/// Samples the server clock once, then starts refilling the rate budget.
	///
	/// The sample is a single `GET` on the API root that bypasses throttling. Concurrent
	/// and repeated calls share the first successful sample; the refill task starts only
	/// after it succeeds. Must be called from within a Tokio runtime.
	pub async fn bootstrap(&self) -> Result<ServerClock> {
		let span = OperationSpan::new(Operation::ClockSync, "bootstrap");

		obs::record_operation_outcome(Operation::ClockSync, OperationOutcome::Attempt);

		let result = span
			.instrument(async {
				let clock = self
					.clock
					.sync_with(|| async move {
						let body = self.send(Verb::Get, "", &(), BOOTSTRAP_FLOOR).await?;

						Ok::<_, Error>(clock::parse_server_timestamp(&body)?)
					})
					.await?;

				self.start_refill();

				Ok::<_, Error>(clock)
			})
			.await;

		obs::record_operation_outcome(Operation::ClockSync, OperationOutcome::from(&result));

		result
	}

	/// Stops the refill task and waits for it to exit.
	///
	/// The clock sample is kept; a later [`ExchangeClient::bootstrap`] restarts refilling.
	pub async fn shutdown(&self) {
		let task = self.refill.lock().take();

		if let Some(task) = task {
			task.shutdown().await;
		}
	}

	/// Whether the refill task is running.
	pub fn is_refilling(&self) -> bool {
		self.refill.lock().as_ref().is_some_and(RefillTask::is_running)
	}

	fn start_refill(&self) {
		let mut slot = self.refill.lock();

		if slot.as_ref().is_some_and(RefillTask::is_running) {
			return;
		}

		*slot = Some(RefillTask::spawn(Arc::clone(&self.limiter), self.config.refill_cadence));
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::Duration as TimeDuration;
	// self
	use super::*;
	use crate::{
		auth::{API_EXPIRES_HEADER, ApiCredentials},
		config::ClientConfig,
		http::{HttpFuture, HttpRequest, HttpResponse},
	};

	#[derive(Debug)]
	struct FixedClockHttpClient {
		server_time: OffsetDateTime,
		calls: Mutex<Vec<HttpRequest>>,
	}
	impl ExchangeHttpClient for FixedClockHttpClient {
		type TransportError = std::io::Error;

		fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
			self.calls.lock().push(request);

			let millis = self.server_time.unix_timestamp_nanos() / 1_000_000;
			let body = format!(r#"{{"name":"BitMEX API","timestamp":{millis}}}"#);

			Box::pin(async move {
				Ok(HttpResponse::new(200, body)
					.with_header("x-ratelimit-limit", "60")
					.with_header("x-ratelimit-remaining", "60"))
			})
		}
	}

	fn client(lag: TimeDuration) -> ExchangeClient<FixedClockHttpClient> {
		ExchangeClient::with_http_client(
			ClientConfig::default(),
			FixedClockHttpClient {
				server_time: OffsetDateTime::now_utc() - lag,
				calls: Mutex::new(Vec::new()),
			},
		)
	}

	#[tokio::test]
	async fn bootstrap_samples_once_and_starts_refill() {
		let client = client(TimeDuration::minutes(10));
		let first = client.bootstrap().await.expect("Bootstrap should succeed.");
		let second = client.bootstrap().await.expect("Repeated bootstrap should reuse the sample.");

		assert_eq!(first, second);
		assert_eq!(client.http_client.calls.lock().len(), 1);
		assert!(first.offset() >= TimeDuration::minutes(10));
		assert!(client.server_time() < OffsetDateTime::now_utc() - TimeDuration::minutes(9));
		assert!(client.is_refilling());
		assert_eq!(client.rate_limit().remaining, 60.);

		client.shutdown().await;

		assert!(!client.is_refilling());
	}

	#[tokio::test]
	async fn bootstrap_hits_the_api_root_unthrottled() {
		let client = client(TimeDuration::ZERO);

		assert_eq!(client.rate_limit().remaining, 1.);

		client.bootstrap().await.expect("The primed budget admits the bootstrap call.");

		let calls = client.http_client.calls.lock();

		assert_eq!(calls[0].verb, Verb::Get);
		assert_eq!(calls[0].url.path(), "/api/v1/");
		assert_eq!(calls[0].url.query(), None);
		assert_eq!(calls[0].body, None);

		drop(calls);
		client.shutdown().await;
	}

	#[tokio::test]
	async fn signatures_expire_relative_to_server_time() {
		let lag = TimeDuration::hours(2);
		let client = client(lag).with_credentials(ApiCredentials::new("key", "secret"));

		client.bootstrap().await.expect("Bootstrap should succeed.");
		client.request(Verb::Get, "user/wallet", ()).await.expect("Signed GET should succeed.");

		let expected = (OffsetDateTime::now_utc() - lag).unix_timestamp() + 60;
		let expires = client.http_client.calls.lock()[1]
			.header(API_EXPIRES_HEADER)
			.and_then(|value| value.parse::<i64>().ok())
			.expect("Signed requests carry an expiry.");

		assert!((expected - 2..=expected).contains(&expires));

		client.shutdown().await;
	}
}
