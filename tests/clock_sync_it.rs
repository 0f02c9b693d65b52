// crates.io
use httpmock::prelude::*;
use time::Duration as TimeDuration;
// self
use exchange_broker::{_preludet::*, limit::RateLimitState};

fn root_body(server_time: OffsetDateTime) -> String {
	let millis = server_time.unix_timestamp_nanos() / 1_000_000;

	format!(r#"{{"name":"BitMEX API","version":"1.2.0","timestamp":{millis}}}"#)
}

#[tokio::test]
async fn bootstrap_samples_the_api_root_once() {
	let server = MockServer::start_async().await;
	let client = build_signed_test_client(&server.base_url());
	let server_time = OffsetDateTime::now_utc() - TimeDuration::hours(1);
	let body = root_body(server_time);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/").header("api-key", TEST_API_KEY);
			then.status(200)
				.header("x-ratelimit-limit", "120")
				.header("x-ratelimit-remaining", "119")
				.header("x-ratelimit-reset", "1700000000")
				.body(body);
		})
		.await;
	let (first, second) = tokio::join!(client.bootstrap(), client.bootstrap());
	let first = first.expect("Bootstrap should succeed.");
	let second = second.expect("Concurrent bootstrap should share the sample.");

	mock.assert_calls_async(1).await;

	assert_eq!(first, second);
	assert!(first.offset() >= TimeDuration::hours(1));
	assert!(first.offset() < TimeDuration::hours(1) + TimeDuration::seconds(30));
	assert!(client.server_time() < OffsetDateTime::now_utc() - TimeDuration::minutes(59));
	assert_eq!(
		client.rate_limit(),
		RateLimitState { limit: 120., remaining: 119., reset_at: 1_700_000_000 }
	);
	assert!(client.is_refilling());

	client.shutdown().await;

	assert!(!client.is_refilling());
}

#[tokio::test]
async fn failed_bootstrap_leaves_the_clock_unsynced() {
	let server = MockServer::start_async().await;
	let client = build_reqwest_test_client(&server.base_url());
	let mut mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/");
			then.status(200).body(r#"{"name":"BitMEX API"}"#);
		})
		.await;
	let err = client.bootstrap().await.expect_err("A root body without `timestamp` is rejected.");

	assert!(matches!(err, Error::Transport(_)));
	assert!(client.server_clock().is_none());
	assert!(!client.is_refilling());

	mock.delete_async().await;
	mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/");
			then.status(200)
				.header("x-ratelimit-remaining", "30")
				.body(root_body(OffsetDateTime::now_utc()));
		})
		.await;

	client.bootstrap().await.expect("A later bootstrap should succeed.");
	mock.assert_async().await;

	assert!(client.server_clock().is_some());

	client.shutdown().await;
}
