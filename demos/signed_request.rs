//! Bootstraps the server clock against a mock exchange, then sends a signed order and
//! prints the budget reconciled from the response headers.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use exchange_broker::{
	auth::ApiCredentials,
	client::{ReqwestExchangeClient, Verb},
	config::ClientConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let root_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/");
			then.status(200)
				.header("x-ratelimit-limit", "60")
				.header("x-ratelimit-remaining", "59")
				.body(r#"{"name":"BitMEX API","timestamp":1700000000000}"#);
		})
		.await;
	let order_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/order").header_exists("api-signature");
			then.status(200)
				.header("x-ratelimit-limit", "60")
				.header("x-ratelimit-remaining", "58")
				.body(r#"{"orderID":"demo-order","ordStatus":"New"}"#);
		})
		.await;
	let config = ClientConfig::builder().base_url(Url::parse(&server.base_url())?).build()?;
	let client = ReqwestExchangeClient::new(config)
		.with_credentials(ApiCredentials::new("demo-key", "demo-secret"));
	let clock = client.bootstrap().await?;

	println!("Server clock offset: {}.", clock.offset());

	let order = client
		.request(
			Verb::Post,
			"order",
			serde_json::json!({ "symbol": "XBTUSD", "orderQty": 1, "price": 590 }),
		)
		.await?;

	println!("Order {} is {}.", order["orderID"], order["ordStatus"]);
	println!("Budget after the call: {:?}.", client.rate_limit());

	root_mock.assert_async().await;
	order_mock.assert_async().await;
	client.shutdown().await;

	Ok(())
}
