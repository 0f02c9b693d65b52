// self
use crate::{
	_prelude::*,
	config::{ClientConfig, Network},
	error::ConfigError,
};

/// Builder for [`ClientConfig`] values.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
	config: ClientConfig,
}
impl ClientConfigBuilder {
	/// Selects the deployment.
	pub fn network(mut self, network: Network) -> Self {
		self.config.network = network;

		self
	}

	/// Overrides the base URL; takes precedence over the network.
	pub fn base_url(mut self, url: Url) -> Self {
		self.config.base_url = Some(url);

		self
	}

	/// Sets the floor used by requests that do not pass one.
	pub fn default_floor(mut self, floor: f64) -> Self {
		self.config.default_floor = floor;

		self
	}

	/// Sets the delay between budget re-checks.
	pub fn poll_interval(mut self, interval: Duration) -> Self {
		self.config.poll_interval = interval;

		self
	}

	/// Sets how many re-checks a throttled call may perform.
	pub fn max_polls(mut self, max_polls: u32) -> Self {
		self.config.max_polls = max_polls;

		self
	}

	/// Sets the delay between refill steps.
	pub fn refill_cadence(mut self, cadence: Duration) -> Self {
		self.config.refill_cadence = cadence;

		self
	}

	/// Sets how many refill steps restore a full budget.
	pub fn refill_window(mut self, window: f64) -> Self {
		self.config.refill_window = window;

		self
	}

	/// Sets how long a request signature stays valid.
	pub fn signature_ttl(mut self, ttl: Duration) -> Self {
		self.config.signature_ttl = ttl;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn build_rejects_non_http_base_urls() {
		let err = ClientConfig::builder()
			.base_url(Url::parse("wss://ws.bitmex.com/realtime").expect("URL should parse."))
			.build()
			.expect_err("WebSocket URLs are not REST roots.");

		assert!(matches!(err, ConfigError::UnsupportedBaseUrl { .. }));
	}

	#[test]
	fn build_rejects_degenerate_throttling() {
		let zero_polls = ClientConfig::builder().max_polls(0).build();
		let zero_window = ClientConfig::builder().refill_window(0.).build();
		let zero_cadence = ClientConfig::builder().refill_cadence(Duration::ZERO).build();

		assert!(matches!(zero_polls, Err(ConfigError::OutOfRange { field: "max_polls" })));
		assert!(matches!(zero_window, Err(ConfigError::OutOfRange { field: "refill_window" })));
		assert!(matches!(zero_cadence, Err(ConfigError::OutOfRange { field: "refill_cadence" })));
	}

	#[test]
	fn build_keeps_overrides() {
		let config = ClientConfig::builder()
			.network(Network::Testnet)
			.default_floor(2.)
			.poll_interval(Duration::from_millis(10))
			.signature_ttl(Duration::from_secs(5))
			.build()
			.expect("Overrides should validate.");

		assert_eq!(config.network, Network::Testnet);
		assert_eq!(config.default_floor, 2.);
		assert_eq!(config.poll_interval, Duration::from_millis(10));
		assert_eq!(config.signature_ttl, Duration::from_secs(5));
	}
}
