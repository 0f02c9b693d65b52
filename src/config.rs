//! Client configuration: target network, throttling knobs, and signature lifetime.
//!
//! [`ClientConfig`] is `serde`-deserializable with per-field defaults so it can be loaded
//! from any source, then checked through [`ClientConfig::validate`] or assembled directly
//! with [`ClientConfig::builder`].

/// Builder API for assembling validated client configurations.
pub mod builder;

pub use builder::*;

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	limit::{DEFAULT_REFILL_WINDOW, PollPolicy},
};

/// Path prefix shared by every REST endpoint.
pub const API_ROOT_PATH: &str = "/api/v1/";
/// Budget callers keep in reserve unless they pass an explicit floor.
pub const DEFAULT_FLOOR: f64 = 10.;
/// Delay between refill steps.
pub const DEFAULT_REFILL_CADENCE: Duration = Duration::from_secs(1);
/// How far into the future signed requests expire.
pub const DEFAULT_SIGNATURE_TTL: Duration = Duration::from_secs(60);

/// Exchange deployment a client talks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Network {
	#[default]
	/// Live trading venue.
	Production,
	/// Paper-trading venue.
	Testnet,
}
impl Network {
	/// Base URL of the deployment.
	pub const fn base_url(self) -> &'static str {
		match self {
			Self::Production => "https://www.bitmex.com",
			Self::Testnet => "https://testnet.bitmex.com",
		}
	}
}

/// Immutable settings consumed by [`ExchangeClient`](crate::client::ExchangeClient).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
	/// Deployment used when no explicit base URL is set.
	pub network: Network,
	/// Explicit base URL overriding [`ClientConfig::network`], e.g. for proxies.
	pub base_url: Option<Url>,
	/// Floor applied by [`ExchangeClient::request`](crate::client::ExchangeClient::request).
	pub default_floor: f64,
	/// Delay between budget re-checks while throttled.
	pub poll_interval: Duration,
	/// Re-checks allowed before a throttled call fails.
	pub max_polls: u32,
	/// Delay between refill steps.
	pub refill_cadence: Duration,
	/// Refill steps needed to restore a full budget.
	pub refill_window: f64,
	/// Lifetime of a request signature.
	pub signature_ttl: Duration,
}
impl ClientConfig {
	/// Creates a builder seeded with the defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Resolves the base URL, preferring the explicit override.
	pub fn resolved_base_url(&self) -> Result<Url, ConfigError> {
		match &self.base_url {
			Some(url) => Ok(url.clone()),
			None => Url::parse(self.network.base_url())
				.map_err(|source| ConfigError::InvalidBaseUrl { source }),
		}
	}

	/// Builds the absolute URL of `endpoint` beneath [`API_ROOT_PATH`].
	pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, ConfigError> {
		let mut url = self.resolved_base_url()?;

		url.set_path(&api_path(endpoint));
		url.set_query(None);
		url.set_fragment(None);

		Ok(url)
	}

	/// Polling policy applied while throttled.
	pub fn poll_policy(&self) -> PollPolicy {
		PollPolicy { interval: self.poll_interval, max_polls: self.max_polls }
	}

	/// Checks the invariants enforced by [`ClientConfigBuilder::build`].
	pub fn validate(&self) -> Result<(), ConfigError> {
		let base = self.resolved_base_url()?;

		if !matches!(base.scheme(), "http" | "https") || base.host_str().is_none() {
			return Err(ConfigError::UnsupportedBaseUrl { url: base.to_string() });
		}
		if !self.default_floor.is_finite() {
			return Err(ConfigError::OutOfRange { field: "default_floor" });
		}
		if self.poll_interval.is_zero() {
			return Err(ConfigError::OutOfRange { field: "poll_interval" });
		}
		if self.max_polls == 0 {
			return Err(ConfigError::OutOfRange { field: "max_polls" });
		}
		if self.refill_cadence.is_zero() {
			return Err(ConfigError::OutOfRange { field: "refill_cadence" });
		}
		if !(self.refill_window.is_finite() && self.refill_window > 0.) {
			return Err(ConfigError::OutOfRange { field: "refill_window" });
		}
		if self.signature_ttl.is_zero() {
			return Err(ConfigError::OutOfRange { field: "signature_ttl" });
		}

		Ok(())
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			network: Network::default(),
			base_url: None,
			default_floor: DEFAULT_FLOOR,
			poll_interval: PollPolicy::DEFAULT_INTERVAL,
			max_polls: PollPolicy::DEFAULT_MAX_POLLS,
			refill_cadence: DEFAULT_REFILL_CADENCE,
			refill_window: DEFAULT_REFILL_WINDOW,
			signature_ttl: DEFAULT_SIGNATURE_TTL,
		}
	}
}

/// Path signed and requested for `endpoint`; a leading `/` is optional.
pub fn api_path(endpoint: &str) -> String {
	format!("{API_ROOT_PATH}{}", endpoint.trim_start_matches('/'))
}
