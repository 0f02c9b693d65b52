//! Exchange client facade: rate budget, clock, signer, and transport in one handle.

pub mod request;

mod bootstrap;
mod pipeline;

pub use request::*;

// self
use crate::{
	_prelude::*,
	auth::{ApiCredentials, RequestSigner},
	clock::{ClockSync, ServerClock},
	config::ClientConfig,
	error::ConfigError,
	http::ExchangeHttpClient,
	limit::{RateLimitField, RateLimitState, RateLimiter, RefillTask},
	obs::{self, Operation, OperationOutcome, OperationSpan},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestExchangeClient = ExchangeClient<ReqwestHttpClient>;

/// HTTP verbs accepted by the request pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
	/// Read-style request; the payload travels in the query string.
	Get,
	/// Create.
	Post,
	/// Amend.
	Put,
	/// Cancel or remove.
	Delete,
}
impl Verb {
	/// Upper-case wire name, as signed.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Delete => "DELETE",
		}
	}

	/// Whether the payload is encoded as a query string instead of a body.
	pub const fn is_read(self) -> bool {
		matches!(self, Self::Get)
	}

	#[cfg(feature = "reqwest")]
	pub(crate) fn method(self) -> reqwest::Method {
		match self {
			Self::Get => reqwest::Method::GET,
			Self::Post => reqwest::Method::POST,
			Self::Put => reqwest::Method::PUT,
			Self::Delete => reqwest::Method::DELETE,
		}
	}
}
impl Display for Verb {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Verb {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		[Self::Get, Self::Post, Self::Put, Self::Delete]
			.into_iter()
			.find(|verb| verb.as_str().eq_ignore_ascii_case(s))
			.ok_or_else(|| ConfigError::UnsupportedVerb { verb: s.to_owned() })
	}
}

/// Client-side broker for one exchange account.
///
/// Every REST call charges the shared [`RateLimiter`] before it is sent and reconciles it
/// from the response headers afterwards. Signed clients authenticate each call with a
/// signature that expires [`ClientConfig::signature_ttl`] after the estimated server time.
/// Cloned clients share the limiter, the clock, and the refill task.
pub struct ExchangeClient<C>
where
	C: ?Sized + ExchangeHttpClient,
{
	/// HTTP transport used for every outbound call.
	pub http_client: Arc<C>,
	/// Validated client configuration.
	pub config: ClientConfig,
	signer: Option<RequestSigner>,
	limiter: Arc<RateLimiter>,
	clock: Arc<ClockSync>,
	refill: Arc<Mutex<Option<RefillTask>>>,
}
impl<C> ExchangeClient<C>
where
	C: ?Sized + ExchangeHttpClient,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_http_client(config: ClientConfig, http_client: impl Into<Arc<C>>) -> Self {
		let limiter = RateLimiter::new(config.poll_policy(), config.refill_window);

		Self {
			http_client: http_client.into(),
			config,
			signer: None,
			limiter: Arc::new(limiter),
			clock: Default::default(),
			refill: Default::default(),
		}
	}

	/// Signs every later request with `credentials`.
	pub fn with_credentials(mut self, credentials: ApiCredentials) -> Self {
		self.signer = Some(RequestSigner::new(&credentials));

		self
	}

	/// Whether requests carry authentication headers.
	pub fn is_signed(&self) -> bool {
		self.signer.is_some()
	}

	/// Shared rate limiter.
	pub fn limiter(&self) -> &Arc<RateLimiter> {
		&self.limiter
	}

	/// Current rate budget estimate.
	pub fn rate_limit(&self) -> RateLimitState {
		self.limiter.snapshot()
	}

	/// Overwrites one budget counter; malformed or sub-one values fall back to the default.
	pub fn set_rate_limit(&self, field: RateLimitField, value: impl Display) {
		self.limiter.set_rate_limit(field, value);
	}

	/// Charges one unit of budget and waits until the rest exceeds `floor`.
	pub async fn throttle(&self, floor: f64) -> Result<()> {
		let span = OperationSpan::new(Operation::Throttle, "throttle");

		obs::record_operation_outcome(Operation::Throttle, OperationOutcome::Attempt);

		let result = span.instrument(self.limiter.acquire(floor)).await;

		obs::record_operation_outcome(Operation::Throttle, OperationOutcome::from(&result));

		result
	}

	/// Estimated server time; local time until [`ExchangeClient::bootstrap`] succeeds.
	pub fn server_time(&self) -> OffsetDateTime {
		self.clock.now()
	}

	/// Clock sampled during bootstrap, if any.
	pub fn server_clock(&self) -> Option<ServerClock> {
		self.clock.clock()
	}
}
#[cfg(feature = "reqwest")]
impl ExchangeClient<ReqwestHttpClient> {
	/// Creates a client that provisions its own reqwest transport.
	pub fn new(config: ClientConfig) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default())
	}
}
impl<C> Clone for ExchangeClient<C>
where
	C: ?Sized + ExchangeHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: Arc::clone(&self.http_client),
			config: self.config.clone(),
			signer: self.signer.clone(),
			limiter: Arc::clone(&self.limiter),
			clock: Arc::clone(&self.clock),
			refill: Arc::clone(&self.refill),
		}
	}
}
impl<C> Debug for ExchangeClient<C>
where
	C: ?Sized + ExchangeHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ExchangeClient")
			.field("config", &self.config)
			.field("signer_key", &self.signer.as_ref().map(RequestSigner::key))
			.field("rate_limit", &self.limiter.snapshot())
			.field("server_clock", &self.clock.clock())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn verbs_parse_case_insensitively() {
		assert_eq!("get".parse::<Verb>().expect("GET should parse."), Verb::Get);
		assert_eq!("Delete".parse::<Verb>().expect("DELETE should parse."), Verb::Delete);
		assert!(matches!(
			"PATCH".parse::<Verb>(),
			Err(ConfigError::UnsupportedVerb { verb }) if verb == "PATCH"
		));
		assert!(Verb::Get.is_read());
		assert!(!Verb::Put.is_read());
	}

	#[test]
	fn verbs_serialize_upper_case() {
		assert_eq!(serde_json::to_string(&Verb::Post).expect("Verb should serialize."), "\"POST\"");
	}
}
