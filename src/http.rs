//! Transport primitives for exchange REST calls.
//!
//! The module exposes [`ExchangeHttpClient`] alongside the transport-neutral
//! [`HttpRequest`] and [`HttpResponse`] types so downstream crates can plug in custom HTTP
//! stacks. The broker only needs a status, a case-insensitive header lookup, and the raw
//! body; JSON decoding and rate-limit reconciliation happen on the broker side so every
//! transport behaves the same way.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{_prelude::*, client::Verb, error::TransportError};

/// Boxed future returned by [`ExchangeHttpClient::execute`].
pub type HttpFuture<'a, E> = Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing exchange REST calls.
///
/// The trait is the broker's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so a single transport can be shared by cloned clients, and the
/// futures they return must be `Send` so request pipelines can hop executors. A transport
/// reports failure only when no response was obtained; HTTP error statuses are ordinary
/// responses because the exchange still attaches rate-limit headers to them.
pub trait ExchangeHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Performs one HTTP exchange.
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError>;
}

/// Fully prepared outbound request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
	/// HTTP verb.
	pub verb: Verb,
	/// Absolute URL including the query string.
	pub url: Url,
	/// Header pairs in insertion order.
	pub headers: Vec<(String, String)>,
	/// Body string, absent for read-style verbs.
	pub body: Option<String>,
}
impl HttpRequest {
	/// Returns the first header value matching `name` case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

/// Transport-neutral response view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	headers: BTreeMap<String, String>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Creates a response with the given status and body and no headers.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: BTreeMap::new(), body: body.into() }
	}

	/// Adds or replaces a header; names are stored lowercase.
	pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// Looks up a header case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Parses the body as JSON, reporting the path of the first failure.
	pub fn json(&self) -> Result<JsonValue, TransportError> {
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| TransportError::Decode { source, status: self.status })
	}
}
impl FromIterator<(String, String)> for HttpResponse {
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (String, String)>,
	{
		iter.into_iter().fold(Self::default(), |response, (name, value)| {
			response.with_header(name, value)
		})
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with a request timeout applied to every call.
	pub fn with_timeout(timeout: Duration) -> Result<Self, crate::error::ConfigError> {
		Ok(Self(ReqwestClient::builder().timeout(timeout).build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ExchangeHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder = client.request(request.verb.method(), request.url);

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					Some((name.as_str().to_owned(), value.to_str().ok()?.to_owned()))
				})
				.collect::<Vec<_>>();
			let body = response.bytes().await?.to_vec();
			let mut converted = HttpResponse::from_iter(headers);

			converted.status = status;
			converted.body = body;

			Ok(converted)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn response_headers_are_case_insensitive() {
		let response = HttpResponse::new(200, "{}").with_header("X-RateLimit-Remaining", "29");

		assert_eq!(response.header("x-ratelimit-remaining"), Some("29"));
		assert_eq!(response.header("X-RATELIMIT-REMAINING"), Some("29"));
		assert_eq!(response.header("x-ratelimit-limit"), None);
	}

	#[test]
	fn json_reports_decode_failures_with_status() {
		let response = HttpResponse::new(502, "<html>Bad Gateway</html>");
		let err = response.json().expect_err("HTML bodies must not decode as JSON.");

		assert!(matches!(err, TransportError::Decode { status: 502, .. }));

		let ok = HttpResponse::new(200, r#"{"timestamp":1}"#)
			.json()
			.expect("JSON bodies should decode.");

		assert_eq!(ok["timestamp"], 1);
	}

	#[test]
	fn request_header_lookup_ignores_case() {
		let request = HttpRequest {
			verb: Verb::Get,
			url: Url::parse("https://www.bitmex.com/api/v1/").expect("URL fixture should parse."),
			headers: vec![("api-key".into(), "abc".into())],
			body: None,
		};

		assert_eq!(request.header("API-KEY"), Some("abc"));
		assert_eq!(request.header("api-signature"), None);
	}
}
