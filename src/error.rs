//! Broker-level error types shared across the limiter, request pipeline, and stream dispatcher.

// self
use crate::{_prelude::*, client::Verb, stream::IdentifierError};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, or an unreadable body).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The exchange answered with a well-formed error payload.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Stream subscription failure.
	#[error(transparent)]
	Stream(#[from] crate::stream::StreamError),

	/// The rate limiter could not secure budget headroom within its retry budget.
	#[error("Rate budget stayed at or below the floor {floor} after {attempts} polls.")]
	ExhaustedRetries {
		/// Number of polls performed before giving up.
		attempts: u32,
		/// Floor the caller asked the budget to exceed.
		floor: f64,
	},
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// The base URL cannot be parsed or joined with an endpoint.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The base URL uses a scheme other than HTTP(S) or lacks a host.
	#[error("Base URL must be an absolute http(s) URL: {url}.")]
	UnsupportedBaseUrl {
		/// Offending URL.
		url: String,
	},
	/// The request payload could not be serialized into a JSON object.
	#[error("Request payload must serialize into a JSON object.")]
	InvalidPayload {
		/// Serialization failure, when the payload did not serialize at all.
		#[source]
		source: Option<serde_json::Error>,
	},
	/// A numeric or duration setting is out of range.
	#[error("Configuration value `{field}` is out of range.")]
	OutOfRange {
		/// Name of the offending setting.
		field: &'static str,
	},
	/// HTTP verb is not supported by the pipeline.
	#[error("Unsupported HTTP verb `{verb}`.")]
	UnsupportedVerb {
		/// Verb as provided by the caller.
		verb: String,
	},
	/// Symbol or table identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] IdentifierError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Error payload returned by the exchange inside an otherwise readable JSON body.
#[derive(Debug, ThisError)]
#[error("{verb} {endpoint} was rejected by the exchange: {message}.")]
pub struct ApiError {
	/// Server-supplied message.
	pub message: String,
	/// Server-supplied error name, when present.
	pub name: Option<String>,
	/// HTTP status of the response carrying the error.
	pub status: u16,
	/// Verb of the failing request.
	pub verb: Verb,
	/// Endpoint of the failing request, relative to the API root.
	pub endpoint: String,
	/// Payload the caller submitted, kept for diagnostics.
	pub payload: JsonValue,
}

/// Transport-level failures: network errors and undecodable responses.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the exchange.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Response body is not valid JSON.
	#[error("Exchange returned malformed JSON.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Response body is valid JSON but lacks a field the broker depends on.
	#[error("Exchange returned an unexpected body: {message}.")]
	UnexpectedBody {
		/// Description of what was missing.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
