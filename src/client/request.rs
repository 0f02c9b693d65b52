//! Request preparation: payload encoding and the exact strings that get signed.

// crates.io
use url::{Position, form_urlencoded::Serializer as FormSerializer};
// self
use crate::{_prelude::*, client::Verb, config::ClientConfig, error::ConfigError};

/// Payload encoded once and ready to be signed and sent.
///
/// For read-style verbs the payload becomes the query string and the body is empty;
/// otherwise the JSON body string is produced once and reused verbatim for both the wire
/// and the signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedRequest {
	/// HTTP verb.
	pub verb: Verb,
	/// Endpoint relative to the API root, without a leading `/`.
	pub endpoint: String,
	/// Form-encoded query string; empty when absent.
	pub query: String,
	/// Body string; empty for read-style verbs.
	pub body: String,
	/// Payload as submitted, kept for error reports.
	pub payload: JsonValue,
}
impl PreparedRequest {
	/// Encodes `payload` for `verb` and `endpoint`.
	///
	/// The payload must serialize into a JSON object; `null` (e.g. `()`) counts as empty.
	pub fn new<P>(verb: Verb, endpoint: &str, payload: &P) -> Result<Self, ConfigError>
	where
		P: ?Sized + Serialize,
	{
		let payload = match serde_json::to_value(payload)
			.map_err(|e| ConfigError::InvalidPayload { source: Some(e) })?
		{
			JsonValue::Null => JsonValue::Object(Default::default()),
			value @ JsonValue::Object(_) => value,
			_ => return Err(ConfigError::InvalidPayload { source: None }),
		};
		let (query, body) = if verb.is_read() {
			(canonical_query(&payload), String::new())
		} else {
			let body = serde_json::to_string(&payload)
				.map_err(|e| ConfigError::InvalidPayload { source: Some(e) })?;

			(String::new(), body)
		};
		let endpoint = endpoint.trim_start_matches('/').to_owned();

		Ok(Self { verb, endpoint, query, body, payload })
	}

	/// Absolute URL of the request, query included.
	pub fn url(&self, config: &ClientConfig) -> Result<Url, ConfigError> {
		let mut url = config.endpoint_url(&self.endpoint)?;

		if !self.query.is_empty() {
			url.set_query(Some(&self.query));
		}

		Ok(url)
	}

	/// Body to put on the wire, absent for read-style verbs.
	pub fn wire_body(&self) -> Option<&str> {
		if self.verb.is_read() { None } else { Some(&self.body) }
	}
}

/// Path plus query of `url`, exactly as it goes on the wire and gets signed.
pub fn signed_path(url: &Url) -> &str {
	&url[Position::BeforePath..Position::AfterQuery]
}

/// Encodes a JSON object as `application/x-www-form-urlencoded` with keys in sorted order.
///
/// Strings are used verbatim, `null` becomes an empty value, and nested arrays or objects
/// are written as compact JSON.
pub fn canonical_query(payload: &JsonValue) -> String {
	let Some(object) = payload.as_object() else {
		return String::new();
	};
	let sorted = object.iter().collect::<BTreeMap<_, _>>();
	let mut serializer = FormSerializer::new(String::new());

	for (key, value) in sorted {
		match value {
			JsonValue::String(text) => serializer.append_pair(key, text),
			JsonValue::Null => serializer.append_pair(key, ""),
			other => serializer.append_pair(key, &other.to_string()),
		};
	}

	serializer.finish()
}
