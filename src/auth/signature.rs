//! Time-scoped HMAC-SHA256 request signatures.
//!
//! The signed message is the concatenation `verb + path + expires + body`, where `path`
//! already contains the API root and any query string. The body must be the exact string
//! placed on the wire; re-serializing the payload would change key order and break the
//! signature.

// crates.io
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{_prelude::*, auth::ApiCredentials, client::Verb};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the unix timestamp after which the signature is void.
pub const API_EXPIRES_HEADER: &str = "api-expires";
/// Header carrying the public key identifier.
pub const API_KEY_HEADER: &str = "api-key";
/// Header carrying the hex-encoded signature.
pub const API_SIGNATURE_HEADER: &str = "api-signature";

/// Authentication headers produced for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedHeaders {
	/// Unix timestamp (seconds) after which the exchange rejects the request.
	pub expires: i64,
	/// Public key identifier.
	pub key: String,
	/// Lowercase hex HMAC-SHA256 signature.
	pub signature: String,
}
impl SignedHeaders {
	/// Returns the three headers as `(name, value)` pairs.
	pub fn into_pairs(self) -> [(&'static str, String); 3] {
		[
			(API_EXPIRES_HEADER, self.expires.to_string()),
			(API_KEY_HEADER, self.key),
			(API_SIGNATURE_HEADER, self.signature),
		]
	}
}

/// Signs requests with a keyed HMAC prepared once per credential pair.
#[derive(Clone)]
pub struct RequestSigner {
	key: String,
	mac: HmacSha256,
}
impl RequestSigner {
	/// Prepares a signer for the provided credentials.
	pub fn new(credentials: &ApiCredentials) -> Self {
		let mac = match HmacSha256::new_from_slice(credentials.secret.expose().as_bytes()) {
			Ok(mac) => mac,
			Err(_) => unreachable!("HMAC accepts keys of any length"),
		};

		Self { key: credentials.key.clone(), mac }
	}

	/// Returns the public key identifier.
	pub fn key(&self) -> &str {
		&self.key
	}

	/// Computes the hex signature for `verb + path + expires + body`.
	pub fn sign(&self, verb: Verb, path: &str, expires: i64, body: &str) -> String {
		let mut mac = self.mac.clone();

		mac.update(verb.as_str().as_bytes());
		mac.update(path.as_bytes());
		mac.update(expires.to_string().as_bytes());
		mac.update(body.as_bytes());

		hex::encode(mac.finalize().into_bytes())
	}

	/// Produces the full header set for one request.
	pub fn signed_headers(&self, verb: Verb, path: &str, expires: i64, body: &str) -> SignedHeaders {
		let signature = self.sign(verb, path, expires, body);

		SignedHeaders { expires, key: self.key.clone(), signature }
	}
}
impl Debug for RequestSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestSigner").field("key", &self.key).field("mac", &"<redacted>").finish()
	}
}
