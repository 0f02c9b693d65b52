//! API key + secret pair used to sign private requests.

// self
use crate::_prelude::*;

/// Redacted API secret wrapper keeping signing material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSecret(String);
impl ApiSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner secret. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for ApiSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for ApiSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ApiSecret").field(&"<redacted>").finish()
	}
}
impl Display for ApiSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Key identifier plus secret issued by the exchange.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCredentials {
	/// Public key identifier sent in the `api-key` header.
	pub key: String,
	/// Secret used as the HMAC key; never transmitted.
	pub secret: ApiSecret,
}
impl ApiCredentials {
	/// Creates a credential pair.
	pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
		Self { key: key.into(), secret: ApiSecret::new(secret) }
	}
}
impl Debug for ApiCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiCredentials")
			.field("key", &self.key)
			.field("secret", &self.secret)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let credentials = ApiCredentials::new("key-1", "super-secret");

		assert_eq!(format!("{:?}", credentials.secret), "ApiSecret(\"<redacted>\")");
		assert_eq!(format!("{}", credentials.secret), "<redacted>");
		assert!(!format!("{credentials:?}").contains("super-secret"));
		assert_eq!(credentials.secret.expose(), "super-secret");
	}
}
