//! Rate budget counters and the server reconciliation rule.

// self
use crate::{_prelude::*, http::HttpResponse};

/// Default `limit` used before the exchange reports one or when it reports garbage.
pub const DEFAULT_LIMIT: i64 = 30;
/// Default used for every other counter when the exchange reports garbage.
pub const DEFAULT_BUDGET_FIELD: i64 = 10;

/// Counters tracked by the limiter and reported through `x-ratelimit-*` headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitField {
	/// Maximum budget.
	Limit,
	/// Budget left right now.
	Remaining,
	/// Advisory reset timestamp.
	Reset,
}
impl RateLimitField {
	/// Every tracked field in reconciliation order.
	pub const ALL: [Self; 3] = [Self::Limit, Self::Remaining, Self::Reset];

	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Limit => "limit",
			Self::Remaining => "remaining",
			Self::Reset => "reset",
		}
	}

	/// Response header carrying this field.
	pub const fn header_name(self) -> &'static str {
		match self {
			Self::Limit => "x-ratelimit-limit",
			Self::Remaining => "x-ratelimit-remaining",
			Self::Reset => "x-ratelimit-reset",
		}
	}

	/// Value substituted when the reported one is missing, malformed, or below one.
	pub const fn default_value(self) -> i64 {
		match self {
			Self::Limit => DEFAULT_LIMIT,
			Self::Remaining | Self::Reset => DEFAULT_BUDGET_FIELD,
		}
	}

	/// Coerces a reported value into an integer, falling back to [`Self::default_value`].
	pub fn coerce(self, raw: &str) -> i64 {
		match leading_integer(raw) {
			Some(value) if value >= 1 => value,
			_ => self.default_value(),
		}
	}
}
impl Display for RateLimitField {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Snapshot of the limiter's budget estimate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateLimitState {
	/// Maximum budget; always positive.
	pub limit: f64,
	/// Estimated requests still permitted; may be fractional.
	pub remaining: f64,
	/// Last reset timestamp reported by the exchange.
	pub reset_at: i64,
}
impl RateLimitState {
	/// Overwrites one field using the coercion rule, keeping `remaining` within `[0, limit]`.
	pub fn set(&mut self, field: RateLimitField, raw: &str) {
		let value = field.coerce(raw);

		match field {
			RateLimitField::Limit => {
				self.limit = value as f64;
				self.remaining = self.remaining.min(self.limit);
			},
			RateLimitField::Remaining => self.remaining = (value as f64).clamp(0., self.limit),
			RateLimitField::Reset => self.reset_at = value,
		}
	}

	/// Applies every `x-ratelimit-*` header of `response`; missing headers count as malformed.
	pub fn reconcile(&mut self, response: &HttpResponse) {
		for field in RateLimitField::ALL {
			self.set(field, response.header(field.header_name()).unwrap_or_default());
		}
	}

	/// Adds one refill step of `limit / window`, capped at `limit`.
	pub fn refill(&mut self, window: f64) {
		self.remaining = (self.remaining + self.limit / window).min(self.limit);
	}

	/// Charges one request attempt. The estimate may go negative under bursts.
	pub fn consume(&mut self) {
		self.remaining -= 1.;
	}
}
impl Default for RateLimitState {
	fn default() -> Self {
		Self { limit: DEFAULT_LIMIT as f64, remaining: 1., reset_at: 0 }
	}
}

// Mirrors integer-prefix parsing: optional sign, then digits; trailing junk is ignored.
fn leading_integer(raw: &str) -> Option<i64> {
	let trimmed = raw.trim_start();
	let (negative, rest) = match trimmed.as_bytes().first() {
		Some(b'-') => (true, &trimmed[1..]),
		Some(b'+') => (false, &trimmed[1..]),
		_ => (false, trimmed),
	};
	let digits = rest.bytes().take_while(u8::is_ascii_digit).count();

	if digits == 0 {
		return None;
	}

	let magnitude = rest[..digits].parse::<i64>().unwrap_or(i64::MAX);

	Some(if negative { -magnitude } else { magnitude })
}
