//! Validated names for the two halves of a stream subscription.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

/// Longest symbol or table name accepted, in characters.
pub const STREAM_NAME_MAX_LEN: usize = 128;

macro_rules! stream_name {
	($(#[$meta:meta])* $name:ident => $kind:expr) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates `value` and wraps it.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				let value = value.into();

				$kind.check(&value)?;

				Ok(Self(value))
			}

			/// Borrows the validated name.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl From<$name> for String {
			fn from(name: $name) -> Self {
				name.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, "{}({})", $kind, self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

/// Which half of a stream key failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum NameKind {
	/// Instrument symbol.
	Symbol,
	/// Realtime table.
	Table,
}
impl NameKind {
	fn check(self, value: &str) -> Result<(), IdentifierError> {
		if value.is_empty() {
			return Err(IdentifierError::Empty { kind: self });
		}
		if let Some(position) = value.chars().position(char::is_whitespace) {
			return Err(IdentifierError::ContainsWhitespace { kind: self, position });
		}

		let len = value.chars().count();

		if len > STREAM_NAME_MAX_LEN {
			return Err(IdentifierError::TooLong { kind: self, len });
		}

		Ok(())
	}
}
impl Display for NameKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(match self {
			Self::Symbol => "Symbol",
			Self::Table => "Table",
		})
	}
}

/// Symbol or table name rejected at subscription time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// Nothing to subscribe to.
	#[error("{kind} name cannot be empty.")]
	Empty {
		/// Rejected half of the key.
		kind: NameKind,
	},
	/// Whitespace would split the `table:symbol` topic.
	#[error("{kind} name contains whitespace at character {position}.")]
	ContainsWhitespace {
		/// Rejected half of the key.
		kind: NameKind,
		/// Character index of the first whitespace.
		position: usize,
	},
	/// Longer than [`STREAM_NAME_MAX_LEN`].
	#[error(
		"{kind} name is {len} characters long; the limit is {max}.",
		max = STREAM_NAME_MAX_LEN
	)]
	TooLong {
		/// Rejected half of the key.
		kind: NameKind,
		/// Character count of the rejected name.
		len: usize,
	},
}

stream_name! {
	/// Instrument symbol a stream is filtered by, e.g. `XBTUSD`.
	Symbol => NameKind::Symbol
}
stream_name! {
	/// Realtime table name, e.g. `trade` or `orderBookL2`.
	TableName => NameKind::Table
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn names_reject_blank_and_spaced_values() {
		assert_eq!(Symbol::new(""), Err(IdentifierError::Empty { kind: NameKind::Symbol }));
		assert_eq!(
			TableName::new("order Book"),
			Err(IdentifierError::ContainsWhitespace { kind: NameKind::Table, position: 5 })
		);

		let symbol = Symbol::new("XBTUSD").expect("Symbol fixture should be valid.");

		assert_eq!(symbol.as_str(), "XBTUSD");
		assert_eq!(format!("{symbol:?}"), "Symbol(XBTUSD)");
	}

	#[test]
	fn serde_enforces_validation_and_length() {
		let table: TableName =
			serde_json::from_str("\"orderBookL2\"").expect("Table should deserialize.");

		assert_eq!(&*table, "orderBookL2");
		assert!(serde_json::from_str::<TableName>("\"\"").is_err());
		assert!(Symbol::new("a".repeat(STREAM_NAME_MAX_LEN)).is_ok());

		let too_long = STREAM_NAME_MAX_LEN + 1;

		assert_eq!(
			Symbol::new("a".repeat(too_long)),
			Err(IdentifierError::TooLong { kind: NameKind::Symbol, len: too_long })
		);
	}
}
