//! Snapshot stream contracts and the incremental dispatcher built on them.
//!
//! Realtime tables arrive as repeated full snapshots. [`StreamDispatcher`] turns them into
//! one callback per genuinely new element, keeping a [`DispatchCursor`] per
//! [`StreamKey`]. Order books are the exception: consumers get a single
//! [`StreamUpdate::TableReplaced`] and re-read the table themselves.

pub mod cursor;
pub mod dispatcher;
pub mod id;
pub mod memory;

pub use cursor::*;
pub use dispatcher::*;
pub use id::*;
pub use memory::*;

// self
use crate::_prelude::*;

/// Table whose snapshots are delivered as a replacement notice rather than per element.
pub const ORDER_BOOK_L2: &str = "orderBookL2";

/// Handler invoked by a transport with every snapshot of a subscribed table.
pub type SnapshotHandler<T> = Box<dyn Fn(&[T]) + Send + Sync>;

/// Push-based source of table snapshots.
///
/// Implementations invoke the handler with the full, possibly truncated, table after
/// every change. Handlers may be called from any thread but never concurrently for the
/// same subscription.
pub trait StreamTransport
where
	Self: 'static + Send + Sync,
{
	/// Row type carried by the tables.
	type Item: 'static + Clone + PartialEq + Send + Sync;

	/// Registers `handler` for every snapshot of `key`.
	fn subscribe(
		&self,
		key: &StreamKey,
		handler: SnapshotHandler<Self::Item>,
	) -> Result<(), StreamError>;

	/// Returns the current contents of `key`.
	fn current_table(&self, key: &StreamKey) -> Vec<Self::Item>;
}

/// Identifies one subscription.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StreamKey {
	/// Instrument symbol.
	pub symbol: Symbol,
	/// Realtime table.
	pub table: TableName,
}
impl StreamKey {
	/// Validates both parts and builds the key.
	pub fn new(symbol: impl AsRef<str>, table: impl AsRef<str>) -> Result<Self, IdentifierError> {
		Ok(Self { symbol: Symbol::new(symbol.as_ref())?, table: TableName::new(table.as_ref())? })
	}

	/// Whether snapshots of this table are delivered as [`StreamUpdate::TableReplaced`].
	pub fn is_order_book(&self) -> bool {
		&*self.table == ORDER_BOOK_L2
	}
}
impl Display for StreamKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}:{}", self.table, self.symbol)
	}
}

/// Notification handed to a stream callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamUpdate<'a, T> {
	/// One element not delivered before.
	Item(&'a T),
	/// The table changed as a whole; re-read it through
	/// [`StreamDispatcher::current_table`].
	TableReplaced,
}

/// Stream subscription failures.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StreamError {
	/// The dispatcher already monitors this key.
	#[error("Stream {table}:{symbol} is already monitored.")]
	AlreadyMonitored {
		/// Symbol of the existing subscription.
		symbol: String,
		/// Table of the existing subscription.
		table: String,
	},
	/// The transport refused the subscription.
	#[error("Stream subscription failed: {message}.")]
	Subscribe {
		/// Transport-provided reason.
		message: String,
	},
}
impl StreamError {
	/// Builds [`StreamError::AlreadyMonitored`] for `key`.
	pub fn already_monitored(key: &StreamKey) -> Self {
		Self::AlreadyMonitored { symbol: key.symbol.to_string(), table: key.table.to_string() }
	}
}
