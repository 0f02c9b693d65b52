//! In-process [`StreamTransport`] for local development and tests.

// crates.io
use parking_lot::ReentrantMutex;
// self
use crate::{
	_prelude::*,
	stream::{SnapshotHandler, StreamError, StreamKey, StreamTransport},
};

type SharedHandler<T> = Arc<SnapshotHandler<T>>;

struct Table<T> {
	rows: Vec<T>,
	handlers: Vec<SharedHandler<T>>,
	// Held from a change until its last handler returns, so a table's snapshots reach every
	// subscriber in order. Reentrant so handlers may publish back into the transport.
	delivery: Arc<ReentrantMutex<()>>,
}
impl<T> Default for Table<T> {
	fn default() -> Self {
		Self { rows: Vec::new(), handlers: Vec::new(), delivery: Default::default() }
	}
}

struct Inner<T> {
	tables: HashMap<StreamKey, Table<T>>,
	closed: bool,
}
impl<T> Default for Inner<T> {
	fn default() -> Self {
		Self { tables: HashMap::new(), closed: false }
	}
}

/// Thread-safe transport that keeps tables in-process and pushes every change to its
/// subscribers.
///
/// Tables can be bounded with [`MemoryStreamTransport::with_max_table_len`]; appends then
/// drop the oldest rows, mirroring a realtime table that only keeps recent history.
pub struct MemoryStreamTransport<T> {
	inner: RwLock<Inner<T>>,
	max_table_len: Option<usize>,
}
impl<T> MemoryStreamTransport<T>
where
	T: 'static + Clone + PartialEq + Send + Sync,
{
	/// Caps every table at `len` rows, keeping the newest.
	pub fn with_max_table_len(mut self, len: usize) -> Self {
		self.max_table_len = Some(len);

		self
	}

	/// Replaces the contents of `key` and notifies its subscribers.
	pub fn publish(&self, key: &StreamKey, rows: impl IntoIterator<Item = T>) {
		self.update(key, |table| {
			table.clear();
			table.extend(rows);
		});
	}

	/// Appends rows to `key`, trims it to the configured length, and notifies subscribers.
	pub fn append(&self, key: &StreamKey, rows: impl IntoIterator<Item = T>) {
		self.update(key, |table| table.extend(rows));
	}

	/// Refuses every later subscription.
	pub fn close(&self) {
		self.inner.write().closed = true;
	}

	fn delivery(&self, key: &StreamKey) -> Arc<ReentrantMutex<()>> {
		Arc::clone(&self.inner.write().tables.entry(key.clone()).or_default().delivery)
	}

	fn update(&self, key: &StreamKey, apply: impl FnOnce(&mut Vec<T>)) {
		let delivery = self.delivery(key);
		let _turn = delivery.lock();
		let (snapshot, handlers) = {
			let mut inner = self.inner.write();
			let table = inner.tables.entry(key.clone()).or_default();

			apply(&mut table.rows);

			let excess =
				self.max_table_len.map_or(0, |max| table.rows.len().saturating_sub(max));

			table.rows.drain(..excess);

			(table.rows.clone(), table.handlers.clone())
		};

		for handler in handlers {
			handler(&snapshot);
		}
	}
}
impl<T> Default for MemoryStreamTransport<T> {
	fn default() -> Self {
		Self { inner: Default::default(), max_table_len: None }
	}
}
impl<T> Debug for MemoryStreamTransport<T> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let inner = self.inner.read();

		f.debug_struct("MemoryStreamTransport")
			.field("tables", &inner.tables.len())
			.field("closed", &inner.closed)
			.field("max_table_len", &self.max_table_len)
			.finish()
	}
}
impl<T> StreamTransport for MemoryStreamTransport<T>
where
	T: 'static + Clone + PartialEq + Send + Sync,
{
	type Item = T;

	fn subscribe(&self, key: &StreamKey, handler: SnapshotHandler<T>) -> Result<(), StreamError> {
		if self.inner.read().closed {
			return Err(StreamError::Subscribe { message: "transport is closed".into() });
		}

		let handler = Arc::new(handler);
		let delivery = self.delivery(key);
		// No update of this table can slip between registering and the first delivery.
		let _turn = delivery.lock();
		let snapshot = {
			let mut inner = self.inner.write();
			let table = inner.tables.entry(key.clone()).or_default();

			table.handlers.push(Arc::clone(&handler));
			table.rows.clone()
		};

		// New subscribers receive the current table first, like a realtime `partial`.
		if !snapshot.is_empty() {
			handler(&snapshot);
		}

		Ok(())
	}

	fn current_table(&self, key: &StreamKey) -> Vec<T> {
		self.inner.read().tables.get(key).map(|table| table.rows.clone()).unwrap_or_default()
	}
}
