//! Incremental dispatcher layered on a [`StreamTransport`].

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	obs,
	stream::{
		CursorAdvance, DispatchCursor, SnapshotHandler, StreamError, StreamKey, StreamTransport,
		StreamUpdate,
	},
};

type CursorMap<T> = Arc<Mutex<HashMap<StreamKey, DispatchCursor<T>>>>;

/// Converts snapshot streams into per-element callbacks.
///
/// The dispatcher wraps a shared transport rather than extending it; cloned dispatchers
/// share both the transport and the cursor table.
pub struct StreamDispatcher<S>
where
	S: ?Sized + StreamTransport,
{
	transport: Arc<S>,
	cursors: CursorMap<S::Item>,
}
impl<S> StreamDispatcher<S>
where
	S: ?Sized + StreamTransport,
{
	/// Wraps `transport`.
	pub fn new(transport: Arc<S>) -> Self {
		Self { transport, cursors: Default::default() }
	}

	/// Underlying transport.
	pub fn transport(&self) -> &Arc<S> {
		&self.transport
	}

	/// Whether `(symbol, table)` is already monitored.
	pub fn is_monitoring(&self, symbol: &str, table: &str) -> bool {
		StreamKey::new(symbol, table).is_ok_and(|key| self.cursors.lock().contains_key(&key))
	}

	/// Subscribes to `(symbol, table)` and invokes `callback` once per new element.
	///
	/// Order book tables produce a single [`StreamUpdate::TableReplaced`] per snapshot.
	/// Each key may be monitored once; a second call fails with
	/// [`StreamError::AlreadyMonitored`].
	pub fn monitor_stream<F>(&self, symbol: &str, table: &str, callback: F) -> Result<()>
	where
		F: 'static + Fn(StreamUpdate<'_, S::Item>) + Send + Sync,
	{
		let key = StreamKey::new(symbol, table).map_err(ConfigError::from)?;

		{
			let mut cursors = self.cursors.lock();

			if cursors.contains_key(&key) {
				return Err(StreamError::already_monitored(&key).into());
			}

			cursors.insert(key.clone(), DispatchCursor::default());
		}

		let handler: SnapshotHandler<S::Item> = {
			let cursors = Arc::clone(&self.cursors);
			let key = key.clone();

			Box::new(move |snapshot: &[S::Item]| dispatch(&cursors, &key, snapshot, &callback))
		};

		if let Err(e) = self.transport.subscribe(&key, handler) {
			self.cursors.lock().remove(&key);

			return Err(e.into());
		}

		Ok(())
	}

	/// Current contents of `(symbol, table)` as held by the transport.
	pub fn current_table(&self, symbol: &str, table: &str) -> Result<Vec<S::Item>> {
		let key = StreamKey::new(symbol, table).map_err(ConfigError::from)?;

		Ok(self.transport.current_table(&key))
	}
}
impl<S> Clone for StreamDispatcher<S>
where
	S: ?Sized + StreamTransport,
{
	fn clone(&self) -> Self {
		Self { transport: Arc::clone(&self.transport), cursors: Arc::clone(&self.cursors) }
	}
}
impl<S> Debug for StreamDispatcher<S>
where
	S: ?Sized + StreamTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StreamDispatcher")
			.field("monitored", &self.cursors.lock().keys().collect::<Vec<_>>())
			.finish()
	}
}

fn dispatch<T, F>(
	cursors: &Mutex<HashMap<StreamKey, DispatchCursor<T>>>,
	key: &StreamKey,
	snapshot: &[T],
	callback: &F,
) where
	T: Clone + PartialEq,
	F: Fn(StreamUpdate<'_, T>),
{
	// The lock only covers the cursor move; callbacks run after it is released.
	let advance = match cursors.lock().get_mut(key) {
		Some(cursor) => cursor.advance(snapshot),
		None => return,
	};

	if matches!(advance, CursorAdvance::Ignored) {
		return;
	}
	if key.is_order_book() {
		callback(StreamUpdate::TableReplaced);

		return;
	}
	if let CursorAdvance::Replayed(items) = advance {
		obs::trace_cursor_miss(&key.symbol, &key.table, items.len());
	}

	for item in advance.items() {
		callback(StreamUpdate::Item(item));
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::stream::{MemoryStreamTransport, ORDER_BOOK_L2};

	type Recorded = Arc<Mutex<Vec<String>>>;

	fn recorder() -> (Recorded, impl Fn(StreamUpdate<'_, i32>) + Send + Sync + 'static) {
		let seen = Recorded::default();
		let sink = Arc::clone(&seen);

		(seen, move |update: StreamUpdate<'_, i32>| {
			sink.lock().push(match update {
				StreamUpdate::Item(item) => item.to_string(),
				StreamUpdate::TableReplaced => "replaced".into(),
			})
		})
	}

	fn key(symbol: &str, table: &str) -> StreamKey {
		StreamKey::new(symbol, table).expect("Key fixture should validate.")
	}

	#[test]
	fn delivers_each_new_element_once() {
		let transport = Arc::new(MemoryStreamTransport::<i32>::default());
		let dispatcher = StreamDispatcher::new(Arc::clone(&transport));
		let (seen, callback) = recorder();
		let trades = key("XBTUSD", "trade");

		dispatcher
			.monitor_stream("XBTUSD", "trade", callback)
			.expect("Subscription should succeed.");
		transport.publish(&trades, [1, 2]);
		transport.publish(&trades, [1, 2, 3]);
		transport.publish(&trades, [2, 3, 4]);

		assert_eq!(*seen.lock(), ["1", "2", "3", "4"]);
	}

	#[test]
	fn cursor_miss_replays_the_whole_snapshot() {
		let transport = Arc::new(MemoryStreamTransport::<i32>::default());
		let dispatcher = StreamDispatcher::new(Arc::clone(&transport));
		let (seen, callback) = recorder();
		let trades = key("XBTUSD", "trade");

		dispatcher
			.monitor_stream("XBTUSD", "trade", callback)
			.expect("Subscription should succeed.");
		transport.publish(&trades, [1, 2]);
		transport.publish(&trades, [8, 9]);

		assert_eq!(*seen.lock(), ["1", "2", "8", "9"]);
	}

	#[test]
	fn empty_snapshots_are_ignored() {
		let transport = Arc::new(MemoryStreamTransport::<i32>::default());
		let dispatcher = StreamDispatcher::new(Arc::clone(&transport));
		let (seen, callback) = recorder();
		let trades = key("XBTUSD", "trade");

		dispatcher
			.monitor_stream("XBTUSD", "trade", callback)
			.expect("Subscription should succeed.");
		transport.publish(&trades, [1, 2]);
		transport.publish(&trades, []);
		transport.publish(&trades, [1, 2, 3]);

		assert_eq!(*seen.lock(), ["1", "2", "3"]);
	}

	#[test]
	fn order_book_snapshots_replace_the_table() {
		let transport = Arc::new(MemoryStreamTransport::<i32>::default());
		let dispatcher = StreamDispatcher::new(Arc::clone(&transport));
		let (seen, callback) = recorder();
		let book = key("XBTUSD", ORDER_BOOK_L2);

		dispatcher
			.monitor_stream("XBTUSD", ORDER_BOOK_L2, callback)
			.expect("Subscription should succeed.");
		transport.publish(&book, [10, 11, 12]);
		transport.publish(&book, [10, 13]);

		assert_eq!(*seen.lock(), ["replaced", "replaced"]);
		assert_eq!(
			dispatcher.current_table("XBTUSD", ORDER_BOOK_L2).expect("Key should validate."),
			[10, 13]
		);
	}

	#[test]
	fn keys_are_independent_and_unique() {
		let transport = Arc::new(MemoryStreamTransport::<i32>::default());
		let dispatcher = StreamDispatcher::new(Arc::clone(&transport));
		let (xbt, xbt_callback) = recorder();
		let (eth, eth_callback) = recorder();

		dispatcher.monitor_stream("XBTUSD", "trade", xbt_callback).expect("XBT should subscribe.");
		dispatcher.monitor_stream("ETHUSD", "trade", eth_callback).expect("ETH should subscribe.");
		transport.publish(&key("XBTUSD", "trade"), [1, 2]);
		transport.publish(&key("ETHUSD", "trade"), [2, 5]);

		assert_eq!(*xbt.lock(), ["1", "2"]);
		assert_eq!(*eth.lock(), ["2", "5"]);

		let (_, again) = recorder();
		let err = dispatcher
			.monitor_stream("XBTUSD", "trade", again)
			.expect_err("Second subscription must be rejected.");

		assert!(matches!(err, Error::Stream(StreamError::AlreadyMonitored { .. })));
		assert!(dispatcher.is_monitoring("ETHUSD", "trade"));
	}

	#[test]
	fn failed_subscription_is_rolled_back() {
		let transport = Arc::new(MemoryStreamTransport::<i32>::default());
		let dispatcher = StreamDispatcher::new(Arc::clone(&transport));

		transport.close();

		let (_, callback) = recorder();
		let err = dispatcher
			.monitor_stream("XBTUSD", "trade", callback)
			.expect_err("Closed transports refuse subscriptions.");

		assert!(matches!(err, Error::Stream(StreamError::Subscribe { .. })));
		assert!(!dispatcher.is_monitoring("XBTUSD", "trade"));

		let (_, callback) = recorder();
		let err = dispatcher
			.monitor_stream("", "trade", callback)
			.expect_err("Blank symbols are invalid.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidIdentifier(_))));
	}
}
