//! Feeds an in-memory trade table and prints each trade exactly once, even though every
//! update republishes the whole table.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
// self
use exchange_broker::stream::{
	MemoryStreamTransport, StreamDispatcher, StreamKey, StreamUpdate,
};

#[derive(Clone, Debug, PartialEq)]
struct Trade {
	id: u32,
	price: f64,
}

fn main() -> Result<()> {
	color_eyre::install()?;

	let transport = Arc::new(MemoryStreamTransport::<Trade>::default().with_max_table_len(4));
	let dispatcher = StreamDispatcher::new(Arc::clone(&transport));
	let key = StreamKey::new("XBTUSD", "trade")?;

	dispatcher.monitor_stream("XBTUSD", "trade", |update| {
		if let StreamUpdate::Item(trade) = update {
			println!("Trade #{} at {}.", trade.id, trade.price);
		}
	})?;

	for batch in [[1, 2], [3, 4], [5, 6]] {
		transport.append(
			&key,
			batch.map(|id| Trade { id, price: 42_000. + f64::from(id) * 0.5 }),
		);
	}

	println!("Table now holds {} trades.", dispatcher.current_table("XBTUSD", "trade")?.len());

	Ok(())
}
