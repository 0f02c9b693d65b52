//! Per-subscription dedup cursor.

/// Outcome of feeding one snapshot to a [`DispatchCursor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorAdvance<'a, T> {
	/// The snapshot was empty; nothing changed.
	Ignored,
	/// First snapshot of the subscription; every element is new.
	Initial(&'a [T]),
	/// The previous tail was found; only the elements after it are new.
	Resumed(&'a [T]),
	/// The previous tail is gone from the table; the whole snapshot is replayed.
	Replayed(&'a [T]),
}
impl<'a, T> CursorAdvance<'a, T> {
	/// Elements to deliver, oldest first.
	pub fn items(&self) -> &'a [T] {
		match *self {
			Self::Ignored => &[],
			Self::Initial(items) | Self::Resumed(items) | Self::Replayed(items) => items,
		}
	}
}

/// Remembers the last delivered element of one `(symbol, table)` subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchCursor<T> {
	last_item: Option<T>,
}
impl<T> DispatchCursor<T>
where
	T: Clone + PartialEq,
{
	/// Last element seen, if any snapshot has been processed.
	pub fn last_item(&self) -> Option<&T> {
		self.last_item.as_ref()
	}

	/// Computes the unseen suffix of `snapshot` and moves the cursor to its last element.
	///
	/// The previous tail is searched from the end so repeated values resolve to their most
	/// recent occurrence.
	pub fn advance<'a>(&mut self, snapshot: &'a [T]) -> CursorAdvance<'a, T> {
		let Some(tail) = snapshot.last() else {
			return CursorAdvance::Ignored;
		};
		let advance = match &self.last_item {
			None => CursorAdvance::Initial(snapshot),
			Some(last) => match snapshot.iter().rposition(|item| item == last) {
				Some(index) => CursorAdvance::Resumed(&snapshot[index + 1..]),
				None => CursorAdvance::Replayed(snapshot),
			},
		};

		self.last_item = Some(tail.clone());

		advance
	}
}
impl<T> Default for DispatchCursor<T> {
	fn default() -> Self {
		Self { last_item: None }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn advance_yields_only_unseen_suffixes() {
		let mut cursor = DispatchCursor::default();

		assert_eq!(cursor.advance(&[1, 2]), CursorAdvance::Initial(&[1, 2][..]));
		assert_eq!(cursor.advance(&[1, 2, 3]), CursorAdvance::Resumed(&[3][..]));
		assert_eq!(cursor.advance(&[2, 3, 4]), CursorAdvance::Resumed(&[4][..]));
		assert_eq!(cursor.advance(&[2, 3, 4]).items(), &[] as &[i32]);
		assert_eq!(cursor.last_item(), Some(&4));
	}

	#[test]
	fn missing_tail_replays_everything() {
		let mut cursor = DispatchCursor::default();

		cursor.advance(&[1, 2]);

		assert_eq!(cursor.advance(&[5, 6, 7]), CursorAdvance::Replayed(&[5, 6, 7][..]));
		assert_eq!(cursor.last_item(), Some(&7));
	}

	#[test]
	fn empty_snapshot_leaves_cursor_untouched() {
		let mut cursor = DispatchCursor::default();

		cursor.advance(&[1, 2]);

		assert_eq!(cursor.advance(&[]), CursorAdvance::Ignored);
		assert_eq!(cursor.last_item(), Some(&2));
	}

	#[test]
	fn repeated_values_resume_after_latest_occurrence() {
		let mut cursor = DispatchCursor::default();

		cursor.advance(&[7, 8]);

		assert_eq!(cursor.advance(&[8, 9, 8, 10]), CursorAdvance::Resumed(&[10][..]));
	}
}
