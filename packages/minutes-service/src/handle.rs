use std::sync::{Arc, OnceLock};

/// A lazily initialised, process-wide value.
///
/// Reads after initialisation are a single atomic load. Every successful
/// [`SharedHandle::get_or_try_init`] returns the same `Arc`.
pub struct SharedHandle<T> {
	cell: OnceLock<Arc<T>>,
}
impl<T> SharedHandle<T> {
	pub const fn new() -> Self {
		Self { cell: OnceLock::new() }
	}

	pub fn get(&self) -> Option<Arc<T>> {
		self.cell.get().cloned()
	}

	/// Runs `init` if the handle is still empty. A failing `init` leaves it empty, so a later
	/// call retries. Racing first calls may each run `init`; only one result is kept.
	pub fn get_or_try_init<E>(&self, init: impl FnOnce() -> Result<T, E>) -> Result<Arc<T>, E> {
		if let Some(value) = self.cell.get() {
			return Ok(value.clone());
		}

		let value = Arc::new(init()?);

		Ok(self.cell.get_or_init(|| value).clone())
	}
}
impl<T> Default for SharedHandle<T> {
	fn default() -> Self {
		Self::new()
	}
}
