//! Cache-on-first-success memoized value shared by concurrent callers.

// self
use crate::_prelude::*;

/// Boxed future returned by a [`Lazy`] supplier.
pub type LazyFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;

type Supplier<T> = Arc<dyn Fn() -> LazyFuture<T> + Send + Sync>;

/// Memoizes the first successful result of a fallible async supplier.
///
/// Reads go through a shared slot; when it is empty, callers serialize on an async mutex and
/// re-check the slot before invoking the supplier, so at most one computation runs at a time.
/// Failures are returned to the caller that observed them and never cached. Clones share state.
pub struct Lazy<T> {
	slot: Arc<RwLock<Option<T>>>,
	compute: Arc<AsyncMutex<()>>,
	supplier: Supplier<T>,
}
impl<T> Lazy<T>
where
	T: 'static + Clone + Send + Sync,
{
	/// Wraps `supplier`; nothing runs until the first [`get`](Self::get).
	pub fn new<F, Fut>(supplier: F) -> Self
	where
		F: 'static + Fn() -> Fut + Send + Sync,
		Fut: 'static + Future<Output = Result<T>> + Send,
	{
		Self {
			slot: Default::default(),
			compute: Default::default(),
			supplier: Arc::new(move || Box::pin(supplier())),
		}
	}

	/// Returns the cached value, computing it first when unset.
	pub async fn get(&self) -> Result<T> {
		if let Some(value) = self.peek() {
			return Ok(value);
		}

		let _guard = self.compute.lock().await;

		if let Some(value) = self.peek() {
			return Ok(value);
		}

		let value = (self.supplier)().await?;

		*self.slot.write() = Some(value.clone());

		Ok(value)
	}

	/// Returns the cached value without computing.
	pub fn peek(&self) -> Option<T> {
		self.slot.read().clone()
	}

	/// Clears the cached value so the next caller recomputes.
	pub fn invalidate(&self) {
		self.slot.write().take();
	}
}
impl<T> Clone for Lazy<T> {
	fn clone(&self) -> Self {
		Self {
			slot: self.slot.clone(),
			compute: self.compute.clone(),
			supplier: self.supplier.clone(),
		}
	}
}
impl<T> Debug for Lazy<T>
where
	T: Debug,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Lazy").field("value", &*self.slot.read()).finish_non_exhaustive()
	}
}
