// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for outbound calls made by one handler.
#[derive(Debug, Default)]
pub struct HandlerMetrics {
	token_fetches: AtomicU64,
	data_calls: AtomicU64,
	failures: AtomicU64,
}
impl HandlerMetrics {
	/// Returns the number of token exchanges attempted.
	pub fn token_fetches(&self) -> u64 {
		self.token_fetches.load(Ordering::Relaxed)
	}

	/// Returns the number of signed data calls attempted.
	pub fn data_calls(&self) -> u64 {
		self.data_calls.load(Ordering::Relaxed)
	}

	/// Returns the number of exchanges and data calls that failed.
	///
	/// Authorization prompts after a successful request-token exchange are not failures.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_token_fetch(&self) {
		self.token_fetches.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_data_call(&self) {
		self.data_calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
