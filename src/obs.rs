//! Optional observability helpers for token exchanges and data calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `xero_oauth1.call` with the `call` (exchange
//!   or data call) and `stage` (call site) fields, plus a `debug` event for every refresh
//!   decision.
//! - Enable `metrics` to increment the `xero_oauth1_call_total` counter for every
//!   attempt/success/failure, labeled by `call` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, auth::TokenExchange};

/// Outbound call kinds observed by the handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// `RequestToken` exchange.
	RequestToken,
	/// `AccessToken` exchange using a verifier.
	AccessToken,
	/// `AccessToken` exchange using a session handle.
	Renewal,
	/// Signed data call against the API endpoint.
	Data,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::RequestToken => "request_token",
			CallKind::AccessToken => "access_token",
			CallKind::Renewal => "renewal",
			CallKind::Data => "data",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl From<TokenExchange> for CallKind {
	fn from(exchange: TokenExchange) -> Self {
		match exchange {
			TokenExchange::RequestToken => CallKind::RequestToken,
			TokenExchange::AccessToken => CallKind::AccessToken,
			TokenExchange::Renewal => CallKind::Renewal,
		}
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a call.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
