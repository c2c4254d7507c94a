//! OAuth 1.0a for the Xero accounting API: request signing, token lifecycles, and signed calls
//! for private, public, and partner applications from one [`handler::RequestHandler`].

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod obs;
pub mod signer;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// crates.io
	use percent_encoding::percent_decode_str;
	// self
	use crate::http::{HttpClient, HttpFuture, HttpRequest, HttpResponse};

	/// Failure injected by [`ScriptedHttpClient::push_transport_error`].
	#[derive(Debug, ThisError)]
	#[error("{0}")]
	pub struct ScriptedTransportError(pub String);

	/// In-memory transport replaying queued responses and recording every request.
	#[derive(Debug, Default)]
	pub struct ScriptedHttpClient {
		responses: Mutex<VecDeque<Result<HttpResponse, ScriptedTransportError>>>,
		requests: Mutex<Vec<HttpRequest>>,
	}
	impl ScriptedHttpClient {
		/// Creates a client with an empty script.
		pub fn new() -> Self {
			Self::default()
		}

		/// Queues a raw response.
		pub fn push(&self, status: u16, body: impl Into<Vec<u8>>) {
			self.responses.lock().push_back(Ok(HttpResponse { status, body: body.into() }));
		}

		/// Queues a form-encoded token endpoint response.
		pub fn push_form(&self, status: u16, body: &str) {
			self.push(status, body.as_bytes());
		}

		/// Queues a JSON response.
		pub fn push_json(&self, status: u16, value: serde_json::Value) {
			self.push(status, value.to_string());
		}

		/// Queues a transport failure.
		pub fn push_transport_error(&self, message: &str) {
			self.responses.lock().push_back(Err(ScriptedTransportError(message.to_owned())));
		}

		/// Returns every request executed so far, in order.
		pub fn requests(&self) -> Vec<HttpRequest> {
			self.requests.lock().clone()
		}
	}
	impl HttpClient for ScriptedHttpClient {
		type TransportError = ScriptedTransportError;

		fn execute(&self, request: HttpRequest) -> HttpFuture<Self::TransportError> {
			self.requests.lock().push(request);

			let next = self.responses.lock().pop_front().unwrap_or_else(|| {
				Err(ScriptedTransportError("No scripted response is queued.".into()))
			});

			Box::pin(async move { next })
		}
	}

	/// Extracts and percent-decodes `name` from an `Authorization: OAuth ...` header.
	pub fn oauth_field(header: &str, name: &str) -> Option<String> {
		header.strip_prefix("OAuth ")?.split(',').find_map(|pair| {
			let (key, value) = pair.trim().split_once('=')?;

			(key == name).then(|| {
				percent_decode_str(value.trim_matches('"')).decode_utf8_lossy().into_owned()
			})
		})
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		path::PathBuf,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
