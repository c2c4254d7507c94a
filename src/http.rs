//! Transport primitives shared by token exchanges and data calls.
//!
//! The handler depends on an HTTP stack only through [`HttpClient`]. Requests arrive fully
//! signed and serialized, so an implementation just moves bytes and reports the status code;
//! it must not retry, since token exchanges are not idempotent.

// self
use crate::{_prelude::*, error::ApiError};

/// Boxed future returned by [`HttpClient::execute`].
pub type HttpFuture<E> = Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + Send>>;

/// HTTP verbs accepted by the handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
	/// `GET`; parameters travel in the query string and are signed.
	Get,
	/// `POST`; parameters travel as a JSON body.
	Post,
	/// `PUT`; parameters travel as a JSON body.
	Put,
	/// `DELETE`; parameters travel as a JSON body.
	Delete,
}
impl HttpMethod {
	/// Uppercase verb as used in signature base strings.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Delete => "DELETE",
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for HttpMethod {
	type Err = ApiError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_uppercase().as_str() {
			"GET" => Ok(Self::Get),
			"POST" => Ok(Self::Post),
			"PUT" => Ok(Self::Put),
			"DELETE" => Ok(Self::Delete),
			_ => Err(ApiError::unsupported_method(s)),
		}
	}
}

/// Fully prepared outbound request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
	/// HTTP verb.
	pub method: HttpMethod,
	/// Absolute URL including any query string.
	pub url: Url,
	/// Header name/value pairs, `Authorization` included.
	pub headers: Vec<(&'static str, String)>,
	/// Serialized request body.
	pub body: Option<Vec<u8>>,
	/// Upper bound for the whole exchange.
	pub timeout: Option<StdDuration>,
}
impl HttpRequest {
	/// Returns the first header value stored under `name` (case-insensitive).
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

/// Status and body of a completed response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Whether the status is in the `2xx` range.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Abstraction over HTTP transports capable of executing signed requests.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared across
/// handlers, and the futures they return must own whatever state they need so they remain
/// `Send` while in flight.
pub trait HttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and resolves once the full response body has been read.
	///
	/// Non-success statuses are returned as responses, not errors.
	fn execute(&self, request: HttpRequest) -> HttpFuture<Self::TransportError>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl std::ops::Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest) -> HttpFuture<Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let method = match request.method {
				HttpMethod::Get => reqwest::Method::GET,
				HttpMethod::Post => reqwest::Method::POST,
				HttpMethod::Put => reqwest::Method::PUT,
				HttpMethod::Delete => reqwest::Method::DELETE,
			};
			let mut builder = client.request(method, request.url);

			for (name, value) in request.headers {
				builder = builder.header(name, value);
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}
			if let Some(timeout) = request.timeout {
				builder = builder.timeout(timeout);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok::<_, ReqwestError>(HttpResponse { status, body })
		})
	}
}
#[cfg(feature = "reqwest")]
impl Debug for ReqwestHttpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ReqwestHttpClient(..)")
	}
}
