//! Handler-level error types shared across signing, token exchanges, and data calls.

// self
use crate::_prelude::*;

/// Handler-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error code raised after a fresh request token has been issued.
pub const AUTHORIZATION_REQUIRED_CODE: u32 = 11200;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; fatal and never retried.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Upstream or transport failure, including API-reported error payloads.
	#[error(transparent)]
	Api(#[from] ApiError),

	/// A request token was issued and must be authorized by the end user.
	///
	/// This is an expected control-flow signal: redirect the user to `authorization_url`,
	/// then supply the returned verifier before calling again.
	#[error("Auth error {token}: user must authorize oauth_token before it can be used.")]
	AuthorizationRequired {
		/// Freshly issued request token.
		token: String,
		/// URL the end user must visit to approve the request token.
		authorization_url: Url,
	},
}
impl Error {
	/// Returns the numeric code associated with the failure.
	///
	/// Configuration errors use the `110xx` range, authorization prompts use `11200`, and
	/// API errors report the HTTP status (or `0` when the transport never produced one).
	pub fn code(&self) -> u32 {
		match self {
			Self::Config(e) => e.code(),
			Self::Api(e) => e.status.map(u32::from).unwrap_or(0),
			Self::AuthorizationRequired { .. } => AUTHORIZATION_REQUIRED_CODE,
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Catch-all for configuration failures without a dedicated code.
	#[error("Config error: {reason}.")]
	Undefined {
		/// Human-readable description.
		reason: String,
		/// Underlying failure, when available.
		#[source]
		source: Option<BoxError>,
	},
	/// Consumer key was not supplied.
	#[error("Config error: missing key.")]
	MissingKey,
	/// Application type was not supplied.
	#[error("Config error: missing application type.")]
	MissingApplicationType,
	/// Application type is not one of `private`, `public`, or `partner`.
	#[error("Config error {value}: unknown application type.")]
	UnknownApplicationType {
		/// Offending value.
		value: String,
	},
	/// Signing method is not one of `HMAC-SHA1` or `RSA-SHA1`.
	#[error("Config error {method}: unknown signature method.")]
	UnknownSignatureMethod {
		/// Offending value.
		method: String,
	},
	/// Private key file is missing or unreadable.
	#[error("Config error {}: private key not found.", path.display())]
	PrivateKeyNotFound {
		/// Configured key path.
		path: PathBuf,
		/// Underlying IO failure, when a path was configured.
		#[source]
		source: Option<std::io::Error>,
	},
	/// Private key file could not be parsed as a PEM RSA private key.
	#[error("Config error {}: private key invalid.", path.display())]
	PrivateKeyInvalid {
		/// Configured key path.
		path: PathBuf,
	},
}
impl ConfigError {
	/// Builds an [`ConfigError::Undefined`] value wrapping `src`.
	pub fn undefined(
		reason: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Undefined { reason: reason.into(), source: Some(Box::new(src)) }
	}

	/// Returns the `110xx` code for the failure.
	pub fn code(&self) -> u32 {
		match self {
			Self::Undefined { .. } => 11000,
			Self::MissingKey => 11001,
			Self::MissingApplicationType => 11002,
			Self::UnknownApplicationType { .. } => 11003,
			Self::UnknownSignatureMethod { .. } => 11004,
			Self::PrivateKeyNotFound { .. } => 11005,
			Self::PrivateKeyInvalid { .. } => 11006,
		}
	}
}

/// Transport, HTTP, or API-reported failure.
#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct ApiError {
	/// HTTP status code, when a response was received.
	pub status: Option<u16>,
	/// Human-readable message, folded from the response body when possible.
	pub message: String,
	/// Underlying failure, when available.
	#[source]
	pub source: Option<BoxError>,
}
impl ApiError {
	/// Creates an error with an explicit status and message.
	pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
		Self { status, message: message.into(), source: None }
	}

	/// Error returned for verbs outside `GET`, `POST`, `PUT`, and `DELETE`.
	pub fn unsupported_method(method: &str) -> Self {
		Self::new(Some(405), format!("405 Bad HTTP Verb: {method}"))
	}

	/// Wraps a transport failure that never produced an HTTP response.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self {
			status: None,
			message: format!("Transport failure: {src}."),
			source: Some(Box::new(src)),
		}
	}

	/// Wraps a response body that could not be decoded.
	pub fn malformed(
		status: u16,
		what: &str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self {
			status: Some(status),
			message: format!("{status}: malformed {what}: {src}."),
			source: Some(Box::new(src)),
		}
	}

	/// Builds an error from a non-success response, folding known error payload shapes.
	pub fn from_response(status: u16, body: &[u8]) -> Self {
		let text = String::from_utf8_lossy(body);
		let text = text.trim();
		let message = fold_json_problem(text, status)
			.or_else(|| fold_oauth_problem(text).map(|detail| format!("{status}: {detail}")))
			.unwrap_or_else(|| {
				if text.is_empty() {
					format!("{status}: HTTP request failed")
				} else {
					format!("{status}: {text}")
				}
			});

		Self::new(Some(status), message)
	}
}

#[derive(Deserialize)]
struct ProblemBody {
	#[serde(default)]
	status: Option<serde_json::Value>,
	title: Option<String>,
	detail: Option<String>,
	#[serde(default)]
	errors: Option<serde_json::Value>,
}

fn fold_json_problem(text: &str, fallback_status: u16) -> Option<String> {
	if !text.starts_with("{\"") {
		return None;
	}

	let problem = serde_json::from_str::<ProblemBody>(text).ok()?;

	if problem.title.is_none() && problem.detail.is_none() {
		return None;
	}

	let status = match problem.status {
		Some(serde_json::Value::String(s)) => s,
		Some(serde_json::Value::Number(n)) => n.to_string(),
		_ => fallback_status.to_string(),
	};
	let mut message = format!(
		"{status}: {} - {}",
		problem.title.unwrap_or_default(),
		problem.detail.unwrap_or_default()
	);

	if let Some(errors) = problem.errors.filter(|e| !is_empty_json(e)) {
		message.push_str(" - errors: ");
		message.push_str(&errors.to_string());
	}

	Some(message)
}

fn fold_oauth_problem(text: &str) -> Option<String> {
	let mut problem = None;
	let mut advice = None;

	for (key, value) in url::form_urlencoded::parse(text.as_bytes()) {
		match key.as_ref() {
			"oauth_problem" => problem = Some(value.into_owned()),
			"oauth_problem_advice" => advice = Some(value.into_owned()),
			_ => {},
		}
	}

	let problem = problem?;

	Some(match advice {
		Some(advice) => format!("{problem} - {advice}"),
		None => problem,
	})
}

fn is_empty_json(value: &serde_json::Value) -> bool {
	match value {
		serde_json::Value::Null => true,
		serde_json::Value::Array(items) => items.is_empty(),
		serde_json::Value::Object(map) => map.is_empty(),
		serde_json::Value::String(s) => s.is_empty(),
		_ => false,
	}
}
