//! Parser for form-encoded token endpoint responses.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ApiError};

/// Fields returned by `RequestToken` and `AccessToken`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenResponse {
	/// `oauth_token`.
	pub token: String,
	/// `oauth_token_secret`.
	pub token_secret: TokenSecret,
	/// `oauth_expires_in`, in seconds.
	pub expires_in: Option<Duration>,
	/// `oauth_session_handle`.
	pub session_handle: Option<String>,
	/// `oauth_authorization_expires_in`, in seconds.
	pub authorization_expires_in: Option<Duration>,
}
impl TokenResponse {
	/// Parses a successful token endpoint body.
	///
	/// Bodies without both `oauth_token` and `oauth_token_secret` are rejected; an
	/// `oauth_problem` report is folded into the error message.
	pub fn parse(status: u16, body: &[u8]) -> Result<Self, ApiError> {
		let mut token = None;
		let mut token_secret = None;
		let mut expires_in = None;
		let mut session_handle = None;
		let mut authorization_expires_in = None;

		for (key, value) in url::form_urlencoded::parse(body) {
			match key.as_ref() {
				"oauth_token" => token = Some(value.into_owned()),
				"oauth_token_secret" => token_secret = Some(TokenSecret::new(value)),
				"oauth_expires_in" => expires_in = Some(parse_seconds(status, &key, &value)?),
				"oauth_session_handle" => session_handle = Some(value.into_owned()),
				"oauth_authorization_expires_in" =>
					authorization_expires_in = Some(parse_seconds(status, &key, &value)?),
				_ => {},
			}
		}

		match (token, token_secret) {
			(Some(token), Some(token_secret)) if !token.is_empty() => Ok(Self {
				token,
				token_secret,
				expires_in,
				session_handle: session_handle.filter(|h| !h.is_empty()),
				authorization_expires_in,
			}),
			_ if body_reports_problem(body) => Err(ApiError::from_response(status, body)),
			_ => Err(ApiError::new(
				Some(status),
				format!("{status}: token response is missing oauth_token or oauth_token_secret"),
			)),
		}
	}
}

fn parse_seconds(status: u16, key: &str, value: &str) -> Result<Duration, ApiError> {
	value
		.trim()
		.parse::<i64>()
		.map(Duration::seconds)
		.map_err(|e| ApiError::malformed(status, key, e))
}

fn body_reports_problem(body: &[u8]) -> bool {
	url::form_urlencoded::parse(body).any(|(key, _)| key == "oauth_problem")
}
