//! Serializable snapshot of a handler's token state.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Token state as seen by callers, used to persist and restore sessions across redirects.
///
/// All seven fields are always present; values not yet known are empty or `None`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthData {
	/// Current request or access token.
	#[serde(default)]
	pub token: String,
	/// Secret paired with `token`; callers must avoid logging it.
	#[serde(default)]
	pub token_secret: TokenSecret,
	/// Instant after which the access token is no longer accepted.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub expires_at: Option<OffsetDateTime>,
	/// Verifier returned to the callback after the user approved the request token.
	#[serde(default)]
	pub verifier: String,
	/// Whether `token` is an authorized access token.
	#[serde(default)]
	pub verified: bool,
	/// Renewal handle issued to partner applications.
	#[serde(default)]
	pub session_handle: Option<String>,
	/// Instant bounding how long `session_handle` may renew the token.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub authorization_expires_at: Option<OffsetDateTime>,
}
impl AuthData {
	/// State for two-legged applications, where the consumer credentials act as the token.
	pub fn two_legged(consumer_key: &str, consumer_secret: &TokenSecret) -> Self {
		Self {
			token: consumer_key.to_owned(),
			token_secret: consumer_secret.clone(),
			verified: true,
			..Default::default()
		}
	}

	/// Restored state for a request token awaiting its exchange.
	pub fn authorized(
		token: impl Into<String>,
		token_secret: impl Into<String>,
		verifier: impl Into<String>,
	) -> Self {
		Self {
			token: token.into(),
			token_secret: TokenSecret::new(token_secret),
			verifier: verifier.into(),
			..Default::default()
		}
	}
}
impl Debug for AuthData {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthData")
			.field("token", &self.token)
			.field("token_secret", &self.token_secret)
			.field("expires_at", &self.expires_at)
			.field("verifier", &self.verifier)
			.field("verified", &self.verified)
			.field("session_handle", &self.session_handle.as_ref().map(|_| "<redacted>"))
			.field("authorization_expires_at", &self.authorization_expires_at)
			.finish()
	}
}
