//! Mutable token state and the pure refresh decision that drives token exchanges.

// self
use crate::{
	_prelude::*,
	auth::{AuthData, TokenResponse, TokenSecret},
	config::TokenPolicy,
};

/// Token exchange the handler must run before a data call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenExchange {
	/// Obtain a fresh request token; ends with an authorization prompt.
	RequestToken,
	/// Trade an authorized request token plus verifier for an access token.
	AccessToken,
	/// Renew an access token through the partner session handle.
	Renewal,
}
impl TokenExchange {
	/// OAuth endpoint segment serving this exchange.
	pub const fn path(self) -> &'static str {
		match self {
			Self::RequestToken => "RequestToken",
			Self::AccessToken | Self::Renewal => "AccessToken",
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::RequestToken => "request_token",
			Self::AccessToken => "access_token",
			Self::Renewal => "renewal",
		}
	}
}
impl Display for TokenExchange {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Token fields to place into the OAuth parameters of one exchange.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExchangeCredentials {
	/// `oauth_token`, empty when none should be sent.
	pub token: String,
	/// Token secret used for the HMAC-SHA1 key.
	pub token_secret: TokenSecret,
	/// `oauth_verifier`, empty when none should be sent.
	pub verifier: String,
	/// `oauth_session_handle`, empty when none should be sent.
	pub session_handle: String,
}

/// Credential pair, expiry, and verification status owned by one handler.
///
/// Decisions are pure functions of the state and a caller-supplied instant; mutations happen
/// only through the `apply_*` methods once a complete token response has been received.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenState {
	token: String,
	token_secret: TokenSecret,
	expires_at: Option<OffsetDateTime>,
	verifier: String,
	verified: bool,
	session_handle: Option<String>,
	authorization_expires_at: Option<OffsetDateTime>,
}
impl TokenState {
	/// Builds state from a caller snapshot.
	///
	/// `verified` is cleared when no token is present, keeping the invariant that a verified
	/// state always carries a token.
	pub fn from_auth_data(data: AuthData) -> Self {
		let verified = data.verified && !data.token.is_empty();

		Self {
			token: data.token,
			token_secret: data.token_secret,
			expires_at: data.expires_at,
			verifier: data.verifier,
			verified,
			session_handle: data.session_handle.filter(|h| !h.is_empty()),
			authorization_expires_at: data.authorization_expires_at,
		}
	}

	/// Returns an owned copy of every field.
	pub fn snapshot(&self) -> AuthData {
		AuthData {
			token: self.token.clone(),
			token_secret: self.token_secret.clone(),
			expires_at: self.expires_at,
			verifier: self.verifier.clone(),
			verified: self.verified,
			session_handle: self.session_handle.clone(),
			authorization_expires_at: self.authorization_expires_at,
		}
	}

	/// Current token.
	pub fn token(&self) -> &str {
		&self.token
	}

	/// Current token secret.
	pub fn token_secret(&self) -> &TokenSecret {
		&self.token_secret
	}

	/// Whether the current token is an authorized access token.
	pub fn is_verified(&self) -> bool {
		self.verified
	}

	/// Stores the verifier returned by the authorization redirect.
	pub fn set_verifier(&mut self, verifier: impl Into<String>) {
		self.verifier = verifier.into();
	}

	/// Decides which exchange, if any, must run before a data call at `now`.
	///
	/// Two-legged policies never exchange tokens. For three-legged policies the checks run in
	/// order: missing token, expired access token, unverified request token, and finally an
	/// elapsed authorization window on a renewable session.
	pub fn plan(&self, now: OffsetDateTime, policy: &TokenPolicy) -> Option<TokenExchange> {
		if !policy.three_legged {
			return None;
		}
		if self.token.is_empty() {
			return Some(TokenExchange::RequestToken);
		}
		if policy.expires && self.expires_at.is_some_and(|at| now >= at) {
			if self.can_renew(policy) {
				return Some(TokenExchange::Renewal);
			}

			return Some(TokenExchange::RequestToken);
		}
		if !self.verified {
			return Some(TokenExchange::AccessToken);
		}
		if self.authorization_expires_at.is_some_and(|at| now >= at) && self.can_renew(policy) {
			return Some(TokenExchange::Renewal);
		}

		None
	}

	/// Token fields to send with `exchange`.
	///
	/// Request-token exchanges carry no token and sign with an empty token secret, so an expired
	/// access token is never presented back to the server.
	pub fn exchange_credentials(&self, exchange: TokenExchange) -> ExchangeCredentials {
		match exchange {
			TokenExchange::RequestToken => ExchangeCredentials::default(),
			TokenExchange::AccessToken => ExchangeCredentials {
				token: self.token.clone(),
				token_secret: self.token_secret.clone(),
				verifier: self.verifier.clone(),
				session_handle: String::new(),
			},
			TokenExchange::Renewal => ExchangeCredentials {
				token: self.token.clone(),
				token_secret: self.token_secret.clone(),
				verifier: String::new(),
				session_handle: self.session_handle.clone().unwrap_or_default(),
			},
		}
	}

	/// Replaces the state with a freshly issued, unauthorized request token.
	pub fn apply_request_token(&mut self, response: TokenResponse) {
		*self = Self { token: response.token, token_secret: response.token_secret, ..Self::default() };
	}

	/// Stores an access token issued by an `AccessToken` or renewal exchange.
	///
	/// Lifetimes are measured from `now`. Session handles are kept only for renewable policies,
	/// and a renewal response without one keeps the previous handle.
	pub fn apply_access_token(
		&mut self,
		response: TokenResponse,
		now: OffsetDateTime,
		policy: &TokenPolicy,
	) {
		self.token = response.token;
		self.token_secret = response.token_secret;
		self.verified = true;
		self.expires_at = response.expires_in.map(|lifetime| now + lifetime);
		self.authorization_expires_at = response.authorization_expires_in.map(|lifetime| now + lifetime);

		if policy.renewable {
			if let Some(handle) = response.session_handle {
				self.session_handle = Some(handle);
			}
		} else {
			self.session_handle = None;
		}
	}

	fn can_renew(&self, policy: &TokenPolicy) -> bool {
		policy.renewable && self.session_handle.is_some()
	}
}
