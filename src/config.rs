//! Validated application configuration consumed by the request handler.
//!
//! [`ApplicationConfig::builder`] checks field presence, parses the signing method and
//! endpoints, and fills defaults from the application type's [`TokenPolicy`].

/// Application types and their token policy table.
pub mod application;
/// Builder API for assembling configurations.
pub mod builder;

pub use application::*;
pub use builder::*;

// self
use crate::{
	_prelude::*,
	auth::{AuthData, TokenSecret},
	error::ConfigError,
	signer::SignatureMethod,
};

/// Default accounting API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.xero.com/api.xro/2.0";
/// Default OAuth endpoint hosting `RequestToken`, `AccessToken`, and `Authorize`.
pub const DEFAULT_OAUTH_ENDPOINT: &str = "https://api.xero.com/oauth";
/// Callback used when the application registers none (out-of-band verifier).
pub const DEFAULT_CALLBACK: &str = "oob";

/// Immutable consumer credentials and endpoints for one application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplicationCredentials {
	/// OAuth consumer key.
	pub consumer_key: String,
	/// OAuth consumer secret; callers must avoid logging it.
	pub consumer_secret: TokenSecret,
	/// Signing method applied to every request.
	pub signature_method: SignatureMethod,
	/// PEM private key path used by RSA-SHA1.
	pub private_key: Option<PathBuf>,
	/// Callback URL sent as `oauth_callback`.
	pub callback_url: String,
	/// Base URL for data calls.
	pub endpoint: Url,
	/// Base URL for token exchanges and user authorization.
	pub oauth_endpoint: Url,
}
impl ApplicationCredentials {
	/// Joins `path` onto the data endpoint.
	pub fn api_url(&self, path: &str) -> Result<Url, ConfigError> {
		join_url(&self.endpoint, path)
	}

	/// Joins `segment` (e.g. `RequestToken`) onto the OAuth endpoint.
	pub fn oauth_url(&self, segment: &str) -> Result<Url, ConfigError> {
		join_url(&self.oauth_endpoint, segment)
	}

	/// Builds the user authorization URL for a request token.
	pub fn authorization_url(&self, token: &str) -> Result<Url, ConfigError> {
		let mut url = self.oauth_url("Authorize")?;

		url.query_pairs_mut().append_pair("oauth_token", token);

		Ok(url)
	}
}

/// Complete handler configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplicationConfig {
	/// Trust model of the application.
	pub application_type: ApplicationType,
	/// Consumer credentials and endpoints.
	pub credentials: ApplicationCredentials,
	/// Token state the handler starts from.
	pub auth_data: AuthData,
	/// Timeout applied to token exchanges and data calls.
	pub timeout: Option<StdDuration>,
}
impl ApplicationConfig {
	/// Creates an empty builder.
	pub fn builder() -> ApplicationConfigBuilder {
		ApplicationConfigBuilder::default()
	}

	/// Token policy of the configured application type.
	pub fn policy(&self) -> TokenPolicy {
		self.application_type.policy()
	}
}

fn join_url(base: &Url, path: &str) -> Result<Url, ConfigError> {
	let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), path.trim_start_matches('/'));

	Url::parse(&joined).map_err(|e| ConfigError::undefined(format!("invalid URL `{joined}`"), e))
}
