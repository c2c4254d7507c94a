// self
use crate::{
	_prelude::*,
	auth::{AuthData, TokenSecret},
	config::{
		ApplicationConfig, ApplicationCredentials, ApplicationType, DEFAULT_CALLBACK,
		DEFAULT_ENDPOINT, DEFAULT_OAUTH_ENDPOINT, join_url,
	},
	error::ConfigError,
	signer::SignatureMethod,
};

/// Builder for [`ApplicationConfig`] values.
#[derive(Debug, Default)]
pub struct ApplicationConfigBuilder {
	/// OAuth consumer key (required).
	pub key: Option<String>,
	/// OAuth consumer secret.
	pub secret: Option<TokenSecret>,
	/// Application type (required).
	pub application_type: Option<ApplicationType>,
	/// Raw signing method override, validated at build time.
	pub sign_with: Option<String>,
	/// PEM private key path.
	pub private_key: Option<PathBuf>,
	/// Callback URL override.
	pub callback_url: Option<String>,
	/// Data endpoint override.
	pub endpoint: Option<String>,
	/// OAuth endpoint override.
	pub oauth_endpoint: Option<String>,
	/// Restored token state.
	pub auth_data: Option<AuthData>,
	/// Request timeout.
	pub timeout: Option<StdDuration>,
}
impl ApplicationConfigBuilder {
	/// Sets the consumer key.
	pub fn key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());

		self
	}

	/// Sets the consumer secret.
	pub fn secret(mut self, secret: impl Into<String>) -> Self {
		self.secret = Some(TokenSecret::new(secret));

		self
	}

	/// Sets the application type.
	pub fn application_type(mut self, application_type: ApplicationType) -> Self {
		self.application_type = Some(application_type);

		self
	}

	/// Overrides the signing method (`HMAC-SHA1` or `RSA-SHA1`).
	pub fn sign_with(mut self, method: impl Into<String>) -> Self {
		self.sign_with = Some(method.into());

		self
	}

	/// Sets the PEM private key path used by RSA-SHA1.
	pub fn private_key(mut self, path: impl Into<PathBuf>) -> Self {
		self.private_key = Some(path.into());

		self
	}

	/// Overrides the callback URL.
	pub fn callback_url(mut self, url: impl Into<String>) -> Self {
		self.callback_url = Some(url.into());

		self
	}

	/// Overrides the data endpoint.
	pub fn endpoint(mut self, url: impl Into<String>) -> Self {
		self.endpoint = Some(url.into());

		self
	}

	/// Overrides the OAuth endpoint.
	pub fn oauth_endpoint(mut self, url: impl Into<String>) -> Self {
		self.oauth_endpoint = Some(url.into());

		self
	}

	/// Seeds the handler with previously captured token state.
	pub fn auth_data(mut self, data: AuthData) -> Self {
		self.auth_data = Some(data);

		self
	}

	/// Applies a timeout to token exchanges and data calls.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ApplicationConfig, ConfigError> {
		let consumer_key = self.key.filter(|key| !key.is_empty()).ok_or(ConfigError::MissingKey)?;
		let application_type = self.application_type.ok_or(ConfigError::MissingApplicationType)?;
		let policy = application_type.policy();
		let signature_method = match self.sign_with.as_deref() {
			Some(raw) => raw.parse::<SignatureMethod>()?,
			None => policy.default_signature,
		};
		let consumer_secret = self.secret.unwrap_or_else(|| TokenSecret::new(""));
		let custom_endpoint = self.endpoint.as_deref().is_some_and(|v| !v.is_empty());
		let endpoint = parse_endpoint("endpoint", self.endpoint.as_deref(), DEFAULT_ENDPOINT)?;
		// A custom data endpoint hosts its own `oauth` segment unless told otherwise.
		let oauth_endpoint = match self.oauth_endpoint.as_deref().filter(|v| !v.is_empty()) {
			Some(raw) => parse_endpoint("oauth_endpoint", Some(raw), DEFAULT_OAUTH_ENDPOINT)?,
			None if custom_endpoint => join_url(&endpoint, "oauth")?,
			None => parse_endpoint("oauth_endpoint", None, DEFAULT_OAUTH_ENDPOINT)?,
		};
		let callback_url = self
			.callback_url
			.filter(|url| !url.is_empty())
			.unwrap_or_else(|| DEFAULT_CALLBACK.to_owned());
		let auth_data = match self.auth_data {
			Some(data) => data,
			None if !policy.three_legged => AuthData::two_legged(&consumer_key, &consumer_secret),
			None => AuthData::default(),
		};

		Ok(ApplicationConfig {
			application_type,
			credentials: ApplicationCredentials {
				consumer_key,
				consumer_secret,
				signature_method,
				private_key: self.private_key,
				callback_url,
				endpoint,
				oauth_endpoint,
			},
			auth_data,
			timeout: self.timeout,
		})
	}
}

fn parse_endpoint(
	name: &'static str,
	value: Option<&str>,
	default: &str,
) -> Result<Url, ConfigError> {
	let raw = value.filter(|v| !v.is_empty()).unwrap_or(default);

	Url::parse(raw).map_err(|e| ConfigError::undefined(format!("{name} `{raw}` is not a URL"), e))
}
