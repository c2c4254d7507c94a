//! OAuth 1.0a signature computation (HMAC-SHA1 and RSA-SHA1).
//!
//! The signer owns only what signing needs: the method, the consumer secret, and an optional
//! private-key path. Token secrets arrive per call so the signer stays independent from the
//! handler's mutable token state.

mod method;
mod oauth;
mod parameters;

pub use method::*;
pub use oauth::*;
pub use parameters::*;

// std
use std::path::Path;
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, pkcs1::DecodeRsaPrivateKey, pkcs8::DecodePrivateKey};
use sha1::{Digest, Sha1};
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

type HmacSha1 = Hmac<Sha1>;

// RFC 3986 section 2.3: only ALPHA, DIGIT, '-', '.', '_', '~' stay unescaped.
const OAUTH_ENCODE_SET: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Percent-encodes `value` with the RFC 3986 unreserved set and uppercase hex digits.
pub fn percent_encode(value: &str) -> String {
	utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// Builds `METHOD&encode(url)&encode(normalized parameters)`.
///
/// `params` must not contain `oauth_signature`.
pub fn signature_base_string(http_method: &str, url: &str, params: &ParameterSet) -> String {
	format!(
		"{}&{}&{}",
		http_method.to_ascii_uppercase(),
		percent_encode(url),
		percent_encode(&params.normalized())
	)
}

/// Computes `oauth_signature` values for one application.
#[derive(Clone)]
pub struct Signer {
	method: SignatureMethod,
	consumer_secret: TokenSecret,
	private_key: Option<PathBuf>,
}
impl Signer {
	/// Creates a signer for `method` keyed with `consumer_secret`.
	pub fn new(method: SignatureMethod, consumer_secret: impl Into<String>) -> Self {
		Self { method, consumer_secret: TokenSecret::new(consumer_secret), private_key: None }
	}

	/// Sets the PEM private key path used by RSA-SHA1.
	pub fn with_private_key(mut self, path: impl Into<PathBuf>) -> Self {
		self.private_key = Some(path.into());

		self
	}

	/// Returns the configured signature method.
	pub fn method(&self) -> SignatureMethod {
		self.method
	}

	/// Signs a request and returns the base64-encoded signature.
	///
	/// `url` is the normalized request URL without query string. `token_secret` is ignored by
	/// RSA-SHA1 and may be empty for HMAC-SHA1 before a token has been issued.
	pub fn sign(
		&self,
		http_method: &str,
		url: &str,
		params: &ParameterSet,
		token_secret: &str,
	) -> Result<String, ConfigError> {
		let base = signature_base_string(http_method, url, params);

		match self.method {
			SignatureMethod::HmacSha1 => self.sign_hmac_sha1(&base, token_secret),
			SignatureMethod::RsaSha1 => self.sign_rsa_sha1(&base),
		}
	}

	fn sign_hmac_sha1(&self, base: &str, token_secret: &str) -> Result<String, ConfigError> {
		let key = format!(
			"{}&{}",
			percent_encode(self.consumer_secret.expose()),
			percent_encode(token_secret)
		);
		let mut mac = HmacSha1::new_from_slice(key.as_bytes()).map_err(|_| {
			ConfigError::Undefined { reason: "HMAC-SHA1 rejected the signing key".into(), source: None }
		})?;

		mac.update(base.as_bytes());

		Ok(STANDARD.encode(mac.finalize().into_bytes()))
	}

	fn sign_rsa_sha1(&self, base: &str) -> Result<String, ConfigError> {
		let path = self
			.private_key
			.as_deref()
			.ok_or_else(|| ConfigError::PrivateKeyNotFound { path: PathBuf::new(), source: None })?;
		let key = load_private_key(path)?;
		let digest = Sha1::digest(base.as_bytes());
		let signature = key
			.sign(Pkcs1v15Sign::new::<Sha1>(), &digest)
			.map_err(|_| ConfigError::PrivateKeyInvalid { path: path.to_path_buf() })?;

		Ok(STANDARD.encode(signature))
	}
}
impl Debug for Signer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Signer")
			.field("method", &self.method)
			.field("consumer_secret", &self.consumer_secret)
			.field("private_key", &self.private_key)
			.finish()
	}
}

fn load_private_key(path: &Path) -> Result<RsaPrivateKey, ConfigError> {
	let bytes = std::fs::read(path).map_err(|e| ConfigError::PrivateKeyNotFound {
		path: path.to_path_buf(),
		source: Some(e),
	})?;
	let invalid = || ConfigError::PrivateKeyInvalid { path: path.to_path_buf() };
	let pem = std::str::from_utf8(&bytes).map_err(|_| invalid())?;

	RsaPrivateKey::from_pkcs1_pem(pem)
		.or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
		.map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const URL: &str = "http://localhost:8082/";
	const SPECIAL: &str = "some+value_with(many){special} symbols<>!*'";

	fn fixture(name: &str) -> PathBuf {
		Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
	}

	fn vectors() -> [ParameterSet; 3] {
		[
			ParameterSet::from([("key", "value")]),
			ParameterSet::new().with("key", vec!["value1", "value2"]),
			ParameterSet::from([("key", SPECIAL)]),
		]
	}

	#[test]
	fn base_string_encodes_url_and_parameters() {
		let [single, multiple, special] = vectors();

		assert_eq!(
			signature_base_string("get", URL, &single),
			"GET&http%3A%2F%2Flocalhost%3A8082%2F&key%3Dvalue"
		);
		assert_eq!(
			signature_base_string("GET", URL, &multiple),
			"GET&http%3A%2F%2Flocalhost%3A8082%2F&key%3Dvalue1%26key%3Dvalue2"
		);
		assert_eq!(
			signature_base_string("GET", URL, &special),
			"GET&http%3A%2F%2Flocalhost%3A8082%2F&key%3Dsome%252Bvalue_with%2528many%2529%257Bspecial%257D%2520symbols%253C%253E%2521%252A%2527"
		);
	}

	#[test]
	fn hmac_sha1_signatures_are_reproducible() {
		let signer = Signer::new(SignatureMethod::HmacSha1, "");
		let expected =
			["lVbOBzouFcQRiEojE7q3ZsNoEto=", "/CCpy/zVTYPrYQJIb/nT+imlQdw=", "6q4LKua/vKE7AuSFqoU26SQ3ovg="];

		for (params, expected) in vectors().iter().zip(expected) {
			let first = signer.sign("GET", URL, params, "").expect("HMAC signing should succeed.");
			let second = signer.sign("GET", URL, params, "").expect("HMAC signing should succeed.");

			assert_eq!(first, expected);
			assert_eq!(first, second);
		}
	}

	#[test]
	fn hmac_sha1_key_encodes_both_secrets() {
		let signer = Signer::new(SignatureMethod::HmacSha1, "cs&x");
		let params = ParameterSet::from([("key", "value")]);
		let signature =
			signer.sign("GET", URL, &params, "ts y").expect("HMAC signing should succeed.");

		assert_eq!(signature, "sLtCzdaNvXOrqWw+2einAUotoS8=");
	}

	#[test]
	fn rsa_sha1_signs_with_pem_key() {
		let signer = Signer::new(SignatureMethod::RsaSha1, "")
			.with_private_key(fixture("privatekey.pem"));
		let expected = [
			"RCeXMzO5w0FGrkZVfk6rIZxGVdl74UxDGo7jcteWdjD5+NUW3t6/LVvVF2OAjO6jC3Wof0cSQ8KzIPGtmd88XNfwlRD9REunDUYYqS275GUieYJ/IqqOB8PY9f5gnDi9crF7SlU9Hz98mWkaPRptVgGEaxPDq2bkYLtWJfjFnyA=",
			"fGvMo/HLnUZH5mhhDNq3d74tOfRfB4WCuuvZzcHK9lrct9Pm/sgjahZgQgjH2NO3fwLM4wsKd5ndaSod6JNWK6rekSSYvbF4IgnYhLna1wK/Y95EI58qcPVXqpj2jsN41tliYE9+5waEvuL5253yhVqqj9HE8f0rZj5/GMB/jtA=",
			"ko9ovi0T1MTsvRcfhedSnxm53lTz/hhdTZzkoW4dMR1Fg9JTL+NmNXolbqNPo78YFyj4wFEaUs1U2tB2eSqU5mgnpDAHBlH4L4IBR0Bwn0iCB+elvw4J2A4jC7IAh66q1XLM+BWYy14+IV5yr1EcxY0Qv5Lo6oRBbbXUNEas90I=",
		];

		for (params, expected) in vectors().iter().zip(expected) {
			let signature =
				signer.sign("GET", URL, params, "ignored").expect("RSA signing should succeed.");

			assert_eq!(signature, expected);
		}
	}

	#[test]
	fn rsa_sha1_rejects_invalid_pem() {
		let path = fixture("privatekey_invalid.pem");
		let signer = Signer::new(SignatureMethod::RsaSha1, "").with_private_key(&path);
		let err = signer
			.sign("GET", "/", &ParameterSet::new(), "")
			.expect_err("Invalid PEM must be rejected.");

		assert!(matches!(&err, ConfigError::PrivateKeyInvalid { path: p } if *p == path));
		assert_eq!(err.code(), 11006);
	}

	#[test]
	fn rsa_sha1_rejects_missing_key_file() {
		let signer = Signer::new(SignatureMethod::RsaSha1, "")
			.with_private_key("/tmp/some-file-does-not-exist");
		let err = signer
			.sign("GET", "/", &ParameterSet::new(), "")
			.expect_err("Missing key file must be rejected.");

		assert!(matches!(err, ConfigError::PrivateKeyNotFound { .. }));
		assert!(err.to_string().contains("/tmp/some-file-does-not-exist"));
		assert_eq!(err.code(), 11005);
	}

	#[test]
	fn debug_output_redacts_consumer_secret() {
		let signer = Signer::new(SignatureMethod::HmacSha1, "super-secret");

		assert!(!format!("{signer:?}").contains("super-secret"));
	}
}
