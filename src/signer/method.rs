// self
use crate::{_prelude::*, error::ConfigError};

/// OAuth 1.0a signature methods supported by the signer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureMethod {
	/// HMAC-SHA1 keyed with the consumer secret and token secret.
	#[serde(rename = "HMAC-SHA1")]
	HmacSha1,
	/// RSA-SHA1 (PKCS#1 v1.5) with a PEM private key.
	#[serde(rename = "RSA-SHA1")]
	RsaSha1,
}
impl SignatureMethod {
	/// Returns the `oauth_signature_method` value.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::HmacSha1 => "HMAC-SHA1",
			Self::RsaSha1 => "RSA-SHA1",
		}
	}
}
impl Display for SignatureMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for SignatureMethod {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"HMAC-SHA1" => Ok(Self::HmacSha1),
			"RSA-SHA1" => Ok(Self::RsaSha1),
			other => Err(ConfigError::UnknownSignatureMethod { method: other.to_owned() }),
		}
	}
}
