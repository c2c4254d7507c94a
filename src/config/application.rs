// self
use crate::{_prelude::*, error::ConfigError, signer::SignatureMethod};

/// Application trust models offered by the accounting API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationType {
	/// Two-legged application bound to a single organisation; tokens never expire.
	Private,
	/// Three-legged application; access tokens expire and require re-authorization.
	Public,
	/// Three-legged application whose access tokens renew through a session handle.
	Partner,
}
impl ApplicationType {
	/// Returns the configuration label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Private => "private",
			Self::Public => "public",
			Self::Partner => "partner",
		}
	}

	/// Returns the token policy row for this application type.
	pub const fn policy(self) -> TokenPolicy {
		match self {
			Self::Private => TokenPolicy {
				three_legged: false,
				expires: false,
				renewable: false,
				default_signature: SignatureMethod::RsaSha1,
			},
			Self::Public => TokenPolicy {
				three_legged: true,
				expires: true,
				renewable: false,
				default_signature: SignatureMethod::HmacSha1,
			},
			Self::Partner => TokenPolicy {
				three_legged: true,
				expires: true,
				renewable: true,
				default_signature: SignatureMethod::RsaSha1,
			},
		}
	}
}
impl Display for ApplicationType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for ApplicationType {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"private" => Ok(Self::Private),
			"public" => Ok(Self::Public),
			"partner" => Ok(Self::Partner),
			"" => Err(ConfigError::MissingApplicationType),
			other => Err(ConfigError::UnknownApplicationType { value: other.to_owned() }),
		}
	}
}

/// Token lifecycle rules that distinguish the application types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenPolicy {
	/// Requires the user-authorization redirect (request token, then access token).
	pub three_legged: bool,
	/// Access tokens carry an `oauth_expires_in` lifetime.
	pub expires: bool,
	/// Access tokens renew through `oauth_session_handle` without user interaction.
	pub renewable: bool,
	/// Signing method used when the configuration does not override it.
	pub default_signature: SignatureMethod,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn policy_table_matches_trust_models() {
		let private = ApplicationType::Private.policy();
		let public = ApplicationType::Public.policy();
		let partner = ApplicationType::Partner.policy();

		assert!(!private.three_legged && !private.expires && !private.renewable);
		assert!(public.three_legged && public.expires && !public.renewable);
		assert!(partner.three_legged && partner.expires && partner.renewable);
		assert_eq!(public.default_signature, SignatureMethod::HmacSha1);
		assert_eq!(partner.default_signature, SignatureMethod::RsaSha1);
	}

	#[test]
	fn parses_labels() {
		assert_eq!("partner".parse::<ApplicationType>().ok(), Some(ApplicationType::Partner));
		assert!(matches!(
			"enterprise".parse::<ApplicationType>(),
			Err(ConfigError::UnknownApplicationType { value }) if value == "enterprise"
		));
		assert!(matches!("".parse::<ApplicationType>(), Err(ConfigError::MissingApplicationType)));
	}
}
