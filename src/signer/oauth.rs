//! Per-call OAuth protocol parameters and the `Authorization` header they produce.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	signer::{ParameterSet, SignatureMethod, percent_encode},
};

/// OAuth protocol version advertised on every call.
pub const OAUTH_VERSION: &str = "1.0";

const NONCE_LEN: usize = 32;

/// Ordered `oauth_*` parameters for one outbound call.
///
/// Timestamps and nonces must be unique per request, so a set is built fresh for every call
/// and never reused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthParameters(BTreeMap<&'static str, String>);
impl OAuthParameters {
	/// Builds the base set with a fresh timestamp and nonce.
	pub fn new(consumer_key: &str, method: SignatureMethod, callback: &str) -> Self {
		Self::at(
			consumer_key,
			method,
			callback,
			OffsetDateTime::now_utc().unix_timestamp(),
			random_nonce(),
		)
	}

	/// Builds the base set with an explicit timestamp and nonce.
	pub fn at(
		consumer_key: &str,
		method: SignatureMethod,
		callback: &str,
		timestamp: i64,
		nonce: impl Into<String>,
	) -> Self {
		let mut map = BTreeMap::new();

		map.insert("oauth_consumer_key", consumer_key.to_owned());
		map.insert("oauth_signature_method", method.as_str().to_owned());
		map.insert("oauth_timestamp", timestamp.to_string());
		map.insert("oauth_nonce", nonce.into());
		map.insert("oauth_callback", callback.to_owned());
		map.insert("oauth_version", OAUTH_VERSION.to_owned());

		Self(map)
	}

	/// Adds `oauth_token`; empty tokens are skipped.
	pub fn token(self, token: &str) -> Self {
		self.optional("oauth_token", token)
	}

	/// Adds `oauth_verifier`; empty verifiers are skipped.
	pub fn verifier(self, verifier: &str) -> Self {
		self.optional("oauth_verifier", verifier)
	}

	/// Adds `oauth_session_handle`; empty handles are skipped.
	pub fn session_handle(self, handle: &str) -> Self {
		self.optional("oauth_session_handle", handle)
	}

	/// Returns the value stored under `name`.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.0.get(name).map(String::as_str)
	}

	/// Iterates over `(name, value)` pairs in name order.
	pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
		self.0.iter().map(|(name, value)| (*name, value.as_str()))
	}

	/// Returns the parameters to sign: the OAuth set merged with `extra`.
	///
	/// OAuth entries win over caller entries with the same name.
	pub fn signing_set(&self, extra: Option<&ParameterSet>) -> ParameterSet {
		let mut set = extra.cloned().unwrap_or_default();

		for (name, value) in self.iter() {
			set.insert(name, value);
		}

		set
	}

	/// Renders `OAuth k="v",...` with the signature appended as `oauth_signature`.
	pub fn authorization_header(&self, signature: &str) -> String {
		let mut buf = String::from("OAuth ");

		for (name, value) in self.iter() {
			buf.push_str(name);
			buf.push_str("=\"");
			buf.push_str(&percent_encode(value));
			buf.push_str("\",");
		}

		buf.push_str("oauth_signature=\"");
		buf.push_str(&percent_encode(signature));
		buf.push('"');

		buf
	}

	fn optional(mut self, name: &'static str, value: &str) -> Self {
		if !value.is_empty() {
			self.0.insert(name, value.to_owned());
		}

		self
	}
}

fn random_nonce() -> String {
	rand::rng().sample_iter(Alphanumeric).take(NONCE_LEN).map(char::from).collect()
}
