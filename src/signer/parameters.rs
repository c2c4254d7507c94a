//! Caller-supplied request parameters and their OAuth normalization.

// std
use std::collections::btree_map;
// self
use crate::{_prelude::*, signer::percent_encode};

/// A single parameter value, or several values sharing one name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
	/// One value.
	Single(String),
	/// Several values emitted as repeated `name=value` pairs.
	Multiple(Vec<String>),
}
impl ParamValue {
	/// Iterates over every value held by the entry.
	pub fn values(&self) -> impl Iterator<Item = &str> {
		let slice = match self {
			Self::Single(value) => std::slice::from_ref(value),
			Self::Multiple(values) => values.as_slice(),
		};

		slice.iter().map(String::as_str)
	}
}
impl From<String> for ParamValue {
	fn from(value: String) -> Self {
		Self::Single(value)
	}
}
impl From<&str> for ParamValue {
	fn from(value: &str) -> Self {
		Self::Single(value.to_owned())
	}
}
impl From<Vec<String>> for ParamValue {
	fn from(values: Vec<String>) -> Self {
		Self::Multiple(values)
	}
}
impl From<Vec<&str>> for ParamValue {
	fn from(values: Vec<&str>) -> Self {
		Self::Multiple(values.into_iter().map(str::to_owned).collect())
	}
}

/// Name-to-value mapping used for query strings, JSON bodies, and signature bases.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, ParamValue>);
impl ParameterSet {
	/// Creates an empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or replaces a parameter.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
		self.0.insert(name.into(), value.into());

		self
	}

	/// Builder-style variant of [`ParameterSet::insert`].
	pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
		self.insert(name, value);

		self
	}

	/// Returns the entry stored under `name`.
	pub fn get(&self, name: &str) -> Option<&ParamValue> {
		self.0.get(name)
	}

	/// Returns the first value stored under `name`.
	pub fn first(&self, name: &str) -> Option<&str> {
		self.get(name).and_then(|value| value.values().next())
	}

	/// Returns `true` when no parameters are present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Number of distinct parameter names.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Iterates over `(name, entry)` pairs in name order.
	pub fn iter(&self) -> btree_map::Iter<'_, String, ParamValue> {
		self.0.iter()
	}

	/// Iterates over flattened `(name, value)` pairs.
	pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().flat_map(|(name, value)| value.values().map(move |v| (name.as_str(), v)))
	}

	/// Copies every entry of `other` into `self`, replacing duplicates.
	pub fn merge(&mut self, other: &ParameterSet) {
		for (name, value) in other.iter() {
			self.0.insert(name.clone(), value.clone());
		}
	}

	/// Keeps only the entries for which `keep` returns `true`.
	pub fn retain(&mut self, mut keep: impl FnMut(&str, &ParamValue) -> bool) {
		self.0.retain(|name, value| keep(name, value));
	}

	/// Produces the normalized parameter string used in signature base strings.
	///
	/// Names and values are percent-encoded first, then sorted by name with ties broken by
	/// value, and finally joined as `name=value` pairs separated by `&`.
	pub fn normalized(&self) -> String {
		let mut encoded = self
			.pairs()
			.map(|(name, value)| (percent_encode(name), percent_encode(value)))
			.collect::<Vec<_>>();

		encoded.sort();

		let mut buf = String::new();

		for (idx, (name, value)) in encoded.iter().enumerate() {
			if idx > 0 {
				buf.push('&');
			}

			buf.push_str(name);
			buf.push('=');
			buf.push_str(value);
		}

		buf
	}
}
impl<K, V> FromIterator<(K, V)> for ParameterSet
where
	K: Into<String>,
	V: Into<ParamValue>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}
impl<K, V, const N: usize> From<[(K, V); N]> for ParameterSet
where
	K: Into<String>,
	V: Into<ParamValue>,
{
	fn from(entries: [(K, V); N]) -> Self {
		entries.into_iter().collect()
	}
}
impl<'a> IntoIterator for &'a ParameterSet {
	type IntoIter = btree_map::Iter<'a, String, ParamValue>;
	type Item = (&'a String, &'a ParamValue);

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
