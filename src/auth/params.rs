//! Caller-owned protocol parameters forwarded to the identity provider.

// self
use crate::_prelude::*;

/// Opaque, ordered set of extra authorize parameters (scope, state, audience, ...).
///
/// Strategies never rewrite the caller's values. A few keys are owned by the web flow
/// itself (see [`AuthParameters::RESERVED`]); those are skipped when the authorize URL is
/// built so a caller cannot clobber the PKCE challenge or the redirect target.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthParameters(BTreeMap<String, String>);
impl AuthParameters {
	/// Keys written by the web strategy that caller values cannot override.
	pub const RESERVED: [&'static str; 6] = [
		"client_id",
		"code_challenge",
		"code_challenge_method",
		"connection",
		"redirect_uri",
		"response_type",
	];

	/// Creates an empty parameter set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces a parameter, builder style.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.insert(key, value);

		self
	}

	/// Sets the `scope` parameter.
	pub fn with_scope(self, scope: impl Into<String>) -> Self {
		self.with("scope", scope)
	}

	/// Sets the `state` parameter; the web flow then uses it instead of a random value.
	pub fn with_state(self, state: impl Into<String>) -> Self {
		self.with("state", state)
	}

	/// Sets the `audience` parameter.
	pub fn with_audience(self, audience: impl Into<String>) -> Self {
		self.with("audience", audience)
	}

	/// Sets `connection_scope`: upstream scopes requested from the social or enterprise IdP.
	pub fn with_connection_scope(self, scope: impl Into<String>) -> Self {
		self.with("connection_scope", scope)
	}

	/// Adds or replaces a parameter.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
		self.0.insert(key.into(), value.into())
	}

	/// Looks up a parameter.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	/// Requested scope, if the caller supplied one.
	pub fn scope(&self) -> Option<&str> {
		self.get("scope")
	}

	/// Caller-supplied state, if any.
	pub fn state(&self) -> Option<&str> {
		self.get("state")
	}

	/// Requested API audience, if any.
	pub fn audience(&self) -> Option<&str> {
		self.get("audience")
	}

	/// Upstream IdP scopes, if any.
	pub fn connection_scope(&self) -> Option<&str> {
		self.get("connection_scope")
	}

	/// Iterates over every parameter in key order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Iterates over parameters the caller may forward verbatim.
	pub fn forwardable(&self) -> impl Iterator<Item = (&str, &str)> {
		self.iter().filter(|(key, _)| !Self::RESERVED.contains(key))
	}

	/// Number of parameters.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no parameters are set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl<K, V> FromIterator<(K, V)> for AuthParameters
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}
