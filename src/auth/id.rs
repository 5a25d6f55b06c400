//! Validated names for connections and OAuth clients.
//!
//! Connection names travel in the authorize query and in the password grant's `realm`, so
//! they are restricted to the characters identity providers accept in a connection name.
//! Client identifiers are opaque and only need to be printable ASCII.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const NAME_MAX_LEN: usize = 128;

macro_rules! def_name {
	($name:ident, $label:literal, $rules:ident, $doc:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates and wraps `value`.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				let value = value.into();

				$rules.check($label, &value)?;

				Ok(Self(value))
			}

			/// Borrows the raw name.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, "{}({})", $label, self.0)
			}
		}
	};
}

def_name! {
	ConnectionId,
	"Connection",
	CONNECTION_RULES,
	"Name of an identity-provider connection (e.g. `google-oauth2`)."
}
def_name! {
	ClientId,
	"Client",
	CLIENT_RULES,
	"OAuth client identifier registered with the identity provider."
}

/// Why a connection or client name was rejected.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// Nothing was supplied.
	#[error("{kind} name cannot be empty.")]
	Empty {
		/// `Connection` or `Client`.
		kind: &'static str,
	},
	/// A character outside the allowed set was found.
	#[error("{kind} name contains {found:?}, which is not allowed.")]
	InvalidCharacter {
		/// `Connection` or `Client`.
		kind: &'static str,
		/// First offending character.
		found: char,
	},
	/// Connection names must start and end with a letter or digit.
	#[error("{kind} name must start and end with a letter or digit.")]
	Edge {
		/// `Connection` or `Client`.
		kind: &'static str,
	},
	/// Longer than providers accept.
	#[error("{kind} name exceeds {max} characters.")]
	TooLong {
		/// `Connection` or `Client`.
		kind: &'static str,
		/// Maximum permitted length.
		max: usize,
	},
}

const CONNECTION_RULES: NameRules = NameRules {
	accepts: |c| c.is_ascii_alphanumeric() || c == '-' || c == '_',
	alphanumeric_edges: true,
};
const CLIENT_RULES: NameRules =
	NameRules { accepts: |c| c.is_ascii_graphic(), alphanumeric_edges: false };

struct NameRules {
	accepts: fn(char) -> bool,
	alphanumeric_edges: bool,
}
impl NameRules {
	fn check(&self, kind: &'static str, value: &str) -> Result<(), IdentifierError> {
		if value.is_empty() {
			return Err(IdentifierError::Empty { kind });
		}
		if let Some(found) = value.chars().find(|c| !(self.accepts)(*c)) {
			return Err(IdentifierError::InvalidCharacter { kind, found });
		}
		if self.alphanumeric_edges
			&& !(value.starts_with(|c: char| c.is_ascii_alphanumeric())
				&& value.ends_with(|c: char| c.is_ascii_alphanumeric()))
		{
			return Err(IdentifierError::Edge { kind });
		}
		if value.len() > NAME_MAX_LEN {
			return Err(IdentifierError::TooLong { kind, max: NAME_MAX_LEN });
		}

		Ok(())
	}
}
