//! Who a usage or credit record belongs to.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

const ANONYMOUS_KEY: &str = "anonymous";

/// Identity a quota is tracked against.
///
/// Signed-out visitors share a single anonymous slot per local store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    User(String),
}

impl Identity {
    /// Builds an identity from an optional user id; blank ids are anonymous.
    pub fn from_user_id(user_id: Option<&str>) -> Self {
        match user_id.map(str::trim) {
            Some(id) if !id.is_empty() => Self::User(id.to_string()),
            _ => Self::Anonymous,
        }
    }

    /// Fragment used in storage keys. User ids are prefixed so no account
    /// id can land on the anonymous slot.
    pub fn key_fragment(&self) -> Cow<'_, str> {
        match self {
            Self::Anonymous => Cow::Borrowed(ANONYMOUS_KEY),
            Self::User(id) => Cow::Owned(format!("user-{id}")),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}
