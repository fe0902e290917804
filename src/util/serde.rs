//! Serializable identifiers shared across the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a capacity-bounded round.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(pub String);

/// Identifier of an organization member, already validated by the identity layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub String);

macro_rules! string_id {
    ($ty:ident) => {
        impl $ty {
            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $ty {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(RoundId);
string_id!(MemberId);

/// Who initiated a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    /// The member acting on their own record.
    Member,
    /// An organization administrator.
    Admin,
    /// The engine itself (admission and promotion).
    System,
}

impl Actor {
    /// Stable lowercase name for logs and audit rows.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
            Self::System => "system",
        }
    }

    /// Administrators and the engine bypass member-facing restrictions.
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::Admin | Self::System)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
