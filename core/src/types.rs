//! Shared primitive types used across the generation pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A stable, unique identifier for any persisted row.
pub type EntityId = String;

pub type ClientId = String;

/// Owning tenant. Organizations themselves live outside this crate.
pub type OrganizationId = String;

/// Error returned when a stored enum label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseLabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseLabelError {}

/// Declares a snake_case label enum with `as_str`, `Display` and `FromStr`.
macro_rules! label_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseLabelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($label => Ok($name::$variant),)+
                    _ => Err(ParseLabelError { kind: $kind, value: s.to_string() }),
                }
            }
        }
    };
}

label_enum!(
    /// Coarse compliance exposure of a client, ordered by severity.
    RiskLevel, "risk level" {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
);

label_enum!(
    /// Monitoring status of one (client, jurisdiction) pair, ordered by severity.
    NexusStatus, "nexus status" {
        Compliant => "compliant",
        Transit => "transit",
        Pending => "pending",
        Warning => "warning",
        Critical => "critical",
    }
);

label_enum!(
    Priority, "priority" {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
);

label_enum!(
    AlertSeverity, "alert severity" {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
);

label_enum!(
    AlertStatus, "alert status" {
        Open => "open",
        Acknowledged => "acknowledged",
        Resolved => "resolved",
    }
);

label_enum!(
    TaskStatus, "task status" {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
    }
);

label_enum!(
    /// Which generator produced a client record.
    RecordSource, "record source" {
        Llm => "llm",
        Fallback => "fallback",
    }
);
