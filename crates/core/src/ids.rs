// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque identifier newtypes for values the orchestrator does not mint
//! itself — tracker-assigned session/issue ids, configured repository ids,
//! and the resume token an agent process emits on `system-init`.
//!
//! These are thin `String` wrappers, not a locally-minted compact id type,
//! because their shape is owned by an external system, not by us — we
//! never generate one, only parse and round-trip it.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! opaque_string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_string_id! {
    /// Tracker-assigned identifier for one conversation thread.
    ///
    /// Stable for the lifetime of the thread; the orchestrator never
    /// generates one, only receives it on webhook events.
    SessionId
}

opaque_string_id! {
    /// Tracker-assigned stable issue id (not the human-readable identifier
    /// like `CEE-42` — see [`crate::session::IssueRef`] for both).
    IssueId
}

opaque_string_id! {
    /// Id of a [`crate::repository::RepositoryConfig`] entry, unique within
    /// one config file.
    RepositoryId
}

opaque_string_id! {
    /// Opaque resume token emitted by the agent process's `system-init`
    /// event and accepted back on `resume`. Meaningless to us beyond
    /// round-tripping it.
    AgentToken
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
