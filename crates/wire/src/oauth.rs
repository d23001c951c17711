// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth callback query shape: `GET
//! /callback?token=…&workspaceId=…&workspaceName=…`.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackQuery {
    pub token: String,
    pub workspace_id: String,
    pub workspace_name: String,
    /// Correlates this callback with the flow that started it, when the
    /// caller threads one through as an extra query param. Optional: the
    /// Only these three named fields are ones the tracker guarantees.
    #[serde(default)]
    pub state: Option<String>,
}

#[cfg(test)]
#[path = "oauth_tests.rs"]
mod tests;
