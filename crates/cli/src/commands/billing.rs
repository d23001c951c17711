// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cyrus billing` / `cyrus set-customer-id`: opaque billing
//! linkage, genuinely out of scope. Both commands exist only so
//! the CLI surface matches the documented command set exactly.

use crate::config_file;
use anyhow::Result;
use std::path::PathBuf;

pub fn run() -> Result<()> {
    println!("Billing is managed outside this CLI. Use `cyrus set-customer-id <id>` to link an installation.");
    Ok(())
}

pub async fn set_customer_id(cyrus_home: PathBuf, id: String) -> Result<()> {
    let (path, mut config) = config_file::read(&cyrus_home).await?;
    config.customer_id = Some(id.clone());
    config_file::write(&path, &config).await?;
    println!("Customer id set to {id:?}");
    Ok(())
}
