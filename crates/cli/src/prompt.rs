// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-oriented stdin prompts for the CLI's interactive wizards
//! (`add-repository`, `refresh-token`).

use std::io::{self, Write};

pub fn ask(label: &str) -> io::Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub fn ask_with_default(label: &str, default: &str) -> io::Result<String> {
    let value = ask(&format!("{label} [{default}]"))?;
    Ok(if value.is_empty() { default.to_string() } else { value })
}

pub fn ask_csv(label: &str) -> io::Result<Vec<String>> {
    Ok(parse_csv(&ask(label)?))
}

pub fn ask_bool(label: &str, default: bool) -> io::Result<bool> {
    let hint = if default { "Y/n" } else { "y/N" };
    Ok(parse_bool(&ask(&format!("{label} [{hint}]"))?, default))
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

fn parse_bool(raw: &str, default: bool) -> bool {
    match raw.trim().to_lowercase().as_str() {
        "" => default,
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    }
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
