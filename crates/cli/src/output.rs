// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Print `value` as pretty JSON, or as the lines `text` renders
pub fn print<T: Serialize>(value: &T, format: OutputFormat, text: impl FnOnce(&T) -> Vec<String>) {
    match format {
        OutputFormat::Text => {
            for line in text(value) {
                println!("{}", line);
            }
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

/// `yes`/`no`/`unknown` for optional flags
pub fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "unknown",
    }
}

/// Temperature with one decimal, or a dash when missing
pub fn temp(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |f| format!("{:.1}°F", f))
}
