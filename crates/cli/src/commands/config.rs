// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tub config`: show the effective configuration with secrets hidden

use tub_core::TubConfig;

use crate::error::TubError;
use crate::output::OutputFormat;

pub fn handle(config: &TubConfig, format: OutputFormat) -> Result<(), TubError> {
    let rendered = render(config, format)
        .map_err(|e| TubError::new("Could not render the configuration").with_context(e))?;
    println!("{}", rendered.trim_end());
    Ok(())
}

pub fn render(config: &TubConfig, format: OutputFormat) -> Result<String, String> {
    let redacted = config.redacted();
    match format {
        OutputFormat::Text => toml::to_string_pretty(&redacted).map_err(|e| e.to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(&redacted).map_err(|e| e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_never_rendered() {
        let mut config = TubConfig::default();
        config.api_token = Some("hunter2".to_string());
        config.equipment.ifttt_key = Some("ifttt-secret".to_string());

        for format in [OutputFormat::Text, OutputFormat::Json] {
            let rendered = render(&config, format).unwrap();
            assert!(!rendered.contains("hunter2"));
            assert!(!rendered.contains("ifttt-secret"));
            assert!(rendered.contains("<redacted>"));
        }
    }

    #[test]
    fn toml_output_reloads() {
        let config = TubConfig::default();
        let rendered = render(&config, OutputFormat::Text).unwrap();
        assert_eq!(TubConfig::from_toml(&rendered).unwrap(), config);
    }
}
