// SPDX-License-Identifier: GPL-3.0-only

//! Kiosk configuration, persisted as JSON

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Folder name used under the pictures directory for session output
const DEFAULT_OUTPUT_FOLDER: &str = "PhotoBooth";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// V4L capture device index (/dev/video{N})
    pub camera_index: usize,
    /// Requested capture width
    pub camera_width: u32,
    /// Requested capture height
    pub camera_height: u32,
    /// Root directory that session directories are created under
    pub output_root: PathBuf,
    /// Printer name substituted into the submit command
    pub printer_name: String,
    /// Convert-to-print-format command template ({src}, {dst} placeholders)
    pub convert_command: Vec<String>,
    /// Print submission command template ({printer}, {pdf} placeholders)
    pub print_command: Vec<String>,
    /// Decorative overlay composited on top of the print layout, if any
    pub mask_path: Option<PathBuf>,
    /// GPIO pin of the guest-action (blue) button
    pub primary_button_pin: u32,
    /// GPIO pin of the guest-action button's indicator light
    pub primary_light_pin: u32,
    /// GPIO pin of the deny (red) button
    pub secondary_button_pin: u32,
    /// GPIO pin of the deny button's indicator light
    pub secondary_light_pin: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_index: 0,
            camera_width: 1280,
            camera_height: 720,
            output_root: default_output_root(),
            printer_name: "photo-printer".to_string(),
            convert_command: vec![
                "convert".to_string(),
                "{src}".to_string(),
                "{dst}".to_string(),
            ],
            print_command: vec![
                "lp".to_string(),
                "-d".to_string(),
                "{printer}".to_string(),
                "{pdf}".to_string(),
            ],
            mask_path: None,
            // Physical (BOARD) pin numbers of the booth wiring harness
            primary_button_pin: 13,
            primary_light_pin: 10,
            secondary_button_pin: 15,
            secondary_light_pin: 8,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location when
    /// `path` is `None`. A missing or unreadable file yields the defaults;
    /// a malformed file is logged and also yields the defaults, so the
    /// kiosk always comes up.
    pub fn load(path: Option<&Path>) -> Config {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(p) => p,
            None => return Config::default(),
        };

        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Config::default(),
        };

        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Malformed configuration file, using defaults"
                );
                Config::default()
            }
        }
    }

    /// Default configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("photobooth").join("config.json"))
    }
}

/// Default session output root under the pictures directory
fn default_output_root() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(DEFAULT_OUTPUT_FOLDER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_command_templates_have_placeholders() {
        let config = Config::default();
        assert!(config.convert_command.iter().any(|a| a.contains("{src}")));
        assert!(config.convert_command.iter().any(|a| a.contains("{dst}")));
        assert!(config.print_command.iter().any(|a| a.contains("{pdf}")));
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/booth.json")));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_round_trips_through_json() {
        let mut config = Config::default();
        config.printer_name = "front-desk".to_string();
        config.camera_index = 2;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, serde_json::to_string(&config).expect("serialize"))
            .expect("write config");

        assert_eq!(Config::load(Some(&path)), config);
    }

    #[test]
    fn load_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").expect("write config");

        assert_eq!(Config::load(Some(&path)), Config::default());
    }
}
