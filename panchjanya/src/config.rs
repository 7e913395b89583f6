//! Daemon configuration
//!
//! Loaded from `panchjanya.toml`. Every field defaults, so the daemon
//! starts with an empty file; section by section:
//!
//! - `[link]` / `[gamepad]`: serial link and controller (see shankha-link)
//! - `[vision]`: extractor endpoint, template pack and pipeline thresholds
//! - `[supervisor]`: auto-stop behavior and the resume button
//! - `[logging]`: log level

use drishti_core::debounce::DebounceConfig;
use drishti_core::detector::DetectorConfig;
use drishti_core::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use shankha_link::config::{GamepadConfig, LinkConfig};
use std::path::Path;
use std::time::Duration;

/// Top-level daemon configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PanchjanyaConfig {
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub gamepad: GamepadConfig,
    #[serde(default)]
    pub vision: VisionConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Vision pipeline configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VisionConfig {
    /// Feature extractor TCP endpoint
    #[serde(default = "default_extractor_addr")]
    pub extractor_addr: String,

    /// Template pack path (.drsh)
    #[serde(default = "default_template_pack")]
    pub template_pack: String,

    /// Lowe ratio test threshold
    #[serde(default = "default_ratio_test")]
    pub ratio_test: f32,

    /// Minimum ratio-test survivors per template
    #[serde(default = "default_min_good_matches")]
    pub min_good_matches: usize,

    /// Minimum RANSAC inliers to accept a candidate
    #[serde(default = "default_min_inliers")]
    pub min_inliers: usize,

    /// Minimum inlier ratio to accept a candidate
    #[serde(default = "default_min_inlier_ratio")]
    pub min_inlier_ratio: f32,

    /// Debounce window length in frames
    #[serde(default = "default_debounce_window")]
    pub debounce_window: usize,

    /// Agreeing frames required within the window
    #[serde(default = "default_debounce_count")]
    pub debounce_count: usize,

    /// Minimum average score across the agreeing frames
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,

    /// Lock revalidation cadence in milliseconds
    #[serde(default = "default_revalidate_ms")]
    pub revalidate_ms: u64,

    /// Failed revalidations before the lock drops
    #[serde(default = "default_max_lost")]
    pub max_lost: u32,
}

/// Auto-stop supervisor configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SupervisorConfig {
    /// Gamepad button that releases an engaged stop and clears the
    /// detection state (triangle on a PS4 pad)
    #[serde(default = "default_resume_button")]
    pub resume_button: u8,

    /// Engage the stop when the operator looks drowsy
    #[serde(default = "default_true")]
    pub attention_stop: bool,
}

/// Logging configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_extractor_addr() -> String {
    "127.0.0.1:7020".to_string()
}
fn default_template_pack() -> String {
    "symbols.drsh".to_string()
}
fn default_ratio_test() -> f32 {
    0.75
}
fn default_min_good_matches() -> usize {
    8
}
fn default_min_inliers() -> usize {
    6
}
fn default_min_inlier_ratio() -> f32 {
    0.35
}
fn default_debounce_window() -> usize {
    6
}
fn default_debounce_count() -> usize {
    4
}
fn default_score_threshold() -> f32 {
    8.0
}
fn default_revalidate_ms() -> u64 {
    800
}
fn default_max_lost() -> u32 {
    6
}
fn default_resume_button() -> u8 {
    3
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            extractor_addr: default_extractor_addr(),
            template_pack: default_template_pack(),
            ratio_test: default_ratio_test(),
            min_good_matches: default_min_good_matches(),
            min_inliers: default_min_inliers(),
            min_inlier_ratio: default_min_inlier_ratio(),
            debounce_window: default_debounce_window(),
            debounce_count: default_debounce_count(),
            score_threshold: default_score_threshold(),
            revalidate_ms: default_revalidate_ms(),
            max_lost: default_max_lost(),
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            resume_button: default_resume_button(),
            attention_stop: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl PanchjanyaConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, shankha_link::Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

impl VisionConfig {
    /// Detector parameters from the config values.
    pub fn detector_config(&self) -> DetectorConfig {
        let mut cfg = DetectorConfig::default();
        cfg.matching.ratio_test = self.ratio_test;
        cfg.matching.min_good_matches = self.min_good_matches;
        cfg.min_inliers = self.min_inliers;
        cfg.min_inlier_ratio = self.min_inlier_ratio;
        cfg
    }

    /// Pipeline parameters from the config values.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            debounce: DebounceConfig {
                window: self.debounce_window,
                required_count: self.debounce_count,
                score_threshold: self.score_threshold,
            },
            revalidate_interval: Duration::from_millis(self.revalidate_ms),
            max_lost: self.max_lost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_gives_defaults() {
        let cfg: PanchjanyaConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.link.baud_rate, 115_200);
        assert_eq!(cfg.vision.extractor_addr, "127.0.0.1:7020");
        assert_eq!(cfg.supervisor.resume_button, 3);
        assert!(cfg.supervisor.attention_stop);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn sections_override_independently() {
        let cfg: PanchjanyaConfig = toml::from_str(
            r#"
[link]
port = "/dev/ttyACM1"
extended_frames = true

[vision]
debounce_window = 10
score_threshold = 12.5

[supervisor]
attention_stop = false
"#,
        )
        .unwrap();
        assert_eq!(cfg.link.port.as_deref(), Some("/dev/ttyACM1"));
        assert!(cfg.link.extended_frames);
        assert_eq!(cfg.vision.debounce_window, 10);
        assert_eq!(cfg.vision.score_threshold, 12.5);
        // Untouched values stay default
        assert_eq!(cfg.vision.max_lost, 6);
        assert!(!cfg.supervisor.attention_stop);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<PanchjanyaConfig>("[vision]\ntypo_field = 1\n").is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panchjanya.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        let cfg = PanchjanyaConfig::load(&path).unwrap();
        assert_eq!(cfg.logging.level, "debug");
        assert!(PanchjanyaConfig::load(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn derived_pipeline_config() {
        let cfg = VisionConfig::default();
        let p = cfg.pipeline_config();
        assert_eq!(p.revalidate_interval, Duration::from_millis(800));
        assert_eq!(p.debounce.window, 6);
        let d = cfg.detector_config();
        assert_eq!(d.min_inliers, 6);
    }
}
