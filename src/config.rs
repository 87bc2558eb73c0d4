//! Configuration module

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::posture::{PostureThresholds, DEFAULT_MIN_CONFIDENCE};
use crate::stream::StreamConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Database connection URL; sessions are kept in memory when unset
    pub database_url: Option<String>,

    /// Pose detector sidecar; frames must carry their own detection when unset
    pub pose_detector_url: Option<String>,

    /// Pose detector request timeout in seconds
    pub detector_timeout_secs: u64,

    /// Attach session stats to every n-th streamed frame (0 = never)
    pub stream_stats_every: u32,

    /// Active sessions without a frame for this long are ended
    pub session_idle_secs: u64,

    /// Ended sessions are dropped from memory after this long
    pub session_retention_secs: u64,

    /// Supervisor period
    pub sweep_interval_secs: u64,

    pub min_landmark_confidence: f64,

    pub thresholds: PostureThresholds,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str, default| parse_or(lookup(key), default);

        let defaults = PostureThresholds::default();
        let thresholds = PostureThresholds {
            neck_ideal: parsed("POSTURE_NECK_IDEAL", defaults.neck_ideal),
            neck_tolerance: parsed("POSTURE_NECK_TOLERANCE", defaults.neck_tolerance),
            severe_slouch: parsed("POSTURE_SEVERE_SLOUCH", defaults.severe_slouch),
            spine_tolerance: parsed("POSTURE_SPINE_TOLERANCE", defaults.spine_tolerance),
            shoulder_tolerance: parsed("POSTURE_SHOULDER_TOLERANCE", defaults.shoulder_tolerance),
            lean_threshold: parsed("POSTURE_LEAN_THRESHOLD", defaults.lean_threshold),
            severe_lean_factor: parsed("POSTURE_SEVERE_LEAN_FACTOR", defaults.severe_lean_factor),
            nose_shoulder_baseline: parsed("POSTURE_NOSE_SHOULDER_BASELINE", defaults.nose_shoulder_baseline),
            nose_shoulder_tolerance: parsed("POSTURE_NOSE_SHOULDER_TOLERANCE", defaults.nose_shoulder_tolerance),
            head_drop_threshold: parsed("POSTURE_HEAD_DROP_THRESHOLD", defaults.head_drop_threshold),
            ..defaults
        };

        Self {
            port: parse_or(lookup("PORT"), 8000),

            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),

            pose_detector_url: lookup("POSE_DETECTOR_URL").filter(|url| !url.trim().is_empty()),

            detector_timeout_secs: parse_or(lookup("POSE_DETECTOR_TIMEOUT_SECS"), 10),

            stream_stats_every: parse_or(lookup("STREAM_STATS_EVERY"), 1),

            session_idle_secs: parse_or(lookup("SESSION_IDLE_SECS"), 300),

            session_retention_secs: parse_or(lookup("SESSION_RETENTION_SECS"), 600),

            sweep_interval_secs: parse_or(lookup("SWEEP_INTERVAL_SECS"), 30),

            min_landmark_confidence: parse_or(lookup("MIN_LANDMARK_CONFIDENCE"), DEFAULT_MIN_CONFIDENCE),

            thresholds,

            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn stream(&self) -> StreamConfig {
        StreamConfig {
            stats_every: self.stream_stats_every,
        }
    }

    pub fn detector_timeout(&self) -> Duration {
        Duration::from_secs(self.detector_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        // tokio intervals panic on a zero period
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn session_idle(&self) -> chrono::Duration {
        chrono::Duration::seconds(clamp_secs(self.session_idle_secs))
    }

    pub fn session_retention(&self) -> chrono::Duration {
        chrono::Duration::seconds(clamp_secs(self.session_retention_secs))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn clamp_secs(secs: u64) -> i64 {
    secs.min(u64::from(u32::MAX)) as i64
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.port, 8000);
        assert!(config.database_url.is_none());
        assert!(config.pose_detector_url.is_none());
        assert_eq!(config.stream_stats_every, 1);
        assert_eq!(config.min_landmark_confidence, DEFAULT_MIN_CONFIDENCE);
        assert_eq!(config.thresholds, PostureThresholds::default());
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "9100"),
            ("DATABASE_URL", "postgres://posture@localhost/posture"),
            ("STREAM_STATS_EVERY", "5"),
            ("POSTURE_LEAN_THRESHOLD", "25"),
            ("POSTURE_NECK_TOLERANCE", " 7.5 "),
            ("ENVIRONMENT", "production"),
        ]);

        assert_eq!(config.port, 9100);
        assert_eq!(config.database_url.as_deref(), Some("postgres://posture@localhost/posture"));
        assert_eq!(config.stream().stats_every, 5);
        assert_eq!(config.thresholds.lean_threshold, 25.0);
        assert_eq!(config.thresholds.neck_tolerance, 7.5);
        assert_eq!(config.thresholds.nose_weight, PostureThresholds::default().nose_weight);
        assert!(config.is_production());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[("PORT", "eighty"), ("DATABASE_URL", "  "), ("SWEEP_INTERVAL_SECS", "0")]);

        assert_eq!(config.port, 8000);
        assert!(config.database_url.is_none());
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }
}
