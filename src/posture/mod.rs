//! Posture Module - per-frame analysis
//!
//! # Architecture
//! - `landmark.rs`: detector landmarks (`Landmark`, `LandmarkSet`)
//! - `metrics.rs`: `MetricExtractor` -> `FrameMetrics`
//! - `classifier.rs`: `PostureClassifier` -> `PostureStatus` + `PostureScore`
//!
//! Missing landmarks are data, not errors: they classify as
//! `NoPersonDetected` and the frame still yields a `FrameResult`.

pub mod landmark;
pub mod metrics;
pub mod classifier;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use landmark::{Landmark, LandmarkKind, LandmarkSet, REQUIRED_LANDMARKS};
pub use metrics::{FrameMetrics, MetricExtractor, DEFAULT_MIN_CONFIDENCE};
pub use classifier::{PostureClassifier, PostureScore, PostureStatus, PostureThresholds, ScoreOutOfRange};

/// Analysis of one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub status: PostureStatus,
    pub score: PostureScore,
    /// Absent when no person was detected
    pub metrics: Option<FrameMetrics>,
    pub timestamp: DateTime<Utc>,
}

impl FrameResult {
    pub fn is_good_posture(&self) -> bool {
        self.status.is_good()
    }
}

/// Extractor + classifier pipeline
#[derive(Debug, Clone, Default)]
pub struct PostureAnalyzer {
    extractor: MetricExtractor,
    classifier: PostureClassifier,
}

impl PostureAnalyzer {
    pub fn new(extractor: MetricExtractor, classifier: PostureClassifier) -> Self {
        Self { extractor, classifier }
    }

    /// Analyze a frame. `None` landmarks means the detector found nobody.
    pub fn analyze(&self, landmarks: Option<&LandmarkSet>, now: DateTime<Utc>) -> FrameResult {
        let metrics = landmarks.and_then(|set| self.extractor.extract(set));
        let (status, score) = self.classifier.classify(metrics.as_ref());

        FrameResult {
            status,
            score,
            metrics,
            timestamp: now,
        }
    }

    pub fn classifier(&self) -> &PostureClassifier {
        &self.classifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upright_landmarks() -> LandmarkSet {
        LandmarkSet::new([
            Landmark::new(LandmarkKind::Nose, 100.0, 30.0, 0.95),
            Landmark::new(LandmarkKind::LeftShoulder, 120.0, 200.0, 0.95),
            Landmark::new(LandmarkKind::RightShoulder, 80.0, 200.0, 0.95),
            Landmark::new(LandmarkKind::LeftHip, 115.0, 400.0, 0.95),
            Landmark::new(LandmarkKind::RightHip, 85.0, 400.0, 0.95),
        ])
    }

    #[test]
    fn test_analyze_upright() {
        let now = Utc::now();
        let result = PostureAnalyzer::default().analyze(Some(&upright_landmarks()), now);

        assert_eq!(result.status, PostureStatus::GoodPosture);
        assert_eq!(result.score, PostureScore::MAX);
        assert!(result.is_good_posture());
        assert!(result.metrics.is_some());
        assert_eq!(result.timestamp, now);
    }

    #[test]
    fn test_analyze_nobody() {
        let analyzer = PostureAnalyzer::default();
        let now = Utc::now();

        let absent = analyzer.analyze(None, now);
        assert_eq!(absent.status, PostureStatus::NoPersonDetected);
        assert!(absent.metrics.is_none());

        let empty = analyzer.analyze(Some(&LandmarkSet::default()), now);
        assert_eq!(empty.status, PostureStatus::NoPersonDetected);
        assert!(!empty.is_good_posture());
    }
}
