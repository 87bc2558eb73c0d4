//! Posture Classifier
//!
//! Pure mapping from frame metrics to a posture status and score.
//! No cross-frame memory lives here; streaks are tracked per session.

use serde::{Deserialize, Serialize};

use super::metrics::FrameMetrics;

// ============================================================================
// STATUS & SCORE
// ============================================================================

/// Posture classification of a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostureStatus {
    #[serde(rename = "Good Posture")]
    GoodPosture,
    #[serde(rename = "Bad Posture")]
    BadPosture,
    #[serde(rename = "Slightly Slouched")]
    SlightlySlouched,
    #[serde(rename = "Severely Slouched")]
    SeverelySlouched,
    #[serde(rename = "Leaning Left")]
    LeaningLeft,
    #[serde(rename = "Leaning Right")]
    LeaningRight,
    #[serde(rename = "Severe Lean Left")]
    SevereLeanLeft,
    #[serde(rename = "Severe Lean Right")]
    SevereLeanRight,
    #[serde(rename = "Leaning Forward")]
    LeaningForward,
    #[serde(rename = "Leaning Backward")]
    LeaningBackward,
    #[serde(rename = "No person detected")]
    NoPersonDetected,
}

impl PostureStatus {
    pub fn is_good(&self) -> bool {
        matches!(self, PostureStatus::GoodPosture)
    }

    /// Whether the frame counts towards good/bad statistics
    pub fn has_subject(&self) -> bool {
        !matches!(self, PostureStatus::NoPersonDetected)
    }
}

/// Posture score, always within [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub struct PostureScore(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("posture score {0} is out of range [0, 100]")]
pub struct ScoreOutOfRange(pub u8);

impl TryFrom<u8> for PostureScore {
    type Error = ScoreOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > Self::MAX.0 {
            return Err(ScoreOutOfRange(value));
        }
        Ok(Self(value))
    }
}

impl From<PostureScore> for u8 {
    fn from(score: PostureScore) -> Self {
        score.0
    }
}

impl PostureScore {
    pub const MAX: PostureScore = PostureScore(100);
    pub const MIN: PostureScore = PostureScore(0);

    /// Clamp to [0, 100] and truncate
    pub fn from_raw(raw: f64) -> Self {
        if raw.is_nan() {
            return Self::MIN;
        }
        Self(raw.clamp(0.0, 100.0).floor() as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

// ============================================================================
// THRESHOLDS
// ============================================================================

/// Classification thresholds and score weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostureThresholds {
    /// Ideal neck angle (degrees)
    pub neck_ideal: f64,
    /// Neck deviation tolerated before the frame is slouched
    pub neck_tolerance: f64,
    /// Neck deviation beyond which the frame is severely slouched
    pub severe_slouch: f64,

    pub spine_tolerance: f64,
    pub shoulder_tolerance: f64,

    /// |spine_tilt| beyond which the subject is leaning sideways
    pub lean_threshold: f64,
    /// Severe lean = lean_threshold * severe_lean_factor
    pub severe_lean_factor: f64,

    /// Expected nose/shoulder distance for an upright subject
    pub nose_shoulder_baseline: f64,
    pub nose_shoulder_tolerance: f64,
    /// Deviation from baseline beyond which the head is forward/backward
    pub head_drop_threshold: f64,

    pub neck_weight: f64,
    pub spine_weight: f64,
    pub shoulder_weight: f64,
    pub nose_weight: f64,
}

impl Default for PostureThresholds {
    fn default() -> Self {
        Self {
            neck_ideal: 175.0,
            neck_tolerance: 5.0,
            severe_slouch: 20.0,
            spine_tolerance: 10.0,
            shoulder_tolerance: 10.0,
            lean_threshold: 30.0,
            severe_lean_factor: 2.0,
            nose_shoulder_baseline: 170.0,
            nose_shoulder_tolerance: 30.0,
            head_drop_threshold: 60.0,
            neck_weight: 0.4,
            spine_weight: 0.4,
            shoulder_weight: 0.4,
            nose_weight: 0.2,
        }
    }
}

impl PostureThresholds {
    pub fn severe_lean_threshold(&self) -> f64 {
        self.lean_threshold * self.severe_lean_factor
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// Signed deviation of each metric from its ideal
#[derive(Debug, Clone, Copy)]
struct Deviations {
    /// Only bending below the ideal counts
    neck: f64,
    spine: f64,
    shoulder: f64,
    nose: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PostureClassifier {
    thresholds: PostureThresholds,
}

impl PostureClassifier {
    pub fn new(thresholds: PostureThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &PostureThresholds {
        &self.thresholds
    }

    /// Classify a frame. `None` metrics means no subject was found.
    pub fn classify(&self, metrics: Option<&FrameMetrics>) -> (PostureStatus, PostureScore) {
        match metrics {
            Some(m) => (self.status(m), self.score(m)),
            None => (PostureStatus::NoPersonDetected, PostureScore::MIN),
        }
    }

    /// Status by precedence; the first matching rule wins
    pub fn status(&self, metrics: &FrameMetrics) -> PostureStatus {
        let t = &self.thresholds;
        let d = self.deviations(metrics);

        if d.spine.abs() > t.severe_lean_threshold() {
            return if d.spine > 0.0 {
                PostureStatus::SevereLeanLeft
            } else {
                PostureStatus::SevereLeanRight
            };
        }

        if d.spine.abs() > t.lean_threshold {
            return if d.spine > 0.0 {
                PostureStatus::LeaningLeft
            } else {
                PostureStatus::LeaningRight
            };
        }

        if d.neck > t.severe_slouch {
            return PostureStatus::SeverelySlouched;
        }
        if d.neck > t.neck_tolerance {
            return PostureStatus::SlightlySlouched;
        }

        if d.nose < -t.head_drop_threshold {
            return PostureStatus::LeaningForward;
        }
        if d.nose > t.head_drop_threshold {
            return PostureStatus::LeaningBackward;
        }

        let within_tolerance = d.spine.abs() <= t.spine_tolerance
            && d.shoulder.abs() <= t.shoulder_tolerance
            && d.nose.abs() <= t.nose_shoulder_tolerance;

        if within_tolerance {
            PostureStatus::GoodPosture
        } else {
            PostureStatus::BadPosture
        }
    }

    /// 100 minus the weighted deviation of each metric beyond its tolerance
    pub fn score(&self, metrics: &FrameMetrics) -> PostureScore {
        let t = &self.thresholds;
        let d = self.deviations(metrics);

        let penalty = t.neck_weight * excess(d.neck, t.neck_tolerance)
            + t.spine_weight * excess(d.spine, t.spine_tolerance)
            + t.shoulder_weight * excess(d.shoulder, t.shoulder_tolerance)
            + t.nose_weight * excess(d.nose, t.nose_shoulder_tolerance);

        PostureScore::from_raw(100.0 - penalty)
    }

    fn deviations(&self, m: &FrameMetrics) -> Deviations {
        Deviations {
            neck: (self.thresholds.neck_ideal - m.neck_angle).max(0.0),
            spine: m.spine_tilt,
            shoulder: m.shoulder_tilt,
            nose: m.nose_shoulder_distance - self.thresholds.nose_shoulder_baseline,
        }
    }
}

fn excess(deviation: f64, tolerance: f64) -> f64 {
    (deviation.abs() - tolerance).max(0.0)
}
