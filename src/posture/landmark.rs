//! Body landmarks as delivered by the pose detector

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Landmark identity (MediaPipe pose topology)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LandmarkKind {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

/// Landmarks the posture metrics cannot be computed without
pub const REQUIRED_LANDMARKS: [LandmarkKind; 5] = [
    LandmarkKind::Nose,
    LandmarkKind::LeftShoulder,
    LandmarkKind::RightShoulder,
    LandmarkKind::LeftHip,
    LandmarkKind::RightHip,
];

/// A single detected keypoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct Landmark {
    pub name: LandmarkKind,
    pub x: f64,
    pub y: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
}

impl Landmark {
    pub fn new(name: LandmarkKind, x: f64, y: f64, confidence: f64) -> Self {
        Self { name, x, y, confidence }
    }
}

/// A 2-D point in the provider's unit system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn midpoint(a: Point, b: Point) -> Point {
        Point {
            x: (a.x + b.x) / 2.0,
            y: (a.y + b.y) / 2.0,
        }
    }
}

/// All landmarks detected in one frame, keyed by identity.
///
/// When the provider reports the same landmark twice the last one wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkSet {
    points: HashMap<LandmarkKind, Landmark>,
}

impl LandmarkSet {
    pub fn new(landmarks: impl IntoIterator<Item = Landmark>) -> Self {
        landmarks.into_iter().collect()
    }

    pub fn get(&self, kind: LandmarkKind) -> Option<&Landmark> {
        self.points.get(&kind)
    }

    /// Position of `kind` if it was detected with at least `min_confidence`
    pub fn confident_point(&self, kind: LandmarkKind, min_confidence: f64) -> Option<Point> {
        self.get(kind)
            .filter(|lm| lm.confidence >= min_confidence)
            .map(|lm| Point { x: lm.x, y: lm.y })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<Landmark> for LandmarkSet {
    fn from_iter<I: IntoIterator<Item = Landmark>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().map(|lm| (lm.name, lm)).collect(),
        }
    }
}
