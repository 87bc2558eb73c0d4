//! Metric Extractor
//!
//! Turns a landmark set into the four scalar posture metrics.
//! Distances stay in the provider's unit system; nothing is rescaled.

use serde::{Deserialize, Serialize};

use super::landmark::{LandmarkKind, LandmarkSet, Point};

/// Default minimum landmark confidence
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;

/// Geometric posture metrics for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameMetrics {
    /// Angle at the neck between nose and hip midpoint, degrees in [0, 180]
    pub neck_angle: f64,
    /// Horizontal offset of the neck midpoint from the hip midpoint
    pub spine_tilt: f64,
    /// Vertical offset of the left shoulder from the right shoulder
    pub shoulder_tilt: f64,
    /// Height of the nose above the shoulder midpoint (y grows downwards)
    pub nose_shoulder_distance: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricExtractor {
    min_confidence: f64,
}

impl Default for MetricExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONFIDENCE)
    }
}

impl MetricExtractor {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    /// Compute metrics, or `None` when there is no usable subject
    /// (a required landmark is missing or below the confidence threshold).
    pub fn extract(&self, landmarks: &LandmarkSet) -> Option<FrameMetrics> {
        let point = |kind| landmarks.confident_point(kind, self.min_confidence);

        let nose = point(LandmarkKind::Nose)?;
        let left_shoulder = point(LandmarkKind::LeftShoulder)?;
        let right_shoulder = point(LandmarkKind::RightShoulder)?;
        let left_hip = point(LandmarkKind::LeftHip)?;
        let right_hip = point(LandmarkKind::RightHip)?;

        let neck = Point::midpoint(left_shoulder, right_shoulder);
        let mid_hip = Point::midpoint(left_hip, right_hip);

        Some(FrameMetrics {
            neck_angle: angle_at(nose, neck, mid_hip),
            spine_tilt: neck.x - mid_hip.x,
            shoulder_tilt: left_shoulder.y - right_shoulder.y,
            nose_shoulder_distance: neck.y - nose.y,
        })
    }
}

/// Angle ABC in degrees. Degenerate rays give 0.
fn angle_at(a: Point, b: Point, c: Point) -> f64 {
    let (bax, bay) = (a.x - b.x, a.y - b.y);
    let (bcx, bcy) = (c.x - b.x, c.y - b.y);

    let magnitude = bax.hypot(bay) * bcx.hypot(bcy);
    if magnitude == 0.0 {
        return 0.0;
    }

    let cos = ((bax * bcx + bay * bcy) / magnitude).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posture::landmark::Landmark;

    fn body(nose: (f64, f64), ls: (f64, f64), rs: (f64, f64), lh: (f64, f64), rh: (f64, f64)) -> LandmarkSet {
        LandmarkSet::new([
            Landmark::new(LandmarkKind::Nose, nose.0, nose.1, 0.9),
            Landmark::new(LandmarkKind::LeftShoulder, ls.0, ls.1, 0.9),
            Landmark::new(LandmarkKind::RightShoulder, rs.0, rs.1, 0.9),
            Landmark::new(LandmarkKind::LeftHip, lh.0, lh.1, 0.9),
            Landmark::new(LandmarkKind::RightHip, rh.0, rh.1, 0.9),
        ])
    }

    #[test]
    fn test_upright_body() {
        let set = body((100.0, 30.0), (120.0, 200.0), (80.0, 200.0), (115.0, 400.0), (85.0, 400.0));
        let m = MetricExtractor::default().extract(&set).unwrap();

        assert!((m.neck_angle - 180.0).abs() < 1e-9);
        assert_eq!(m.spine_tilt, 0.0);
        assert_eq!(m.shoulder_tilt, 0.0);
        assert_eq!(m.nose_shoulder_distance, 170.0);
    }

    #[test]
    fn test_signed_tilts() {
        let set = body((100.0, 30.0), (130.0, 190.0), (90.0, 205.0), (95.0, 400.0), (65.0, 400.0));
        let m = MetricExtractor::default().extract(&set).unwrap();

        // neck at x=110, hips at x=80
        assert_eq!(m.spine_tilt, 30.0);
        assert_eq!(m.shoulder_tilt, -15.0);
        assert!(m.neck_angle < 180.0 && m.neck_angle > 0.0);
    }

    #[test]
    fn test_right_angle() {
        let angle = angle_at(
            Point { x: 0.0, y: 1.0 },
            Point { x: 0.0, y: 0.0 },
            Point { x: 1.0, y: 0.0 },
        );
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_ray_is_zero() {
        let set = body((100.0, 200.0), (120.0, 200.0), (80.0, 200.0), (115.0, 400.0), (85.0, 400.0));
        let m = MetricExtractor::default().extract(&set).unwrap();
        assert_eq!(m.neck_angle, 0.0);
    }

    #[test]
    fn test_missing_required_landmark() {
        let mut landmarks: Vec<Landmark> = vec![
            Landmark::new(LandmarkKind::Nose, 100.0, 30.0, 0.9),
            Landmark::new(LandmarkKind::LeftShoulder, 120.0, 200.0, 0.9),
            Landmark::new(LandmarkKind::RightShoulder, 80.0, 200.0, 0.9),
            Landmark::new(LandmarkKind::LeftHip, 115.0, 400.0, 0.9),
        ];
        let extractor = MetricExtractor::default();
        assert!(extractor.extract(&LandmarkSet::new(landmarks.clone())).is_none());

        landmarks.push(Landmark::new(LandmarkKind::RightHip, 85.0, 400.0, 0.49));
        assert!(extractor.extract(&LandmarkSet::new(landmarks.clone())).is_none());

        assert!(MetricExtractor::new(0.4).extract(&LandmarkSet::new(landmarks)).is_some());
    }

    #[test]
    fn test_extra_landmarks_are_ignored() {
        let mut set: Vec<Landmark> = vec![
            Landmark::new(LandmarkKind::LeftEar, 0.0, 0.0, 0.1),
            Landmark::new(LandmarkKind::RightKnee, 0.0, 0.0, 0.1),
        ];
        assert!(MetricExtractor::default().extract(&LandmarkSet::new(set.clone())).is_none());

        set.extend([
            Landmark::new(LandmarkKind::Nose, 100.0, 30.0, 0.9),
            Landmark::new(LandmarkKind::LeftShoulder, 120.0, 200.0, 0.9),
            Landmark::new(LandmarkKind::RightShoulder, 80.0, 200.0, 0.9),
            Landmark::new(LandmarkKind::LeftHip, 115.0, 400.0, 0.9),
            Landmark::new(LandmarkKind::RightHip, 85.0, 400.0, 0.9),
        ]);
        assert!(MetricExtractor::default().extract(&LandmarkSet::new(set)).is_some());
    }
}
