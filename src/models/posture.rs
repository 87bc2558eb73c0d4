//! Frame analysis request/response models

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::posture::{FrameMetrics, FrameResult, Landmark, PostureStatus};
use crate::session::{types::round2, SessionSnapshot};

/// Landmarks submitted directly by the client
#[derive(Debug, Deserialize, Validate)]
pub struct AnalyzeRequest {
    #[validate(nested)]
    pub landmarks: Vec<Landmark>,
    /// The detector's own person-present flag
    #[serde(default = "default_present")]
    pub present: bool,
}

fn default_present() -> bool {
    true
}

/// Encoded image to run through the landmark provider
#[derive(Debug, Deserialize, Validate)]
pub struct FrameRequest {
    #[validate(length(min = 1))]
    pub frame: String,
}

/// Metrics as sent over the wire (2 decimals)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsView {
    pub neck_angle: f64,
    pub spine_tilt: f64,
    pub shoulder_tilt: f64,
    pub nose_shoulder_distance: f64,
}

impl From<&FrameMetrics> for MetricsView {
    fn from(m: &FrameMetrics) -> Self {
        Self {
            neck_angle: round2(m.neck_angle),
            spine_tilt: round2(m.spine_tilt),
            shoulder_tilt: round2(m.shoulder_tilt),
            nose_shoulder_distance: round2(m.nose_shoulder_distance),
        }
    }
}

/// Per-frame result, shared by the REST and streaming surfaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResponse {
    pub status: String,
    pub posture_status: PostureStatus,
    pub posture_score: u8,
    pub is_good_posture: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_stats: Option<SessionSnapshot>,
}

impl FrameResponse {
    pub fn new(result: &FrameResult, session_stats: Option<SessionSnapshot>) -> Self {
        Self {
            status: "success".to_string(),
            posture_status: result.status,
            posture_score: result.score.value(),
            is_good_posture: result.is_good_posture(),
            metrics: result.metrics.as_ref().map(MetricsView::from),
            session_stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posture::PostureScore;
    use chrono::Utc;

    #[test]
    fn test_frame_response_shape() {
        let result = FrameResult {
            status: PostureStatus::LeaningRight,
            score: PostureScore::from_raw(84.0),
            metrics: Some(FrameMetrics {
                neck_angle: 167.3333,
                spine_tilt: -45.0,
                shoulder_tilt: 3.0,
                nose_shoulder_distance: 170.0,
            }),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(FrameResponse::new(&result, None)).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["posture_status"], "Leaning Right");
        assert_eq!(json["posture_score"], 84);
        assert_eq!(json["is_good_posture"], false);
        assert_eq!(json["metrics"]["neck_angle"], 167.33);
        assert!(json.get("session_stats").is_none());
    }

    #[test]
    fn test_no_person_omits_metrics() {
        let result = FrameResult {
            status: PostureStatus::NoPersonDetected,
            score: PostureScore::MIN,
            metrics: None,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(FrameResponse::new(&result, None)).unwrap();
        assert!(json.get("metrics").is_none());
        assert_eq!(json["posture_score"], 0);
    }
}
