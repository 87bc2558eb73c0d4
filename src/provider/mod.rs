//! Landmark providers
//!
//! The pose detector is an external collaborator. Frames reach the service
//! base64 encoded; a provider turns the decoded bytes into landmarks.
//! - `payload.rs`: the frame already carries the detection as JSON
//! - `remote.rs`: the image is posted to a detector sidecar

pub mod payload;
pub mod remote;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::posture::{Landmark, LandmarkSet};

pub use payload::PayloadProvider;
pub use remote::RemoteProvider;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("frame could not be decoded: {0}")]
    Decode(String),

    #[error("detector request failed: {0}")]
    Detector(String),

    #[error("detector returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Detector(err.to_string())
    }
}

/// Detector output: landmarks plus whether a person was found
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Detection {
    #[serde(default = "default_present")]
    pub present: bool,
    #[serde(default)]
    #[validate(nested)]
    pub landmarks: Vec<Landmark>,
}

fn default_present() -> bool {
    true
}

impl Detection {
    /// Landmarks, or `None` when the detector saw nobody
    pub fn into_landmarks(self) -> Option<LandmarkSet> {
        if self.present {
            Some(LandmarkSet::new(self.landmarks))
        } else {
            None
        }
    }

    fn from_json(bytes: &[u8]) -> Result<Self, ProviderError> {
        let detection: Detection = serde_json::from_slice(bytes)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        detection
            .validate()
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(detection)
    }
}

#[axum::async_trait]
pub trait LandmarkProvider: Send + Sync {
    async fn detect(&self, image: &[u8]) -> Result<Detection, ProviderError>;
}

/// Decode a base64 frame, accepting an optional `data:<mime>;base64,` prefix
pub fn decode_frame(frame: &str) -> Result<Vec<u8>, ProviderError> {
    let encoded = match frame.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => frame,
    };

    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| ProviderError::Decode(e.to_string()))?;

    if bytes.is_empty() {
        return Err(ProviderError::Decode("empty frame".to_string()));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_frame() {
        let encoded = BASE64.encode(b"jpeg-bytes");
        assert_eq!(decode_frame(&encoded).unwrap(), b"jpeg-bytes");

        let data_url = format!("data:image/jpeg;base64,{}", encoded);
        assert_eq!(decode_frame(&data_url).unwrap(), b"jpeg-bytes");

        assert!(matches!(decode_frame("***"), Err(ProviderError::Decode(_))));
        assert!(matches!(decode_frame(""), Err(ProviderError::Decode(_))));
    }

    #[test]
    fn test_detection_defaults_to_present() {
        let d = Detection::from_json(br#"{"landmarks":[]}"#).unwrap();
        assert!(d.present);

        let absent = Detection::from_json(br#"{"present":false}"#).unwrap();
        assert!(absent.into_landmarks().is_none());
    }

    #[test]
    fn test_detection_rejects_bad_confidence() {
        let json = br#"{"landmarks":[{"name":"NOSE","x":1,"y":2,"confidence":3.0}]}"#;
        assert!(matches!(Detection::from_json(json), Err(ProviderError::InvalidResponse(_))));
    }
}
