//! Payload provider: detection runs on the client and the frame carries
//! `{"present": bool, "landmarks": [...]}` as JSON.

use super::{Detection, LandmarkProvider, ProviderError};

#[derive(Debug, Clone, Default)]
pub struct PayloadProvider;

#[axum::async_trait]
impl LandmarkProvider for PayloadProvider {
    async fn detect(&self, image: &[u8]) -> Result<Detection, ProviderError> {
        Detection::from_json(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posture::LandmarkKind;

    #[tokio::test]
    async fn test_payload_detection() {
        let json = br#"{"present":true,"landmarks":[{"name":"NOSE","x":1.5,"y":2.5,"confidence":0.9}]}"#;
        let detection = PayloadProvider.detect(json).await.unwrap();

        let set = detection.into_landmarks().unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(LandmarkKind::Nose).map(|lm| lm.x), Some(1.5));
    }

    #[tokio::test]
    async fn test_payload_garbage() {
        let result = PayloadProvider.detect(b"\xff\xd8\xff").await;
        tokio_test::assert_err!(result);
    }
}
