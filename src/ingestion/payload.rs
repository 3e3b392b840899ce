//! Wire payload types shared by the persistent channel and the one-shot
//! upload endpoint.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error_handling::types::IngestError;

/// Device identity attached to a capture submission.
///
/// The persistent channel spells the keys `deviceName`/`platform`; the
/// one-shot HTTP body historically used `device_name` and `type`. Aliases
/// accept every observed spelling; serialization emits the channel form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default, alias = "type")]
    pub platform: Option<String>,
    #[serde(
        default,
        rename = "deviceName",
        alias = "device_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub device_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udid: Option<String>,
}

/// One screenshot submission.
///
/// `image` is a data URI (`data:image/png;base64,<payload>`); `timestamp` is
/// the client-side capture time, server-stamped when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRequest {
    pub image: String,
    #[serde(rename = "deviceInfo", alias = "device_info", default)]
    pub device_info: DeviceInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Acknowledgement returned to the submitting client on both entry points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureAck {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CaptureAck {
    pub fn success(filename: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            filename: Some(filename.into()),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            filename: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Decode the image payload out of its data URI wrapping.
///
/// The comma delimiter is mandatory; everything before it is carried but not
/// trusted. Undecodable base64 and empty decoded payloads are rejected. The
/// rejection reasons describe the payload only, never server paths.
pub fn decode_image(image: &str) -> Result<Vec<u8>, IngestError> {
    let (_, encoded) = image
        .split_once(',')
        .ok_or_else(|| IngestError::BadPayload("missing data URI delimiter".to_string()))?;
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| IngestError::BadPayload(format!("base64 decode failed: {}", e)))?;
    if bytes.is_empty() {
        return Err(IngestError::BadPayload("decoded image is empty".to_string()));
    }
    Ok(bytes)
}

/// Encode raw image bytes into the data URI form the collector expects.
pub fn encode_image(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_roundtrip() {
        let encoded = encode_image(b"screenshot-bytes");
        assert_eq!(decode_image(&encoded).unwrap(), b"screenshot-bytes");
    }

    #[test]
    fn test_decode_rejects_missing_delimiter() {
        let err = decode_image("aGVsbG8=").unwrap_err();
        assert!(matches!(err, IngestError::BadPayload(_)));
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let err = decode_image("data:image/png;base64,!!!not-base64!!!").unwrap_err();
        assert!(matches!(err, IngestError::BadPayload(_)));
    }

    #[test]
    fn test_decode_rejects_empty_payload() {
        let err = decode_image("data:image/png;base64,").unwrap_err();
        assert!(matches!(err, IngestError::BadPayload(_)));
    }

    #[test]
    fn test_device_info_accepts_channel_spelling() {
        let info: DeviceInfo = serde_json::from_str(
            r#"{"platform": "iOS", "deviceName": "iPhone", "udid": "abc-123"}"#,
        )
        .unwrap();
        assert_eq!(info.platform.as_deref(), Some("iOS"));
        assert_eq!(info.device_name.as_deref(), Some("iPhone"));
        assert_eq!(info.udid.as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_device_info_accepts_one_shot_spelling() {
        let info: DeviceInfo =
            serde_json::from_str(r#"{"type": "Android", "device_name": "Pixel"}"#).unwrap();
        assert_eq!(info.platform.as_deref(), Some("Android"));
        assert_eq!(info.device_name.as_deref(), Some("Pixel"));
    }

    #[test]
    fn test_capture_request_accepts_both_device_info_keys() {
        let channel: CaptureRequest = serde_json::from_str(
            r#"{"image": "data:,aGk=", "deviceInfo": {"platform": "iOS"},
                "timestamp": "2024-01-01T12:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(channel.device_info.platform.as_deref(), Some("iOS"));
        assert!(channel.timestamp.is_some());

        let one_shot: CaptureRequest =
            serde_json::from_str(r#"{"image": "data:,aGk=", "device_info": {"type": "Android"}}"#)
                .unwrap();
        assert_eq!(one_shot.device_info.platform.as_deref(), Some("Android"));
        assert!(one_shot.timestamp.is_none());
    }

    #[test]
    fn test_ack_constructors() {
        let ok = CaptureAck::success("shot.png");
        assert!(ok.is_success());
        assert_eq!(ok.filename.as_deref(), Some("shot.png"));

        let err = CaptureAck::error("bad payload");
        assert!(!err.is_success());
        assert_eq!(err.message.as_deref(), Some("bad payload"));
        assert!(err.filename.is_none());
    }
}
