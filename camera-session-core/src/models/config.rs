use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::camera_models::{Size, ViewFinderAspect};
use super::error::SessionError;

/// Configuration for a camera session.
///
/// Every field has a default, so a partial JSON document is valid input to
/// [`SessionConfig::from_json_str`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Viewfinder aspect passed to the device on open (default: 16:9).
    pub evf_aspect: ViewFinderAspect,

    /// Largest acceptable preview stream size (default: 1280x720).
    pub preferred_preview_ceiling: Size,

    /// Delay between an open failure and the forced failure indication
    /// (default: 1000 ms).
    pub open_failure_feedback_delay_ms: u64,

    /// Shortest recording a stop request may produce (default: 1000 ms).
    pub min_recording_duration_ms: u64,

    /// JPEG quality for post-processed photos, 1..=100 (default: 95).
    pub jpeg_quality: u8,

    /// Rotate and crop captured photos to the viewfinder aspect (default: true).
    pub crop_to_evf_aspect: bool,

    /// Name of the device worker thread (default: "camera-device").
    pub worker_thread_name: String,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.preferred_preview_ceiling.is_empty() {
            return Err(SessionError::InvalidConfiguration(format!(
                "preview ceiling must be non-zero, got {}",
                self.preferred_preview_ceiling
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(SessionError::InvalidConfiguration(format!(
                "jpeg quality out of range: {}",
                self.jpeg_quality
            )));
        }
        if self.worker_thread_name.trim().is_empty() {
            return Err(SessionError::InvalidConfiguration(
                "worker thread name must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, SessionError> {
        let config: SessionConfig = serde_json::from_str(json)
            .map_err(|e| SessionError::InvalidConfiguration(format!("malformed config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn open_failure_feedback_delay(&self) -> Duration {
        Duration::from_millis(self.open_failure_feedback_delay_ms)
    }

    pub fn min_recording_duration(&self) -> Duration {
        Duration::from_millis(self.min_recording_duration_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            evf_aspect: ViewFinderAspect::Wh16x9,
            preferred_preview_ceiling: Size::new(1280, 720),
            open_failure_feedback_delay_ms: 1000,
            min_recording_duration_ms: 1000,
            jpeg_quality: 95,
            crop_to_evf_aspect: true,
            worker_thread_name: "camera-device".into(),
        }
    }
}
