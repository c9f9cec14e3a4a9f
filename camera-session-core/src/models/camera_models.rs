use std::fmt;

use serde::{Deserialize, Serialize};

/// Frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width / height ratio. Zero-height sizes report an infinite ratio.
    pub fn aspect_wh(&self) -> f32 {
        if self.height == 0 {
            return f32::INFINITY;
        }
        self.width as f32 / self.height as f32
    }

    /// Whether this size fits inside `ceiling` in both dimensions.
    pub fn fits_within(&self, ceiling: Size) -> bool {
        self.width <= ceiling.width && self.height <= ceiling.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Viewfinder aspect ratio selectable by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ViewFinderAspect {
    #[serde(rename = "1:1")]
    Wh1x1,
    #[serde(rename = "4:3")]
    Wh4x3,
    #[default]
    #[serde(rename = "16:9")]
    Wh16x9,
}

impl ViewFinderAspect {
    /// Width / height ratio. Always >= 1.0.
    pub fn ratio_wh(&self) -> f32 {
        match self {
            Self::Wh1x1 => 1.0,
            Self::Wh4x3 => 4.0 / 3.0,
            Self::Wh16x9 => 16.0 / 9.0,
        }
    }
}

impl fmt::Display for ViewFinderAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wh1x1 => write!(f, "1:1"),
            Self::Wh4x3 => write!(f, "4:3"),
            Self::Wh16x9 => write!(f, "16:9"),
        }
    }
}

/// Which way the lens points relative to the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    #[default]
    Back,
    Front,
}

/// Current rotation of the display, clockwise from its natural orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayRotation {
    #[default]
    Rotate0,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl DisplayRotation {
    pub fn degrees(&self) -> u32 {
        match self {
            Self::Rotate0 => 0,
            Self::Rotate90 => 90,
            Self::Rotate180 => 180,
            Self::Rotate270 => 270,
        }
    }

    /// Normalise an arbitrary degree value, snapping to the nearest quarter turn.
    pub fn from_degrees(degrees: i32) -> Self {
        match ((degrees.rem_euclid(360) + 45) / 90) % 4 {
            1 => Self::Rotate90,
            2 => Self::Rotate180,
            3 => Self::Rotate270,
            _ => Self::Rotate0,
        }
    }
}

/// Static properties of a camera module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraInfo {
    pub facing: Facing,
    /// Clockwise angle the sensor image must be rotated to appear upright
    /// on the display in its natural orientation. One of 0, 90, 180, 270.
    pub sensor_orientation: u32,
}

impl Default for CameraInfo {
    fn default() -> Self {
        Self {
            facing: Facing::Back,
            sensor_orientation: 90,
        }
    }
}

/// Preview and still sizes chosen once per device open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeNegotiation {
    pub preview: Size,
    pub picture: Size,
}

/// Phases of a single still capture, delivered in order for one request id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Exposure finished.
    Shutter { request_id: u64 },
    /// Capture sequence finished; the device accepts the next request.
    /// `success == false` means no photo will follow for this id.
    Done { request_id: u64, success: bool },
    /// Encoded photo ready to store.
    PhotoReady { request_id: u64, data: Vec<u8> },
}

impl CaptureEvent {
    pub fn request_id(&self) -> u64 {
        match self {
            Self::Shutter { request_id }
            | Self::Done { request_id, .. }
            | Self::PhotoReady { request_id, .. } => *request_id,
        }
    }
}
