//! Sensor-to-display rotation math.
//!
//! Preview uses the display rotation; still capture uses the live device
//! tilt rounded to the nearest quarter turn. Front-facing cameras mirror, so
//! the device angle enters the composition with the opposite sign.

use crate::models::camera_models::{CameraInfo, DisplayRotation, Facing};

/// Clockwise rotation to apply to preview frames so they appear upright.
pub fn preview_rotation(info: &CameraInfo, display: DisplayRotation) -> u32 {
    let sensor = info.sensor_orientation % 360;
    let display = display.degrees();
    match info.facing {
        Facing::Back => (sensor + 360 - display) % 360,
        Facing::Front => (360 - (sensor + display) % 360) % 360,
    }
}

/// Round a device tilt in degrees to the nearest multiple of 90 in 0..360.
pub fn round_device_orientation(degrees: i32) -> u32 {
    (((degrees.rem_euclid(360) + 45) / 90 * 90) % 360) as u32
}

/// Rotation to record in a still photo.
///
/// `device_orientation` is the latest tilt reported by the orientation
/// listener, or `None` while it is unknown (device lying flat, no reading
/// yet); unknown tilt yields 0.
pub fn capture_rotation(info: &CameraInfo, device_orientation: Option<i32>) -> u32 {
    let Some(tilt) = device_orientation else {
        return 0;
    };
    let tilt = round_device_orientation(tilt);
    let sensor = info.sensor_orientation % 360;
    match info.facing {
        Facing::Back => (sensor + tilt) % 360,
        Facing::Front => (sensor + 360 - tilt) % 360,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn back(sensor: u32) -> CameraInfo {
        CameraInfo {
            facing: Facing::Back,
            sensor_orientation: sensor,
        }
    }

    fn front(sensor: u32) -> CameraInfo {
        CameraInfo {
            facing: Facing::Front,
            sensor_orientation: sensor,
        }
    }

    #[test]
    fn back_camera_preview_subtracts_display_rotation() {
        assert_eq!(preview_rotation(&back(90), DisplayRotation::Rotate0), 90);
        assert_eq!(preview_rotation(&back(90), DisplayRotation::Rotate90), 0);
        assert_eq!(preview_rotation(&back(90), DisplayRotation::Rotate270), 180);
        assert_eq!(preview_rotation(&back(0), DisplayRotation::Rotate90), 270);
    }

    #[test]
    fn front_camera_preview_is_mirrored() {
        assert_eq!(preview_rotation(&front(270), DisplayRotation::Rotate0), 90);
        assert_eq!(preview_rotation(&front(270), DisplayRotation::Rotate90), 0);
        assert_eq!(preview_rotation(&front(90), DisplayRotation::Rotate180), 90);
    }

    #[test]
    fn device_orientation_rounds_to_nearest_quarter() {
        assert_eq!(round_device_orientation(0), 0);
        assert_eq!(round_device_orientation(44), 0);
        assert_eq!(round_device_orientation(45), 90);
        assert_eq!(round_device_orientation(200), 180);
        assert_eq!(round_device_orientation(330), 0);
        assert_eq!(round_device_orientation(314), 270);
    }

    #[test]
    fn capture_rotation_composes_with_facing_sign() {
        assert_eq!(capture_rotation(&back(90), Some(0)), 90);
        assert_eq!(capture_rotation(&back(90), Some(92)), 180);
        assert_eq!(capture_rotation(&back(90), Some(275)), 0);
        assert_eq!(capture_rotation(&front(270), Some(90)), 180);
        assert_eq!(capture_rotation(&front(270), Some(0)), 270);
    }

    #[test]
    fn unknown_tilt_records_no_rotation() {
        assert_eq!(capture_rotation(&back(90), None), 0);
        assert_eq!(capture_rotation(&front(270), None), 0);
    }
}
