use std::sync::Arc;

use crate::models::camera_models::Size;

/// Display target for the preview stream.
pub trait PreviewSurface: Send + Sync {
    fn size(&self) -> Size;

    /// `false` once the platform has destroyed the surface.
    fn is_valid(&self) -> bool;
}

pub type SurfaceHandle = Arc<dyn PreviewSurface>;

/// UI collaborator of the session controller.
///
/// Notifications are delivered on the dispatcher context, one at a time.
/// [`SessionView::preview_surface`] is queried while the controller holds
/// its lock, so implementations must not call back into the controller
/// from it.
pub trait SessionView: Send + Sync {
    /// The surface to bind the preview to, once the platform has created it.
    fn preview_surface(&self) -> Option<SurfaceHandle>;

    fn on_scan_started(&self);

    fn on_scan_done(&self, success: bool);

    fn on_shutter_done(&self);

    fn on_recording_started(&self);

    fn on_recording_stopped(&self);

    /// Reset scan and capture indicators.
    fn clear(&self);

    /// The session gave up on the camera; the view should close itself.
    fn force_stop(&self);
}
