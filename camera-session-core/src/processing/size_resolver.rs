//! Frame size negotiation.
//!
//! Picks preview and still sizes from a device's supported set. The target
//! aspect is always snapped to 4:3 or 16:9 first; filtering on the raw ratio
//! tends to leave an empty candidate set.

use log::debug;

use crate::models::camera_models::{Size, SizeNegotiation};

/// Max |aspect - snapped aspect| for a size to count as matching.
pub const ASPECT_RATIO_CLEARANCE: f32 = 0.01;

const ASPECT_4_3: f32 = 4.0 / 3.0;
const ASPECT_16_9: f32 = 16.0 / 9.0;

/// Snap `target_aspect` to the nearer of 4:3 and 16:9. Ties go to 16:9.
pub fn snap_aspect(target_aspect: f32) -> f32 {
    let diff_4_3 = (ASPECT_4_3 - target_aspect).abs();
    let diff_16_9 = (ASPECT_16_9 - target_aspect).abs();
    if diff_4_3 < diff_16_9 {
        ASPECT_4_3
    } else {
        ASPECT_16_9
    }
}

fn aspect_matches(size: &Size, snapped: f32) -> bool {
    (size.aspect_wh() - snapped).abs() < ASPECT_RATIO_CLEARANCE
}

/// Widest candidate; among equal widths the first one in slice order wins.
fn widest<'a>(candidates: impl Iterator<Item = &'a Size>) -> Option<Size> {
    candidates.fold(None, |best: Option<Size>, size| match best {
        Some(b) if b.width >= size.width => Some(b),
        _ => Some(*size),
    })
}

/// Pick the preview stream size.
///
/// Among sizes matching the snapped aspect, returns the widest one that fits
/// inside `preferred_ceiling`. Falls back to the first supported size.
/// Returns `None` only when `supported_sizes` is empty.
pub fn resolve_preview_size(
    target_aspect: f32,
    supported_sizes: &[Size],
    preferred_ceiling: Size,
) -> Option<Size> {
    let snapped = snap_aspect(target_aspect);
    let chosen = widest(
        supported_sizes
            .iter()
            .filter(|s| aspect_matches(s, snapped))
            .filter(|s| s.fits_within(preferred_ceiling)),
    );
    let result = chosen.or_else(|| supported_sizes.first().copied());
    debug!(
        "preview size: target={:.3} snapped={:.3} ceiling={} -> {:?}",
        target_aspect, snapped, preferred_ceiling, result
    );
    result
}

/// Pick the still picture size: the widest size matching the snapped aspect,
/// with no ceiling. Falls back to the first supported size.
pub fn resolve_picture_size(target_aspect: f32, supported_sizes: &[Size]) -> Option<Size> {
    let snapped = snap_aspect(target_aspect);
    let chosen = widest(supported_sizes.iter().filter(|s| aspect_matches(s, snapped)));
    let result = chosen.or_else(|| supported_sizes.first().copied());
    debug!(
        "picture size: target={:.3} snapped={:.3} -> {:?}",
        target_aspect, snapped, result
    );
    result
}

/// Resolve both sizes for one device open.
pub fn negotiate(
    target_aspect: f32,
    preview_sizes: &[Size],
    picture_sizes: &[Size],
    preferred_ceiling: Size,
) -> Option<SizeNegotiation> {
    Some(SizeNegotiation {
        preview: resolve_preview_size(target_aspect, preview_sizes, preferred_ceiling)?,
        picture: resolve_picture_size(target_aspect, picture_sizes)?,
    })
}
