//! Pure calculation functions for derivative dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale natural dimensions so the longer edge equals `max_dimension`.
///
/// The shorter edge is scaled by the same ratio and floored. Both outputs
/// are clamped to at least 1 so extreme panoramas never collapse to a zero
/// edge. Sources smaller than the bound are scaled up.
///
/// # Arguments
/// * `natural` - Source dimensions (width, height), both positive
/// * `max_dimension` - Target size of the longer edge
///
/// # Returns
/// * `(width, height)` - Derivative dimensions
///
/// # Examples
/// ```
/// # use album_resizer::imaging::compute_target_dimensions;
/// // 4:3 landscape into a 256px bound → 256x192
/// assert_eq!(compute_target_dimensions((4000, 3000), 256), (256, 192));
///
/// // Portrait: height takes the bound
/// assert_eq!(compute_target_dimensions((3000, 4000), 256), (192, 256));
/// ```
pub fn compute_target_dimensions(natural: (u32, u32), max_dimension: u32) -> (u32, u32) {
    let (width, height) = natural;

    if width > height {
        // Landscape: width is the longer edge
        (max_dimension, scale_floor(height, max_dimension, width))
    } else {
        // Portrait or square: height is the longer edge
        (scale_floor(width, max_dimension, height), max_dimension)
    }
}

/// `floor(edge * bound / longer)`, at least 1.
fn scale_floor(edge: u32, bound: u32, longer: u32) -> u32 {
    let scaled = u64::from(edge) * u64::from(bound) / u64::from(longer.max(1));
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}
