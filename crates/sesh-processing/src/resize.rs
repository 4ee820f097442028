//! Aspect-preserving bounds for derived assets.
//!
//! Previews and thumbnails only ever shrink: a source already inside the
//! bound keeps its natural size.

use image::imageops::FilterType;

/// Fit `(width, height)` within `max_px` on the longest side.
pub fn fit_within(width: u32, height: u32, max_px: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_px || longest == 0 {
        return (width, height);
    }

    let scale = max_px as f32 / longest as f32;
    let new_width = ((width as f32 * scale).round() as u32).max(1);
    let new_height = ((height as f32 * scale).round() as u32).max(1);
    (new_width, new_height)
}

/// Same bound with both sides rounded down to even values, which the video
/// encoder requires for yuv420p output.
pub fn fit_within_even(width: u32, height: u32, max_px: u32) -> (u32, u32) {
    let (new_width, new_height) = fit_within(width, height, max_px);
    (round_down_even(new_width), round_down_even(new_height))
}

fn round_down_even(px: u32) -> u32 {
    ((px / 2) * 2).max(2)
}

/// Choose a resampling filter by downscale ratio: strong downscales hide a
/// cheaper filter, mild ones keep the sharper and slower one.
pub fn select_filter(
    orig_width: u32,
    orig_height: u32,
    new_width: u32,
    new_height: u32,
) -> FilterType {
    let width_ratio = orig_width as f32 / new_width as f32;
    let height_ratio = orig_height as f32 / new_height as f32;
    let max_ratio = width_ratio.max(height_ratio);

    if max_ratio > 2.0 {
        FilterType::Triangle
    } else if max_ratio > 1.5 {
        FilterType::CatmullRom
    } else {
        FilterType::Lanczos3
    }
}
