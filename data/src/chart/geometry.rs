//! Candle body and stroke width scaling as a function of visible item density.
//!
//! Everything here is a pure function of its arguments; renderers call into
//! this once per frame with the visible item count and the pixel budget of
//! the draw area along the category axis.

/// Minimum stroke width in px, also the floor of the stick width clamp.
pub const STROKE_SCALING_MIN_WIDTH: f32 = 0.3;
/// Below this many visible items the configured stroke width is used as-is.
pub const STROKE_SCALING_MIN_ITEMS: usize = 200;
/// Above this many visible items the stroke collapses to the minimum.
pub const STROKE_SCALING_MAX_ITEMS: usize = 2500;

const AUTO_WIDTH_SCALING_MIN_ITEMS: usize = 10;
const AUTO_WIDTH_SCALING_MAX_ITEMS: usize = 200;

const AUTO_WIDTH_FACTOR: f32 = 4.5 / 7.0;
const AUTO_WIDTH_FACTOR_SMALL: f32 = 0.9;

/// Stroke width for wicks/outlines at the given density.
///
/// Full `max_stroke_width` up to 200 visible items, a fixed 0.3 px past
/// 2500, linearly interpolated in between.
pub fn stroke_width(item_count: usize, max_stroke_width: f32) -> f32 {
    if item_count > STROKE_SCALING_MAX_ITEMS {
        STROKE_SCALING_MIN_WIDTH
    } else if item_count <= STROKE_SCALING_MIN_ITEMS {
        max_stroke_width
    } else {
        let width_difference = max_stroke_width - STROKE_SCALING_MIN_WIDTH;
        let item_ratio = (item_count - STROKE_SCALING_MIN_ITEMS) as f32
            / (STROKE_SCALING_MAX_ITEMS - STROKE_SCALING_MIN_ITEMS) as f32;
        STROKE_SCALING_MIN_WIDTH.max(max_stroke_width - width_difference * item_ratio)
    }
}

/// Candle body width for `item_count` visible items sharing `available_px`
/// along the category axis.
///
/// `max_allowed_width` caps the result; it comes from the chart's
/// max-span-per-item policy mapped through the x scale.
pub fn stick_width(item_count: usize, available_px: f32, max_allowed_width: f32) -> f32 {
    let item_count = item_count.max(1);
    let mut width = available_px / item_count as f32;

    if item_count > AUTO_WIDTH_SCALING_MAX_ITEMS {
        // dynamic gap keeps bodies visually separated at high densities
        width -= 2.0 * (item_count as f32 / 1000.0);
        width *= AUTO_WIDTH_FACTOR;
    } else if item_count > AUTO_WIDTH_SCALING_MIN_ITEMS {
        let factor_difference = AUTO_WIDTH_FACTOR_SMALL - AUTO_WIDTH_FACTOR;
        let item_ratio = item_count as f32 / AUTO_WIDTH_SCALING_MAX_ITEMS as f32;
        width *= AUTO_WIDTH_FACTOR_SMALL - factor_difference * item_ratio;
    } else {
        width *= AUTO_WIDTH_FACTOR_SMALL;
    }

    width = width.min(max_allowed_width);
    width.max(STROKE_SCALING_MIN_WIDTH.min(max_allowed_width))
}
