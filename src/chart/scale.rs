use iced::{Color, Rectangle, theme::palette::Extended};

use data::util::{abbr_large_numbers, format_with_precision};

const MAX_LABEL_ITERATIONS: usize = 1000;

/// How many item slots the widest candle may span, the policy behind the
/// stick width cap in `chart::renderer::Projection`.
pub const MAX_STICK_SPAN_ITEMS: f32 = 20.0;

pub fn max_allowed_stick_px(slot_px: f32) -> f32 {
    slot_px * MAX_STICK_SPAN_ITEMS
}

/// Pick a tick step and a rounded upper bound for the given value range.
pub fn calc_optimal_ticks(highest: f32, lowest: f32, labels_can_fit: i32) -> (f32, f32) {
    let range = (highest - lowest).abs().max(f32::EPSILON);
    let labels = labels_can_fit.max(1) as f32;

    let base = 10.0f32.powf(range.log10().floor());

    let step = match range / base {
        r if r <= labels * 0.1 => 0.1 * base,
        r if r <= labels * 0.2 => 0.2 * base,
        r if r <= labels * 0.5 => 0.5 * base,
        r if r <= labels => base,
        r if r <= labels * 2.0 => 2.0 * base,
        _ => (range / labels).min(5.0 * base),
    };

    let rounded_highest = (highest / step).ceil() * step;
    (step, rounded_highest)
}

#[derive(Debug, Clone, PartialEq)]
pub struct YLabel {
    /// Vertical position within the pane area, in px.
    pub y: f32,
    pub text: String,
}

/// Y-axis labels for one pane, formatted with its decimal precision.
pub fn generate_labels(
    area: Rectangle,
    lowest: f32,
    highest: f32,
    text_size: f32,
    decimals: Option<usize>,
) -> Vec<YLabel> {
    if !lowest.is_finite() || !highest.is_finite() {
        return Vec::new();
    }
    if (highest - lowest).abs() < f32::EPSILON {
        return Vec::new();
    }

    let format = |value: f32| -> String {
        match decimals {
            Some(decimals) => format_with_precision(value, decimals),
            None => abbr_large_numbers(value),
        }
    };

    let labels_can_fit = (area.height / (text_size * 3.0)) as i32;
    if labels_can_fit <= 1 {
        return vec![YLabel {
            y: area.y,
            text: format(highest),
        }];
    }

    let (step, max) = calc_optimal_ticks(highest, lowest, labels_can_fit);

    let mut value = max;
    while value > highest {
        value -= step;
    }

    let mut labels = Vec::with_capacity((labels_can_fit + 2) as usize);
    let mut safety_counter = 0;

    while value >= lowest && safety_counter < MAX_LABEL_ITERATIONS {
        let clamped = value.clamp(lowest, highest);
        let y = area.y + area.height - ((clamped - lowest) / (highest - lowest) * area.height);
        labels.push(YLabel {
            y,
            text: format(value),
        });

        value -= step;
        safety_counter += 1;
    }

    labels
}

/// Last close and its direction, for the price line and its axis tag.
#[derive(Debug, Clone, Copy)]
pub enum PriceInfoLabel {
    Up(f32),
    Down(f32),
    Neutral(f32),
}

impl PriceInfoLabel {
    pub fn new(close: f32, open: f32) -> Self {
        if close >= open {
            PriceInfoLabel::Up(close)
        } else {
            PriceInfoLabel::Down(close)
        }
    }

    pub fn get_with_color(self, palette: &Extended) -> (f32, Color) {
        match self {
            PriceInfoLabel::Up(p) => (p, palette.success.base.color),
            PriceInfoLabel::Down(p) => (p, palette.danger.base.color),
            PriceInfoLabel::Neutral(p) => (p, palette.secondary.strong.color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iced::{Point, Size};

    #[test]
    fn optimal_ticks_cover_the_range() {
        let (step, max) = calc_optimal_ticks(105.0, 95.0, 5);
        assert!(step > 0.0);
        assert!(max >= 105.0);
        assert!((max / step).fract().abs() < 1e-3);
    }

    #[test]
    fn labels_respect_precision_and_bounds() {
        let area = Rectangle::new(Point::ORIGIN, Size::new(60.0, 300.0));
        let labels = generate_labels(area, 10.0, 20.0, 12.0, Some(2));

        assert!(!labels.is_empty());
        assert!(labels.iter().all(|l| l.text.contains('.')));
        assert!(
            labels
                .iter()
                .all(|l| l.y >= area.y - 1.0 && l.y <= area.y + area.height + 1.0)
        );
    }

    #[test]
    fn degenerate_ranges_produce_no_labels() {
        let area = Rectangle::new(Point::ORIGIN, Size::new(60.0, 300.0));
        assert!(generate_labels(area, 5.0, 5.0, 12.0, None).is_empty());
        assert!(generate_labels(area, f32::NAN, 5.0, 12.0, None).is_empty());
    }

    #[test]
    fn price_label_direction() {
        assert!(matches!(PriceInfoLabel::new(11.0, 10.0), PriceInfoLabel::Up(_)));
        assert!(matches!(PriceInfoLabel::new(9.0, 10.0), PriceInfoLabel::Down(_)));
    }
}
