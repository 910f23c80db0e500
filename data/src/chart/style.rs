use iced_core::Color;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::series::SeriesKey;

pub const DEFAULT_UP_COLOR: Color = Color::from_rgb8(0x26, 0xA6, 0x9A);
pub const DEFAULT_DOWN_COLOR: Color = Color::from_rgb8(0xEF, 0x53, 0x50);
pub const DEFAULT_PRICE_COLOR: Color = Color::from_rgb8(0x3C, 0x78, 0xD8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    pub const ALL: [LineStyle; 3] = [LineStyle::Solid, LineStyle::Dashed, LineStyle::Dotted];

    /// Dash segments for the canvas stroke, `None` for a solid line.
    pub fn segments(&self) -> Option<&'static [f32]> {
        match self {
            LineStyle::Solid => None,
            LineStyle::Dashed => Some(&[6.0, 4.0]),
            LineStyle::Dotted => Some(&[1.0, 3.0]),
        }
    }
}

impl std::fmt::Display for LineStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LineStyle::Solid => "Solid",
            LineStyle::Dashed => "Dashed",
            LineStyle::Dotted => "Dotted",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum LineWidth {
    #[default]
    W1,
    W2,
    W3,
    W4,
    W5,
}

impl LineWidth {
    pub const ALL: [LineWidth; 5] = [
        LineWidth::W1,
        LineWidth::W2,
        LineWidth::W3,
        LineWidth::W4,
        LineWidth::W5,
    ];

    pub fn px(&self) -> f32 {
        match self {
            LineWidth::W1 => 1.0,
            LineWidth::W2 => 2.0,
            LineWidth::W3 => 3.0,
            LineWidth::W4 => 4.0,
            LineWidth::W5 => 5.0,
        }
    }
}

impl std::fmt::Display for LineWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}px", self.px())
    }
}

/// Identity of an externally registered renderer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct CustomKindId(pub u16);

/// The closed set of visual styles a series may be drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum RenderKind {
    Candlestick,
    Bars,
    Area,
    Line,
    Step,
    Custom(CustomKindId),
}

impl RenderKind {
    /// Kinds a price (OHLC) series may switch between.
    pub const PRICE: [RenderKind; 5] = [
        RenderKind::Candlestick,
        RenderKind::Bars,
        RenderKind::Area,
        RenderKind::Line,
        RenderKind::Step,
    ];

    pub fn is_ohlc(&self) -> bool {
        matches!(self, RenderKind::Candlestick | RenderKind::Bars)
    }

    pub fn allowed_for_price(&self) -> bool {
        !matches!(self, RenderKind::Custom(_))
    }

    /// Which style axes this kind exposes for configuration.
    ///
    /// `Custom` kinds declare their own axes at registration; this is the
    /// fallback for unregistered ids.
    pub fn style_axes(&self) -> StyleAxes {
        match self {
            RenderKind::Candlestick | RenderKind::Bars => StyleAxes::OHLC,
            RenderKind::Area | RenderKind::Line | RenderKind::Step | RenderKind::Custom(_) => {
                StyleAxes::LINE
            }
        }
    }
}

impl std::fmt::Display for RenderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RenderKind::Candlestick => "Candlestick",
            RenderKind::Bars => "OHLC Bars",
            RenderKind::Area => "Area",
            RenderKind::Line => "Line",
            RenderKind::Step => "Step",
            RenderKind::Custom(_) => "Custom",
        };
        write!(f, "{s}")
    }
}

/// Configurable style axes of a renderer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleAxes {
    pub line_style: bool,
    pub line_width: bool,
    pub up_color: bool,
    pub down_color: bool,
    pub series_color: bool,
}

impl StyleAxes {
    pub const LINE: StyleAxes = StyleAxes {
        line_style: true,
        line_width: true,
        up_color: false,
        down_color: false,
        series_color: true,
    };

    pub const OHLC: StyleAxes = StyleAxes {
        line_style: false,
        line_width: true,
        up_color: true,
        down_color: true,
        series_color: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SeriesStyle {
    pub color: Color,
    pub line_style: LineStyle,
    pub line_width: LineWidth,
    pub up: Option<Color>,
    pub down: Option<Color>,
}

impl SeriesStyle {
    pub fn price() -> Self {
        Self {
            color: DEFAULT_PRICE_COLOR,
            line_style: LineStyle::Solid,
            line_width: LineWidth::W1,
            up: Some(DEFAULT_UP_COLOR),
            down: Some(DEFAULT_DOWN_COLOR),
        }
    }

    pub fn indicator(color: Color) -> Self {
        Self {
            color,
            line_style: LineStyle::Solid,
            line_width: LineWidth::W1,
            up: None,
            down: None,
        }
    }

    pub fn stroke_width(&self) -> f32 {
        self.line_width.px()
    }
}

/// Style of a series as it was when first highlighted, consulted by reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialStyle {
    pub kind: RenderKind,
    pub style: SeriesStyle,
}

/// Per-key record of initial series styles.
///
/// Lifecycle is explicit: a record is captured on first highlight and erased
/// when the series is removed, so a later series reusing the key starts
/// fresh.
#[derive(Debug, Default)]
pub struct StyleMemory {
    initial: FxHashMap<SeriesKey, InitialStyle>,
}

impl StyleMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the style for `key` unless one is already held.
    pub fn capture(&mut self, key: &SeriesKey, kind: RenderKind, style: SeriesStyle) {
        self.initial
            .entry(key.clone())
            .or_insert(InitialStyle { kind, style });
    }

    pub fn get(&self, key: &SeriesKey) -> Option<&InitialStyle> {
        self.initial.get(key)
    }

    pub fn forget(&mut self, key: &SeriesKey) {
        self.initial.remove(key);
    }
}
