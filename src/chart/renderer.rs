use iced::{Color, Point, Rectangle, Size};
use rustc_hash::FxHashMap;

use data::chart::geometry;
use data::chart::style::{CustomKindId, RenderKind, SeriesStyle, StyleAxes};

use super::series::{PlotSource, SeriesCategory, SeriesEntry};

/// Stroke selection handed to the render surface alongside geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSpec {
    pub width: f32,
    pub color: Color,
    pub dash: Option<&'static [f32]>,
}

/// Where computed geometry ends up.
///
/// The engine never touches pixels itself; an iced `canvas::Frame` adapter
/// lives in `chart::paint`.
pub trait PaintSurface {
    fn fill_rect(&mut self, top_left: Point, size: Size, color: Color);

    fn stroke_line(&mut self, from: Point, to: Point, stroke: StrokeSpec);

    fn fill_polygon(&mut self, points: &[Point], color: Color);
}

/// Mapping of a pane's item/value space onto its pixel area for one frame.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    pub area: Rectangle,
    /// First visible item index.
    pub first: usize,
    /// Visible item count.
    pub count: usize,
    pub min: f32,
    pub max: f32,
    /// Stick width cap from the max-span-per-item policy, in px.
    pub max_stick_px: f32,
}

impl Projection {
    pub fn slot_width(&self) -> f32 {
        self.area.width / self.count.max(1) as f32
    }

    pub fn x_of(&self, item: usize) -> f32 {
        let slot = self.slot_width();
        self.area.x + (item.saturating_sub(self.first)) as f32 * slot + slot / 2.0
    }

    pub fn y_of(&self, value: f32) -> f32 {
        if self.max <= self.min {
            self.area.y + self.area.height
        } else {
            let ratio = (value - self.min) / (self.max - self.min);
            self.area.y + self.area.height - ratio * self.area.height
        }
    }

    fn visible_items(&self, source: &dyn PlotSource) -> std::ops::Range<usize> {
        self.first..(self.first + self.count).min(source.len())
    }
}

/// Renderer bound to a single series.
///
/// While disabled, style edits land on a shadow copy that `enable` discards,
/// and `draw` emits nothing; the pre-disable kind and style come back
/// untouched.
pub struct SeriesRenderer {
    kind: RenderKind,
    style: SeriesStyle,
    shadow: Option<SeriesStyle>,
}

impl SeriesRenderer {
    pub fn new(kind: RenderKind, style: SeriesStyle) -> Self {
        Self {
            kind,
            style,
            shadow: None,
        }
    }

    pub fn kind(&self) -> RenderKind {
        self.kind
    }

    pub fn style(&self) -> &SeriesStyle {
        self.shadow.as_ref().unwrap_or(&self.style)
    }

    pub fn style_mut(&mut self) -> &mut SeriesStyle {
        self.shadow.as_mut().unwrap_or(&mut self.style)
    }

    pub fn is_disabled(&self) -> bool {
        self.shadow.is_some()
    }

    pub(super) fn disable(&mut self) {
        if self.shadow.is_none() {
            self.shadow = Some(self.style);
        }
    }

    pub(super) fn enable(&mut self) {
        self.shadow = None;
    }

    fn set_kind(&mut self, kind: RenderKind) {
        self.kind = kind;
    }

    pub fn draw(
        &self,
        source: &dyn PlotSource,
        proj: &Projection,
        registry: &RendererRegistry,
        surface: &mut dyn PaintSurface,
    ) {
        if self.is_disabled() {
            return;
        }

        match self.kind {
            RenderKind::Candlestick => self.draw_candles(source, proj, surface),
            RenderKind::Bars => self.draw_bars(source, proj, surface),
            RenderKind::Line => self.draw_line(source, proj, surface),
            RenderKind::Step => self.draw_step(source, proj, surface),
            RenderKind::Area => self.draw_area(source, proj, surface),
            RenderKind::Custom(id) => {
                if let Some(spec) = registry.custom(id) {
                    (spec.draw)(surface, source, proj, &self.style);
                }
            }
        }
    }

    fn up_down_color(&self, is_up: bool) -> Color {
        if is_up {
            self.style.up.unwrap_or(self.style.color)
        } else {
            self.style.down.unwrap_or(self.style.color)
        }
    }

    fn draw_candles(&self, source: &dyn PlotSource, proj: &Projection, surface: &mut dyn PaintSurface) {
        let stick = geometry::stick_width(proj.count, proj.area.width, proj.max_stick_px);
        let wick = StrokeSpec {
            width: geometry::stroke_width(proj.count, self.style.stroke_width()),
            color: self.style.color,
            dash: None,
        };

        for item in proj.visible_items(source) {
            let Some(ohlc) = source.ohlc(item) else {
                continue;
            };
            if !ohlc.close.is_finite() || !ohlc.open.is_finite() {
                continue;
            }

            let x = proj.x_of(item);
            let color = self.up_down_color(ohlc.is_up());
            let body_high = ohlc.open.max(ohlc.close);
            let body_low = ohlc.open.min(ohlc.close);

            if ohlc.high > body_high {
                surface.stroke_line(
                    Point::new(x, proj.y_of(ohlc.high)),
                    Point::new(x, proj.y_of(body_high)),
                    StrokeSpec { color, ..wick },
                );
            }
            if ohlc.low < body_low {
                surface.stroke_line(
                    Point::new(x, proj.y_of(ohlc.low)),
                    Point::new(x, proj.y_of(body_low)),
                    StrokeSpec { color, ..wick },
                );
            }

            let top = proj.y_of(body_high);
            let bottom = proj.y_of(body_low);
            surface.fill_rect(
                Point::new(x - stick / 2.0, top),
                Size::new(stick, (bottom - top).max(1.0)),
                color,
            );
        }
    }

    fn draw_bars(&self, source: &dyn PlotSource, proj: &Projection, surface: &mut dyn PaintSurface) {
        let stick = geometry::stick_width(proj.count, proj.area.width, proj.max_stick_px);
        let width = geometry::stroke_width(proj.count, self.style.stroke_width());

        for item in proj.visible_items(source) {
            let Some(ohlc) = source.ohlc(item) else {
                continue;
            };
            if !ohlc.close.is_finite() || !ohlc.open.is_finite() {
                continue;
            }

            let x = proj.x_of(item);
            let stroke = StrokeSpec {
                width,
                color: self.up_down_color(ohlc.is_up()),
                dash: None,
            };

            surface.stroke_line(
                Point::new(x, proj.y_of(ohlc.high)),
                Point::new(x, proj.y_of(ohlc.low)),
                stroke,
            );
            surface.stroke_line(
                Point::new(x - stick / 2.0, proj.y_of(ohlc.open)),
                Point::new(x, proj.y_of(ohlc.open)),
                stroke,
            );
            surface.stroke_line(
                Point::new(x, proj.y_of(ohlc.close)),
                Point::new(x + stick / 2.0, proj.y_of(ohlc.close)),
                stroke,
            );
        }
    }

    fn line_stroke(&self) -> StrokeSpec {
        StrokeSpec {
            width: self.style.stroke_width(),
            color: self.style.color,
            dash: self.style.line_style.segments(),
        }
    }

    fn draw_line(&self, source: &dyn PlotSource, proj: &Projection, surface: &mut dyn PaintSurface) {
        let stroke = self.line_stroke();
        let mut prev: Option<Point> = None;

        for item in proj.visible_items(source) {
            let y = source.y(item);
            if !y.is_finite() {
                prev = None;
                continue;
            }
            let point = Point::new(proj.x_of(item), proj.y_of(y));
            if let Some(last) = prev {
                surface.stroke_line(last, point, stroke);
            }
            prev = Some(point);
        }
    }

    fn draw_step(&self, source: &dyn PlotSource, proj: &Projection, surface: &mut dyn PaintSurface) {
        let stroke = self.line_stroke();
        let mut prev: Option<Point> = None;

        for item in proj.visible_items(source) {
            let y = source.y(item);
            if !y.is_finite() {
                prev = None;
                continue;
            }
            let point = Point::new(proj.x_of(item), proj.y_of(y));
            if let Some(last) = prev {
                let corner = Point::new(point.x, last.y);
                surface.stroke_line(last, corner, stroke);
                surface.stroke_line(corner, point, stroke);
            }
            prev = Some(point);
        }
    }

    fn draw_area(&self, source: &dyn PlotSource, proj: &Projection, surface: &mut dyn PaintSurface) {
        let baseline = proj.area.y + proj.area.height;
        let fill = self.style.color.scale_alpha(0.25);
        let mut run: Vec<Point> = Vec::new();

        let flush = |run: &mut Vec<Point>, surface: &mut dyn PaintSurface| {
            if run.len() > 1 {
                let mut polygon = run.clone();
                polygon.push(Point::new(run[run.len() - 1].x, baseline));
                polygon.push(Point::new(run[0].x, baseline));
                surface.fill_polygon(&polygon, fill);
            }
            run.clear();
        };

        for item in proj.visible_items(source) {
            let y = source.y(item);
            if !y.is_finite() {
                flush(&mut run, surface);
                continue;
            }
            run.push(Point::new(proj.x_of(item), proj.y_of(y)));
        }
        flush(&mut run, surface);

        self.draw_line(source, proj, surface);
    }
}

/// Externally supplied renderer kind: name, configurable axes, draw fn.
pub struct CustomRenderSpec {
    pub name: String,
    pub axes: StyleAxes,
    pub draw: CustomDrawFn,
}

pub type CustomDrawFn =
    Box<dyn Fn(&mut dyn PaintSurface, &dyn PlotSource, &Projection, &SeriesStyle)>;

/// Owns custom renderer specs and performs kind switches with lossless
/// style transfer.
#[derive(Default)]
pub struct RendererRegistry {
    custom: FxHashMap<CustomKindId, CustomRenderSpec>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: CustomKindId, spec: CustomRenderSpec) {
        self.custom.insert(id, spec);
    }

    pub fn custom(&self, id: CustomKindId) -> Option<&CustomRenderSpec> {
        self.custom.get(&id)
    }

    pub fn style_axes(&self, kind: RenderKind) -> StyleAxes {
        match kind {
            RenderKind::Custom(id) => self
                .custom
                .get(&id)
                .map_or(kind.style_axes(), |spec| spec.axes),
            _ => kind.style_axes(),
        }
    }

    /// Switch a series to another renderer kind, carrying over color,
    /// stroke, and up/down colors.
    ///
    /// Kinds not permitted for the entry's category are a silent no-op, as
    /// are kind changes while the series is hidden.
    pub fn set_kind(&self, entry: &mut SeriesEntry, kind: RenderKind) {
        if entry.renderer().is_disabled() || entry.renderer().kind() == kind {
            return;
        }

        let permitted = match entry.category() {
            SeriesCategory::Price => kind.allowed_for_price(),
            SeriesCategory::Indicator => match kind {
                RenderKind::Custom(id) => self.custom.contains_key(&id),
                _ => true,
            },
        };
        if !permitted {
            log::debug!(
                "renderer kind {kind} not permitted for series '{}'",
                entry.key()
            );
            return;
        }

        entry.renderer_mut().set_kind(kind);
    }
}

/// Geometry sink used by unit tests in place of a canvas frame.
#[cfg(test)]
#[derive(Default)]
pub struct ShapeLog {
    pub rects: Vec<(Point, Size, Color)>,
    pub lines: Vec<(Point, Point, StrokeSpec)>,
    pub polygons: Vec<(Vec<Point>, Color)>,
}

#[cfg(test)]
impl PaintSurface for ShapeLog {
    fn fill_rect(&mut self, top_left: Point, size: Size, color: Color) {
        self.rects.push((top_left, size, color));
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: StrokeSpec) {
        self.lines.push((from, to, stroke));
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color) {
        self.polygons.push((points.to_vec(), color));
    }
}
