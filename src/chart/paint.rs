use iced::widget::canvas::{self, Frame, LineDash, Path, Stroke};
use iced::{Color, Point, Rectangle, Size, Theme};

use crate::style;

use super::StackedChart;
use super::legend::{self, LegendLayout};
use super::renderer::{PaintSurface, Projection, StrokeSpec};
use super::scale::{self, PriceInfoLabel};

const TEXT_SIZE: f32 = 12.0;
const RANGE_PADDING: f32 = 0.05;

impl PaintSurface for Frame {
    fn fill_rect(&mut self, top_left: Point, size: Size, color: Color) {
        self.fill_rectangle(top_left, size, color);
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: StrokeSpec) {
        let mut line = Stroke::with_color(
            Stroke {
                width: stroke.width,
                ..Stroke::default()
            },
            stroke.color,
        );
        if let Some(segments) = stroke.dash {
            line.line_dash = LineDash {
                segments,
                offset: 0,
            };
        }
        self.stroke(&Path::line(from, to), line);
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color) {
        if points.len() < 3 {
            return;
        }
        let path = Path::new(|builder| {
            builder.move_to(points[0]);
            for point in &points[1..] {
                builder.line_to(*point);
            }
            builder.close();
        });
        self.fill(&path, color);
    }
}

/// Series, axis labels, and the last-price line for every pane.
pub(crate) fn draw_panes(chart: &StackedChart, frame: &mut Frame, theme: &Theme) {
    let palette = theme.extended_palette();
    let local = Rectangle::new(Point::ORIGIN, Size::new(frame.width(), frame.height()));

    for (index, (pane_id, region)) in chart.stack().regions(local).into_iter().enumerate() {
        let Some(pane) = chart.stack().pane(pane_id) else {
            continue;
        };

        if index > 0 {
            frame.stroke_line(
                Point::new(region.x, region.y),
                Point::new(region.x + region.width, region.y),
                StrokeSpec {
                    width: 1.0,
                    color: palette.background.strong.color,
                    dash: None,
                },
            );
        }

        let Some((min, max)) = pane.range() else {
            continue;
        };
        let pad = (max - min) * RANGE_PADDING;
        let (min, max) = (min - pad, max + pad);

        for entry in pane.entries() {
            let source = entry.source();
            let count = source.len();
            if count == 0 {
                continue;
            }

            let proj = Projection {
                area: region,
                first: 0,
                count,
                min,
                max,
                max_stick_px: scale::max_allowed_stick_px(region.width / count as f32),
            };
            entry
                .renderer()
                .draw(source.as_ref(), &proj, chart.registry(), frame);

            if entry.is_price() && !entry.is_hidden() && chart.last_price_line_enabled() {
                draw_last_price_line(frame, &proj, source.as_ref(), palette);
            }
        }

        for label in scale::generate_labels(
            region,
            min,
            max,
            TEXT_SIZE,
            Some(pane.max_precision()),
        ) {
            frame.fill_text(canvas::Text {
                content: label.text,
                position: Point::new(region.x + region.width - 6.0, label.y),
                size: iced::Pixels(TEXT_SIZE - 2.0),
                color: palette.background.base.text.scale_alpha(0.6),
                align_x: iced::Alignment::End.into(),
                ..canvas::Text::default()
            });
        }
    }
}

fn draw_last_price_line(
    frame: &mut Frame,
    proj: &Projection,
    source: &dyn crate::chart::series::PlotSource,
    palette: &iced::theme::palette::Extended,
) {
    let last = source.len().saturating_sub(1);
    let Some(ohlc) = source.ohlc(last) else {
        return;
    };

    let (price, color) = PriceInfoLabel::new(ohlc.close, ohlc.open).get_with_color(palette);
    let y = proj.y_of(price);

    frame.stroke(
        &Path::line(
            Point::new(proj.area.x, y),
            Point::new(proj.area.x + proj.area.width, y),
        ),
        Stroke::with_color(
            Stroke {
                width: 1.0,
                line_dash: LineDash {
                    segments: &[2.0, 2.0],
                    offset: 4,
                },
                ..Stroke::default()
            },
            color.scale_alpha(0.8),
        ),
    );
}

/// Legend rows on top of the series layer, emphasis following the
/// interaction state.
pub(crate) fn draw_legend(chart: &StackedChart, frame: &mut Frame, theme: &Theme) {
    let palette = theme.extended_palette();
    let local = Rectangle::new(Point::ORIGIN, Size::new(frame.width(), frame.height()));
    let layout = LegendLayout::new(chart.stack(), local);

    for (rect, info) in layout.items() {
        let Some(pane) = chart.stack().pane(info.pane) else {
            continue;
        };
        let Some(entry) = pane.entry(info.dataset) else {
            continue;
        };

        let highlighted = chart
            .legend()
            .highlighted()
            .is_some_and(|h| h.pane == info.pane && h.dataset == info.dataset);
        let background = if highlighted {
            style::legend_highlight(theme)
        } else {
            style::legend_background(theme)
        };
        frame.fill_rectangle(rect.position(), rect.size(), background);

        let text_color = if entry.is_hidden() {
            palette.background.base.text.scale_alpha(0.4)
        } else {
            entry.renderer().style().color
        };
        frame.fill_text(canvas::Text {
            content: legend::legend_label(entry, None, pane.max_precision()),
            position: Point::new(rect.x + 3.0, rect.y + 2.0),
            size: iced::Pixels(TEXT_SIZE - 3.0),
            color: text_color,
            ..canvas::Text::default()
        });
    }
}
