use iced::{Point, Rectangle};

use data::chart::series::SeriesKey;
use data::util::format_with_precision;

use super::pane::{EMPTY_PANE_WEIGHT, INITIAL_PANE_WEIGHT, PaneId, PaneStack};
use super::series::SeriesEntry;

pub const LEGEND_ITEM_HEIGHT: f32 = 16.0;
pub const LEGEND_PADDING: f32 = 4.0;
const LEGEND_ITEM_SPACING: f32 = 2.0;
const LEGEND_CHAR_WIDTH: f32 = 7.0;

/// Identifies the legend entry currently under emphasis.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightedLegend {
    /// Position of the pane in the stack when the hit was resolved.
    pub subplot: usize,
    pub pane: PaneId,
    /// Dataset index within the pane.
    pub dataset: usize,
    pub key: SeriesKey,
}

/// Pointer-driven resolution of legend entries and pane slices.
///
/// The engine rebuilds the default implementation per event from the pane
/// regions; anything that can answer these two queries can drive the
/// controller.
pub trait EntityLookup {
    fn legend_at(&self, position: Point) -> Option<HighlightedLegend>;

    fn subplot_at(&self, position: Point) -> Option<usize>;
}

/// Legend hit regions laid out at the top-left of each pane slice.
pub struct LegendLayout {
    items: Vec<(Rectangle, HighlightedLegend)>,
    regions: Vec<Rectangle>,
}

impl LegendLayout {
    pub fn new(stack: &PaneStack, bounds: Rectangle) -> Self {
        let mut items = Vec::new();
        let mut regions = Vec::new();

        for (subplot, (pane_id, region)) in stack.regions(bounds).into_iter().enumerate() {
            regions.push(region);
            let Some(pane) = stack.pane(pane_id) else {
                continue;
            };

            let mut y = region.y + LEGEND_PADDING;
            for (dataset, entry) in pane.entries().iter().enumerate() {
                let width = guesstimate_text_width(entry.title());
                let rect = Rectangle {
                    x: region.x + LEGEND_PADDING,
                    y,
                    width,
                    height: LEGEND_ITEM_HEIGHT,
                };
                items.push((
                    rect,
                    HighlightedLegend {
                        subplot,
                        pane: pane_id,
                        dataset,
                        key: entry.key(),
                    },
                ));
                y += LEGEND_ITEM_HEIGHT + LEGEND_ITEM_SPACING;
            }
        }

        Self { items, regions }
    }

    pub fn items(&self) -> &[(Rectangle, HighlightedLegend)] {
        &self.items
    }
}

impl EntityLookup for LegendLayout {
    fn legend_at(&self, position: Point) -> Option<HighlightedLegend> {
        self.items
            .iter()
            .find(|(rect, _)| rect.contains(position))
            .map(|(_, info)| info.clone())
    }

    fn subplot_at(&self, position: Point) -> Option<usize> {
        self.regions.iter().position(|region| region.contains(position))
    }
}

fn guesstimate_text_width(title: &str) -> f32 {
    title.chars().count().max(4) as f32 * LEGEND_CHAR_WIDTH + LEGEND_PADDING * 2.0
}

/// Legend row text: the title plus the values at `item` (crosshair position
/// or the latest datapoint). Hidden series show the bare title.
pub fn legend_label(entry: &SeriesEntry, item: Option<usize>, precision: usize) -> String {
    let source = entry.source();
    if !source.legend_value_visible() || source.is_empty() {
        return entry.title().to_string();
    }

    let item = item.unwrap_or(source.len() - 1).min(source.len() - 1);

    if let Some(ohlc) = source.ohlc(item) {
        format!(
            "{} O:{} H:{} L:{} C:{}",
            entry.title(),
            format_with_precision(ohlc.open, precision),
            format_with_precision(ohlc.high, precision),
            format_with_precision(ohlc.low, precision),
            format_with_precision(ohlc.close, precision),
        )
    } else {
        let y = source.y(item);
        if y.is_finite() {
            format!("{} {}", entry.title(), format_with_precision(y, precision))
        } else {
            entry.title().to_string()
        }
    }
}

/// Outcome of a pointer release, for the engine to translate into actions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Released {
    pub repaint: bool,
    /// An ended drag wants the deferred empty-pane sweep.
    pub settle: bool,
}

/// The highlight/drag/drop state machine over the pane stack.
///
/// All methods re-validate the references they hold before mutating; stale
/// hits (a pane or entry removed by an earlier event) fall through without
/// touching the stack.
#[derive(Default)]
pub struct LegendState {
    highlighted: Option<HighlightedLegend>,
    drag: Option<HighlightedLegend>,
    dragged: bool,
}

impl LegendState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn highlighted(&self) -> Option<&HighlightedLegend> {
        self.highlighted.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragged
    }

    pub fn is_highlighting(&self) -> bool {
        self.drag.is_some() || self.highlighted.is_some()
    }

    /// Hover tracking and, during a drag, the move/drop logic.
    ///
    /// Returns whether anything changed that needs a repaint.
    pub fn pointer_moved(
        &mut self,
        stack: &mut PaneStack,
        lookup: &dyn EntityLookup,
        position: Point,
    ) -> bool {
        if self.drag.is_some() {
            return self.drag_moved(stack, lookup, position);
        }

        match lookup.legend_at(position) {
            Some(hit) => {
                if self.highlighted.as_ref() != Some(&hit) {
                    self.highlighted = Some(hit);
                    true
                } else {
                    false
                }
            }
            None => self.disable_highlighting(),
        }
    }

    /// Clear hover emphasis; kept as-is while a drag owns the highlight.
    pub fn disable_highlighting(&mut self) -> bool {
        if !self.dragged && self.highlighted.is_some() {
            self.highlighted = None;
            true
        } else {
            false
        }
    }

    /// Primary press on a highlighted legend arms a potential drag.
    pub fn pointer_pressed(&mut self, button: PointerButton) {
        if button != PointerButton::Primary {
            return;
        }
        if self.highlighted.is_some() {
            self.drag = self.highlighted.clone();
        }
    }

    fn drag_moved(
        &mut self,
        stack: &mut PaneStack,
        lookup: &dyn EntityLookup,
        position: Point,
    ) -> bool {
        let Some(drag) = self.drag.clone() else {
            return false;
        };

        if stack.pane(drag.pane).is_none() {
            // origin vanished underneath the drag
            self.abort_drag(stack);
            return true;
        }

        let mut changed = false;
        if !self.dragged {
            // first motion past the press: the drag is real now
            self.dragged = true;
            stack.add_drop_target();
            changed = true;
        }

        let Some(to_subplot) = lookup.subplot_at(position) else {
            return changed;
        };
        if to_subplot == drag.subplot {
            return changed;
        }
        let Some(to_pane) = stack.pane_at(to_subplot).map(|pane| pane.id()) else {
            return changed;
        };
        if to_pane == drag.pane {
            return changed;
        }

        if let Some(target_id) = stack.drop_target() {
            let weight = if to_pane == target_id {
                INITIAL_PANE_WEIGHT
            } else {
                EMPTY_PANE_WEIGHT
            };
            if let Some(target) = stack.pane_mut(target_id) {
                target.set_weight(weight);
            }
        }

        let Ok(new_dataset) = stack.move_entry(drag.pane, drag.dataset, to_pane) else {
            log::warn!("legend drag lost its entry; aborting move");
            return changed;
        };

        let info = HighlightedLegend {
            subplot: to_subplot,
            pane: to_pane,
            dataset: new_dataset,
            key: drag.key,
        };
        self.highlighted = Some(info.clone());
        self.drag = Some(info);
        true
    }

    /// Release: a click (no motion) toggles visibility, an ended drag asks
    /// for the deferred pane sweep.
    pub fn pointer_released(
        &mut self,
        stack: &mut PaneStack,
        lookup: &dyn EntityLookup,
        position: Point,
        button: PointerButton,
    ) -> Released {
        if button != PointerButton::Primary {
            return Released::default();
        }

        let mut released = Released::default();

        if !self.dragged {
            released.repaint = self.toggle_visibility(stack, lookup, position);
        }

        if self.drag.take().is_some() {
            self.dragged = false;
            stack.clear_drop_target();
            released.settle = true;
            released.repaint = true;
        }

        released
    }

    fn toggle_visibility(
        &mut self,
        stack: &mut PaneStack,
        lookup: &dyn EntityLookup,
        position: Point,
    ) -> bool {
        let Some(hit) = lookup.legend_at(position) else {
            return false;
        };
        let Some(pane) = stack.pane_mut(hit.pane) else {
            return false;
        };
        let Some(entry) = pane.entry_mut(hit.dataset) else {
            return false;
        };
        if entry.key() != hit.key {
            // the index was reused by another series since the hit resolved
            return false;
        }

        entry.toggle_hidden();
        pane.recompute_range();

        // same identity, same position: refresh the emphasis in place
        self.highlighted = Some(hit);
        true
    }

    /// Drop highlight/drag references that no longer resolve, e.g. after
    /// the deferred pane sweep removed their pane.
    pub fn revalidate(&mut self, stack: &PaneStack) -> bool {
        let resolves = |info: &HighlightedLegend| {
            stack
                .pane(info.pane)
                .and_then(|pane| pane.entry(info.dataset))
                .is_some_and(|entry| entry.key() == info.key)
        };

        let mut changed = false;
        if let Some(highlight) = &self.highlighted
            && !resolves(highlight)
        {
            self.highlighted = None;
            changed = true;
        }
        if let Some(drag) = &self.drag
            && !resolves(drag)
        {
            self.drag = None;
            self.dragged = false;
            changed = true;
        }
        changed
    }

    fn abort_drag(&mut self, stack: &mut PaneStack) {
        self.drag = None;
        self.dragged = false;
        stack.clear_drop_target();
        stack.remove_empty_panes();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::pane::Pane;
    use std::rc::Rc;
    use crate::chart::series::{PlotSource, SeriesEntry, ValueSource};
    use data::chart::series::{Ohlc, OhlcBuffer, ValueBuffer};
    use data::chart::style::{DEFAULT_PRICE_COLOR, RenderKind, SeriesStyle};
    use iced::Size;

    fn bounds() -> Rectangle {
        Rectangle::new(Point::ORIGIN, Size::new(800.0, 600.0))
    }

    fn indicator(key: &str, values: Vec<(u64, f32)>) -> SeriesEntry {
        let source = ValueSource::new(key, 2, ValueBuffer::from_points(values));
        SeriesEntry::indicator(
            source as Rc<dyn PlotSource>,
            RenderKind::Line,
            SeriesStyle::indicator(DEFAULT_PRICE_COLOR),
        )
    }

    fn price(key: &str) -> SeriesEntry {
        let source = crate::chart::series::OhlcSource::new(
            key,
            2,
            OhlcBuffer::from_points(vec![(
                1,
                Ohlc {
                    open: 10.0,
                    high: 12.0,
                    low: 9.0,
                    close: 11.0,
                },
            )]),
        );
        SeriesEntry::price(source as Rc<dyn PlotSource>, RenderKind::Candlestick)
    }

    /// Pane A with price + one indicator, as in a fresh chart.
    fn stack_with_two_series() -> PaneStack {
        let mut stack = PaneStack::new();
        let mut pane = Pane::new(INITIAL_PANE_WEIGHT);
        pane.add_entry(price("XYZ"));
        pane.add_entry(indicator("MA20", vec![(1, 10.5)]));
        stack.push_pane(pane);
        stack
    }

    fn layout(stack: &PaneStack) -> LegendLayout {
        LegendLayout::new(stack, bounds())
    }

    fn first_legend_pos(stack: &PaneStack, item: usize) -> Point {
        let l = layout(stack);
        let (rect, _) = &l.items()[item];
        Point::new(rect.x + 1.0, rect.y + 1.0)
    }

    #[test]
    fn hover_highlights_and_clears() {
        let mut stack = stack_with_two_series();
        let mut legend = LegendState::new();

        let pos = first_legend_pos(&stack, 1);
        let l = layout(&stack);
        assert!(legend.pointer_moved(&mut stack, &l, pos));
        assert_eq!(legend.highlighted().unwrap().key.as_str(), "MA20");

        // off-legend clears
        assert!(legend.pointer_moved(&mut stack, &l, Point::new(700.0, 500.0)));
        assert!(legend.highlighted().is_none());
    }

    #[test]
    fn click_without_motion_toggles_visibility() {
        let mut stack = stack_with_two_series();
        let mut legend = LegendState::new();
        let pos = first_legend_pos(&stack, 1);

        let l = layout(&stack);
        legend.pointer_moved(&mut stack, &l, pos);
        legend.pointer_pressed(PointerButton::Primary);
        let released = legend.pointer_released(&mut stack, &l, pos, PointerButton::Primary);

        assert!(released.repaint);
        let entry = &stack.panes()[0].entries()[1];
        assert!(entry.is_hidden());
        assert!(entry.source().y(0).is_nan());

        // second click re-enables with the original values back
        let l = layout(&stack);
        legend.pointer_moved(&mut stack, &l, pos);
        legend.pointer_pressed(PointerButton::Primary);
        legend.pointer_released(&mut stack, &l, pos, PointerButton::Primary);

        let entry = &stack.panes()[0].entries()[1];
        assert!(!entry.is_hidden());
        assert_eq!(entry.source().y(0), 10.5);
    }

    #[test]
    fn drag_to_empty_space_creates_and_promotes_drop_pane() {
        let mut stack = stack_with_two_series();
        let mut legend = LegendState::new();
        let pos = first_legend_pos(&stack, 1);

        let l = layout(&stack);
        legend.pointer_moved(&mut stack, &l, pos);
        legend.pointer_pressed(PointerButton::Primary);

        // first motion: drop target appears small
        legend.pointer_moved(&mut stack, &l, Point::new(pos.x + 5.0, pos.y + 5.0));
        assert!(legend.is_dragging());
        assert_eq!(stack.len(), 2);
        let target = stack.drop_target().unwrap();
        assert_eq!(stack.pane(target).unwrap().weight(), EMPTY_PANE_WEIGHT);

        // rebuild the layout so the new pane has a region, then hover it
        let l = LegendLayout::new(&stack, bounds());
        legend.pointer_moved(&mut stack, &l, Point::new(400.0, 590.0));

        let target_pane = stack.pane(target).unwrap();
        assert_eq!(target_pane.weight(), INITIAL_PANE_WEIGHT);
        assert_eq!(target_pane.len(), 1);
        assert_eq!(target_pane.entries()[0].key().as_str(), "MA20");
        assert_eq!(stack.panes()[0].len(), 1);

        // release ends the drag and asks for the deferred sweep
        let released =
            legend.pointer_released(&mut stack, &l, Point::new(400.0, 590.0), PointerButton::Primary);
        assert!(released.settle);
        assert!(stack.drop_target().is_none());

        stack.remove_empty_panes();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.panes()[0].weight(), INITIAL_PANE_WEIGHT);
        assert_eq!(stack.panes()[1].weight(), INITIAL_PANE_WEIGHT);
    }

    #[test]
    fn drag_back_restores_origin_and_discards_drop_pane() {
        let mut stack = stack_with_two_series();
        let mut legend = LegendState::new();

        // first drag: MA20 into the drop target
        let pos = first_legend_pos(&stack, 1);
        let l = layout(&stack);
        legend.pointer_moved(&mut stack, &l, pos);
        legend.pointer_pressed(PointerButton::Primary);
        legend.pointer_moved(&mut stack, &l, Point::new(pos.x + 5.0, pos.y));
        let l = layout(&stack);
        legend.pointer_moved(&mut stack, &l, Point::new(400.0, 590.0));
        legend.pointer_released(&mut stack, &l, Point::new(400.0, 590.0), PointerButton::Primary);
        stack.remove_empty_panes();
        assert_eq!(stack.len(), 2);

        // second drag: back into pane A
        let pos = first_legend_pos(&stack, 1);
        let l = layout(&stack);
        legend.pointer_moved(&mut stack, &l, pos);
        legend.pointer_pressed(PointerButton::Primary);
        legend.pointer_moved(&mut stack, &l, Point::new(pos.x + 5.0, pos.y));
        let l = layout(&stack);
        legend.pointer_moved(&mut stack, &l, Point::new(400.0, 20.0));
        legend.pointer_released(&mut stack, &l, Point::new(400.0, 20.0), PointerButton::Primary);
        stack.remove_empty_panes();

        assert_eq!(stack.len(), 1);
        assert_eq!(stack.panes()[0].len(), 2);
    }

    #[test]
    fn hover_change_during_drag_keeps_highlight() {
        let mut stack = stack_with_two_series();
        let mut legend = LegendState::new();
        let pos = first_legend_pos(&stack, 1);

        let l = layout(&stack);
        legend.pointer_moved(&mut stack, &l, pos);
        legend.pointer_pressed(PointerButton::Primary);
        legend.pointer_moved(&mut stack, &l, Point::new(pos.x + 5.0, pos.y));

        // pointer leaves every legend region mid-drag
        legend.pointer_moved(&mut stack, &l, Point::new(790.0, 10.0));
        assert!(legend.highlighted().is_some());
    }

    #[test]
    fn secondary_release_is_ignored() {
        let mut stack = stack_with_two_series();
        let mut legend = LegendState::new();
        let pos = first_legend_pos(&stack, 1);

        let l = layout(&stack);
        legend.pointer_moved(&mut stack, &l, pos);
        let released = legend.pointer_released(&mut stack, &l, pos, PointerButton::Secondary);

        assert_eq!(released, Released::default());
        assert!(!stack.panes()[0].entries()[1].is_hidden());
    }

    #[test]
    fn legend_label_formats_ohlc_and_values() {
        let price_entry = price("XYZ");
        assert_eq!(
            legend_label(&price_entry, None, 2),
            "XYZ O:10.00 H:12.00 L:9.00 C:11.00"
        );

        let ma = indicator("MA20", vec![(1, 10.5)]);
        assert_eq!(legend_label(&ma, Some(0), 1), "MA20 10.5");

        let mut hidden = indicator("MA20", vec![(1, 10.5)]);
        hidden.disable();
        assert_eq!(legend_label(&hidden, None, 1), "MA20");
    }
}
