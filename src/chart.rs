pub mod indicator;
pub mod legend;
pub(crate) mod paint;
pub mod pane;
pub mod renderer;
pub mod scale;
pub mod series;

use std::rc::Rc;

use iced::widget::canvas::{self, Canvas, Event, Geometry};
use iced::{Element, Length, Point, Rectangle, Renderer, Theme, mouse};
use rustc_hash::FxHashMap;

use data::chart::ViewConfig;
use data::chart::series::SeriesKey;
use data::chart::style::{InitialStyle, LineStyle, LineWidth, RenderKind, SeriesStyle, StyleMemory};

use indicator::{ParamValue, ProviderError, SeriesProvider};
use legend::{HighlightedLegend, LegendLayout, LegendState, PointerButton};
use pane::{INITIAL_PANE_WEIGHT, Pane, PaneId, PaneStack};
use renderer::RendererRegistry;
use series::{PlotSource, SeriesEntry};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("series '{0}' not found in any pane")]
    SeriesNotFound(SeriesKey),
    #[error("series '{0}' is not removable")]
    NotRemovable(SeriesKey),
    #[error("pane no longer exists")]
    PaneNotFound,
    #[error("entry reference is stale")]
    StaleEntry,
}

/// Input the engine reacts to, one discrete pointer/layout event at a time.
#[derive(Debug, Clone, Copy)]
pub enum Message {
    PointerMoved(Point),
    PointerPressed(Point, PointerButton),
    PointerReleased(Point, PointerButton),
    BoundsChanged(Rectangle),
    /// Posted back by the host after the triggering event completed; runs
    /// the deferred empty-pane sweep.
    PanesSettled,
}

/// What the host should do after an update.
pub enum Action {
    /// Re-enqueue the message on the same event queue, after the current
    /// event fully settles.
    Defer(Message),
    /// Surface a message to the user.
    Notify(String),
}

struct Caches {
    main: canvas::Cache,
    overlay: canvas::Cache,
}

impl Default for Caches {
    fn default() -> Self {
        Self {
            main: canvas::Cache::new(),
            overlay: canvas::Cache::new(),
        }
    }
}

/// A chart of stacked panes with a drag/drop legend.
///
/// All mutation happens on the UI thread through [`StackedChart::update`]
/// and the style/series operations below; drawing goes through the iced
/// [`canvas::Program`] impl.
pub struct StackedChart {
    stack: PaneStack,
    legend: LegendState,
    styles: StyleMemory,
    registry: RendererRegistry,
    bounds: Rectangle,
    show_last_price_line: bool,
    last_valid_args: FxHashMap<SeriesKey, Vec<ParamValue>>,
    cache: Caches,
}

impl StackedChart {
    /// A chart with the price series as entry 0 of the first pane.
    pub fn new(price: Rc<dyn PlotSource>) -> Self {
        let mut stack = PaneStack::new();
        let mut pane = Pane::new(INITIAL_PANE_WEIGHT);
        pane.add_entry(SeriesEntry::price(price, RenderKind::Candlestick));
        stack.push_pane(pane);

        Self {
            stack,
            legend: LegendState::new(),
            styles: StyleMemory::new(),
            registry: RendererRegistry::new(),
            bounds: Rectangle::default(),
            show_last_price_line: true,
            last_valid_args: FxHashMap::default(),
            cache: Caches::default(),
        }
    }

    pub fn stack(&self) -> &PaneStack {
        &self.stack
    }

    pub fn legend(&self) -> &LegendState {
        &self.legend
    }

    pub fn registry(&self) -> &RendererRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut RendererRegistry {
        &mut self.registry
    }

    pub fn initial_style(&self, key: &SeriesKey) -> Option<InitialStyle> {
        self.styles.get(key).copied()
    }

    pub fn set_last_price_line(&mut self, show: bool) {
        self.show_last_price_line = show;
        self.invalidate();
    }

    pub(crate) fn last_price_line_enabled(&self) -> bool {
        self.show_last_price_line
    }

    /// Snapshot of the persistable view options.
    pub fn view_config(&self) -> ViewConfig {
        ViewConfig {
            pane_weights: self.stack.panes().iter().map(Pane::weight).collect(),
            show_last_price_line: self.show_last_price_line,
        }
    }

    pub fn update(&mut self, message: Message) -> Option<Action> {
        match message {
            Message::BoundsChanged(bounds) => {
                self.bounds = bounds;
                self.invalidate();
                None
            }
            Message::PointerMoved(position) => {
                let layout = LegendLayout::new(&self.stack, self.bounds);
                let before = self.legend.highlighted().cloned();
                let repaint = self.legend.pointer_moved(&mut self.stack, &layout, position);

                if repaint {
                    if let Some(highlight) = self.legend.highlighted().cloned()
                        && before.as_ref() != Some(&highlight)
                    {
                        self.capture_initial(&highlight);
                    }
                    self.invalidate();
                }
                None
            }
            Message::PointerPressed(_, button) => {
                self.legend.pointer_pressed(button);
                None
            }
            Message::PointerReleased(position, button) => {
                let layout = LegendLayout::new(&self.stack, self.bounds);
                let released =
                    self.legend
                        .pointer_released(&mut self.stack, &layout, position, button);
                if released.repaint {
                    self.invalidate();
                }
                released
                    .settle
                    .then_some(Action::Defer(Message::PanesSettled))
            }
            Message::PanesSettled => {
                let removed = self.stack.remove_empty_panes();
                if removed > 0 {
                    log::debug!("removed {removed} empty pane(s) after interaction settled");
                    self.legend.revalidate(&self.stack);
                    self.invalidate();
                }
                None
            }
        }
    }

    /// Record the series' style on first highlight, for later reset.
    fn capture_initial(&mut self, highlight: &HighlightedLegend) {
        let Some(entry) = self
            .stack
            .pane(highlight.pane)
            .and_then(|pane| pane.entry(highlight.dataset))
        else {
            return;
        };
        self.styles.capture(
            &entry.key(),
            entry.renderer().kind(),
            *entry.renderer().style(),
        );
    }

    fn entry_mut(&mut self, key: &SeriesKey) -> Option<&mut SeriesEntry> {
        let (pane_index, dataset) = self.stack.find_by_key(key)?;
        let pane_id = self.stack.panes()[pane_index].id();
        self.stack.pane_mut(pane_id)?.entry_mut(dataset)
    }

    fn recompute_range_of(&mut self, key: &SeriesKey) {
        if let Some((pane_index, _)) = self.stack.find_by_key(key) {
            let pane_id = self.stack.panes()[pane_index].id();
            if let Some(pane) = self.stack.pane_mut(pane_id) {
                pane.recompute_range();
            }
        }
    }

    /// Add an indicator series built by `provider`.
    ///
    /// With `pane` unset (or stale) the series gets a fresh pane below the
    /// existing ones.
    pub fn add_indicator(
        &mut self,
        provider: &dyn SeriesProvider,
        args: &[ParamValue],
        kind: RenderKind,
        style: SeriesStyle,
        pane: Option<PaneId>,
    ) -> Result<PaneId, ProviderError> {
        let source = provider.build(args)?;
        self.last_valid_args.insert(provider.key(), args.to_vec());

        let pane_id = match pane.filter(|id| self.stack.pane(*id).is_some()) {
            Some(id) => id,
            None => self.stack.push_pane(Pane::new(INITIAL_PANE_WEIGHT)),
        };
        if let Some(target) = self.stack.pane_mut(pane_id) {
            target.add_entry(SeriesEntry::indicator(source, kind, style));
        }
        self.invalidate();
        Ok(pane_id)
    }

    /// Rebuild an indicator's dataset from edited parameters.
    ///
    /// A rejected edit leaves the display and the stored arguments at their
    /// last valid state; the returned error carries the user-facing text.
    pub fn modify_indicator(
        &mut self,
        provider: &dyn SeriesProvider,
        args: &[ParamValue],
    ) -> Result<(), ProviderError> {
        let key = provider.key();
        match provider.build(args) {
            Ok(source) => {
                if let Some(entry) = self.entry_mut(&key) {
                    entry.replace_source(source);
                }
                self.recompute_range_of(&key);
                self.last_valid_args.insert(key, args.to_vec());
                self.invalidate();
                Ok(())
            }
            Err(err) => {
                log::warn!("parameter edit rejected for '{key}': {err}");
                Err(err)
            }
        }
    }

    pub fn last_valid_args(&self, key: &SeriesKey) -> Option<&[ParamValue]> {
        self.last_valid_args.get(key).map(Vec::as_slice)
    }

    /// Switch a series to another renderer kind, keeping its style.
    pub fn set_series_kind(&mut self, key: &SeriesKey, kind: RenderKind) {
        let Some((pane_index, dataset)) = self.stack.find_by_key(key) else {
            return;
        };
        let pane_id = self.stack.panes()[pane_index].id();
        let registry = &self.registry;
        if let Some(entry) = self
            .stack
            .pane_mut(pane_id)
            .and_then(|pane| pane.entry_mut(dataset))
        {
            registry.set_kind(entry, kind);
        }
        self.invalidate();
    }

    pub fn set_line_style(&mut self, key: &SeriesKey, line_style: LineStyle) {
        self.edit_style(key, |axes| axes.line_style, |style| style.line_style = line_style);
    }

    pub fn set_line_width(&mut self, key: &SeriesKey, line_width: LineWidth) {
        self.edit_style(key, |axes| axes.line_width, |style| style.line_width = line_width);
    }

    pub fn set_series_color(&mut self, key: &SeriesKey, color: iced::Color) {
        self.edit_style(key, |axes| axes.series_color, |style| style.color = color);
    }

    pub fn set_up_color(&mut self, key: &SeriesKey, color: iced::Color) {
        self.edit_style(key, |axes| axes.up_color, |style| style.up = Some(color));
    }

    pub fn set_down_color(&mut self, key: &SeriesKey, color: iced::Color) {
        self.edit_style(key, |axes| axes.down_color, |style| style.down = Some(color));
    }

    /// Apply one style edit if the series' kind exposes that axis; edits on
    /// axes the kind does not declare are silent no-ops.
    fn edit_style(
        &mut self,
        key: &SeriesKey,
        axis: impl Fn(&data::chart::style::StyleAxes) -> bool,
        edit: impl FnOnce(&mut SeriesStyle),
    ) {
        let Some((pane_index, dataset)) = self.stack.find_by_key(key) else {
            return;
        };
        let pane_id = self.stack.panes()[pane_index].id();
        let registry = &self.registry;
        if let Some(entry) = self
            .stack
            .pane_mut(pane_id)
            .and_then(|pane| pane.entry_mut(dataset))
        {
            let axes = registry.style_axes(entry.renderer().kind());
            if !axis(&axes) {
                return;
            }
            edit(entry.renderer_mut().style_mut());
        }
        self.invalidate();
    }

    /// Restore the style captured at first highlight; the kind stays.
    pub fn reset_style(&mut self, key: &SeriesKey) {
        let Some(initial) = self.styles.get(key).copied() else {
            return;
        };
        if let Some(entry) = self.entry_mut(key) {
            *entry.renderer_mut().style_mut() = initial.style;
            self.invalidate();
        }
    }

    pub fn hide_series(&mut self, key: &SeriesKey) {
        if let Some(entry) = self.entry_mut(key) {
            entry.disable();
            self.recompute_range_of(key);
            self.invalidate();
        }
    }

    pub fn show_series(&mut self, key: &SeriesKey) {
        if let Some(entry) = self.entry_mut(key) {
            entry.enable();
            self.recompute_range_of(key);
            self.invalidate();
        }
    }

    /// Remove a removable series and everything remembered about it.
    pub fn remove_series(&mut self, key: &SeriesKey) -> Result<(), ChartError> {
        let (pane_index, dataset) = self
            .stack
            .find_by_key(key)
            .ok_or_else(|| ChartError::SeriesNotFound(key.clone()))?;
        let pane_id = self.stack.panes()[pane_index].id();

        self.stack.remove_series(pane_id, dataset)?;
        self.styles.forget(key);
        self.last_valid_args.remove(key);
        self.stack.remove_empty_panes();
        self.legend.revalidate(&self.stack);
        self.invalidate();
        Ok(())
    }

    pub fn view(&self) -> Element<'_, Message> {
        Canvas::new(self)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn invalidate(&mut self) {
        self.cache.main.clear();
        self.cache.overlay.clear();
    }
}

fn pointer_button(button: mouse::Button) -> Option<PointerButton> {
    match button {
        mouse::Button::Left => Some(PointerButton::Primary),
        mouse::Button::Right => Some(PointerButton::Secondary),
        _ => None,
    }
}

impl canvas::Program<Message> for StackedChart {
    type State = ();

    fn update(
        &self,
        _state: &mut Self::State,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        if self.bounds != bounds {
            return Some(canvas::Action::publish(Message::BoundsChanged(bounds)));
        }

        let Event::Mouse(mouse_event) = event else {
            return None;
        };

        match mouse_event {
            mouse::Event::CursorMoved { .. } => {
                let position = cursor.position()?;
                let action = canvas::Action::publish(Message::PointerMoved(position));
                Some(if self.legend.is_dragging() {
                    action.and_capture()
                } else {
                    action
                })
            }
            mouse::Event::ButtonPressed(button) => {
                let position = cursor.position()?;
                let button = pointer_button(*button)?;
                let action = canvas::Action::publish(Message::PointerPressed(position, button));
                Some(if self.legend.is_highlighting() {
                    action.and_capture()
                } else {
                    action
                })
            }
            mouse::Event::ButtonReleased(button) => {
                let position = cursor.position()?;
                let button = pointer_button(*button)?;
                Some(canvas::Action::publish(Message::PointerReleased(
                    position, button,
                )))
            }
            _ => None,
        }
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let main = self
            .cache
            .main
            .draw(renderer, bounds.size(), |frame| {
                paint::draw_panes(self, frame, theme);
            });
        let overlay = self
            .cache
            .overlay
            .draw(renderer, bounds.size(), |frame| {
                paint::draw_legend(self, frame, theme);
            });
        vec![main, overlay]
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if self.legend.is_dragging() {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(bounds) && self.legend.highlighted().is_some() {
            mouse::Interaction::Pointer
        } else {
            mouse::Interaction::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data::chart::series::{Ohlc, OhlcBuffer, ValueBuffer};
    use data::chart::style::DEFAULT_PRICE_COLOR;
    use iced::Size;
    use super::indicator::{ParamKind, ParameterSpec};
    use super::series::{OhlcSource, ValueSource};

    struct WindowAverage;

    impl SeriesProvider for WindowAverage {
        fn key(&self) -> SeriesKey {
            SeriesKey::from("MA20")
        }

        fn parameters(&self) -> Vec<ParameterSpec> {
            vec![ParameterSpec {
                name: "window".to_string(),
                kind: ParamKind::Number { min: 1.0, max: 500.0 },
                default: ParamValue::Number(20.0),
            }]
        }

        fn build(&self, args: &[ParamValue]) -> Result<Rc<dyn PlotSource>, ProviderError> {
            match args {
                [ParamValue::Number(w)] if *w >= 1.0 => Ok(ValueSource::new(
                    self.key(),
                    2,
                    ValueBuffer::from_points(vec![(1, *w as f32)]),
                )),
                _ => Err(ProviderError::Rejected("window must be positive".into())),
            }
        }
    }

    fn price_source() -> Rc<dyn PlotSource> {
        OhlcSource::new(
            "XYZ",
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
        )
    }

    fn chart_with_indicator() -> StackedChart {
        let mut chart = StackedChart::new(price_source());
        let first_pane = chart.stack().panes()[0].id();
        chart
            .add_indicator(
                &WindowAverage,
                &[ParamValue::Number(20.0)],
                RenderKind::Line,
                SeriesStyle::indicator(DEFAULT_PRICE_COLOR),
                Some(first_pane),
            )
            .unwrap();
        chart.update(Message::BoundsChanged(Rectangle::new(
            Point::ORIGIN,
            Size::new(800.0, 600.0),
        )));
        chart
    }

    fn legend_pos(chart: &StackedChart, item: usize) -> Point {
        let layout = LegendLayout::new(chart.stack(), chart.bounds);
        let (rect, _) = &layout.items()[item];
        Point::new(rect.x + 1.0, rect.y + 1.0)
    }

    #[test]
    fn price_series_sits_at_index_zero_of_first_pane() {
        let chart = chart_with_indicator();
        let first = &chart.stack().panes()[0];
        assert!(first.entries()[0].is_price());
        assert_eq!(first.entries()[1].key().as_str(), "MA20");
    }

    #[test]
    fn drag_scenario_builds_and_settles_second_pane() {
        let mut chart = chart_with_indicator();
        let ma = legend_pos(&chart, 1);

        chart.update(Message::PointerMoved(ma));
        chart.update(Message::PointerPressed(ma, PointerButton::Primary));
        chart.update(Message::PointerMoved(Point::new(ma.x + 4.0, ma.y)));
        chart.update(Message::PointerMoved(Point::new(400.0, 590.0)));

        let action = chart.update(Message::PointerReleased(
            Point::new(400.0, 590.0),
            PointerButton::Primary,
        ));
        let Some(Action::Defer(deferred)) = action else {
            panic!("drag end should defer the pane sweep");
        };
        chart.update(deferred);

        let panes = chart.stack().panes();
        assert_eq!(panes.len(), 2);
        assert_eq!(panes[0].len(), 1);
        assert_eq!(panes[0].weight(), INITIAL_PANE_WEIGHT);
        assert_eq!(panes[1].len(), 1);
        assert_eq!(panes[1].weight(), INITIAL_PANE_WEIGHT);
        assert_eq!(panes[1].entries()[0].key().as_str(), "MA20");
    }

    #[test]
    fn highlight_captures_initial_style_for_reset() {
        let mut chart = chart_with_indicator();
        let key = SeriesKey::from("MA20");
        let ma = legend_pos(&chart, 1);

        chart.update(Message::PointerMoved(ma));
        assert!(chart.initial_style(&key).is_some());

        chart.set_line_width(&key, LineWidth::W5);
        chart.set_series_kind(&key, RenderKind::Step);
        chart.reset_style(&key);

        let (pane_index, dataset) = chart.stack().find_by_key(&key).unwrap();
        let entry = chart.stack().panes()[pane_index].entry(dataset).unwrap();
        assert_eq!(entry.renderer().style().line_width, LineWidth::W1);
        // kind is not part of a style reset
        assert_eq!(entry.renderer().kind(), RenderKind::Step);
    }

    #[test]
    fn remove_series_forgets_initial_style() {
        let mut chart = chart_with_indicator();
        let key = SeriesKey::from("MA20");

        chart.update(Message::PointerMoved(legend_pos(&chart, 1)));
        assert!(chart.initial_style(&key).is_some());

        chart.remove_series(&key).unwrap();
        assert!(chart.initial_style(&key).is_none());
        assert!(chart.stack().find_by_key(&key).is_none());
    }

    #[test]
    fn remove_series_refuses_the_price_series() {
        let mut chart = chart_with_indicator();
        let key = SeriesKey::from("XYZ");

        let err = chart.remove_series(&key).unwrap_err();
        assert_eq!(err, ChartError::NotRemovable(key));
        assert_eq!(chart.stack().panes()[0].len(), 2);
    }

    #[test]
    fn rejected_parameter_edit_rolls_back() {
        let mut chart = chart_with_indicator();
        let key = SeriesKey::from("MA20");

        assert!(
            chart
                .modify_indicator(&WindowAverage, &[ParamValue::Number(-3.0)])
                .is_err()
        );

        // display and stored arguments still reflect the last valid edit
        assert_eq!(
            chart.last_valid_args(&key),
            Some(&[ParamValue::Number(20.0)][..])
        );
        let (pane_index, dataset) = chart.stack().find_by_key(&key).unwrap();
        let entry = chart.stack().panes()[pane_index].entry(dataset).unwrap();
        assert_eq!(entry.source().y(0), 20.0);

        assert!(
            chart
                .modify_indicator(&WindowAverage, &[ParamValue::Number(50.0)])
                .is_ok()
        );
        let (pane_index, dataset) = chart.stack().find_by_key(&key).unwrap();
        let entry = chart.stack().panes()[pane_index].entry(dataset).unwrap();
        assert_eq!(entry.source().y(0), 50.0);
    }

    #[test]
    fn up_color_edit_ignored_for_line_kind() {
        let mut chart = chart_with_indicator();
        let key = SeriesKey::from("MA20");

        chart.set_up_color(&key, iced::Color::WHITE);

        let (pane_index, dataset) = chart.stack().find_by_key(&key).unwrap();
        let entry = chart.stack().panes()[pane_index].entry(dataset).unwrap();
        assert_eq!(entry.renderer().style().up, None);
    }
}
