use std::cell::{Cell, RefCell};
use std::rc::Rc;

use data::chart::series::{Ohlc, OhlcBuffer, SeriesKey, ValueBuffer};
use data::chart::style::{RenderKind, SeriesStyle};

use super::pane::PaneId;
use super::renderer::SeriesRenderer;

/// A dataset as the chart sees it.
///
/// Implementors supply the x-domain, per-item values, and a settable
/// non-owning back-reference to the pane currently plotting the series,
/// which the legend drag logic updates on re-parenting.
pub trait PlotSource {
    fn key(&self) -> SeriesKey;

    fn len(&self) -> usize;

    fn x(&self, item: usize) -> Option<u64>;

    /// Y value at `item`; NaN means "no value".
    fn y(&self, item: usize) -> f32;

    fn ohlc(&self, _item: usize) -> Option<Ohlc> {
        None
    }

    /// Decimal digits for axis formatting.
    fn precision(&self) -> usize;

    fn pane(&self) -> Option<PaneId>;

    fn set_pane(&self, pane: Option<PaneId>);

    /// The wrapped source when this is the disabled decorator.
    fn enabled(&self) -> Option<Rc<dyn PlotSource>> {
        None
    }

    fn legend_value_visible(&self) -> bool {
        true
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unwrap the disabled decorator, if any.
pub fn maybe_unwrap(source: &Rc<dyn PlotSource>) -> Rc<dyn PlotSource> {
    source.enabled().unwrap_or_else(|| Rc::clone(source))
}

/// Whether two handles refer to the same logical series, looking through
/// the disabled decorator on either side.
pub fn same_series(a: &Rc<dyn PlotSource>, b: &Rc<dyn PlotSource>) -> bool {
    Rc::ptr_eq(&maybe_unwrap(a), &maybe_unwrap(b))
}

/// Pass-through decorator that keeps a series' x-domain and identity while
/// reporting every y as "no value".
pub struct DisabledSource {
    inner: Rc<dyn PlotSource>,
}

impl DisabledSource {
    pub fn new(inner: Rc<dyn PlotSource>) -> Self {
        debug_assert!(
            inner.enabled().is_none(),
            "disabled decorator must not nest"
        );
        Self { inner }
    }
}

impl PlotSource for DisabledSource {
    fn key(&self) -> SeriesKey {
        self.inner.key()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn x(&self, item: usize) -> Option<u64> {
        self.inner.x(item)
    }

    fn y(&self, _item: usize) -> f32 {
        f32::NAN
    }

    fn precision(&self) -> usize {
        0
    }

    fn pane(&self) -> Option<PaneId> {
        self.inner.pane()
    }

    fn set_pane(&self, pane: Option<PaneId>) {
        self.inner.set_pane(pane);
    }

    fn enabled(&self) -> Option<Rc<dyn PlotSource>> {
        Some(Rc::clone(&self.inner))
    }

    fn legend_value_visible(&self) -> bool {
        false
    }
}

/// OHLC dataset backed by an in-memory buffer.
pub struct OhlcSource {
    key: SeriesKey,
    data: RefCell<OhlcBuffer>,
    precision: usize,
    pane: Cell<Option<PaneId>>,
}

impl OhlcSource {
    pub fn new(key: impl Into<SeriesKey>, precision: usize, data: OhlcBuffer) -> Rc<Self> {
        Rc::new(Self {
            key: key.into(),
            data: RefCell::new(data),
            precision,
            pane: Cell::new(None),
        })
    }

    pub fn push(&self, x: u64, ohlc: Ohlc) {
        self.data.borrow_mut().push(x, ohlc);
    }

    pub fn latest(&self) -> Option<(u64, Ohlc)> {
        self.data.borrow().latest().copied()
    }
}

impl PlotSource for OhlcSource {
    fn key(&self) -> SeriesKey {
        self.key.clone()
    }

    fn len(&self) -> usize {
        self.data.borrow().len()
    }

    fn x(&self, item: usize) -> Option<u64> {
        self.data.borrow().x(item)
    }

    fn y(&self, item: usize) -> f32 {
        self.data
            .borrow()
            .ohlc(item)
            .map_or(f32::NAN, |ohlc| ohlc.close)
    }

    fn ohlc(&self, item: usize) -> Option<Ohlc> {
        self.data.borrow().ohlc(item)
    }

    fn precision(&self) -> usize {
        self.precision
    }

    fn pane(&self) -> Option<PaneId> {
        self.pane.get()
    }

    fn set_pane(&self, pane: Option<PaneId>) {
        self.pane.set(pane);
    }
}

/// Single-value dataset backed by an in-memory buffer.
pub struct ValueSource {
    key: SeriesKey,
    data: RefCell<ValueBuffer>,
    precision: usize,
    pane: Cell<Option<PaneId>>,
}

impl ValueSource {
    pub fn new(key: impl Into<SeriesKey>, precision: usize, data: ValueBuffer) -> Rc<Self> {
        Rc::new(Self {
            key: key.into(),
            data: RefCell::new(data),
            precision,
            pane: Cell::new(None),
        })
    }

    pub fn push(&self, x: u64, y: f32) {
        self.data.borrow_mut().push(x, y);
    }
}

impl PlotSource for ValueSource {
    fn key(&self) -> SeriesKey {
        self.key.clone()
    }

    fn len(&self) -> usize {
        self.data.borrow().len()
    }

    fn x(&self, item: usize) -> Option<u64> {
        self.data.borrow().x(item)
    }

    fn y(&self, item: usize) -> f32 {
        self.data.borrow().y(item).unwrap_or(f32::NAN)
    }

    fn precision(&self) -> usize {
        self.precision
    }

    fn pane(&self) -> Option<PaneId> {
        self.pane.get()
    }

    fn set_pane(&self, pane: Option<PaneId>) {
        self.pane.set(pane);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesCategory {
    Price,
    Indicator,
}

/// One dataset bound to one renderer, the unit a pane holds.
pub struct SeriesEntry {
    source: Rc<dyn PlotSource>,
    renderer: SeriesRenderer,
    category: SeriesCategory,
    removable: bool,
    title: String,
}

impl std::fmt::Debug for SeriesEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesEntry")
            .field("key", &self.source.key())
            .field("category", &self.category)
            .field("removable", &self.removable)
            .field("title", &self.title)
            .finish()
    }
}

impl SeriesEntry {
    pub fn price(source: Rc<dyn PlotSource>, kind: RenderKind) -> Self {
        let title = source.key().to_string();
        Self {
            source,
            renderer: SeriesRenderer::new(kind, SeriesStyle::price()),
            category: SeriesCategory::Price,
            removable: false,
            title,
        }
    }

    pub fn indicator(source: Rc<dyn PlotSource>, kind: RenderKind, style: SeriesStyle) -> Self {
        let title = source.key().to_string();
        Self {
            source,
            renderer: SeriesRenderer::new(kind, style),
            category: SeriesCategory::Indicator,
            removable: true,
            title,
        }
    }

    pub fn key(&self) -> SeriesKey {
        self.source.key()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn source(&self) -> &Rc<dyn PlotSource> {
        &self.source
    }

    /// Swap in a rebuilt dataset, keeping renderer, pane binding, and
    /// hidden state.
    pub fn replace_source(&mut self, source: Rc<dyn PlotSource>) {
        let pane = self.source.pane();
        self.source.set_pane(None);
        source.set_pane(pane);
        self.source = if self.is_hidden() {
            Rc::new(DisabledSource::new(source))
        } else {
            source
        };
    }

    pub fn renderer(&self) -> &SeriesRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut SeriesRenderer {
        &mut self.renderer
    }

    pub fn category(&self) -> SeriesCategory {
        self.category
    }

    pub fn is_price(&self) -> bool {
        self.category == SeriesCategory::Price
    }

    pub fn removable(&self) -> bool {
        self.removable
    }

    pub fn precision(&self) -> usize {
        self.source.precision()
    }

    pub fn is_hidden(&self) -> bool {
        self.renderer.is_disabled()
    }

    /// Wrap the dataset and renderer so the series stops plotting while
    /// keeping its identity. No-op when already hidden.
    pub fn disable(&mut self) {
        if self.is_hidden() {
            return;
        }
        self.source = Rc::new(DisabledSource::new(Rc::clone(&self.source)));
        self.renderer.disable();
    }

    /// Restore the exact dataset and renderer from before `disable`; any
    /// style edits made while hidden are discarded.
    pub fn enable(&mut self) {
        if let Some(inner) = self.source.enabled() {
            self.source = inner;
        }
        self.renderer.enable();
    }

    pub fn toggle_hidden(&mut self) {
        if self.is_hidden() {
            self.enable();
        } else {
            self.disable();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_entry(key: &str) -> (Rc<ValueSource>, SeriesEntry) {
        let source = ValueSource::new(
            key,
            2,
            ValueBuffer::from_points(vec![(1, 10.0), (2, 11.5), (3, 9.0)]),
        );
        let entry = SeriesEntry::indicator(
            Rc::clone(&source) as Rc<dyn PlotSource>,
            RenderKind::Line,
            SeriesStyle::indicator(data::chart::style::DEFAULT_PRICE_COLOR),
        );
        (source, entry)
    }

    #[test]
    fn disable_reports_no_values_but_keeps_domain() {
        let (_, mut entry) = value_entry("MA 20");
        entry.disable();

        assert!(entry.is_hidden());
        assert_eq!(entry.source().len(), 3);
        assert_eq!(entry.source().x(1), Some(2));
        assert!(entry.source().y(1).is_nan());
        assert_eq!(entry.source().precision(), 0);
        assert!(!entry.source().legend_value_visible());
    }

    #[test]
    fn enable_restores_exact_source_identity() {
        let (source, mut entry) = value_entry("MA 20");
        let original: Rc<dyn PlotSource> = source;

        entry.disable();
        assert!(!Rc::ptr_eq(entry.source(), &original));

        entry.enable();
        assert!(Rc::ptr_eq(entry.source(), &original));
        assert_eq!(entry.source().y(0), 10.0);
    }

    #[test]
    fn style_edits_while_hidden_are_discarded() {
        let (_, mut entry) = value_entry("MA 20");
        let before = *entry.renderer().style();

        entry.disable();
        entry.renderer_mut().style_mut().line_width = data::chart::style::LineWidth::W5;
        entry.enable();

        assert_eq!(*entry.renderer().style(), before);
    }

    #[test]
    fn double_disable_does_not_nest() {
        let (source, mut entry) = value_entry("MA 20");
        entry.disable();
        entry.disable();
        entry.enable();
        assert!(!entry.is_hidden());
        assert!(Rc::ptr_eq(
            entry.source(),
            &(source as Rc<dyn PlotSource>)
        ));
    }

    #[test]
    fn same_series_matches_through_decorator() {
        let (source, mut entry) = value_entry("MA 20");
        let plain: Rc<dyn PlotSource> = source;
        entry.disable();
        assert!(same_series(entry.source(), &plain));
    }
}
