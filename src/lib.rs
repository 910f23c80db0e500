//! An interactive multi-pane charting engine for financial time series.
//!
//! A [`chart::StackedChart`] displays an OHLC price series and any number of
//! indicator series across vertically stacked panes. The legend is the
//! primary interaction surface: hovering highlights a series, clicking
//! toggles its visibility, and dragging a legend row moves the series
//! between panes or into a freshly created one. Pane weights, renderer
//! kinds, and per-series styles are all adjustable at runtime.
//!
//! The engine integrates with iced through `canvas::Program`; hosts feed it
//! [`chart::Message`]s and honor the returned [`chart::Action`]s (deferred
//! cleanup re-posts, user-facing notices).

pub mod chart;
pub mod style;

pub use chart::{Action, ChartError, Message, StackedChart};
pub use chart::indicator::{ParamValue, ParameterSpec, ProviderError, SeriesProvider};
pub use chart::legend::PointerButton;
pub use chart::pane::{PaneId, PaneStack};
pub use chart::series::{OhlcSource, PlotSource, SeriesEntry, ValueSource};
