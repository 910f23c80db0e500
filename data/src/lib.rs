pub mod chart;
pub mod log;
pub mod util;

pub use chart::geometry;
pub use chart::series::{Ohlc, OhlcBuffer, SeriesKey, ValueBuffer};
pub use chart::style::{RenderKind, SeriesStyle, StyleMemory};

#[derive(thiserror::Error, Debug, Clone)]
pub enum InternalError {
    #[error("Layout error: {0}")]
    Layout(String),
    #[error("Series error: {0}")]
    Series(String),
}
