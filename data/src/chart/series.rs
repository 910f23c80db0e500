use serde::{Deserialize, Serialize};

/// Stable identity of a plotted series, e.g. `"BTCUSDT"` or `"MA 20"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct SeriesKey(String);

impl SeriesKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SeriesKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Ohlc {
    pub open: f32,
    pub high: f32,
    pub low: f32,
    pub close: f32,
}

impl Ohlc {
    pub fn is_up(&self) -> bool {
        self.close > self.open
    }

    /// Midpoint of the open/close body.
    pub fn body_mid(&self) -> f32 {
        (self.open + self.close) / 2.0
    }
}

/// List-backed OHLC storage with a `u64` x-domain (timestamps or indices).
#[derive(Debug, Clone, Default)]
pub struct OhlcBuffer {
    points: Vec<(u64, Ohlc)>,
}

impl OhlcBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<(u64, Ohlc)>) -> Self {
        Self { points }
    }

    pub fn push(&mut self, x: u64, ohlc: Ohlc) {
        self.points.push((x, ohlc));
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn x(&self, item: usize) -> Option<u64> {
        self.points.get(item).map(|(x, _)| *x)
    }

    pub fn ohlc(&self, item: usize) -> Option<Ohlc> {
        self.points.get(item).map(|(_, v)| *v)
    }

    pub fn latest(&self) -> Option<&(u64, Ohlc)> {
        self.points.last()
    }
}

/// List-backed single-value storage, NaN marks "no value".
#[derive(Debug, Clone, Default)]
pub struct ValueBuffer {
    points: Vec<(u64, f32)>,
}

impl ValueBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<(u64, f32)>) -> Self {
        Self { points }
    }

    pub fn push(&mut self, x: u64, y: f32) {
        self.points.push((x, y));
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn x(&self, item: usize) -> Option<u64> {
        self.points.get(item).map(|(x, _)| *x)
    }

    pub fn y(&self, item: usize) -> Option<f32> {
        self.points.get(item).map(|(_, y)| *y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ohlc_direction() {
        let up = Ohlc {
            open: 1.0,
            high: 3.0,
            low: 0.5,
            close: 2.0,
        };
        assert!(up.is_up());
        assert!(
            !Ohlc {
                close: 1.0,
                ..up
            }
            .is_up()
        );
    }

    #[test]
    fn buffers_preserve_insertion_order() {
        let mut buf = ValueBuffer::new();
        buf.push(10, 1.0);
        buf.push(20, f32::NAN);
        buf.push(30, 3.0);

        assert_eq!(buf.len(), 3);
        assert_eq!(buf.x(1), Some(20));
        assert!(buf.y(1).unwrap().is_nan());
        assert_eq!(buf.y(2), Some(3.0));
    }
}
