use serde::{Deserialize, Deserializer};

/// Round `value` to the nearest multiple of `tick`.
pub fn round_to_tick(value: f32, tick: f32) -> f32 {
    if tick <= 0.0 {
        return value;
    }
    (value / tick).round() * tick
}

/// Pick a readable tick step for a value range of the given magnitude.
pub fn guesstimate_ticks(range: f32) -> f32 {
    let range = range.abs();
    if range == 0.0 {
        return 1.0;
    }

    let base = 10.0f32.powf(range.log10().floor());
    match range / base {
        r if r <= 2.0 => base / 5.0,
        r if r <= 5.0 => base / 2.0,
        _ => base,
    }
}

/// Abbreviate large axis values, e.g. `1_250_000.0` -> `"1.25M"`.
pub fn abbr_large_numbers(value: f32) -> String {
    let abs = value.abs();

    if abs >= 1_000_000_000.0 {
        format!("{:.2}B", value / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else if abs >= 1.0 {
        format!("{value:.2}")
    } else {
        format!("{value:.3}")
    }
}

/// Format a value with a fixed number of decimal digits.
pub fn format_with_precision(value: f32, precision: usize) -> String {
    format!("{value:.precision$}")
}

/// Deserialize a field tolerantly, falling back to `Default` on error.
pub fn ok_or_default<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Deserialize<'de> + Default,
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_tick() {
        assert_eq!(round_to_tick(103.4, 5.0), 105.0);
        assert_eq!(round_to_tick(1.234, 0.0), 1.234);
    }

    #[test]
    fn guesstimates_readable_steps() {
        assert_eq!(guesstimate_ticks(100.0), 20.0);
        assert_eq!(guesstimate_ticks(35.0), 5.0);
        assert_eq!(guesstimate_ticks(12.0), 2.0);
    }

    #[test]
    fn abbreviates_large_numbers() {
        assert_eq!(abbr_large_numbers(1_250_000.0), "1.25M");
        assert_eq!(abbr_large_numbers(4_200.0), "4.2K");
        assert_eq!(abbr_large_numbers(0.1234), "0.123");
    }

    #[test]
    fn formats_with_precision() {
        assert_eq!(format_with_precision(3.14159, 2), "3.14");
        assert_eq!(format_with_precision(2.0, 0), "2");
    }
}
