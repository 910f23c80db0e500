pub mod geometry;
pub mod series;
pub mod style;

use serde::{Deserialize, Serialize};

use crate::util::ok_or_default;

/// Per-chart view options that survive serialization.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ViewConfig {
    /// Relative weights of the stacked panes, top to bottom.
    #[serde(deserialize_with = "ok_or_default", default)]
    pub pane_weights: Vec<u32>,
    #[serde(deserialize_with = "ok_or_default", default)]
    pub show_last_price_line: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_config_tolerates_malformed_fields() {
        let cfg: ViewConfig =
            serde_json::from_str(r#"{"pane_weights": "oops", "show_last_price_line": true}"#)
                .unwrap();
        assert!(cfg.pane_weights.is_empty());
        assert!(cfg.show_last_price_line);
    }
}
