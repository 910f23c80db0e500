use std::rc::Rc;

use data::chart::series::SeriesKey;

use super::series::PlotSource;

/// A parameter edit was rejected by the provider; the chart rolls the
/// display back to the last valid arguments.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ProviderError {
    #[error("invalid parameters: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f64),
    Toggle(bool),
    Choice(String),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Toggle(b) => write!(f, "{b}"),
            ParamValue::Choice(c) => write!(f, "{c}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    Number { min: f64, max: f64 },
    Toggle,
    Choice { options: Vec<String> },
}

/// Schema of one configurable indicator parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParamKind,
    pub default: ParamValue,
}

/// Supplies indicator datasets and their parameter schema.
///
/// `build` may reject an argument set; callers keep the previous dataset on
/// display and surface the error to the user.
pub trait SeriesProvider {
    fn key(&self) -> SeriesKey;

    fn title(&self) -> String {
        self.key().to_string()
    }

    fn parameters(&self) -> Vec<ParameterSpec>;

    fn build(&self, args: &[ParamValue]) -> Result<Rc<dyn PlotSource>, ProviderError>;
}
