//! Observable warnings for inputs that are corrected instead of rejected

use serde::{Deserialize, Serialize};
use std::fmt;

/// A recoverable problem that changed how a request was carried out
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Warning {
    /// The requested confidence level was outside (0, 1) and was replaced
    LevelOutOfRange { requested: f64, used: f64 },
    /// Sobel's test was requested for several mediators; the bootstrap ran instead
    SobelFallback { n_mediators: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LevelOutOfRange { requested, used } => write!(
                f,
                "confidence level {requested} is not in (0, 1); using {used}"
            ),
            Self::SobelFallback { n_mediators } => write!(
                f,
                "Sobel test is only available for one mediator ({n_mediators} given); \
                 using the bootstrap test"
            ),
        }
    }
}

/// A value after validation, with the warning raised if it had to be corrected
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Validated<T> {
    pub value: T,
    pub warning: Option<Warning>,
}

impl<T> Validated<T> {
    /// A value that passed validation unchanged
    pub fn accepted(value: T) -> Self {
        Self { value, warning: None }
    }

    /// A value that replaced an invalid input
    pub fn corrected(value: T, warning: Warning) -> Self {
        Self {
            value,
            warning: Some(warning),
        }
    }

    /// Whether the input had to be corrected
    pub fn was_corrected(&self) -> bool {
        self.warning.is_some()
    }

    /// Split into the value and the warning, pushing the warning onto `sink`
    pub fn into_value(self, sink: &mut Vec<Warning>) -> T {
        if let Some(w) = self.warning {
            sink.push(w);
        }
        self.value
    }
}
