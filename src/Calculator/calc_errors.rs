use thiserror::Error;

/// shortcut for results of the calculator engines
pub type CalcOutcome<T> = Result<T, CalcError>;

/// error types of formula parsing, molar mass computation and equation balancing.
/// Every variant carries a human-readable message that ends up in `CalcResult::details`
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalcError {
    #[error("Unknown element: {0}")]
    UnknownElement(String),
    #[error("Invalid formula: '{0}' has zero molar mass")]
    InvalidFormula(String),
    #[error("Malformed formula '{formula}': {message}")]
    MalformedFormula { formula: String, message: String },
    #[error("Atom count of {0} is too large")]
    CountOverflow(String),
    #[error("Provide exactly three values (one missing)")]
    InvalidDilution,
    #[error("{0} must be non-zero")]
    ZeroDivisor(&'static str),
    #[error("Volume must be > 0 L")]
    NonPositiveVolume,
    #[error("Stoichiometric coefficient of {0} must be > 0")]
    InvalidCoefficient(String),
    #[error("Could not balance equation (try different formatting or simpler equation)")]
    BalanceFailed,
    #[error("Invalid request: {0}")]
    Request(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::Request(e.to_string())
    }
}
