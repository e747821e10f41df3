use std::fmt;

/// Errors caused by scenario inputs that cannot describe a valid market or portfolio.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Cholesky factorisation failed (or produced a degenerate factor)
    NotPositiveDefinite { matrix: &'static str },
    /// Correlation input differs from its transpose
    AsymmetricCorrelation { row: &'static str, col: &'static str },
    /// Accounts must hold some money before anything can be projected
    NonPositiveBalance { total: f64 },
    /// A sampling distribution rejected its parameters
    InvalidDistribution {
        name: &'static str,
        reason: &'static str,
    },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::NotPositiveDefinite { matrix } => {
                write!(f, "{matrix} matrix is not positive-definite")
            }
            ConfigurationError::AsymmetricCorrelation { row, col } => {
                write!(f, "correlation[{row}][{col}] differs from correlation[{col}][{row}]")
            }
            ConfigurationError::NonPositiveBalance { total } => {
                write!(f, "total account balance must be > 0 (got {total})")
            }
            ConfigurationError::InvalidDistribution { name, reason } => {
                write!(f, "invalid {name} parameters: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Out-of-range scalar inputs. The calling layer is expected to reject these
/// first; the engine re-checks before allocating anything.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    SimsOutOfRange { sims: usize },
    AgeRange { current_age: u32, end_age: u32 },
    NegativeBalance { account: String, balance: f64 },
    FractionOutOfRange { field: String, value: f64 },
    NonFiniteValue { field: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::SimsOutOfRange { sims } => write!(
                f,
                "sims must be within [{}, {}] (got {sims})",
                crate::model::MIN_SIMS,
                crate::model::MAX_SIMS
            ),
            ValidationError::AgeRange {
                current_age,
                end_age,
            } => write!(
                f,
                "end_age ({end_age}) must be greater than current_age ({current_age})"
            ),
            ValidationError::NegativeBalance { account, balance } => {
                write!(f, "account '{account}' has a negative balance ({balance})")
            }
            ValidationError::FractionOutOfRange { field, value } => {
                write!(f, "{field} is out of range (got {value})")
            }
            ValidationError::NonFiniteValue { field } => write!(f, "{field} must be finite"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Any failure that aborts a simulation run. There is no partial result.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    Configuration(ConfigurationError),
    Validation(ValidationError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Configuration(e) => write!(f, "configuration error: {e}"),
            EngineError::Validation(e) => write!(f, "validation error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Configuration(e) => Some(e),
            EngineError::Validation(e) => Some(e),
        }
    }
}

impl From<ConfigurationError> for EngineError {
    fn from(err: ConfigurationError) -> Self {
        EngineError::Configuration(err)
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Validation(err)
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
