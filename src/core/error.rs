use thiserror::Error;

/// Failures that abort a simulation run. None of them are retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("unknown item kind: {0:?}")]
    InvalidKind(String),

    #[error("spending too much: expenses {expenses:.2} vs available {available:.2}")]
    Overspend { expenses: f64, available: f64 },

    #[error("cannot meet monthly repayment of {repayment:.2} with {available:.2} available")]
    UnmetRepayment { repayment: f64, available: f64 },

    #[error("month ended with {remaining:.2} unallocated income")]
    UnbalancedMonth { remaining: f64 },

    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("simulated date is out of range")]
    DateOutOfRange,

    #[error("a portfolio can hold only one cash item")]
    DuplicateCashItem,

    #[error("cannot raise {needed:.2} from investments worth {available:.2}")]
    InsufficientInvestments { needed: f64, available: f64 },
}
