use thiserror::Error;

/// Errors raised by the clustering pipeline and evaluation harness
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("Invalid configuration: {reason}")]
    Configuration { reason: String },

    #[error("Invalid input table: {reason}")]
    Validation { reason: String },

    #[error("No label found for symbol: {symbol}")]
    MissingLabel { symbol: String },

    #[error("Model `{model}` cannot be used here: {reason}")]
    Capability { model: String, reason: String },

    #[error("Partition labels and parameter map disagree: {reason}")]
    PartitionMismatch { reason: String },

    #[error("Data unavailable: {reason}")]
    DataUnavailable { reason: String },

    #[error("Fit failed for model `{model}`: {reason}")]
    Fit { model: String, reason: String },
}

impl ClusterError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn data_unavailable(reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            reason: reason.into(),
        }
    }
}
