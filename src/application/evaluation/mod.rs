// Fit/score/search harness and the scores it optimizes
pub mod baselines;
pub mod harness;
pub mod scoring;

pub use harness::{GridSearch, GridSearchOutcome, ScoreFn, compute_score, multi_cluster};
pub use scoring::{negated_wcss, wcss, wcss_rows};
