pub mod cluster_input;
pub mod correlation;
pub mod evaluation;
pub mod models;
pub mod transforms;
