//! Clustering model ports and adapters.

pub mod kmeans;
pub mod params;

pub use kmeans::KMeansFactory;
pub use params::{ParamGrid, ParamSet, ParamValue};

use crate::application::cluster_input::FeatureMatrix;
use crate::domain::errors::ClusterError;

/// A clustering component: fit a feature matrix, return one label per row.
pub trait ClusterModel: Send + Sync {
    fn name(&self) -> &str;

    fn fit(&self, features: &FeatureMatrix) -> Result<Vec<String>, ClusterError>;
}

/// Builds a [`ClusterModel`] from a concrete parameter assignment.
pub trait ModelFactory: Send + Sync {
    fn name(&self) -> &'static str;

    fn build(&self, params: &ParamSet) -> Result<Box<dyn ClusterModel>, ClusterError>;
}

/// Look up a model factory by name.
///
/// This is the dynamic boundary: a name that resolves is guaranteed to fit,
/// an unknown one fails with `Capability` before any model is constructed.
pub fn resolve_factory(name: &str) -> Result<Box<dyn ModelFactory>, ClusterError> {
    match name.to_lowercase().as_str() {
        "kmeans" => Ok(Box::new(KMeansFactory)),
        _ => Err(ClusterError::Capability {
            model: name.to_string(),
            reason: "no registered factory provides a fit capability under this name".to_string(),
        }),
    }
}
