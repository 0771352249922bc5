use smartcore::cluster::kmeans::{KMeans, KMeansParameters};
use smartcore::linalg::basic::matrix::DenseMatrix;

use super::{ClusterModel, ModelFactory, ParamSet};
use crate::application::cluster_input::FeatureMatrix;
use crate::domain::errors::ClusterError;

const DEFAULT_MAX_ITER: usize = 100;

/// Factory for the smartcore K-Means adapter.
///
/// Parameters: `k` (required cluster count, >= 1) and `max_iter`
/// (optional, default 100).
pub struct KMeansFactory;

impl ModelFactory for KMeansFactory {
    fn name(&self) -> &'static str {
        "kmeans"
    }

    fn build(&self, params: &ParamSet) -> Result<Box<dyn ClusterModel>, ClusterError> {
        let k = params.require_usize("k")?;
        if k == 0 {
            return Err(ClusterError::configuration("`k` must be at least 1"));
        }
        let max_iter = params.usize_or("max_iter", DEFAULT_MAX_ITER)?;

        Ok(Box::new(KMeansModel { k, max_iter }))
    }
}

pub struct KMeansModel {
    k: usize,
    max_iter: usize,
}

impl ClusterModel for KMeansModel {
    fn name(&self) -> &str {
        "kmeans"
    }

    fn fit(&self, features: &FeatureMatrix) -> Result<Vec<String>, ClusterError> {
        if features.n_assets() < self.k {
            return Err(ClusterError::Fit {
                model: "kmeans".to_string(),
                reason: format!(
                    "{} assets cannot form {} clusters",
                    features.n_assets(),
                    self.k
                ),
            });
        }

        let matrix = DenseMatrix::from_2d_vec(&features.rows().to_vec()).map_err(|e| {
            ClusterError::Fit {
                model: "kmeans".to_string(),
                reason: format!("matrix construction failed: {}", e),
            }
        })?;

        let parameters = KMeansParameters::default()
            .with_k(self.k)
            .with_max_iter(self.max_iter);

        let model = KMeans::<f64, u32, DenseMatrix<f64>, Vec<u32>>::fit(&matrix, parameters)
            .map_err(|e| ClusterError::Fit {
                model: "kmeans".to_string(),
                reason: e.to_string(),
            })?;

        let labels = model.predict(&matrix).map_err(|e| ClusterError::Fit {
            model: "kmeans".to_string(),
            reason: e.to_string(),
        })?;

        Ok(labels.into_iter().map(|l| l.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::TimeSeriesTable;
    use chrono::NaiveDate;
    use indexmap::IndexMap;

    fn two_blob_features() -> FeatureMatrix {
        let index = (0..4)
            .map(|i| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i))
            .collect();
        let mut columns = IndexMap::new();
        columns.insert("A1".to_string(), vec![0.0, 0.1, -0.1, 0.05]);
        columns.insert("A2".to_string(), vec![0.1, 0.0, -0.05, 0.1]);
        columns.insert("B1".to_string(), vec![10.0, 10.1, 9.9, 10.05]);
        columns.insert("B2".to_string(), vec![10.1, 10.0, 9.95, 10.1]);
        let table = TimeSeriesTable::from_columns(index, columns).unwrap();
        FeatureMatrix::from_table(&table)
    }

    #[test]
    fn test_build_requires_k() {
        let result = KMeansFactory.build(&ParamSet::new());
        assert!(matches!(result, Err(ClusterError::Configuration { .. })));
    }

    #[test]
    fn test_build_rejects_zero_k() {
        let mut params = ParamSet::new();
        params.insert("k", 0i64);
        let result = KMeansFactory.build(&params);
        assert!(matches!(result, Err(ClusterError::Configuration { .. })));
    }

    #[test]
    fn test_fit_separates_obvious_blobs() {
        let mut params = ParamSet::new();
        params.insert("k", 2i64);
        let model = KMeansFactory.build(&params).unwrap();

        let labels = model.fit(&two_blob_features()).unwrap();
        assert_eq!(labels.len(), 4);

        // Within-blob labels agree, across-blob labels differ.
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn test_fit_single_cluster() {
        let mut params = ParamSet::new();
        params.insert("k", 1i64);
        let model = KMeansFactory.build(&params).unwrap();

        let labels = model.fit(&two_blob_features()).unwrap();
        assert!(labels.iter().all(|l| l == &labels[0]));
    }

    #[test]
    fn test_fit_more_clusters_than_assets() {
        let mut params = ParamSet::new();
        params.insert("k", 9i64);
        let model = KMeansFactory.build(&params).unwrap();

        let result = model.fit(&two_blob_features());
        assert!(matches!(result, Err(ClusterError::Fit { .. })));
    }
}
