use serde::{Deserialize, Deserializer};
use std::path::Path;

use crate::services::sequence_model::ModelError;

fn unit_range() -> (f64, f64) {
    (0.0, 1.0)
}

/// A bound written as `-10.0` or, as sklearn stores fitted attributes, as
/// the one-element array `[-10.0]`.
fn single_feature<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Bound {
        Scalar(f64),
        PerFeature(Vec<f64>),
    }

    match Bound::deserialize(deserializer)? {
        Bound::Scalar(v) => Ok(v),
        Bound::PerFeature(values) => match values.as_slice() {
            [v] => Ok(*v),
            _ => Err(serde::de::Error::custom(format!(
                "expected a single feature, got {} values",
                values.len()
            ))),
        },
    }
}

/// Min-max scaler for a single feature, fitted offline on day-over-day
/// price differences.
///
/// Maps `[data_min, data_max]` linearly onto `feature_range`. A zero-width
/// data range uses a scale of 1 so constant inputs stay finite.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MinMaxScaler {
    #[serde(alias = "data_min_", deserialize_with = "single_feature")]
    data_min: f64,
    #[serde(alias = "data_max_", deserialize_with = "single_feature")]
    data_max: f64,
    #[serde(default = "unit_range")]
    feature_range: (f64, f64),
}

impl MinMaxScaler {
    pub fn new(data_min: f64, data_max: f64, feature_range: (f64, f64)) -> Self {
        Self { data_min, data_max, feature_range }
    }

    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let scaler: Self = serde_json::from_str(raw)?;
        if !scaler.data_min.is_finite() || !scaler.data_max.is_finite() {
            return Err(ModelError::Invalid("scaler bounds must be finite".into()));
        }
        if scaler.feature_range.0 >= scaler.feature_range.1 {
            return Err(ModelError::Invalid(format!(
                "feature_range must be increasing, got {:?}",
                scaler.feature_range
            )));
        }
        Ok(scaler)
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ModelError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    fn scale(&self) -> f64 {
        let span = self.data_max - self.data_min;
        let span = if span == 0.0 { 1.0 } else { span };
        (self.feature_range.1 - self.feature_range.0) / span
    }

    fn offset(&self) -> f64 {
        self.feature_range.0 - self.data_min * self.scale()
    }

    pub fn transform(&self, value: f64) -> f64 {
        value * self.scale() + self.offset()
    }

    pub fn inverse_transform(&self, scaled: f64) -> f64 {
        (scaled - self.offset()) / self.scale()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_maps_bounds_onto_range() {
        let scaler = MinMaxScaler::new(-5.0, 15.0, (0.0, 1.0));
        assert!((scaler.transform(-5.0) - 0.0).abs() < 1e-12);
        assert!((scaler.transform(15.0) - 1.0).abs() < 1e-12);
        assert!((scaler.transform(0.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_undoes_transform() {
        let scaler = MinMaxScaler::new(-3.2, 4.7, (-1.0, 1.0));
        let scaled = scaler.transform(1.3);
        assert!((scaler.inverse_transform(scaled) - 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_zero_width_range_stays_finite() {
        let scaler = MinMaxScaler::new(2.0, 2.0, (0.0, 1.0));
        assert_eq!(scaler.transform(2.0), 0.0);
        assert!(scaler.inverse_transform(0.5).is_finite());
    }

    #[test]
    fn test_reads_sklearn_attribute_names() {
        let scaler = MinMaxScaler::from_json(r#"{"data_min_": -10.0, "data_max_": 10.0}"#).unwrap();
        assert_eq!(scaler, MinMaxScaler::new(-10.0, 10.0, (0.0, 1.0)));
    }

    #[test]
    fn test_reads_per_feature_arrays_from_sklearn_dump() {
        let scaler = MinMaxScaler::from_json(
            r#"{"data_min_": [-10.0], "data_max_": [10.0], "feature_range": [0.0, 1.0]}"#,
        )
        .unwrap();
        assert_eq!(scaler, MinMaxScaler::new(-10.0, 10.0, (0.0, 1.0)));
        assert!((scaler.transform(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_multi_feature_bounds() {
        let err = MinMaxScaler::from_json(r#"{"data_min_": [-1.0, -2.0], "data_max_": [1.0, 2.0]}"#);
        assert!(matches!(err, Err(ModelError::Json(_))));
    }

    #[test]
    fn test_rejects_inverted_feature_range() {
        let err = MinMaxScaler::from_json(r#"{"data_min": 0.0, "data_max": 1.0, "feature_range": [1.0, 0.0]}"#);
        assert!(matches!(err, Err(ModelError::Invalid(_))));
    }
}
