//! Value cleansing and summary statistics.
//!
//! Raw values equal to the variable's `_FillValue` (or `missing_value`)
//! become `None`; everything else is multiplied by `scale_factor` and then
//! shifted by `add_offset`, each only when present.

use netcdf_parser::Variable;
use serde::{Deserialize, Serialize};

/// Packing and fill attributes of one variable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cleanser {
    pub fill_value: Option<f64>,
    pub scale_factor: Option<f64>,
    pub add_offset: Option<f64>,
}

impl Cleanser {
    pub fn for_variable(variable: &Variable) -> Self {
        let fill_value = variable
            .attributes
            .iter()
            .find(|a| a.name == "_FillValue" || a.name == "missing_value")
            .and_then(|a| a.value.as_f64());

        Self {
            fill_value,
            scale_factor: variable.attribute("scale_factor").and_then(|v| v.as_f64()),
            add_offset: variable.attribute("add_offset").and_then(|v| v.as_f64()),
        }
    }

    /// Cleanse one raw value.
    pub fn apply(&self, raw: f64) -> Option<f64> {
        if let Some(fill) = self.fill_value {
            if raw == fill || (fill.is_nan() && raw.is_nan()) {
                return None;
            }
        }
        let mut value = raw;
        if let Some(scale) = self.scale_factor {
            value *= scale;
        }
        if let Some(offset) = self.add_offset {
            value += offset;
        }
        Some(value)
    }

    pub fn apply_all(&self, raw: &[f64]) -> Vec<Option<f64>> {
        raw.iter().map(|&v| self.apply(v)).collect()
    }
}

/// Summary of a cleansed variable. Nulls are excluded from every aggregate
/// but counted in `count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sum: f64,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub null_count: usize,
    pub count: usize,
}

impl VariableStats {
    pub fn from_values(values: &[Option<f64>]) -> Self {
        let mut present: Vec<f64> = values.iter().flatten().copied().collect();
        let null_count = values.len() - present.len();

        let sum: f64 = present.iter().sum();
        let min = present.iter().copied().reduce(f64::min);
        let max = present.iter().copied().reduce(f64::max);
        let mean = (!present.is_empty()).then(|| sum / present.len() as f64);

        present.sort_by(|a, b| a.total_cmp(b));
        let median = match present.len() {
            0 => None,
            n if n % 2 == 1 => Some(present[n / 2]),
            n => Some((present[n / 2 - 1] + present[n / 2]) / 2.0),
        };

        Self {
            min,
            max,
            sum,
            mean,
            median,
            null_count,
            count: values.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_before_offset() {
        let c = Cleanser {
            fill_value: Some(-1.0),
            scale_factor: Some(2.0),
            add_offset: Some(10.0),
        };
        assert_eq!(c.apply(3.0), Some(16.0));
        assert_eq!(c.apply(-1.0), None);
    }

    #[test]
    fn test_no_attributes_is_identity() {
        let c = Cleanser::default();
        assert_eq!(c.apply_all(&[1.5, -2.0]), vec![Some(1.5), Some(-2.0)]);
    }

    #[test]
    fn test_nan_fill_matches_nan() {
        let c = Cleanser {
            fill_value: Some(f64::NAN),
            ..Default::default()
        };
        assert_eq!(c.apply(f64::NAN), None);
        assert_eq!(c.apply(1.0), Some(1.0));
    }

    #[test]
    fn test_stats_skip_nulls() {
        let stats = VariableStats::from_values(&[Some(4.0), None, Some(1.0), Some(7.0), None]);
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(7.0));
        assert_eq!(stats.sum, 12.0);
        assert_eq!(stats.mean, Some(4.0));
        assert_eq!(stats.median, Some(4.0));
        assert_eq!(stats.null_count, 2);
        assert_eq!(stats.count, 5);
    }

    #[test]
    fn test_stats_even_median_and_empty() {
        let stats = VariableStats::from_values(&[Some(1.0), Some(2.0), Some(3.0), Some(10.0)]);
        assert_eq!(stats.median, Some(2.5));

        let empty = VariableStats::from_values(&[None, None]);
        assert_eq!(empty.min, None);
        assert_eq!(empty.mean, None);
        assert_eq!(empty.null_count, 2);
    }
}
