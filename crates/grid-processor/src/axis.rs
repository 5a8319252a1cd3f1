//! CF axis resolution.
//!
//! Identifies the X/Y/T coordinate variables of a dataset from their
//! attributes. Variables are visited in file order and each one is tested
//! against every rule, highest priority first; the first variable matching
//! any rule wins. A variable declared later never overrides an earlier match,
//! even if it matches a higher-priority rule.
//!
//! Rules, for a variable with the expected dimensionality:
//!
//! 1. `axis` (name case-insensitive) equals `X`/`Y`/`T`
//! 2. `cartesian_axis` (name case-insensitive) equals `X`/`Y`/`T`
//! 3. `_CoordinateAxisType` equals `Lon`/`Lat`/`Time`
//! 4. `standard_name` (value case-insensitive) equals `longitude`/`latitude`/`time`
//! 5. `standard_name` equals `projection_x_coordinate`/`projection_y_coordinate`:
//!    the dataset is a projected source, and the 2-D longitude/latitude
//!    "ordinate" variable is looked up with the same rules.

use netcdf_parser::{Header, Variable};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A logical coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisKind {
    X,
    Y,
    T,
}

impl AxisKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::T => "T",
        }
    }

    fn coordinate_axis_type(&self) -> &'static str {
        match self {
            Self::X => "Lon",
            Self::Y => "Lat",
            Self::T => "Time",
        }
    }

    fn standard_name(&self) -> &'static str {
        match self {
            Self::X => "longitude",
            Self::Y => "latitude",
            Self::T => "time",
        }
    }

    fn projected_standard_name(&self) -> Option<&'static str> {
        match self {
            Self::X => Some("projection_x_coordinate"),
            Self::Y => Some("projection_y_coordinate"),
            Self::T => None,
        }
    }
}

/// The variable bound to an axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisBinding {
    /// Coordinate variable name (also the dimension name).
    pub axis: String,
    /// 2-D variable holding true longitudes/latitudes, for projected sources.
    pub ordinate: Option<String>,
}

impl AxisBinding {
    pub fn new(axis: impl Into<String>) -> Self {
        Self {
            axis: axis.into(),
            ordinate: None,
        }
    }
}

/// Axis bindings derived once per header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisBindings {
    pub x: Option<AxisBinding>,
    pub y: Option<AxisBinding>,
    pub t: Option<AxisBinding>,
}

impl AxisBindings {
    /// Resolve X, Y and T from a header.
    pub fn resolve(header: &Header) -> Self {
        let x = search_axis(header, AxisKind::X);
        let y = search_axis(header, AxisKind::Y);
        let t = search_axis(header, AxisKind::T);

        debug!(x = ?x, y = ?y, t = ?t, "resolved axes");
        if t.is_none() {
            info!("no time axis found");
        }
        Self { x, y, t }
    }

    pub fn get(&self, kind: AxisKind) -> Option<&AxisBinding> {
        match kind {
            AxisKind::X => self.x.as_ref(),
            AxisKind::Y => self.y.as_ref(),
            AxisKind::T => self.t.as_ref(),
        }
    }

    /// True when X or Y carries an ordinate variable.
    pub fn is_projected_source(&self) -> bool {
        [&self.x, &self.y]
            .into_iter()
            .flatten()
            .any(|b| b.ordinate.is_some())
    }
}

/// What a search is looking for: a logical axis, or a lon/lat ordinate.
#[derive(Debug, Clone, Copy)]
enum Target {
    Axis(AxisKind),
    Ordinate(&'static str),
}

impl Target {
    fn axis_value(&self) -> &'static str {
        match self {
            Self::Axis(kind) => kind.label(),
            Self::Ordinate(name) => name,
        }
    }

    fn coordinate_axis_type(&self) -> &'static str {
        match self {
            Self::Axis(kind) => kind.coordinate_axis_type(),
            Self::Ordinate(name) => name,
        }
    }

    fn standard_name(&self) -> &'static str {
        match self {
            Self::Axis(kind) => kind.standard_name(),
            Self::Ordinate(name) => name,
        }
    }

    fn projected_standard_name(&self) -> Option<&'static str> {
        match self {
            Self::Axis(kind) => kind.projected_standard_name(),
            Self::Ordinate(_) => None,
        }
    }
}

/// Find the variable bound to `kind` (1-D coordinate variables only).
pub fn search_axis(header: &Header, kind: AxisKind) -> Option<AxisBinding> {
    search(header, Target::Axis(kind), 1)
}

fn text_attrs<'a>(var: &'a Variable) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    var.attributes
        .iter()
        .filter_map(|a| a.value.as_str().map(|v| (a.name.as_str(), v)))
}

fn search(header: &Header, target: Target, dim_len: usize) -> Option<AxisBinding> {
    for var in header
        .variables
        .iter()
        .filter(|v| v.dimensions.len() == dim_len)
    {
        let axis_value = target.axis_value();
        if text_attrs(var).any(|(n, v)| n.eq_ignore_ascii_case("axis") && v == axis_value) {
            return Some(AxisBinding::new(&var.name));
        }
        if text_attrs(var)
            .any(|(n, v)| n.eq_ignore_ascii_case("cartesian_axis") && v == axis_value)
        {
            return Some(AxisBinding::new(&var.name));
        }
        let coord_type = target.coordinate_axis_type();
        if text_attrs(var).any(|(n, v)| n == "_CoordinateAxisType" && v == coord_type) {
            return Some(AxisBinding::new(&var.name));
        }
        let standard_name = target.standard_name();
        if text_attrs(var)
            .any(|(n, v)| n == "standard_name" && v.to_lowercase() == standard_name)
        {
            return Some(AxisBinding::new(&var.name));
        }
        if let Some(projected) = target.projected_standard_name() {
            if text_attrs(var).any(|(n, v)| n == "standard_name" && v.to_lowercase() == projected)
            {
                let ordinate_name = match target {
                    Target::Axis(AxisKind::X) => "longitude",
                    _ => "latitude",
                };
                return match search(header, Target::Ordinate(ordinate_name), 2) {
                    Some(ordinate) => Some(AxisBinding {
                        axis: var.name.clone(),
                        ordinate: Some(ordinate.axis),
                    }),
                    None => {
                        warn!(
                            variable = %var.name,
                            ordinate = ordinate_name,
                            "projected coordinate has no 2-D ordinate variable"
                        );
                        None
                    }
                };
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcdf_parser::{Attribute, AttributeValue, Dimension, NcType};

    fn var(name: &str, dims: Vec<usize>, attrs: &[(&str, &str)]) -> Variable {
        Variable {
            name: name.into(),
            dimensions: dims,
            attributes: attrs
                .iter()
                .map(|(n, v)| Attribute {
                    name: n.to_string(),
                    value: AttributeValue::Text(v.to_string()),
                })
                .collect(),
            nc_type: NcType::Double,
            byte_size: 16,
            offset: 0,
            is_record: false,
        }
    }

    fn header(variables: Vec<Variable>) -> Header {
        Header {
            version: 1,
            record_dimension: None,
            record_step: 0,
            dimensions: vec![
                Dimension {
                    name: "a".into(),
                    size: 2,
                },
                Dimension {
                    name: "b".into(),
                    size: 2,
                },
            ],
            global_attributes: vec![],
            variables,
        }
    }

    #[test]
    fn test_each_rule_matches() {
        let cases: [(&str, &str); 5] = [
            ("axis", "X"),
            ("AXIS", "X"),
            ("cartesian_axis", "X"),
            ("_CoordinateAxisType", "Lon"),
            ("standard_name", "Longitude"),
        ];
        for (name, value) in cases {
            let h = header(vec![var("lon", vec![0], &[(name, value)])]);
            assert_eq!(
                search_axis(&h, AxisKind::X),
                Some(AxisBinding::new("lon")),
                "rule {}={}",
                name,
                value
            );
        }
    }

    #[test]
    fn test_axis_value_is_case_sensitive() {
        let h = header(vec![var("lon", vec![0], &[("axis", "x")])]);
        assert_eq!(search_axis(&h, AxisKind::X), None);
    }

    #[test]
    fn test_dimensionality_must_be_one() {
        let h = header(vec![var("lon", vec![0, 1], &[("axis", "X")])]);
        assert_eq!(search_axis(&h, AxisKind::X), None);
    }

    #[test]
    fn test_first_variable_wins_over_higher_priority_rule() {
        let h = header(vec![
            var("lon_a", vec![0], &[("standard_name", "longitude")]),
            var("lon_b", vec![1], &[("axis", "X")]),
        ]);
        assert_eq!(search_axis(&h, AxisKind::X).unwrap().axis, "lon_a");
    }

    #[test]
    fn test_projected_source_binds_ordinate() {
        let h = header(vec![
            var("lon2d", vec![1, 0], &[("standard_name", "longitude")]),
            var("lat2d", vec![1, 0], &[("standard_name", "latitude")]),
            var("x", vec![0], &[("standard_name", "projection_x_coordinate")]),
            var("y", vec![1], &[("standard_name", "projection_y_coordinate")]),
        ]);
        let axes = AxisBindings::resolve(&h);
        assert_eq!(
            axes.x,
            Some(AxisBinding {
                axis: "x".into(),
                ordinate: Some("lon2d".into())
            })
        );
        assert_eq!(axes.y.unwrap().ordinate.as_deref(), Some("lat2d"));
        assert!(axes.t.is_none());
    }

    #[test]
    fn test_projected_without_ordinate_is_unresolved() {
        let h = header(vec![var(
            "x",
            vec![0],
            &[("standard_name", "projection_x_coordinate")],
        )]);
        assert_eq!(search_axis(&h, AxisKind::X), None);
    }

    #[test]
    fn test_time_axis() {
        let h = header(vec![var("time", vec![0], &[("_CoordinateAxisType", "Time")])]);
        let axes = AxisBindings::resolve(&h);
        assert_eq!(axes.get(AxisKind::T).unwrap().axis, "time");
        assert!(!axes.is_projected_source());
    }
}
