//! Per-cell styling: colour and opacity ramps.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grid::GridCell;

/// A style property that is either fixed or derived from each cell.
pub enum Styled<T> {
    Constant(T),
    Computed(Box<dyn Fn(&GridCell) -> T + Send + Sync>),
}

impl<T: Clone> Styled<T> {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&GridCell) -> T + Send + Sync + 'static,
    {
        Self::Computed(Box::new(f))
    }

    /// Value of the property for `cell`.
    pub fn resolve(&self, cell: &GridCell) -> T {
        match self {
            Self::Constant(value) => value.clone(),
            Self::Computed(f) => f(cell),
        }
    }
}

impl<T> From<T> for Styled<T> {
    fn from(value: T) -> Self {
        Self::Constant(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Styled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Colour at a value on a stepped ramp.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ColorStop {
    pub value: f64,
    pub color: String,
}

/// Opacity at a value on a stepped ramp.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct OpacityStop {
    pub value: f64,
    pub opacity: f64,
}

/// Channels of a `#rrggbb` stop colour (the `#` is optional).
pub fn hex_to_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let digits = color.strip_prefix('#').unwrap_or(color);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let packed = u32::from_str_radix(digits, 16).ok()?;
    let [_, r, g, b] = packed.to_be_bytes();
    Some((r, g, b))
}

pub fn rgb_to_hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

fn lerp_channel(start: u8, end: u8, t: f64) -> f64 {
    start as f64 + (end as f64 - start as f64) * t
}

/// Locate `value` on sorted stops: `Err(i)` when clamped to stop `i`,
/// `Ok((i, t))` when between stops `i - 1` and `i` at fraction `t`.
fn locate(value: f64, stops: &[f64]) -> std::result::Result<(usize, f64), usize> {
    let last = stops.len() - 1;
    if value <= stops[0] {
        return Err(0);
    }
    if value >= stops[last] {
        return Err(last);
    }
    let end = stops.iter().position(|&s| value <= s).unwrap_or(last);
    let (lo, hi) = (stops[end - 1], stops[end]);
    Ok((end, (value - lo) / (hi - lo)))
}

/// Colour of `value` interpolated between the surrounding stops.
///
/// Values beyond the outer stops take the outer colours. Channels are
/// truncated.
pub fn stepped_hex_color(value: f64, stops: &[ColorStop]) -> Option<String> {
    if stops.is_empty() || value.is_nan() {
        return None;
    }
    let mut sorted = stops.to_vec();
    sorted.sort_by(|a, b| a.value.total_cmp(&b.value));
    let values: Vec<f64> = sorted.iter().map(|s| s.value).collect();

    match locate(value, &values) {
        Err(i) => Some(sorted[i].color.clone()),
        Ok((end, t)) => {
            let (r0, g0, b0) = hex_to_rgb(&sorted[end - 1].color)?;
            let (r1, g1, b1) = hex_to_rgb(&sorted[end].color)?;
            Some(rgb_to_hex((
                lerp_channel(r0, r1, t) as u8,
                lerp_channel(g0, g1, t) as u8,
                lerp_channel(b0, b1, t) as u8,
            )))
        }
    }
}

/// Colour of `value` on a two-colour ramp over `[min, max]`, channels rounded.
pub fn linear_hex_color(
    value: f64,
    min: f64,
    max: f64,
    min_color: &str,
    max_color: &str,
) -> Option<String> {
    if value.is_nan() {
        return None;
    }
    let t = if max > min {
        (value.clamp(min, max) - min) / (max - min)
    } else {
        0.0
    };
    let (r0, g0, b0) = hex_to_rgb(min_color)?;
    let (r1, g1, b1) = hex_to_rgb(max_color)?;
    Some(rgb_to_hex((
        lerp_channel(r0, r1, t).round() as u8,
        lerp_channel(g0, g1, t).round() as u8,
        lerp_channel(b0, b1, t).round() as u8,
    )))
}

/// Opacity of `value` interpolated between the surrounding stops.
pub fn stepped_opacity(value: f64, stops: &[OpacityStop]) -> Option<f64> {
    if stops.is_empty() || value.is_nan() {
        return None;
    }
    let mut sorted = stops.to_vec();
    sorted.sort_by(|a, b| a.value.total_cmp(&b.value));
    let values: Vec<f64> = sorted.iter().map(|s| s.value).collect();

    Some(match locate(value, &values) {
        Err(i) => sorted[i].opacity,
        Ok((end, t)) => {
            let (a, b) = (sorted[end - 1].opacity, sorted[end].opacity);
            a + (b - a) * t
        }
    })
}

/// Opacity of `value` over `[min, max]`; the opacity range is clamped to
/// `[0, 1]`.
pub fn linear_opacity(
    value: f64,
    min: f64,
    max: f64,
    min_opacity: f64,
    max_opacity: f64,
) -> Option<f64> {
    if value.is_nan() {
        return None;
    }
    let min_opacity = min_opacity.max(0.0);
    let max_opacity = max_opacity.min(1.0);
    let t = if max > min {
        (value.clamp(min, max) - min) / (max - min)
    } else {
        0.0
    };
    Some((max_opacity - min_opacity) * t + min_opacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DimensionFilter;

    fn stops() -> Vec<ColorStop> {
        vec![
            ColorStop {
                value: 10.0,
                color: "#ffffff".into(),
            },
            ColorStop {
                value: 0.0,
                color: "#000000".into(),
            },
        ]
    }

    #[test]
    fn test_hex_round_trip() {
        assert_eq!(hex_to_rgb("#ff8000"), Some((255, 128, 0)));
        assert_eq!(hex_to_rgb("FF8000"), Some((255, 128, 0)));
        assert_eq!(hex_to_rgb("#fff"), None);
        assert_eq!(hex_to_rgb("#gg0000"), None);
        assert_eq!(hex_to_rgb("+12345"), None);
        assert_eq!(hex_to_rgb("##ff8000"), None);
        assert_eq!(rgb_to_hex((255, 128, 0)), "#ff8000");
    }

    #[test]
    fn test_stepped_color() {
        let stops = stops();
        assert_eq!(stepped_hex_color(-5.0, &stops).as_deref(), Some("#000000"));
        assert_eq!(stepped_hex_color(50.0, &stops).as_deref(), Some("#ffffff"));
        // 255 * 0.5 = 127.5 truncates
        assert_eq!(stepped_hex_color(5.0, &stops).as_deref(), Some("#7f7f7f"));
        assert_eq!(stepped_hex_color(f64::NAN, &stops), None);
        assert_eq!(stepped_hex_color(1.0, &[]), None);
    }

    #[test]
    fn test_linear_color_rounds() {
        assert_eq!(
            linear_hex_color(5.0, 0.0, 10.0, "#000000", "#ffffff").as_deref(),
            Some("#808080")
        );
        assert_eq!(
            linear_hex_color(99.0, 0.0, 10.0, "#000000", "#ff0000").as_deref(),
            Some("#ff0000")
        );
    }

    #[test]
    fn test_opacity_ramps() {
        let stops = [
            OpacityStop {
                value: 0.0,
                opacity: 0.2,
            },
            OpacityStop {
                value: 10.0,
                opacity: 0.6,
            },
        ];
        assert_eq!(stepped_opacity(-1.0, &stops), Some(0.2));
        assert!((stepped_opacity(5.0, &stops).unwrap() - 0.4).abs() < 1e-12);

        assert_eq!(linear_opacity(5.0, 0.0, 10.0, -1.0, 2.0), Some(0.5));
        assert_eq!(linear_opacity(20.0, 0.0, 10.0, 0.0, 0.8), Some(0.8));
    }

    #[test]
    fn test_styled_resolves_per_cell() {
        let cell = GridCell {
            i: 0,
            j: 0,
            x: 0.0,
            y: 0.0,
            polygon: None,
            value: Some(10.0),
            dimensions: DimensionFilter::new(),
        };
        let fixed: Styled<String> = "#123456".to_string().into();
        assert_eq!(fixed.resolve(&cell), "#123456");

        let ramp = stops();
        let computed = Styled::computed(move |c: &GridCell| {
            c.value.and_then(|v| stepped_hex_color(v, &ramp))
        });
        assert_eq!(computed.resolve(&cell).as_deref(), Some("#ffffff"));
    }
}
