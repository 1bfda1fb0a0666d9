//! Quantized range bounds
//!
//! A range describes the admissible values `min + k * step` lying in
//! `[min, max]`, with finite bounds. Candidates are snapped to the nearest grid
//! point, ties going to the upper neighbour, and the grid index is limited so
//! the result stays both in bounds and on the grid.

use crate::parameters::constraint::ConstructionError;
use crate::parameters::value::Value;
use std::fmt;

/// Slack on the grid index, absorbing the rounding of `(value - min) / step`
/// so decimal midpoints and `max` land on the expected grid point
const GRID_EPSILON: f64 = 1e-9;

/// Scalar types that can be laid out on a quantization grid
pub trait Quantize: Copy + PartialOrd + fmt::Debug + fmt::Display + Into<Value> {
    /// Snap `value` onto `min + k * step`, keeping the result inside `[min, max]`
    fn quantize(value: Self, min: Self, step: Self, max: Self) -> Self;

    /// Whether `step` can define a grid
    fn is_valid_step(step: Self) -> bool;

    /// Whether `bound` can be used as `min` or `max`
    fn is_valid_bound(bound: Self) -> bool;

    /// Whether two grids have the same step and share their grid points
    fn same_grid(min_a: Self, step_a: Self, min_b: Self, step_b: Self, tolerance: f64) -> bool;
}

impl Quantize for f64 {
    fn quantize(value: f64, min: f64, step: f64, max: f64) -> f64 {
        let last = ((max - min) / step + GRID_EPSILON).floor();
        let k = ((value - min) / step + 0.5 + GRID_EPSILON)
            .floor()
            .clamp(0.0, last);
        (min + k * step).clamp(min, max)
    }

    fn is_valid_step(step: f64) -> bool {
        step.is_finite() && step > 0.0
    }

    fn is_valid_bound(bound: f64) -> bool {
        bound.is_finite()
    }

    fn same_grid(min_a: f64, step_a: f64, min_b: f64, step_b: f64, tolerance: f64) -> bool {
        if (step_a - step_b).abs() >= tolerance {
            return false;
        }
        let offset = (min_a - min_b) / step_a;
        (offset - offset.round()).abs() * step_a < tolerance
    }
}

impl Quantize for i64 {
    fn quantize(value: i64, min: i64, step: i64, max: i64) -> i64 {
        // i128 keeps the offset arithmetic exact for any pair of i64 values
        let (value, min, step, max) = (value as i128, min as i128, step as i128, max as i128);
        let last = (max - min) / step;
        let k = (2 * (value - min) + step).div_euclid(2 * step).clamp(0, last);
        (min + k * step) as i64
    }

    fn is_valid_step(step: i64) -> bool {
        step > 0
    }

    fn is_valid_bound(_bound: i64) -> bool {
        true
    }

    fn same_grid(min_a: i64, step_a: i64, min_b: i64, step_b: i64, _tolerance: f64) -> bool {
        step_a == step_b && (min_a as i128 - min_b as i128) % step_a as i128 == 0
    }
}

/// Bounds of a quantized range: `min`, `step`, `max` and a default value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<T> {
    /// Smallest admissible value, also the origin of the grid
    pub min: T,

    /// Distance between two admissible values
    pub step: T,

    /// Largest admissible value
    pub max: T,

    /// Value a variable starts from
    pub default: T,
}

impl<T: Quantize> Bounds<T> {
    /// Create new bounds. The default is `min` unless given, and is snapped
    /// into the range if it lies outside.
    ///
    /// # Examples
    ///
    /// ```
    /// use libdsp_rs::parameters::bounds::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 0.5, 2.0, Some(7.0)).unwrap();
    /// assert_eq!(bounds.default, 2.0);
    /// assert!(Bounds::new(2.0, 0.5, 0.0, None).is_err());
    /// ```
    pub fn new(min: T, step: T, max: T, default: Option<T>) -> Result<Self, ConstructionError> {
        // Also rejects NaN bounds, for which the comparison is false. Infinite
        // bounds have no grid.
        if !(min <= max) || !T::is_valid_bound(min) || !T::is_valid_bound(max) {
            return Err(ConstructionError::InvalidBounds {
                min: min.into(),
                max: max.into(),
            });
        }
        if !T::is_valid_step(step) {
            return Err(ConstructionError::InvalidStep { step: step.into() });
        }

        let default = T::quantize(default.unwrap_or(min), min, step, max);
        Ok(Self {
            min,
            step,
            max,
            default,
        })
    }

    /// Snap a candidate onto the grid and into the bounds
    pub fn apply(&self, value: T) -> T {
        T::quantize(value, self.min, self.step, self.max)
    }

    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    /// Overlap of two ranges sharing the same grid.
    ///
    /// Returns `None` when the steps differ, the grids are offset from each
    /// other, or the ranges do not overlap. The default of `self` is carried
    /// over, snapped into the overlap.
    pub fn intersect(&self, other: &Self, tolerance: f64) -> Option<Self> {
        if !T::same_grid(self.min, self.step, other.min, other.step, tolerance) {
            return None;
        }

        let min = if self.min >= other.min { self.min } else { other.min };
        let max = if self.max <= other.max { self.max } else { other.max };
        if min > max {
            return None;
        }

        Some(Self {
            min,
            step: self.step,
            max,
            default: T::quantize(self.default, min, self.step, max),
        })
    }
}
