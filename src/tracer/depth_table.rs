//! Depth-correlated initial concentration.

use crate::error::TracerError;

/// Piecewise-linear concentration as a function of depth.
///
/// Depths are strictly increasing and finite. Outside the tabulated range the
/// first or last concentration is returned.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "DepthTableColumns", into = "DepthTableColumns")
)]
pub struct DepthTable {
    depths: Vec<f64>,
    values: Vec<f64>,
}

/// Column form of a [`DepthTable`], as it appears in input data.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DepthTableColumns {
    pub depth: Vec<f64>,
    pub concentration: Vec<f64>,
}

impl DepthTable {
    pub fn new(depths: Vec<f64>, values: Vec<f64>) -> Result<Self, TracerError> {
        if depths.len() != values.len() {
            return Err(TracerError::InvalidTable(format!(
                "{} depths for {} concentrations",
                depths.len(),
                values.len()
            )));
        }
        if depths.is_empty() {
            return Err(TracerError::InvalidTable("depth table has no rows".into()));
        }
        if let Some(bad) = depths.iter().chain(&values).find(|v| !v.is_finite()) {
            return Err(TracerError::InvalidTable(format!("non-finite entry {bad}")));
        }
        if let Some(w) = depths.windows(2).find(|w| w[1] <= w[0]) {
            return Err(TracerError::InvalidTable(format!(
                "depths must be strictly increasing, found {} after {}",
                w[1], w[0]
            )));
        }
        Ok(Self { depths, values })
    }

    /// Build from `(depth, concentration)` rows.
    pub fn from_points(points: &[(f64, f64)]) -> Result<Self, TracerError> {
        let (depths, values) = points.iter().copied().unzip();
        Self::new(depths, values)
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    pub fn depths(&self) -> &[f64] {
        &self.depths
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Concentration at `depth`.
    pub fn evaluate(&self, depth: f64) -> f64 {
        let last = self.depths.len() - 1;
        if depth <= self.depths[0] {
            return self.values[0];
        }
        if depth >= self.depths[last] {
            return self.values[last];
        }
        // first depth strictly above `depth`; 1 <= hi <= last here
        let hi = self.depths.partition_point(|&d| d <= depth);
        let lo = hi - 1;
        let (d0, d1) = (self.depths[lo], self.depths[hi]);
        let (v0, v1) = (self.values[lo], self.values[hi]);
        v0 + (v1 - v0) * (depth - d0) / (d1 - d0)
    }
}

impl TryFrom<DepthTableColumns> for DepthTable {
    type Error = TracerError;

    fn try_from(c: DepthTableColumns) -> Result<Self, Self::Error> {
        Self::new(c.depth, c.concentration)
    }
}

impl From<DepthTable> for DepthTableColumns {
    fn from(t: DepthTable) -> Self {
        Self { depth: t.depths, concentration: t.values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn interpolates_linearly() {
        let t = DepthTable::from_points(&[(0.0, 0.1), (100.0, 0.9)]).unwrap();
        assert_abs_diff_eq!(t.evaluate(50.0), 0.5, epsilon = 1e-14);
        assert_abs_diff_eq!(t.evaluate(25.0), 0.3, epsilon = 1e-14);
        assert_eq!(t.evaluate(100.0), 0.9);
    }

    #[test]
    fn clamps_outside_range() {
        let t = DepthTable::from_points(&[(10.0, 1.0), (20.0, 3.0), (40.0, 2.0)]).unwrap();
        assert_eq!(t.evaluate(-5.0), 1.0);
        assert_eq!(t.evaluate(1e6), 2.0);
        assert_abs_diff_eq!(t.evaluate(30.0), 2.5, epsilon = 1e-14);
        assert_eq!(t.evaluate(20.0), 3.0);
    }

    #[test]
    fn single_row_is_constant() {
        let t = DepthTable::from_points(&[(5.0, 0.25)]).unwrap();
        assert_eq!(t.evaluate(0.0), 0.25);
        assert_eq!(t.evaluate(5.0), 0.25);
        assert_eq!(t.evaluate(9.0), 0.25);
    }

    #[test]
    fn rejects_malformed_tables() {
        assert!(matches!(DepthTable::new(vec![], vec![]), Err(TracerError::InvalidTable(_))));
        assert!(DepthTable::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(DepthTable::from_points(&[(1.0, 0.0), (1.0, 1.0)]).is_err());
        assert!(DepthTable::from_points(&[(2.0, 0.0), (1.0, 1.0)]).is_err());
        assert!(DepthTable::from_points(&[(0.0, f64::NAN)]).is_err());
    }
}
