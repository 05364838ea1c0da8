//! Discrete factors over network variables.
//!
//! A factor holds one axis per variable, in the order of `vars`. Products align both
//! operands to the union of their variables and rely on ndarray broadcasting, so no
//! index arithmetic is done by hand.

use super::NetworkError;
use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn};

#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    vars: Vec<usize>,
    values: ArrayD<f64>,
}

impl Factor {
    /// Builds a factor from row-major `values` (last variable varying fastest).
    pub fn new(vars: Vec<usize>, cards: &[usize], values: Vec<f64>) -> Result<Self, NetworkError> {
        if vars.len() != cards.len() {
            return Err(NetworkError::Shape(format!(
                "{} variables but {} cardinalities",
                vars.len(),
                cards.len()
            )));
        }
        let values = ArrayD::from_shape_vec(IxDyn(cards), values)
            .map_err(|e| NetworkError::Shape(e.to_string()))?;
        Ok(Self { vars, values })
    }

    pub fn vars(&self) -> &[usize] {
        &self.vars
    }

    pub fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    pub fn contains(&self, var: usize) -> bool {
        self.vars.contains(&var)
    }

    fn axis_of(&self, var: usize) -> Option<usize> {
        self.vars.iter().position(|&v| v == var)
    }

    /// Fixes `var` to `state` and drops its axis. Factors without `var` are returned as-is.
    pub fn reduce(&self, var: usize, state: usize) -> Result<Factor, NetworkError> {
        let Some(axis) = self.axis_of(var) else {
            return Ok(self.clone());
        };
        let cardinality = self.values.shape()[axis];
        if state >= cardinality {
            return Err(NetworkError::StateOutOfRange {
                node: var,
                state,
                cardinality,
            });
        }
        let mut vars = self.vars.clone();
        vars.remove(axis);
        Ok(Factor {
            vars,
            values: self.values.index_axis(Axis(axis), state).to_owned(),
        })
    }

    /// Sums `var` out of the factor.
    pub fn marginalize(&self, var: usize) -> Factor {
        let Some(axis) = self.axis_of(var) else {
            return self.clone();
        };
        let mut vars = self.vars.clone();
        vars.remove(axis);
        Factor {
            vars,
            values: self.values.sum_axis(Axis(axis)),
        }
    }

    /// Pointwise product over the union of both scopes (own variables first).
    pub fn product(&self, other: &Factor) -> Factor {
        let mut union = self.vars.clone();
        union.extend(other.vars.iter().copied().filter(|v| !self.vars.contains(v)));
        let values = &self.aligned(&union) * &other.aligned(&union);
        Factor {
            vars: union,
            values,
        }
    }

    /// A view with axes permuted into `union` order and length-one axes for the
    /// variables this factor does not mention.
    fn aligned(&self, union: &[usize]) -> ArrayViewD<'_, f64> {
        let mut axes: Vec<usize> = (0..self.vars.len()).collect();
        axes.sort_by_key(|&axis| union.iter().position(|&u| u == self.vars[axis]));
        let mut view = self.values.view().permuted_axes(axes);
        for (position, var) in union.iter().enumerate() {
            if !self.vars.contains(var) {
                view = view.insert_axis(Axis(position));
            }
        }
        view
    }

    /// Scales the values to sum to one. `None` when the total mass is zero.
    pub fn normalize(&self) -> Option<Factor> {
        let total = self.values.sum();
        if !(total > 0.0 && total.is_finite()) {
            return None;
        }
        Some(Factor {
            vars: self.vars.clone(),
            values: &self.values / total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn prior() -> Factor {
        // P(A)
        Factor::new(vec![0], &[2], vec![0.3, 0.7]).unwrap()
    }

    fn conditional() -> Factor {
        // P(B | A), rows indexed by A
        Factor::new(vec![0, 1], &[2, 3], vec![0.5, 0.25, 0.25, 0.1, 0.1, 0.8]).unwrap()
    }

    #[test]
    fn product_then_marginalize_gives_the_marginal() {
        let joint = prior().product(&conditional());
        assert_eq!(joint.vars(), &[0, 1]);
        let marginal = joint.marginalize(0);
        assert_eq!(marginal.vars(), &[1]);
        let expected = [0.3 * 0.5 + 0.7 * 0.1, 0.3 * 0.25 + 0.7 * 0.1, 0.3 * 0.25 + 0.7 * 0.8];
        for (value, want) in marginal.values().iter().zip(expected) {
            assert_abs_diff_eq!(*value, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn product_aligns_permuted_scopes() {
        // Factor over (B, A) multiplied into one over (A, B) must match element-wise.
        let flipped = Factor::new(vec![1, 0], &[3, 2], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let product = conditional().product(&flipped);
        assert_eq!(product.vars(), &[0, 1]);
        assert_abs_diff_eq!(product.values()[[0, 2].as_slice()], 0.25 * 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(product.values()[[1, 1].as_slice()], 0.1 * 4.0, epsilon = 1e-12);
    }

    #[test]
    fn reduce_fixes_a_state() {
        let reduced = conditional().reduce(1, 2).unwrap();
        assert_eq!(reduced.vars(), &[0]);
        assert_eq!(reduced.values().iter().copied().collect::<Vec<_>>(), vec![0.25, 0.8]);
        assert!(matches!(
            conditional().reduce(1, 3),
            Err(NetworkError::StateOutOfRange { state: 3, cardinality: 3, .. })
        ));
        assert_eq!(prior().reduce(5, 0).unwrap(), prior());
    }

    #[test]
    fn normalize_rejects_zero_mass() {
        let zero = Factor::new(vec![0], &[2], vec![0.0, 0.0]).unwrap();
        assert!(zero.normalize().is_none());
        let scaled = Factor::new(vec![0], &[2], vec![1.0, 3.0]).unwrap().normalize().unwrap();
        assert_abs_diff_eq!(scaled.values()[[0].as_slice()], 0.25, epsilon = 1e-12);
    }

    #[test]
    fn rejects_mismatched_shapes() {
        assert!(Factor::new(vec![0], &[3], vec![0.5, 0.5]).is_err());
        assert!(Factor::new(vec![0, 1], &[2], vec![0.5, 0.5]).is_err());
    }
}
