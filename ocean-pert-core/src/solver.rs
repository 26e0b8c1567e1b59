//! Salinity-balancing Newton solver.
//!
//! Given an original (temperature, salinity, depth) state and an
//! independently perturbed temperature field, finds the salinity field that
//! restores the original in-situ density at every sea point. Each grid
//! point is an independent scalar root-finding problem; the solver runs them
//! all at once as whole-field array arithmetic (map: per-point equation of
//! state and Newton step; reduce: global maximum absolute residual), with
//! the iterations themselves strictly sequential.
//!
//! The derivative ∂ρ/∂S is estimated by a one-sided finite difference
//! rather than by differentiating the polynomial, which keeps the solver
//! decoupled from the equation of state. Note the sign convention:
//! `(ρ(S) − ρ(S + h)) / h` is the *negative* of the forward difference, and
//! pairs with the update `S += Δρ / (dρ/dS)`. Flipping either one alone
//! diverges.

use crate::eos::eos_insitu;
use crate::errors::{OceanPertError, OceanPertResult};
use crate::field::{broadcast_to, common_shape, FloatValue};
use crate::mask::SeaMask;
use log::debug;
use ndarray::{ArrayD, ArrayViewD};
use serde::{Deserialize, Serialize};

/// Options controlling the balancing iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceOptions {
    /// Convergence bound on the maximum absolute density residual over sea
    /// points.
    /// unit: kg/m^3
    pub tolerance: FloatValue,
    /// Finite-difference step used to estimate ∂ρ/∂S.
    /// unit: PSU
    pub salinity_step: FloatValue,
    /// Iteration ceiling. `None` removes the ceiling entirely; the solve
    /// then loops indefinitely on input that cannot converge.
    pub max_iterations: Option<usize>,
}

impl Default for BalanceOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            salinity_step: 0.01,
            // Realistic solves converge in well under 50 iterations; the
            // ceiling only exists to turn a hang into an error
            max_iterations: Some(100_000),
        }
    }
}

/// Solve for the salinity field that restores the original density under a
/// perturbed temperature field.
///
/// At every sea point the returned salinity `S` satisfies
/// `eos(T_perturbed, S, z) == eos(T_original, S_original, z)` to within
/// `options.tolerance`, except where the final clamp replaced a negative
/// salinity with zero. Land points carry whatever the unconditional array
/// arithmetic produced; consumers must reapply the mask.
///
/// Inputs are never mutated. All operands must be broadcast compatible;
/// incompatible shapes fail before the iteration starts.
///
/// # Errors
///
/// * [`OceanPertError::ShapeMismatch`] if the operands do not share a
///   common broadcast shape.
/// * [`OceanPertError::NonConvergence`] if `options.max_iterations` is
///   reached with the residual still above tolerance, e.g. when a vanishing
///   derivative has injected non-finite values into the iteration.
pub fn balance_salinity(
    perturbed_temperature: &ArrayViewD<'_, FloatValue>,
    original_temperature: &ArrayViewD<'_, FloatValue>,
    original_salinity: &ArrayViewD<'_, FloatValue>,
    depth: &ArrayViewD<'_, FloatValue>,
    sea_mask: &SeaMask,
    options: &BalanceOptions,
) -> OceanPertResult<ArrayD<FloatValue>> {
    let shape = common_shape(&[
        perturbed_temperature.shape(),
        original_temperature.shape(),
        original_salinity.shape(),
        depth.shape(),
        sea_mask.shape(),
    ])?;

    // Target density from the unperturbed state, land points forced to zero
    let rho0 = masked_density(
        original_temperature,
        original_salinity,
        depth,
        sea_mask,
        &shape,
    )?;

    // Working copy on the full broadcast shape: every point updates
    // independently even when the input salinity was a broadcast column
    let mut salinity = broadcast_to(original_salinity, &shape)?.to_owned();

    let mut rho = masked_density(
        perturbed_temperature,
        &salinity.view(),
        depth,
        sea_mask,
        &shape,
    )?;
    let mut residual = &rho - &rho0;

    let mut iterations = 0usize;
    loop {
        let max_residual = max_abs_residual(&residual);
        if max_residual <= options.tolerance {
            break;
        }
        if let Some(ceiling) = options.max_iterations {
            if iterations >= ceiling {
                return Err(OceanPertError::NonConvergence {
                    iterations,
                    residual: max_residual,
                });
            }
        }
        iterations += 1;
        debug!("iteration {iterations} max density residual {max_residual:e}");

        // d rho / d S estimated at the current (unmasked) density; at land
        // points the numerator is junk but the step there is irrelevant
        let bumped = &salinity + options.salinity_step;
        let rho_bumped = eos_insitu(perturbed_temperature, &bumped.view(), depth)?;
        let derivative = (&rho - &rho_bumped) / options.salinity_step;

        salinity += &(&residual / &derivative);

        rho = masked_density(
            perturbed_temperature,
            &salinity.view(),
            depth,
            sea_mask,
            &shape,
        )?;
        residual = &rho - &rho0;
    }

    // Negative salinity is unphysical: clamp to zero without re-checking
    // the density target at the clamped points
    salinity.mapv_inplace(|s| if s < 0.0 { 0.0 } else { s });
    Ok(salinity)
}

/// Density with land points forced to exactly zero, on the full grid shape.
fn masked_density(
    temperature: &ArrayViewD<'_, FloatValue>,
    salinity: &ArrayViewD<'_, FloatValue>,
    depth: &ArrayViewD<'_, FloatValue>,
    sea_mask: &SeaMask,
    shape: &[usize],
) -> OceanPertResult<ArrayD<FloatValue>> {
    let rho = eos_insitu(temperature, salinity, depth)?;
    let mut rho = if rho.shape() == shape {
        rho
    } else {
        broadcast_to(&rho.view(), shape)?.to_owned()
    };
    sea_mask.zero_land(&mut rho)?;
    Ok(rho)
}

/// Maximum absolute residual over the whole grid.
///
/// NaN (a vanishing finite-difference derivative propagates NaN through the
/// Newton step) maps to +∞ so a degenerate point can never be mistaken for
/// a converged one.
fn max_abs_residual(residual: &ArrayD<FloatValue>) -> FloatValue {
    residual.iter().fold(0.0, |max, &value| {
        let magnitude = value.abs();
        if magnitude.is_nan() {
            FloatValue::INFINITY
        } else {
            max.max(magnitude)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eos::eos_insitu_scalar;
    use approx::assert_relative_eq;
    use ndarray::{ArrayD, IxDyn};

    fn uniform(shape: &[usize], value: FloatValue) -> ArrayD<FloatValue> {
        ArrayD::from_elem(IxDyn(shape), value)
    }

    fn depth_column(levels: &[FloatValue]) -> ArrayD<FloatValue> {
        ArrayD::from_shape_vec(IxDyn(&[1, levels.len(), 1, 1]), levels.to_vec()).unwrap()
    }

    #[test]
    fn test_idempotent_when_unperturbed() {
        let t = uniform(&[1, 3, 2, 2], 10.0);
        let s = uniform(&[1, 3, 2, 2], 35.0);
        let z = depth_column(&[0.0, 100.0, 1000.0]);
        let mask = SeaMask::all_sea(&[1, 3, 2, 2]);

        let balanced = balance_salinity(
            &t.view(),
            &t.view(),
            &s.view(),
            &z.view(),
            &mask,
            &BalanceOptions::default(),
        )
        .unwrap();

        // Residual is zero from the start, so not a single Newton step runs
        assert_eq!(balanced, s);
    }

    #[test]
    fn test_uniform_warming_restores_density() {
        let t0 = uniform(&[1, 3, 2, 2], 10.0);
        let t1 = uniform(&[1, 3, 2, 2], 11.0);
        let s0 = uniform(&[1, 3, 2, 2], 35.0);
        let z = depth_column(&[0.0, 100.0, 1000.0]);
        let mask = SeaMask::all_sea(&[1, 3, 2, 2]);

        let balanced = balance_salinity(
            &t1.view(),
            &t0.view(),
            &s0.view(),
            &z.view(),
            &mask,
            &BalanceOptions::default(),
        )
        .unwrap();

        let levels = [0.0, 100.0, 1000.0];
        for (k, &depth) in levels.iter().enumerate() {
            let s_new = balanced[[0, k, 0, 0]];
            // Warming lowered the density; restoring it needs more salt
            assert!(s_new > 35.0, "expected salinity above 35, got {s_new}");
            assert_relative_eq!(
                eos_insitu_scalar(11.0, s_new, depth),
                eos_insitu_scalar(10.0, 35.0, depth),
                epsilon = 1e-12
            );
            // Uniform inputs per level must converge to a uniform answer
            assert_eq!(s_new, balanced[[0, k, 1, 1]]);
        }
    }

    #[test]
    fn test_converges_within_bounded_iterations() {
        // A smooth, non-uniform perturbation over realistic ocean ranges
        let shape = [1, 3, 4, 4];
        let mut t0 = uniform(&shape, 0.0);
        let mut t1 = uniform(&shape, 0.0);
        let mut s0 = uniform(&shape, 0.0);
        for k in 0..3 {
            for j in 0..4 {
                for i in 0..4 {
                    let idx = [0, k, j, i];
                    t0[idx] = 18.0 - 4.0 * k as FloatValue + 0.3 * j as FloatValue;
                    t1[idx] = t0[idx] + 1.5 - 0.1 * i as FloatValue;
                    s0[idx] = 34.0 + 0.2 * k as FloatValue + 0.05 * i as FloatValue;
                }
            }
        }
        let z = depth_column(&[5.0, 300.0, 2000.0]);
        let mask = SeaMask::all_sea(&shape);

        let options = BalanceOptions {
            max_iterations: Some(50),
            ..Default::default()
        };
        let balanced =
            balance_salinity(&t1.view(), &t0.view(), &s0.view(), &z.view(), &mask, &options)
                .unwrap();

        let z_full = z.broadcast(IxDyn(&shape)).unwrap();
        for ((idx, &s_new), &depth) in balanced.indexed_iter().zip(z_full.iter()) {
            let rho_new = eos_insitu_scalar(t1[&idx], s_new, depth);
            let rho_target = eos_insitu_scalar(t0[&idx], s0[&idx], depth);
            assert_relative_eq!(rho_new, rho_target, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_all_land_mask_returns_immediately() {
        let t0 = uniform(&[1, 2, 2, 2], 10.0);
        let t1 = uniform(&[1, 2, 2, 2], 14.0);
        let s0 = uniform(&[1, 2, 2, 2], 35.0);
        let z = depth_column(&[0.0, 100.0]);
        let mask = SeaMask::all_land(&[1, 2, 2, 2]);

        // Zero iterations allowed: an all-land solve must not need any
        let options = BalanceOptions {
            max_iterations: Some(0),
            ..Default::default()
        };
        let balanced =
            balance_salinity(&t1.view(), &t0.view(), &s0.view(), &z.view(), &mask, &options)
                .unwrap();
        assert_eq!(balanced, s0);
    }

    #[test]
    fn test_land_points_do_not_block_convergence() {
        let t0 = uniform(&[1, 1, 2, 2], 10.0);
        let t1 = uniform(&[1, 1, 2, 2], 12.0);
        let mut s0 = uniform(&[1, 1, 2, 2], 35.0);
        // A land fill value that would wreck the residual if it were counted
        s0[[0, 0, 1, 1]] = 1.0e20;
        let z = depth_column(&[0.0]);
        let mask = SeaMask::new(
            ArrayD::from_shape_vec(IxDyn(&[1, 1, 2, 2]), vec![true, true, true, false]).unwrap(),
        );

        let balanced = balance_salinity(
            &t1.view(),
            &t0.view(),
            &s0.view(),
            &z.view(),
            &mask,
            &BalanceOptions::default(),
        )
        .unwrap();

        let s_new = balanced[[0, 0, 0, 0]];
        assert_relative_eq!(
            eos_insitu_scalar(12.0, s_new, 0.0),
            eos_insitu_scalar(10.0, 35.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_negative_salinity_clamped_to_zero() {
        // Cooling nearly fresh water: restoring the density would need
        // negative salt, which the final clamp replaces with exactly zero
        let t0 = uniform(&[1, 1, 1, 1], 20.0);
        let t1 = uniform(&[1, 1, 1, 1], 16.0);
        let s0 = uniform(&[1, 1, 1, 1], 0.5);
        let z = depth_column(&[0.0]);
        let mask = SeaMask::all_sea(&[1, 1, 1, 1]);

        let balanced = balance_salinity(
            &t1.view(),
            &t0.view(),
            &s0.view(),
            &z.view(),
            &mask,
            &BalanceOptions::default(),
        )
        .unwrap();

        assert_eq!(balanced[[0, 0, 0, 0]], 0.0);
    }

    #[test]
    fn test_non_convergence_error() {
        let t0 = uniform(&[1, 1, 1, 1], 10.0);
        let t1 = uniform(&[1, 1, 1, 1], 11.0);
        let s0 = uniform(&[1, 1, 1, 1], 35.0);
        let z = depth_column(&[0.0]);
        let mask = SeaMask::all_sea(&[1, 1, 1, 1]);

        // One degree of warming cannot be balanced in a single iteration at
        // tolerance 1e-12
        let options = BalanceOptions {
            max_iterations: Some(1),
            ..Default::default()
        };
        let err = balance_salinity(&t1.view(), &t0.view(), &s0.view(), &z.view(), &mask, &options)
            .unwrap_err();
        match err {
            OceanPertError::NonConvergence {
                iterations,
                residual,
            } => {
                assert_eq!(iterations, 1);
                assert!(residual > 1e-12);
            }
            other => panic!("expected NonConvergence, got {other:?}"),
        }
    }

    #[test]
    fn test_shape_mismatch_fails_before_iterating() {
        let t0 = uniform(&[1, 2, 2, 2], 10.0);
        let t1 = uniform(&[1, 2, 3, 2], 11.0);
        let s0 = uniform(&[1, 2, 2, 2], 35.0);
        let z = depth_column(&[0.0, 100.0]);
        let mask = SeaMask::all_sea(&[1, 2, 2, 2]);

        let err = balance_salinity(
            &t1.view(),
            &t0.view(),
            &s0.view(),
            &z.view(),
            &mask,
            &BalanceOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, OceanPertError::ShapeMismatch(_, _)));
    }

    #[test]
    fn test_inputs_not_mutated() {
        let t0 = uniform(&[1, 1, 2, 2], 10.0);
        let t1 = uniform(&[1, 1, 2, 2], 11.0);
        let s0 = uniform(&[1, 1, 2, 2], 35.0);
        let z = depth_column(&[50.0]);
        let mask = SeaMask::all_sea(&[1, 1, 2, 2]);

        let balanced = balance_salinity(
            &t1.view(),
            &t0.view(),
            &s0.view(),
            &z.view(),
            &mask,
            &BalanceOptions::default(),
        )
        .unwrap();

        assert_eq!(s0, uniform(&[1, 1, 2, 2], 35.0));
        assert!(balanced[[0, 0, 0, 0]] > 35.0);
    }

    #[test]
    fn test_finite_difference_matches_analytic_sign() {
        // The documented convention is the negative of the forward
        // difference; a central difference of the kernel confirms the sign
        let (t, s, z) = (10.0, 35.0, 500.0);
        let h = 0.01;
        let solver_convention = (eos_insitu_scalar(t, s, z) - eos_insitu_scalar(t, s + h, z)) / h;
        let central =
            (eos_insitu_scalar(t, s + h, z) - eos_insitu_scalar(t, s - h, z)) / (2.0 * h);

        // Density grows with salinity, so the solver's convention is negative
        assert!(central > 0.0);
        assert!(solver_convention < 0.0);
        assert_relative_eq!(-solver_convention, central, epsilon = 1e-4);
    }

    #[test]
    fn test_options_toml_round_trip() {
        let options = BalanceOptions::default();
        let serialised = toml::to_string(&options).unwrap();
        let deserialised: BalanceOptions = toml::from_str(&serialised).unwrap();

        assert_eq!(deserialised.tolerance, options.tolerance);
        assert_eq!(deserialised.salinity_step, options.salinity_step);
        assert_eq!(deserialised.max_iterations, options.max_iterations);
    }
}
