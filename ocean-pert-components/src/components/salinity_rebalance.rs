//! Salinity rebalancing component
//!
//! Runs the core Newton solver against a pair of states: the original
//! initial condition and a temperature-perturbed copy. The result is the
//! perturbed state with its salinity replaced by the field that restores
//! the original in-situ density at every sea point.

use ocean_pert_core::errors::OceanPertResult;
use ocean_pert_core::mask::SeaMask;
use ocean_pert_core::solver::{balance_salinity, BalanceOptions};
use ocean_pert_core::state::OceanState;
use serde::{Deserialize, Serialize};

/// Rebalances a perturbed state's salinity to restore the original density.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalinityRebalance {
    options: BalanceOptions,
}

impl SalinityRebalance {
    /// Create with default solver options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with explicit solver options.
    pub fn from_options(options: BalanceOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BalanceOptions {
        &self.options
    }

    /// Rebalance the perturbed state against the original.
    ///
    /// Both states must share the original's grid; the depth axis of the
    /// original is used for both density evaluations. Negative salinities
    /// produced by the solve are already clamped to zero. Land-point
    /// salinities are implementation-defined and should be re-masked by
    /// the consumer.
    pub fn solve(
        &self,
        original: &OceanState,
        perturbed: &OceanState,
        sea_mask: &SeaMask,
    ) -> OceanPertResult<OceanState> {
        let depth = original.depth_field();
        let balanced = balance_salinity(
            &perturbed.temperature(),
            &original.temperature(),
            &original.salinity(),
            &depth.view(),
            sea_mask,
            &self.options,
        )?;
        perturbed.with_salinity(balanced)
    }
}
