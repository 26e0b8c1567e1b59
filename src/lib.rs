//! Density-consistent perturbation of ocean initial conditions.
//!
//! This crate bundles the workspace members for downstream users:
//!
//! - from `ocean-pert-core`: the seawater equation of state ([`eos`]) and
//!   the salinity-balancing Newton solver ([`solver`]), plus the [`field`],
//!   [`mask`] and [`state`] types they operate on.
//! - from `ocean-pert-components`: the concrete perturbation steps built on
//!   the core, temperature increments and salinity rebalancing.
//!
//! The array type used throughout is re-exported as [`ndarray`] so callers
//! can build inputs against the same version.
//!
//! # Example
//!
//! ```
//! use ocean_pert::components::{SalinityRebalance, TemperatureIncrement};
//! use ocean_pert::mask::SeaMask;
//! use ocean_pert::ndarray::{array, ArrayD, IxDyn};
//! use ocean_pert::state::OceanState;
//!
//! let shape = [1, 2, 2, 2];
//! let original = OceanState::new(
//!     ArrayD::from_elem(IxDyn(&shape), 10.0),
//!     ArrayD::from_elem(IxDyn(&shape), 35.0),
//!     array![0.0, 100.0],
//! )
//! .unwrap();
//! let mask = SeaMask::all_sea(&shape);
//!
//! let warmed = TemperatureIncrement::new(ArrayD::from_elem(IxDyn(&shape), 1.0))
//!     .apply(&original)
//!     .unwrap();
//! let rebalanced = SalinityRebalance::new()
//!     .solve(&original, &warmed, &mask)
//!     .unwrap();
//!
//! // Saltier, to make up for the density lost to warming
//! assert!(rebalanced.salinity()[[0, 0, 0, 0]] > 35.0);
//! ```

pub use ndarray;

pub use ocean_pert_core::{eos, errors, field, mask, solver, state};

pub mod components {
    pub use ocean_pert_components::components::{SalinityRebalance, TemperatureIncrement};
}
