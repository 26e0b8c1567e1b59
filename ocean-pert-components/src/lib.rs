//! Concrete perturbation components for ocean initial conditions.
//!
//! These components wire the computational core (`ocean_pert_core`) into
//! the two steps a perturbation pipeline actually performs: adding a
//! temperature increment to a state, and rebalancing salinity so the
//! perturbed state keeps the original in-situ density.

pub mod components;
