//! Core functionality for density-consistent ocean initial-condition
//! perturbation: a seawater equation of state and the salinity-balancing
//! Newton solver built on it.
//!
//! The crate is a computational library: it is handed well-formed in-memory
//! arrays and returns arrays. Reading and writing gridded datasets,
//! horizontal regridding and time averaging are its callers' business.

pub mod eos;
pub mod errors;
pub mod field;
pub mod mask;
pub mod solver;
pub mod state;
