//! Temperature increment component
//!
//! Adds a precomputed temperature-increment field to a state's potential
//! temperature, e.g. the difference between two hindcast ensemble means.
//! The increment broadcasts against the state, so a single (z, y, x)
//! increment can perturb a state with a leading time axis.

use ndarray::ArrayD;
use ocean_pert_core::errors::OceanPertResult;
use ocean_pert_core::field::{broadcast_to, common_shape, FloatValue};
use ocean_pert_core::state::OceanState;
use serde::{Deserialize, Serialize};

/// Adds a fixed increment field to a state's temperature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureIncrement {
    increment: ArrayD<FloatValue>,
}

impl TemperatureIncrement {
    /// Create from the increment field (°C, added pointwise).
    pub fn new(increment: ArrayD<FloatValue>) -> Self {
        Self { increment }
    }

    pub fn increment(&self) -> &ArrayD<FloatValue> {
        &self.increment
    }

    /// Return a new state with the increment added to the temperature.
    ///
    /// Salinity and the depth axis are carried over untouched; the input
    /// state is not modified.
    pub fn apply(&self, state: &OceanState) -> OceanPertResult<OceanState> {
        let temperature = state.temperature();
        let shape = common_shape(&[temperature.shape(), self.increment.shape()])?;

        let mut perturbed = broadcast_to(&temperature, &shape)?.to_owned();
        perturbed += &broadcast_to(&self.increment.view(), &shape)?;

        state.with_temperature(perturbed)
    }
}
