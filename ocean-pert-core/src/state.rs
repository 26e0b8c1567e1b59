//! The ocean initial-condition state handed to the solver.
//!
//! An [`OceanState`] bundles the potential-temperature and salinity fields
//! with the 1-D vertical depth axis they share. Fields follow the
//! time × depth × latitude × longitude axis order (leading axes optional);
//! the vertical axis is the third from the end, or the first axis for
//! fields with fewer than three dimensions.
//!
//! States are immutable: the `with_*` helpers return a new state rather
//! than mutating in place, so an original and a perturbed state can coexist
//! during a solve.

use crate::errors::{OceanPertError, OceanPertResult};
use crate::field::{common_shape, FloatValue};
use ndarray::{Array1, ArrayD, ArrayViewD, IxDyn};
use serde::{Deserialize, Serialize};

/// Potential temperature (°C), salinity (PSU) and the shared depth axis (m).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OceanState {
    temperature: ArrayD<FloatValue>,
    salinity: ArrayD<FloatValue>,
    depth: Array1<FloatValue>,
}

/// Index of the vertical axis for a field of the given dimensionality.
fn vertical_axis(ndim: usize) -> usize {
    ndim.saturating_sub(3)
}

impl OceanState {
    /// Build a state, validating that the fields share a grid.
    ///
    /// Temperature and salinity must be broadcast compatible and the depth
    /// axis must match their vertical extent.
    pub fn new(
        temperature: ArrayD<FloatValue>,
        salinity: ArrayD<FloatValue>,
        depth: Array1<FloatValue>,
    ) -> OceanPertResult<Self> {
        let shape = common_shape(&[temperature.shape(), salinity.shape()])?;
        let levels = if shape.is_empty() {
            1
        } else {
            shape[vertical_axis(shape.len())]
        };
        if depth.len() != levels {
            return Err(OceanPertError::DepthAxisMismatch {
                expected: levels,
                actual: depth.len(),
            });
        }
        Ok(Self {
            temperature,
            salinity,
            depth,
        })
    }

    pub fn temperature(&self) -> ArrayViewD<'_, FloatValue> {
        self.temperature.view()
    }

    pub fn salinity(&self) -> ArrayViewD<'_, FloatValue> {
        self.salinity.view()
    }

    pub fn depth(&self) -> &Array1<FloatValue> {
        &self.depth
    }

    /// The depth axis reshaped to broadcast against the state's fields.
    ///
    /// For a (t, z, y, x) temperature field this is the (1, nz, 1, 1)
    /// column the equation of state consumes, so the same level depth is
    /// applied at every horizontal point.
    pub fn depth_field(&self) -> ArrayD<FloatValue> {
        let ndim = self.temperature.ndim().max(1);
        let mut shape = vec![1; ndim];
        shape[vertical_axis(ndim)] = self.depth.len();
        self.depth
            .clone()
            .into_shape_with_order(IxDyn(&shape))
            .expect("depth length was validated at construction")
    }

    /// Replace the temperature field, keeping salinity and depth.
    pub fn with_temperature(&self, temperature: ArrayD<FloatValue>) -> OceanPertResult<Self> {
        Self::new(temperature, self.salinity.clone(), self.depth.clone())
    }

    /// Replace the salinity field, keeping temperature and depth.
    pub fn with_salinity(&self, salinity: ArrayD<FloatValue>) -> OceanPertResult<Self> {
        Self::new(self.temperature.clone(), salinity, self.depth.clone())
    }
}
