//! Land-sea masking of gridded fields.
//!
//! A [`SeaMask`] marks which grid points are ocean (`true`) and which are
//! land (`false`). Land points are never skipped during field arithmetic:
//! they are computed unconditionally and then forced to exactly zero, so
//! whatever the equation of state produces from land fill values can never
//! leak into a convergence criterion. The mask is immutable for the duration
//! of a solve.

use crate::errors::{OceanPertError, OceanPertResult};
use crate::field::FloatValue;
use ndarray::{ArrayD, ArrayViewD, IxDyn, Zip};
use serde::{Deserialize, Serialize};

/// Boolean land-sea mask, broadcastable against the fields it masks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeaMask {
    mask: ArrayD<bool>,
}

impl SeaMask {
    /// Wrap a boolean field: `true` is sea, `false` is land.
    pub fn new(mask: ArrayD<bool>) -> Self {
        Self { mask }
    }

    /// A mask marking every point as sea.
    pub fn all_sea(shape: &[usize]) -> Self {
        Self {
            mask: ArrayD::from_elem(IxDyn(shape), true),
        }
    }

    /// A mask marking every point as land.
    pub fn all_land(shape: &[usize]) -> Self {
        Self {
            mask: ArrayD::from_elem(IxDyn(shape), false),
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.mask.shape()
    }

    pub fn view(&self) -> ArrayViewD<'_, bool> {
        self.mask.view()
    }

    /// Number of sea points in the mask itself (before broadcasting).
    pub fn sea_point_count(&self) -> usize {
        self.mask.iter().filter(|&&sea| sea).count()
    }

    /// Force land points of `field` to exactly 0.0, in place.
    ///
    /// The mask broadcasts against the field, so a horizontal (y, x) mask
    /// can zero a full (t, z, y, x) field. Fails if the shapes are not
    /// broadcast compatible.
    pub fn zero_land(&self, field: &mut ArrayD<FloatValue>) -> OceanPertResult<()> {
        let mask = self.mask.broadcast(field.raw_dim()).ok_or_else(|| {
            OceanPertError::ShapeMismatch(self.mask.shape().to_vec(), field.shape().to_vec())
        })?;
        Zip::from(field)
            .and(&mask)
            .for_each(|value, &sea| {
                if !sea {
                    *value = 0.0;
                }
            });
        Ok(())
    }
}
