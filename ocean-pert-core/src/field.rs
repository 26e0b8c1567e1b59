//! Shared scalar type and broadcasting rules for gridded fields.
//!
//! Every field handled by this crate is a dense [`ndarray`] array of `f64`,
//! typically shaped time × depth × latitude × longitude. Operands follow
//! numpy-style broadcasting: shapes are aligned from the trailing axis and an
//! axis of length 1 stretches to match its counterpart. Incompatible shapes
//! fail fast with [`OceanPertError::ShapeMismatch`] before any arithmetic
//! runs.

use crate::errors::{OceanPertError, OceanPertResult};
use ndarray::{ArrayViewD, IxDyn};

/// The float type used across the crate.
///
/// The equation of state is calibrated in double precision; callers holding
/// `f32` data should cast up before entering the solver.
pub type FloatValue = f64;

/// Compute the broadcast shape of two operand shapes.
///
/// Shapes are right-aligned; a missing or length-1 axis stretches to the
/// other operand's extent.
///
/// # Examples
///
/// ```
/// use ocean_pert_core::field::broadcast_shape;
///
/// let shape = broadcast_shape(&[1, 31, 1, 1], &[1, 31, 292, 362]).unwrap();
/// assert_eq!(shape, vec![1, 31, 292, 362]);
///
/// assert!(broadcast_shape(&[3, 4], &[5, 4]).is_err());
/// ```
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> OceanPertResult<Vec<usize>> {
    let ndim = a.len().max(b.len());
    let mut out = vec![0; ndim];
    for i in 0..ndim {
        // Right-aligned: missing leading axes behave as length 1
        let da = if i < ndim - a.len() {
            1
        } else {
            a[i - (ndim - a.len())]
        };
        let db = if i < ndim - b.len() {
            1
        } else {
            b[i - (ndim - b.len())]
        };
        out[i] = if da == db || db == 1 {
            da
        } else if da == 1 {
            db
        } else {
            return Err(OceanPertError::ShapeMismatch(a.to_vec(), b.to_vec()));
        };
    }
    Ok(out)
}

/// Compute the common broadcast shape of any number of operand shapes.
pub fn common_shape(shapes: &[&[usize]]) -> OceanPertResult<Vec<usize>> {
    let mut out: Vec<usize> = Vec::new();
    for shape in shapes {
        out = broadcast_shape(&out, shape)?;
    }
    Ok(out)
}

/// Broadcast a field view to the given shape.
///
/// The shape is usually the output of [`common_shape`]; a failure here
/// means the field cannot stretch to it.
pub fn broadcast_to<'a>(
    field: &'a ArrayViewD<'_, FloatValue>,
    shape: &[usize],
) -> OceanPertResult<ArrayViewD<'a, FloatValue>> {
    field
        .broadcast(IxDyn(shape))
        .ok_or_else(|| OceanPertError::ShapeMismatch(field.shape().to_vec(), shape.to_vec()))
}
