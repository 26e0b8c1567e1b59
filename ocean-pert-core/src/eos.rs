//! Seawater equation of state.
//!
//! Computes in-situ density from potential temperature, salinity and depth
//! using the Jackett and McDougall (1994) polynomial, with the coefficients
//! of the NEMO `eos_insitu` routine. Pressure is approximated by depth:
//! 1 dbar ≈ 1 m, i.e. no pressure variation along geopotential surfaces.
//!
//! The returned value is the density anomaly ρ − 1000 kg/m³. The historical
//! NEMO routine documents a normalised anomaly (ρ − ρ₀)/ρ₀ instead; that
//! stale convention is deliberately not reproduced here.
//!
//! # References
//!
//! - Jackett & McDougall (1994), J. Atmos. Ocean. Tech.
//!
//! # Units
//!
//! - Potential temperature: °C
//! - Salinity: PSU (practical salinity units)
//! - Depth: m, used as pressure in dbar
//! - Density anomaly: kg/m³, relative to 1000 kg/m³
//!
//! Check value: ρ = 1060.93298 kg/m³ (anomaly 60.93298) for T = 40 °C,
//! S = 40 PSU, p = 10000 dbar.

use crate::errors::OceanPertResult;
use crate::field::{broadcast_to, common_shape, FloatValue};
use ndarray::{ArrayD, ArrayViewD, IxDyn, Zip};

/// Reference volumic mass of seawater (kg/m³), the `rau0` of NEMO.
pub const RAU0: FloatValue = 1035.0;

/// Compute the in-situ density anomaly at a single point.
///
/// This is the elementwise kernel behind [`eos_insitu`]. The polynomial is a
/// calibrated physical formula: the coefficients and the Horner nesting must
/// not be reordered. Negative salinity is guarded with `|S|` before the
/// square root; no other range checking is performed, so accuracy outside
/// oceanographic T/S/p ranges is the caller's responsibility.
///
/// # Arguments
/// * `t` - Potential temperature in °C
/// * `s` - Salinity in PSU
/// * `z` - Depth in m (pressure in dbar)
///
/// # Returns
/// In-situ density minus 1000 kg/m³
pub fn eos_insitu_scalar(t: FloatValue, s: FloatValue, z: FloatValue) -> FloatValue {
    let sr = s.abs().sqrt();

    // Volumic mass of pure water at atmospheric pressure
    let r1 = ((((6.536332e-9 * t - 1.120083e-6) * t + 1.001685e-4) * t - 9.095290e-3) * t
        + 6.793952e-2)
        * t
        + 999.842594;
    // Salinity corrections at atmospheric pressure
    let r2 = (((5.3875e-9 * t - 8.2467e-7) * t + 7.6438e-5) * t - 4.0899e-3) * t + 0.824493;
    let r3 = (-1.6546e-6 * t + 1.0227e-4) * t - 5.72466e-3;
    let r4 = 4.8314e-4;

    // Potential volumic mass, referenced to the surface
    let rho_p = (r4 * s + r3 * sr + r2) * s + r1;

    // Compression terms of the secant bulk modulus
    let e = (-3.508914e-8 * t - 1.248266e-8) * t - 2.595994e-6;
    let bw = (1.296821e-6 * t - 5.782165e-9) * t + 1.045941e-4;
    let b = bw + e * s;

    let d = -2.042967e-2;
    let c = (-7.267926e-5 * t + 2.598241e-3) * t + 0.1571896;
    let aw = ((5.939910e-6 * t + 2.512549e-3) * t - 0.1028859) * t - 4.721788;
    let a = (d * sr + c) * s + aw;

    let b1 = (-0.1909078 * t + 7.390729) * t - 55.87545;
    let a1 = ((2.326469e-3 * t + 1.553190) * t - 65.00517) * t + 1044.077;
    let kw = (((-1.361629e-4 * t - 1.852732e-2) * t - 30.41638) * t + 2098.925) * t + 190925.6;
    let k0 = (b1 * sr + a1) * s + kw;

    // In-situ density via the secant bulk modulus, passed through the
    // reference volumic mass exactly as the NEMO routine does
    let prd = (rho_p / (1.0 - z / (k0 - z * (a - z * b))) - RAU0) / RAU0;
    prd * RAU0 + RAU0 - 1000.0
}

/// Compute the in-situ density anomaly over whole fields, elementwise.
///
/// The three operands may have different shapes as long as they are
/// broadcast compatible (see [`crate::field::broadcast_shape`]); the result
/// takes the common broadcast shape. Shape mismatches are reported before
/// any arithmetic runs.
///
/// Pure and stateless: no iteration, no caching.
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use ocean_pert_core::eos::eos_insitu;
///
/// let t = array![[10.0, 12.0]].into_dyn();
/// let s = array![[35.0, 35.2]].into_dyn();
/// let z = array![[0.0]].into_dyn(); // broadcasts across the row
///
/// let rho = eos_insitu(&t.view(), &s.view(), &z.view()).unwrap();
/// assert_eq!(rho.shape(), &[1, 2]);
/// // Surface seawater at 10 °C, 35 PSU is about 1026.95 kg/m³
/// assert!((rho[[0, 0]] - 26.95).abs() < 0.1);
/// ```
pub fn eos_insitu(
    temperature: &ArrayViewD<'_, FloatValue>,
    salinity: &ArrayViewD<'_, FloatValue>,
    depth: &ArrayViewD<'_, FloatValue>,
) -> OceanPertResult<ArrayD<FloatValue>> {
    let shape = common_shape(&[temperature.shape(), salinity.shape(), depth.shape()])?;

    let t = broadcast_to(temperature, &shape)?;
    let s = broadcast_to(salinity, &shape)?;
    let z = broadcast_to(depth, &shape)?;

    let mut rho = ArrayD::zeros(IxDyn(&shape));
    Zip::from(&mut rho)
        .and(&t)
        .and(&s)
        .and(&z)
        .for_each(|rho, &t, &s, &z| *rho = eos_insitu_scalar(t, s, z));
    Ok(rho)
}
