use std::f64::consts::{
    PI,
    SQRT_2,
};

use crate::models::SkewNormalParams;

fn normal_pdf(z: f64) -> f64 {
    (-0.5 * z * z).exp() / (2.0 * PI).sqrt()
}

fn normal_cdf(u: f64) -> f64 {
    0.5 * libm::erfc(-u / SQRT_2)
}

/// One scaled skew-normal component evaluated at `t`.
///
/// `amplitude * (2 / scale) * phi(z) * Phi(-skew * z)` with
/// `z = (t - location) / scale`. The skew enters with a negative sign, so a
/// positive `skew` gives a peak tailing to the left of `location`. The
/// component integrates to `amplitude`.
pub fn evaluate(params: &SkewNormalParams, t: f64) -> f64 {
    let SkewNormalParams {
        amplitude,
        skew,
        location,
        scale,
    } = *params;
    let z = (t - location) / scale;
    amplitude * 2.0 / scale * normal_pdf(z) * normal_cdf(-skew * z)
}

/// Partial derivatives of [`evaluate`] with respect to
/// `[amplitude, skew, location, scale]`.
pub fn gradient(params: &SkewNormalParams, t: f64) -> [f64; 4] {
    let SkewNormalParams {
        amplitude,
        skew,
        location,
        scale,
    } = *params;
    let z = (t - location) / scale;
    let pdf = normal_pdf(z);
    let cdf = normal_cdf(-skew * z);
    let shape = pdf * cdf;
    // d(shape)/dz
    let shape_dz = pdf * (-z * cdf - skew * normal_pdf(skew * z));
    let norm = 2.0 / scale;

    [
        norm * shape,
        amplitude * norm * pdf * normal_pdf(skew * z) * (-z),
        amplitude * norm * shape_dz * (-1.0 / scale),
        -amplitude * norm / scale * (shape + z * shape_dz),
    ]
}
