//! Radial embedding of an edge length: Bessel basis functions times a smooth polynomial cutoff.
//!
//! ```text
//! b_n(r) = 2/r_max * sin(n*pi*r/r_max) / r,    n = 1..n_basis
//! u(r)   = 1 - (p+1)(p+2)/2 x^p + p(p+2) x^(p+1) - p(p+1)/2 x^(p+2),    x = r/r_max < 1
//! ```
//! u(r) and its first two derivatives vanish at r_max.
use crate::common::constants::PI;
use ndarray::Array1;





/// Polynomial cutoff envelope u(r) and its derivative du/dr
pub fn polynomial_cutoff(r: f64, r_max: f64, p: f64) -> (f64, f64)
{
    let x: f64 = r / r_max;
    if x >= 1.0
    {
        return (0.0, 0.0);
    }

    let u: f64 = 1.0
        - (p + 1.0) * (p + 2.0) / 2.0 * x.powf(p)
        + p * (p + 2.0) * x.powf(p + 1.0)
        - p * (p + 1.0) / 2.0 * x.powf(p + 2.0);
    // du/dx = -p(p+1)(p+2)/2 * x^(p-1) * (1-x)^2
    let du_dx: f64 = -p * (p + 1.0) * (p + 2.0) / 2.0 * x.powf(p - 1.0) * (1.0 - x) * (1.0 - x);

    (u, du_dx / r_max)
}



/// Bessel basis values and derivatives with respect to r.
///
/// # Parameters
/// ```text
/// r: the edge length (must be > 0)
/// r_max: the cutoff radius
/// n_basis: the number of basis functions
/// ```
pub fn bessel_basis(r: f64, r_max: f64, n_basis: usize) -> (Array1<f64>, Array1<f64>)
{
    let prefactor: f64 = 2.0 / r_max;
    let mut values: Array1<f64> = Array1::zeros(n_basis);
    let mut derivatives: Array1<f64> = Array1::zeros(n_basis);
    for n in 0..n_basis
    {
        let k: f64 = (n + 1) as f64 * PI / r_max;
        let (sin, cos): (f64, f64) = (k * r).sin_cos();
        values[n] = prefactor * sin / r;
        derivatives[n] = prefactor * (k * cos * r - sin) / (r * r);
    }
    (values, derivatives)
}



/// The radial features of an edge, i.e. the Bessel basis scaled by the cutoff envelope, and their derivatives
pub fn radial_features(r: f64, r_max: f64, n_basis: usize, p: f64) -> (Array1<f64>, Array1<f64>)
{
    let (u, du): (f64, f64) = polynomial_cutoff(r, r_max, p);
    let (b, db): (Array1<f64>, Array1<f64>) = bessel_basis(r, r_max, n_basis);
    let features: Array1<f64> = &b * u;
    let derivatives: Array1<f64> = &db * u + &b * du;
    (features, derivatives)
}
