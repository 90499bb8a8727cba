//! About the matrix operations on periodic boxes and coordinates.

use crate::common::constants::MIN_BOX_VOLUME;
use crate::common::error::*;
use ndarray::Array2;
#[cfg(test)]
use crate::common::constants::PI;
#[cfg(test)]
use ndarray::{Array1, array};
#[cfg(test)]
use ndarray_rand::{RandomExt, rand_distr::Uniform};





/// A random rotation matrix built from three Euler angles
#[cfg(test)]
pub fn rand_rot() -> Array2<f64>
{
    let angles: Array1<f64> = Array1::random(3, Uniform::new(0.0, 2.0 * PI));
    let (alpha, beta, gamma): (f64, f64, f64) = (angles[0], angles[1], angles[2]);

    return array![[alpha.cos()*gamma.cos() - beta.cos()*alpha.sin()*gamma.sin(), -beta.cos()*gamma.cos()*alpha.sin() - alpha.cos()*gamma.sin(), alpha.sin()*beta.sin()],
                  [gamma.cos()*alpha.sin() + alpha.cos()*beta.cos()*gamma.sin(), alpha.cos()*beta.cos()*gamma.cos() - alpha.sin()*gamma.sin(), -alpha.cos()*beta.sin()],
                  [beta.sin()*gamma.sin(), gamma.cos()*beta.sin(), beta.cos()]]
}



/// Signed volume of the box spanned by the rows of a 3*3 matrix
pub fn box_volume(box_vectors: &Array2<f64>) -> f64
{
    let a = box_vectors;
    a[[0,0]] * (a[[1,1]]*a[[2,2]] - a[[1,2]]*a[[2,1]])
        - a[[0,1]] * (a[[1,0]]*a[[2,2]] - a[[1,2]]*a[[2,0]])
        + a[[0,2]] * (a[[1,0]]*a[[2,1]] - a[[1,1]]*a[[2,0]])
}

/// Whether all off-diagonal elements of the box are zero
pub fn is_orthorhombic(box_vectors: &Array2<f64>) -> bool
{
    (0..3).all(|i| (0..3).all(|j| i == j || box_vectors[[i,j]] == 0.0))
}

/// Check that the box vectors form a 3*3 finite matrix with a non-zero volume.
///
/// # Parameters
/// ```text
/// box_vectors: periodic box vectors, one vector per row
/// ```
pub fn check_box_vectors(box_vectors: &Array2<f64>) -> Result<()>
{
    if box_vectors.dim() != (3, 3)
    {
        return Err(Error::Shape(error_array_shape("box_vectors", (3, 3), box_vectors.dim())));
    }
    if box_vectors.iter().any(|x| !x.is_finite())
    {
        return Err(Error::Shape(String::from("the periodic box vectors contain non-finite values")));
    }
    let volume: f64 = box_volume(box_vectors);
    if volume.abs() < MIN_BOX_VOLUME
    {
        return Err(Error::Shape(format!("the periodic box is degenerate (volume {:e})", volume)));
    }
    Ok(())
}
