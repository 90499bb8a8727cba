//! The edge network of the pair model: a stack of dense layers with tanh activations between them
//! and a scalar linear output, evaluated together with its gradient with respect to the input.
use crate::common::error::*;
use ndarray::{Array1, Array2};





/// A dense layer y = W x + b.
///
/// # Fields
/// ```text
/// weight: the weights (n_out*n_in Array)
/// bias: the biases (n_out Array)
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DenseLayer
{
    pub weight: Array2<f64>,
    pub bias: Array1<f64>,
}





impl DenseLayer
{
    pub fn n_in(&self) -> usize
    {
        self.weight.ncols()
    }

    pub fn n_out(&self) -> usize
    {
        self.weight.nrows()
    }
}





/// The pair network of a deployed model.
///
/// # Fields
/// ```text
/// layers: the dense layers, tanh is applied after each of them except the last one
/// per_species_energy: the energy shift of an isolated atom of each species (Unit: model energy)
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PairNetwork
{
    layers: Vec<DenseLayer>,
    per_species_energy: Array1<f64>,
}





impl PairNetwork
{
    /// Check the layer dimensions and build the network.
    ///
    /// The input of the first layer is the radial features of the edge followed by the one-hot
    /// encodings of the central and the neighbor species, so it has n_basis + 2*n_species columns.
    pub fn new(layers: Vec<DenseLayer>, per_species_energy: Array1<f64>, n_basis: usize) -> Result<Self>
    {
        let n_species: usize = per_species_energy.len();
        let first: &DenseLayer = layers.first()
            .ok_or_else(|| Error::Shape(String::from("the pair network has no layer")))?;
        if first.n_in() != n_basis + 2 * n_species
        {
            return Err(Error::Shape(format!("the first layer takes {} inputs, but {} radial features and {} species need {}",
                first.n_in(), n_basis, n_species, n_basis + 2 * n_species)));
        }

        for (k, layer) in layers.iter().enumerate()
        {
            if layer.bias.len() != layer.n_out()
            {
                return Err(Error::Shape(format!("layer {} has {} outputs but {} biases", k, layer.n_out(), layer.bias.len())));
            }
            if k > 0 && layer.n_in() != layers[k - 1].n_out()
            {
                return Err(Error::Shape(format!("layer {} takes {} inputs but layer {} gives {}", k, layer.n_in(), k - 1, layers[k - 1].n_out())));
            }
        }
        if layers[layers.len() - 1].n_out() != 1
        {
            return Err(Error::Shape(String::from("the last layer of the pair network should have a single output")));
        }

        Ok(PairNetwork { layers, per_species_energy })
    }

    pub fn layers(&self) -> &[DenseLayer]
    {
        &self.layers
    }

    pub fn per_species_energy(&self) -> &Array1<f64>
    {
        &self.per_species_energy
    }

    pub fn n_species(&self) -> usize
    {
        self.per_species_energy.len()
    }

    pub fn n_input(&self) -> usize
    {
        self.layers[0].n_in()
    }

    /// Evaluate the network and its gradient with respect to the input.
    ///
    /// # Parameters
    /// ```text
    /// x: the input vector (n_input Array)
    /// value: the scalar output
    /// grad: d(value)/dx (n_input Array)
    /// ```
    pub fn value_and_grad(&self, x: &Array1<f64>) -> (f64, Array1<f64>)
    {
        let nlayer: usize = self.layers.len();

        // Forward, keeping the tanh activations of the hidden layers
        let mut activations: Vec< Array1<f64> > = Vec::with_capacity(nlayer);
        let mut h: Array1<f64> = x.clone();
        for (k, layer) in self.layers.iter().enumerate()
        {
            let z: Array1<f64> = layer.weight.dot(&h) + &layer.bias;
            h = if k + 1 < nlayer
            {
                z.mapv(f64::tanh)
            }
            else
            {
                z
            };
            activations.push(h.clone());
        }
        let value: f64 = h[0];

        // Backward
        let mut grad: Array1<f64> = Array1::ones(1);
        for k in (0..nlayer).rev()
        {
            if k + 1 < nlayer
            {
                grad = grad * activations[k].mapv(|a| 1.0 - a * a);
            }
            grad = self.layers[k].weight.t().dot(&grad);
        }

        (value, grad)
    }
}










#[cfg(test)]
mod tests
{
    use super::*;
    use ndarray::array;

    fn small_network() -> PairNetwork
    {
        // 1 basis function, 1 species: 3 inputs -> 2 hidden -> 1
        let hidden: DenseLayer = DenseLayer
        {
            weight: array![[0.3, -0.2, 0.5], [0.1, 0.4, -0.6]],
            bias: array![0.05, -0.1],
        };
        let output: DenseLayer = DenseLayer
        {
            weight: array![[0.7, -1.1]],
            bias: array![0.2],
        };
        PairNetwork::new(vec![hidden, output], array![-0.5], 1).unwrap()
    }

    #[test]
    fn gradient_matches_finite_differences()
    {
        let network: PairNetwork = small_network();
        let x: Array1<f64> = array![0.8, 1.0, 1.0];
        let (_, grad): (f64, Array1<f64>) = network.value_and_grad(&x);

        let h: f64 = 1.0E-6;
        for i in 0..x.len()
        {
            let mut xp: Array1<f64> = x.clone();
            let mut xm: Array1<f64> = x.clone();
            xp[i] += h;
            xm[i] -= h;
            let fd: f64 = (network.value_and_grad(&xp).0 - network.value_and_grad(&xm).0) / (2.0 * h);
            assert!((grad[i] - fd).abs() < 1.0E-8, "component {}", i);
        }
    }

    #[test]
    fn value_of_a_single_linear_layer()
    {
        let layer: DenseLayer = DenseLayer { weight: array![[2.0, 0.0, 1.0]], bias: array![0.5] };
        let network: PairNetwork = PairNetwork::new(vec![layer], array![0.0], 1).unwrap();
        let (value, grad): (f64, Array1<f64>) = network.value_and_grad(&array![1.0, 3.0, -1.0]);
        assert!((value - 1.5).abs() < 1.0E-12);
        assert_eq!(grad, array![2.0, 0.0, 1.0]);
    }

    #[test]
    fn mismatched_layers_are_rejected()
    {
        let layer: DenseLayer = DenseLayer { weight: Array2::zeros((1, 4)), bias: Array1::zeros(1) };
        assert!(matches!(PairNetwork::new(vec![layer], array![0.0], 1), Err(Error::Shape(_))));
        assert!(PairNetwork::new(Vec::new(), array![0.0], 1).is_err());

        let wide: DenseLayer = DenseLayer { weight: Array2::zeros((2, 3)), bias: Array1::zeros(2) };
        assert!(PairNetwork::new(vec![wide], array![0.0], 1).is_err());
    }
}
