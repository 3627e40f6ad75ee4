use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::Activation};
use crate::error::{NnError, Result};

/// One affine transform `a = f(x · W + b)`.
///
/// `weights` is `(n_input, n_output)` and `biases` is `(1, n_output)`.
/// `derivative` is normally the layer's own activation; it differs only
/// when a caller overrides it (`Activation::Linear` acts as identity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer{
    weights: Matrix,
    biases: Matrix,
    activator: Activation,
    derivative: Activation,
}

impl Layer {
    pub fn new(weights: Matrix, biases: Matrix, activation: Activation) -> Result<Layer> {
        check_bias_shape(&weights, &biases)?;
        Ok(Layer {
            weights,
            biases,
            activator: activation,
            derivative: activation,
        })
    }

    /// A zero-filled layer mapping `input_size` values to `size` values.
    pub fn zeros(input_size: usize, size: usize, activation: Activation) -> Layer {
        Layer {
            weights: Matrix::zeros(input_size, size),
            biases: Matrix::zeros(1, size),
            activator: activation,
            derivative: activation,
        }
    }

    /// Replaces the derivative used during backpropagation.
    pub fn with_derivative(mut self, derivative: Activation) -> Layer {
        self.derivative = derivative;
        self
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    pub fn size(&self) -> usize {
        self.weights.cols
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn biases(&self) -> &Matrix {
        &self.biases
    }

    pub fn activation(&self) -> Activation {
        self.activator
    }

    pub fn derivative(&self) -> Activation {
        self.derivative
    }

    pub fn set_derivative(&mut self, derivative: Activation) {
        self.derivative = derivative;
    }

    /// Changes the activation and resets the derivative to match it.
    pub fn set_activation(&mut self, activation: Activation) {
        self.activator = activation;
        self.derivative = activation;
    }

    pub fn set_weights(&mut self, weights: Matrix) -> Result<()> {
        weights.check_consistent()?;
        if weights.shape() != self.weights.shape() {
            return Err(NnError::ShapeMismatch(format!(
                "new weights are {:?}, layer expects {:?}", weights.shape(), self.weights.shape()
            )));
        }
        self.weights = weights;
        Ok(())
    }

    pub fn set_biases(&mut self, biases: Matrix) -> Result<()> {
        biases.check_consistent()?;
        if biases.shape() != self.biases.shape() {
            return Err(NnError::ShapeMismatch(format!(
                "new biases are {:?}, layer expects {:?}", biases.shape(), self.biases.shape()
            )));
        }
        self.biases = biases;
        Ok(())
    }

    /// Forward step for one sample. `input.len()` must equal `input_size()`;
    /// the network checks this before calling.
    pub fn feed_from(&self, input: &[f32]) -> Vec<f32> {
        let z = &Matrix::from_vec(input.to_vec()) * &self.weights + self.biases.clone();
        self.activator.forward(z.row(0))
    }

    /// Forward step for a batch, one sample per row.
    pub fn feed_batch(&self, inputs: &Matrix) -> Matrix {
        let z = inputs * &self.weights;
        let data = z.data.iter()
            .map(|row| {
                let shifted: Vec<f32> = row.iter().zip(self.biases.row(0)).map(|(x, b)| x + b).collect();
                self.activator.forward(&shifted)
            })
            .collect();
        Matrix { rows: z.rows, cols: z.cols, data }
    }

    /// Applies pre-computed gradients scaled by lr.
    pub fn apply_gradients(&mut self, weights_grad: &Matrix, biases_grad: &Matrix, lr: f32) {
        self.weights = self.weights.clone() - weights_grad.map(|x| x * lr);
        self.biases = self.biases.clone() - biases_grad.map(|x| x * lr);
    }
}

fn check_bias_shape(weights: &Matrix, biases: &Matrix) -> Result<()> {
    weights.check_consistent()?;
    biases.check_consistent()?;
    if weights.rows == 0 || weights.cols == 0 {
        return Err(NnError::ShapeMismatch(format!(
            "weight {:?} has an empty dimension", weights.shape()
        )));
    }
    if biases.rows != 1 || biases.cols != weights.cols {
        return Err(NnError::ShapeMismatch(format!(
            "bias {:?} does not match weight {:?}; expected (1, {})",
            biases.shape(), weights.shape(), weights.cols
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> Layer {
        let w = Matrix::from_data(vec![vec![1.0, -1.0], vec![0.5, 2.0], vec![0.0, 1.0]]).unwrap();
        let b = Matrix::from_vec(vec![0.5, -0.5]);
        Layer::new(w, b, Activation::Relu).unwrap()
    }

    #[test]
    fn rejects_bias_of_wrong_length() {
        let w = Matrix::zeros(3, 2);
        let err = Layer::new(w, Matrix::from_vec(vec![0.0; 3]), Activation::Linear).unwrap_err();
        assert!(matches!(err, NnError::ShapeMismatch(_)));
    }

    #[test]
    fn rejects_matrices_whose_rows_disagree_with_shape() {
        let w = Matrix { rows: 3, cols: 2, data: vec![vec![0.0; 2]] };
        let err = Layer::new(w, Matrix::zeros(1, 2), Activation::Linear).unwrap_err();
        assert!(matches!(err, NnError::ShapeMismatch(_)));

        let mut l = layer();
        let ragged = Matrix { rows: 3, cols: 2, data: vec![vec![0.0; 2], vec![0.0; 2], vec![0.0; 1]] };
        assert!(l.set_weights(ragged).is_err());
    }

    #[test]
    fn rejects_empty_weights() {
        let err = Layer::new(Matrix::zeros(0, 0), Matrix::zeros(1, 0), Activation::Linear).unwrap_err();
        assert!(matches!(err, NnError::ShapeMismatch(_)));
    }

    #[test]
    fn feed_from_applies_affine_then_activation() {
        let l = layer();
        // z = [1 + 1 + 0 + 0.5, -1 + 4 + 1 - 0.5] = [2.5, 3.5]
        assert_eq!(l.feed_from(&[1.0, 2.0, 1.0]), vec![2.5, 3.5]);
        // z = [-1 - 0.5 + 0.5, 1 - 2 - 0.5] -> relu -> [0, 0]
        assert_eq!(l.feed_from(&[-1.0, -1.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn feed_batch_matches_per_sample_feed() {
        let l = layer();
        let batch = Matrix::from_data(vec![vec![1.0, 2.0, 1.0], vec![-1.0, -1.0, 0.0]]).unwrap();
        let out = l.feed_batch(&batch);
        assert_eq!(out.row(0), l.feed_from(batch.row(0)).as_slice());
        assert_eq!(out.row(1), l.feed_from(batch.row(1)).as_slice());
    }

    #[test]
    fn setters_validate_shape() {
        let mut l = layer();
        assert!(l.set_weights(Matrix::zeros(2, 3)).is_err());
        assert!(l.set_biases(Matrix::from_vec(vec![1.0])).is_err());
        l.set_biases(Matrix::from_vec(vec![1.0, 1.0])).unwrap();
        assert_eq!(l.biases().row(0), &[1.0, 1.0]);
    }

    #[test]
    fn apply_gradients_steps_against_the_gradient() {
        let mut l = Layer::zeros(2, 1, Activation::Linear);
        let gw = Matrix::from_data(vec![vec![1.0], vec![-2.0]]).unwrap();
        let gb = Matrix::from_vec(vec![4.0]);
        l.apply_gradients(&gw, &gb, 0.5);
        assert_eq!(l.weights().flatten(), vec![-0.5, 1.0]);
        assert_eq!(l.biases().flatten(), vec![-2.0]);
    }
}
