use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::activation::activation::Activation;
use crate::error::{NnError, Result};
use crate::layers::dense::Layer;
use crate::loss::loss_type::LossType;
use crate::math::matrix::Matrix;
use crate::network::initializer::Initializer;
use crate::network::pairing::{output_pairing, OutputPairing};

/// Gradient of the loss w.r.t. one layer's parameters. Shapes always equal
/// the layer's `weights` and `biases`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub weights: Matrix,
    pub biases: Matrix,
}

/// An ordered stack of dense layers plus an optional loss.
///
/// The loss is only consulted by `backpropagation`. Binding it also decides
/// whether the output layer's derivative step collapses to a pass-through
/// (see `network::pairing`).
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    layers: Vec<Layer>,
    loss: Option<LossType>,
    output_passthrough: bool,
}

impl Network {
    /// Builds a network from a flat `weight_0, bias_0, weight_1, bias_1, …`
    /// sequence and one activation per layer. Biases are `(1, n)` rows.
    pub fn new(arrays: Vec<Matrix>, activations: &[Activation]) -> Result<Network> {
        if activations.is_empty() {
            return Err(NnError::ShapeMismatch("a network needs at least one layer".into()));
        }
        if arrays.len() != 2 * activations.len() {
            return Err(NnError::ShapeMismatch(format!(
                "{} arrays given for {} activations; expected one weight and one bias per layer",
                arrays.len(), activations.len()
            )));
        }

        let mut arrays = arrays.into_iter();
        let layers = activations.iter()
            .map(|&activation| match (arrays.next(), arrays.next()) {
                (Some(weights), Some(biases)) => Layer::new(weights, biases, activation),
                _ => Err(NnError::ShapeMismatch("missing weight or bias array".into())),
            })
            .collect::<Result<Vec<_>>>()?;
        Network::from_layers(layers)
    }

    /// Same as `new`, resolving activations by name.
    pub fn from_names<S: AsRef<str>>(arrays: Vec<Matrix>, activations: &[S]) -> Result<Network> {
        let activations = activations.iter()
            .map(|name| Activation::from_name(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Network::new(arrays, &activations)
    }

    /// Wraps already-built layers, checking the dimension chain.
    pub fn from_layers(layers: Vec<Layer>) -> Result<Network> {
        if layers.is_empty() {
            return Err(NnError::ShapeMismatch("a network needs at least one layer".into()));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[1].input_size() != pair[0].size() {
                return Err(NnError::ShapeMismatch(format!(
                    "layer {} takes {} inputs but layer {} produces {}",
                    i + 1, pair[1].input_size(), i, pair[0].size()
                )));
            }
        }
        Ok(Network { layers, loss: None, output_passthrough: false })
    }

    /// A zero-initialized network. `sizes` holds the input size followed by
    /// each layer's output size, so `sizes.len() == activations.len() + 1`.
    pub fn create(sizes: &[usize], activations: &[Activation]) -> Result<Network> {
        if activations.is_empty() || sizes.len() != activations.len() + 1 {
            return Err(NnError::ShapeMismatch(format!(
                "{} sizes cannot describe {} layers", sizes.len(), activations.len()
            )));
        }
        if let Some(i) = sizes.iter().position(|&s| s == 0) {
            return Err(NnError::ShapeMismatch(format!("size {i} is zero")));
        }
        let layers = sizes.windows(2)
            .zip(activations)
            .map(|(pair, &activation)| Layer::zeros(pair[0], pair[1], activation))
            .collect();
        Network::from_layers(layers)
    }

    /// Fills every weight matrix from `initializers` (one per layer) using a
    /// ChaCha8 stream seeded with `seed`, and zeroes the biases. The same
    /// seed always yields the same weights.
    pub fn initialize(&mut self, initializers: &[Initializer], seed: u64) -> Result<()> {
        if initializers.len() != self.layers.len() {
            return Err(NnError::ShapeMismatch(format!(
                "{} initializers given for {} layers", initializers.len(), self.layers.len()
            )));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for (layer, init) in self.layers.iter_mut().zip(initializers) {
            let (rows, cols) = layer.weights().shape();
            let weights = match init {
                Initializer::Xavier => Matrix::xavier(rows, cols, &mut rng),
                Initializer::Kaiming => Matrix::kaiming(rows, cols, &mut rng),
                Initializer::Normal => Matrix::normal(rows, cols, &mut rng),
            };
            layer.set_weights(weights)?;
            layer.set_biases(Matrix::zeros(1, cols))?;
        }
        debug!(seed, layers = self.layers.len(), "initialized network weights");
        Ok(())
    }

    pub fn with_loss(mut self, loss: LossType) -> Network {
        self.set_loss(loss);
        self
    }

    /// Binds the loss used by `backpropagation` and re-evaluates the output
    /// layer pairing. Pairings without an analytic simplification only warn.
    pub fn set_loss(&mut self, loss: LossType) {
        let output = self.output_layer().activation();
        self.loss = Some(loss);
        self.output_passthrough = match output_pairing(loss, output) {
            OutputPairing::Cancels => {
                debug!(loss = %loss, activation = %output, "output derivative replaced by pass-through");
                true
            }
            OutputPairing::Nominal => {
                warn!(
                    loss = %loss,
                    activation = %output,
                    "no analytic simplification for this loss and output activation; \
                     using the nominal derivative, which may be inconsistent"
                );
                false
            }
        };
    }

    pub fn clear_loss(&mut self) {
        self.loss = None;
        self.output_passthrough = false;
    }

    pub fn loss(&self) -> Option<LossType> {
        self.loss
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, i: usize) -> Option<&Layer> {
        self.layers.get(i)
    }

    /// Mutable access for optimizers updating parameters between calls.
    pub fn layer_mut(&mut self, i: usize) -> Option<&mut Layer> {
        self.layers.get_mut(i)
    }

    /// Replaces one layer's activation, keeping the bound loss consistent.
    pub fn set_activation(&mut self, i: usize, activation: Activation) -> Result<()> {
        let layer = self.layers.get_mut(i).ok_or_else(|| {
            NnError::ShapeMismatch(format!("layer index {i} out of range"))
        })?;
        layer.set_activation(activation);
        if let Some(loss) = self.loss {
            self.set_loss(loss);
        }
        Ok(())
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].input_size()
    }

    pub fn output_size(&self) -> usize {
        self.output_layer().size()
    }

    fn output_layer(&self) -> &Layer {
        &self.layers[self.layers.len() - 1]
    }

    /// Forward pass for one sample.
    pub fn predict(&self, input: &[f32]) -> Result<Vec<f32>> {
        self.check_input(input)?;
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.feed_from(&current);
        }
        Ok(current)
    }

    /// Forward pass for a batch, one sample per row.
    pub fn predict_batch(&self, inputs: &Matrix) -> Result<Matrix> {
        if inputs.cols != self.input_size() {
            return Err(NnError::ShapeMismatch(format!(
                "batch has {} columns, network expects {}", inputs.cols, self.input_size()
            )));
        }
        let mut current = inputs.clone();
        for layer in &self.layers {
            current = layer.feed_batch(&current);
        }
        Ok(current)
    }

    /// Gradient of the bound loss w.r.t. every weight and bias for a single
    /// `(input, target)` pair, ordered like `layers()`.
    pub fn backpropagation(&self, input: &[f32], target: &[f32]) -> Result<Vec<Gradient>> {
        let loss = self.loss.ok_or(NnError::MissingLoss)?;
        self.check_input(input)?;
        if target.len() != self.output_size() {
            return Err(NnError::ShapeMismatch(format!(
                "target has {} values, network outputs {}", target.len(), self.output_size()
            )));
        }

        // activations[0] is the input, activations[l + 1] the output of layer l.
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(input.to_vec());
        for layer in &self.layers {
            let next = layer.feed_from(&activations[activations.len() - 1]);
            activations.push(next);
        }

        let n = self.layers.len();
        let mut gradients = Vec::with_capacity(n);
        let mut delta = loss.gradient(&activations[n], target);

        for l in (0..n).rev() {
            if l + 1 < n {
                delta = self.layers[l + 1].weights().dot_vec(&delta);
            }
            let derivative = self.derivative_for(l).derivative(&activations[l + 1]);
            delta = delta.iter().zip(derivative.iter()).map(|(e, d)| e * d).collect();

            let weights = Matrix::outer(&activations[l], &delta);
            let biases = Matrix::from_vec(delta.clone());
            assert_eq!(weights.shape(), self.layers[l].weights().shape(), "weight gradient shape, layer {l}");
            assert_eq!(biases.shape(), self.layers[l].biases().shape(), "bias gradient shape, layer {l}");
            gradients.push(Gradient { weights, biases });
        }

        gradients.reverse();
        Ok(gradients)
    }

    fn derivative_for(&self, l: usize) -> Activation {
        if self.output_passthrough && l + 1 == self.layers.len() {
            Activation::Linear
        } else {
            self.layers[l].derivative()
        }
    }

    fn check_input(&self, input: &[f32]) -> Result<()> {
        if input.len() != self.input_size() {
            return Err(NnError::ShapeMismatch(format!(
                "input has {} values, network expects {}", input.len(), self.input_size()
            )));
        }
        Ok(())
    }

    /// Number of trainable values (all weights and biases).
    pub fn total_parameters(&self) -> usize {
        self.layers.iter()
            .map(|l| l.input_size() * l.size() + l.size())
            .sum()
    }

    /// Every parameter in one flat vector: per layer, the bias followed by
    /// the row-major weights.
    pub fn parameters(&self) -> Vec<f32> {
        let mut params = Vec::with_capacity(self.total_parameters());
        for layer in &self.layers {
            params.extend(layer.biases().flatten());
            params.extend(layer.weights().flatten());
        }
        params
    }

    /// Adds a flat delta, laid out like `parameters()`, to every parameter.
    pub fn update(&mut self, delta: &[f32]) -> Result<()> {
        if delta.len() != self.total_parameters() {
            return Err(NnError::ShapeMismatch(format!(
                "delta has {} values, network has {} parameters", delta.len(), self.total_parameters()
            )));
        }
        let mut offset = 0;
        for layer in &mut self.layers {
            let (rows, cols) = layer.weights().shape();
            let bias_delta = Matrix::from_flat(1, cols, &delta[offset..offset + cols])?;
            offset += cols;
            let weight_delta = Matrix::from_flat(rows, cols, &delta[offset..offset + rows * cols])?;
            offset += rows * cols;

            let biases = layer.biases().clone() + bias_delta;
            let weights = layer.weights().clone() + weight_delta;
            layer.set_biases(biases)?;
            layer.set_weights(weights)?;
        }
        Ok(())
    }

    /// Lays out a `backpropagation` result like `parameters()`.
    pub fn flatten_gradients(gradients: &[Gradient]) -> Vec<f32> {
        gradients.iter()
            .flat_map(|g| g.biases.flatten().into_iter().chain(g.weights.flatten()))
            .collect()
    }
}
