//! Neural network used as the evolved decision function.
//!
//! A plain feed-forward MLP with tanh activations, plus the genetic operators
//! (mutation and crossover) the evolution engine breeds with.

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::policy::Policy;

pub mod mlp;

pub use mlp::Mlp;

/// Feed-forward network controlling one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brain {
    /// Ordered layers from input to output.
    pub layers: Vec<Mlp>,
}

impl Brain {
    /// Creates a new brain with random weights.
    pub fn new<R: Rng>(layer_sizes: &[usize], scale: f32, rng: &mut R) -> Self {
        let layers = layer_sizes
            .windows(2)
            .map(|pair| Mlp::new_random(pair[0], pair[1], scale, rng))
            .collect();

        Self { layers }
    }

    /// Runs a forward pass through every layer.
    #[inline]
    pub fn think(&self, inputs: &Array1<f32>) -> Array1<f32> {
        let mut output = inputs.clone();
        for layer in &self.layers {
            output = layer.forward(&output);
        }
        output
    }

    /// Layer sizes from input to output, e.g. `[3, 6, 1]`.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.layers.len() + 1);
        if let Some(first) = self.layers.first() {
            sizes.push(first.input_size());
        }
        sizes.extend(self.layers.iter().map(Mlp::output_size));
        sizes
    }

    /// Creates a new brain by weighted averaging two parent brains.
    ///
    /// `weight1` is the share of `parent1`; parents must have the same shape.
    pub fn crossover_weighted(parent1: &Brain, parent2: &Brain, weight1: f32) -> Self {
        let layers = parent1
            .layers
            .iter()
            .zip(&parent2.layers)
            .map(|(layer1, layer2)| Mlp::crossover_weighted(layer1, layer2, weight1))
            .collect();
        Self { layers }
    }

    /// Mutates all parameters in the brain.
    pub fn mutate<R: Rng>(&mut self, mutation_scale: f32, rng: &mut R) {
        for layer in &mut self.layers {
            layer.mutate(mutation_scale, rng);
        }
    }

    /// Euclidean distance between the flattened parameters of two brains.
    pub fn distance(brain1: &Brain, brain2: &Brain) -> f32 {
        brain1
            .to_flat_vector()
            .iter()
            .zip(brain2.to_flat_vector())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }

    /// Flattens all weights and biases into a single vector.
    pub fn to_flat_vector(&self) -> Vec<f32> {
        let mut flat = Vec::new();
        for layer in &self.layers {
            flat.extend(layer.weights.iter().copied());
            flat.extend(layer.biases.iter().copied());
        }
        flat
    }
}

impl Policy for Brain {
    fn activate(&self, inputs: &Array1<f32>) -> Array1<f32> {
        self.think(inputs)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn shape_matches_layer_sizes() {
        let mut rng = StdRng::seed_from_u64(1);
        let brain = Brain::new(&[3, 6, 1], 1.0, &mut rng);

        assert_eq!(brain.layers.len(), 2);
        assert_eq!(brain.layer_sizes(), vec![3, 6, 1]);
        assert_eq!(brain.to_flat_vector().len(), 3 * 6 + 6 + 6 + 1);
    }

    #[test]
    fn think_outputs_stay_in_tanh_range() {
        let mut rng = StdRng::seed_from_u64(2);
        let brain = Brain::new(&[3, 4, 1], 1.0, &mut rng);
        let output = brain.think(&Array1::from_vec(vec![250.0, 10.0, 54.0]));

        assert_eq!(output.len(), 1);
        assert!(output[0] >= -1.0 && output[0] <= 1.0);
    }

    #[test]
    fn same_seed_same_brain() {
        let a = Brain::new(&[3, 6, 1], 1.0, &mut StdRng::seed_from_u64(9));
        let b = Brain::new(&[3, 6, 1], 1.0, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
        assert_eq!(Brain::distance(&a, &b), 0.0);
    }

    #[test]
    fn mutation_changes_weights() {
        let mut rng = StdRng::seed_from_u64(3);
        let original = Brain::new(&[3, 6, 1], 1.0, &mut rng);
        let mut mutated = original.clone();
        mutated.mutate(0.1, &mut rng);

        assert!(Brain::distance(&original, &mutated) > 0.0);
        assert_eq!(mutated.layer_sizes(), original.layer_sizes());
    }

    #[test]
    fn crossover_with_full_weight_copies_parent() {
        let mut rng = StdRng::seed_from_u64(4);
        let parent1 = Brain::new(&[3, 2, 1], 1.0, &mut rng);
        let parent2 = Brain::new(&[3, 2, 1], 1.0, &mut rng);

        let child = Brain::crossover_weighted(&parent1, &parent2, 1.0);

        assert!(Brain::distance(&child, &parent1) < 1e-6);
    }
}
