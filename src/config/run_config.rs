use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::activation::activation::Activation;
use crate::error::{NnError, Result};
use crate::loss::loss_type::LossType;
use crate::network::network::Network;

/// Decoded `key = value` run configuration.
///
/// ```text
/// # comment
/// weights     = model.json
/// activations = relu, relu, sigmoid
/// loss        = binary_crossentropy
/// test_sample = sample.json
/// test_target = target.json
/// ```
///
/// Only `weights` is required. Keys the engine does not use are kept in
/// `extra` for the tool that wrote the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunConfig {
    pub weights: PathBuf,
    /// Overrides the activations stored in the archive, one per layer.
    pub activations: Option<Vec<Activation>>,
    pub loss: Option<LossType>,
    pub test_sample: Option<PathBuf>,
    pub test_target: Option<PathBuf>,
    pub extra: BTreeMap<String, String>,
}

impl RunConfig {
    pub fn parse(text: &str) -> Result<RunConfig> {
        let mut weights = None;
        let mut config = RunConfig::default();

        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| {
                NnError::Config(format!("line {}: expected `key = value`, got '{line}'", lineno + 1))
            })?;
            let (key, value) = (key.trim(), value.trim());

            match key {
                "weights" => weights = Some(PathBuf::from(value)),
                "activations" => {
                    let list = value.split(',')
                        .map(str::parse::<Activation>)
                        .collect::<Result<Vec<_>>>()?;
                    config.activations = Some(list);
                }
                "loss" => config.loss = Some(value.parse()?),
                "test_sample" => config.test_sample = Some(PathBuf::from(value)),
                "test_target" => config.test_target = Some(PathBuf::from(value)),
                _ => {
                    config.extra.insert(key.to_string(), value.to_string());
                }
            }
        }

        config.weights = weights.ok_or_else(|| NnError::Config("missing required key 'weights'".into()))?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
        let text = std::fs::read_to_string(path)?;
        RunConfig::parse(&text)
    }
}

impl Network {
    /// Loads the archive named by `config.weights`, applies any activation
    /// overrides and binds the configured loss.
    pub fn from_config(config: &RunConfig) -> Result<Network> {
        let mut network = Network::load_json(&config.weights)?;

        if let Some(activations) = &config.activations {
            if activations.len() != network.len() {
                return Err(NnError::Config(format!(
                    "{} activations listed for a {}-layer network", activations.len(), network.len()
                )));
            }
            for (i, &activation) in activations.iter().enumerate() {
                network.set_activation(i, activation)?;
            }
        }
        if let Some(loss) = config.loss {
            network.set_loss(loss);
        }
        debug!(weights = %config.weights.display(), "network built from run configuration");
        Ok(network)
    }
}
