use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

use crate::activation::activation::Activation;
use crate::error::{NnError, Result};
use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;
use crate::network::network::Network;

/// One named f32 array: a shape plus its row-major values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedArray {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl NamedArray {
    /// Checks that `data` holds exactly the number of values `shape` implies.
    fn check_len(&self, key: &str) -> Result<()> {
        let expected = self.shape.iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| malformed(format!("{key} has shape {:?}, which overflows", self.shape)))?;
        if expected != self.data.len() {
            return Err(malformed(format!(
                "{key} has shape {:?} but {} values", self.shape, self.data.len()
            )));
        }
        Ok(())
    }
}

/// A network's parameters as a named-array container:
/// `weight_0, bias_0, weight_1, bias_1, …` plus `activations`, one name per
/// layer. Enough to rebuild the network without any other configuration;
/// the loss is not stored and is bound by the caller after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archive {
    #[serde(default)]
    pub activations: Option<Vec<String>>,
    #[serde(flatten)]
    pub arrays: BTreeMap<String, NamedArray>,
}

impl Archive {
    pub fn from_network(network: &Network) -> Archive {
        let mut arrays = BTreeMap::new();
        for (i, layer) in network.layers().iter().enumerate() {
            let w = layer.weights();
            arrays.insert(format!("weight_{i}"), NamedArray {
                shape: vec![w.rows, w.cols],
                data: w.flatten(),
            });
            arrays.insert(format!("bias_{i}"), NamedArray {
                shape: vec![layer.size()],
                data: layer.biases().flatten(),
            });
        }
        let activations = network.layers().iter()
            .map(|l| l.activation().name().to_string())
            .collect();
        Archive { activations: Some(activations), arrays }
    }

    /// Validates the archive and rebuilds the network it describes.
    pub fn into_network(mut self) -> Result<Network> {
        let names = self.activations.take()
            .ok_or_else(|| malformed("no 'activations' array"))?;
        if names.is_empty() {
            return Err(malformed("'activations' is empty"));
        }
        if self.arrays.len() != 2 * names.len() {
            return Err(malformed(format!(
                "{} float arrays for {} activations; expected one weight and one bias per layer",
                self.arrays.len(), names.len()
            )));
        }

        let mut layers = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let activation = Activation::from_name(name)
                .map_err(|_| malformed(format!("layer {i} has unknown activation '{name}'")))?;

            let weight = self.take_array(&format!("weight_{i}"))?;
            let bias = self.take_array(&format!("bias_{i}"))?;
            weight.check_len(&format!("weight_{i}"))?;
            bias.check_len(&format!("bias_{i}"))?;
            let (rows, cols) = match weight.shape[..] {
                [rows, cols] if rows > 0 && cols > 0 => (rows, cols),
                [_, _] => return Err(malformed(format!("weight_{i} has an empty dimension"))),
                _ => return Err(malformed(format!("weight_{i} is not 2-dimensional"))),
            };
            if bias.shape != [cols] {
                return Err(malformed(format!(
                    "bias_{i} has shape {:?}, expected [{cols}]", bias.shape
                )));
            }

            let weights = Matrix::from_flat(rows, cols, &weight.data)
                .map_err(|e| malformed(format!("weight_{i}: {e}")))?;
            let biases = Matrix::from_flat(1, cols, &bias.data)
                .map_err(|e| malformed(format!("bias_{i}: {e}")))?;
            layers.push(Layer::new(weights, biases, activation).map_err(|e| malformed(e.to_string()))?);
        }

        Network::from_layers(layers).map_err(|e| malformed(e.to_string()))
    }

    fn take_array(&mut self, key: &str) -> Result<NamedArray> {
        self.arrays.remove(key).ok_or_else(|| malformed(format!("missing array '{key}'")))
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Archive> {
        serde_json::from_reader(reader).map_err(|e| {
            if e.is_io() { NnError::Json(e) } else { malformed(e.to_string()) }
        })
    }
}

fn malformed(msg: impl Into<String>) -> NnError {
    NnError::MalformedArchive(msg.into())
}

impl Network {
    /// Serializes the network weights to a pretty-printed JSON archive.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        let mut writer = std::io::BufWriter::new(file);
        Archive::from_network(self).to_writer(&mut writer)?;
        writer.flush()?;
        debug!(path = %path.as_ref().display(), layers = self.len(), "saved network archive");
        Ok(())
    }

    /// Deserializes a network from a JSON archive previously written by
    /// `save_json`. No loss is bound.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Network> {
        let file = std::fs::File::open(path.as_ref())?;
        let reader = std::io::BufReader::new(file);
        let network = Archive::from_reader(reader)?.into_network()?;
        debug!(path = %path.as_ref().display(), layers = network.len(), "loaded network archive");
        Ok(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::initializer::Initializer;

    fn network() -> Network {
        let mut net = Network::create(&[3, 4, 2], &[Activation::Softsign, Activation::Softmax]).unwrap();
        net.initialize(&[Initializer::Kaiming, Initializer::Xavier], 9).unwrap();
        net.update(&vec![0.125; net.total_parameters()]).unwrap();
        net
    }

    fn round_trip(archive: &Archive) -> Result<Network> {
        let mut buf = Vec::new();
        archive.to_writer(&mut buf).unwrap();
        Archive::from_reader(buf.as_slice())?.into_network()
    }

    #[test]
    fn archive_round_trip_is_bit_exact() {
        let net = network();
        let loaded = round_trip(&Archive::from_network(&net)).unwrap();
        assert_eq!(loaded, net);
        let bits = |n: &Network| n.parameters().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&loaded), bits(&net));
    }

    #[test]
    fn archive_names_every_array() {
        let archive = Archive::from_network(&network());
        let keys: Vec<&str> = archive.arrays.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["bias_0", "bias_1", "weight_0", "weight_1"]);
        assert_eq!(archive.arrays["weight_0"].shape, vec![3, 4]);
        assert_eq!(archive.arrays["bias_1"].shape, vec![2]);
        assert_eq!(archive.activations, Some(vec!["softsign".to_string(), "softmax".to_string()]));
    }

    #[test]
    fn missing_activations_is_malformed() {
        let mut archive = Archive::from_network(&network());
        archive.activations = None;
        assert!(matches!(round_trip(&archive), Err(NnError::MalformedArchive(_))));
    }

    #[test]
    fn odd_array_count_is_malformed() {
        let mut archive = Archive::from_network(&network());
        archive.arrays.remove("bias_1");
        assert!(matches!(round_trip(&archive), Err(NnError::MalformedArchive(_))));
    }

    #[test]
    fn broken_dimension_chain_is_malformed() {
        let mut archive = Archive::from_network(&network());
        archive.arrays.insert("weight_1".into(), NamedArray { shape: vec![5, 2], data: vec![0.0; 10] });
        assert!(matches!(round_trip(&archive), Err(NnError::MalformedArchive(_))));
    }

    #[test]
    fn data_length_must_match_shape() {
        let mut archive = Archive::from_network(&network());
        archive.arrays.insert("bias_0".into(), NamedArray { shape: vec![4], data: vec![0.0; 3] });
        assert!(matches!(round_trip(&archive), Err(NnError::MalformedArchive(_))));
    }

    #[test]
    fn overflowing_shape_is_malformed() {
        let mut archive = Archive::from_network(&network());
        archive.arrays.insert("weight_0".into(), NamedArray { shape: vec![usize::MAX / 2 + 1, 2], data: vec![] });
        archive.arrays.insert("bias_0".into(), NamedArray { shape: vec![2], data: vec![0.0; 2] });
        assert!(matches!(round_trip(&archive), Err(NnError::MalformedArchive(_))));
    }

    #[test]
    fn empty_dimension_is_malformed() {
        let mut archive = Archive::from_network(&network());
        archive.arrays.insert("weight_0".into(), NamedArray { shape: vec![0, 4], data: vec![] });
        assert!(matches!(round_trip(&archive), Err(NnError::MalformedArchive(_))));
    }

    #[test]
    fn unknown_activation_is_malformed() {
        let mut archive = Archive::from_network(&network());
        archive.activations = Some(vec!["softsign".into(), "maxout".into()]);
        assert!(matches!(round_trip(&archive), Err(NnError::MalformedArchive(_))));
    }

    #[test]
    fn garbage_input_is_malformed() {
        let err = Archive::from_reader(&b"{\"weight_0\": 3}"[..]).unwrap_err();
        assert!(matches!(err, NnError::MalformedArchive(_)));
    }
}
