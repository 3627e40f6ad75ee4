pub mod archive;
pub mod initializer;
pub mod network;
pub mod pairing;

pub use archive::{Archive, NamedArray};
pub use initializer::Initializer;
pub use network::{Gradient, Network};
pub use pairing::{output_pairing, OutputPairing};
