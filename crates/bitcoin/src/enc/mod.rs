//! Address encoding for Bitcoin networks: base58check and bech32 string
//! formats, and the parameterized network encoders.

pub mod bases;
pub mod encoder;

pub use bases::*;
pub use encoder::*;
