//! Holds Bitcoin specific value types: scripts, witnesses, outpoints, wire
//! inputs, outputs, and spendable previous outputs.

pub mod script;
pub mod txin;
pub mod txout;
pub mod utxo;

pub use script::*;
pub use txin::*;
pub use txout::*;
pub use utxo::*;
