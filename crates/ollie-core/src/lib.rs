//! Shared primitives used by the Ollie compiler front end.
//!
//! Currently this is just string interning; it is split out of `ollie-front`
//! because the symbol type is meant to be cheap to pass around and free of
//! any dependency on the parser/analyzer's own types.

mod interner;

pub use interner::{Interner, Symbol};
