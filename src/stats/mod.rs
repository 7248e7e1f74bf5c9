//! Stats module - derived series computation

mod deltas;

pub use deltas::DeltaBuilder;
