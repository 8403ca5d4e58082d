//! External collaborators the engine consumes through narrow interfaces.

pub mod rng;

pub use rng::{FixedRng, RngProvider, SeededRng, SequenceRng};
