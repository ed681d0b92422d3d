//! Weighted random choices driven by a single quantum random byte.
pub mod diagnostics;
pub mod error;
pub mod settings;
pub mod source;
pub mod weighted_random;

pub use error::{Error, Result};
pub use source::{AnuSource, LocalSource, RandomByteSource};
pub use weighted_random::{normalize_weights, quantum_choice, ChoiceMap, WeightedChooser};

/// Number of distinct values a random byte can take.
pub const BYTE_SPACE: usize = 256;

/// The normalized weight table always sums to this.
pub const TABLE_TOTAL: u32 = 255;

/// Choices used when none are given.
pub const DEFAULT_CHOICES: [&str; 3] = ["apple", "banana", "cherry"];
pub const DEFAULT_WEIGHTS: [f64; 3] = [1.0, 2.0, 3.0];
