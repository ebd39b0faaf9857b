//! Feature preprocessing
//!
//! Scaling statistics are fitted once on the training partition and frozen
//! inside the serialized pipeline; serving never refits them.

mod scaler;

pub use scaler::StandardScaler;
