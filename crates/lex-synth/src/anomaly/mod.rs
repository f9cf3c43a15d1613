//! Anomaly detection used by outlier clamping.

mod isolation_forest;

pub use isolation_forest::{IsolationForest, IsolationTree};
