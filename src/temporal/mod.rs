//! Temporal reduction (§3, §4.5): calendar/weather-year handling, the
//! chronological-to-representative-period clustering pipeline, and the
//! profile rescaling that follows it.
pub mod clustering;
pub mod rescale;
pub mod settings;

pub use clustering::{ClusterMethod, ClusterResult};
pub use settings::{Period, TemporalSettings};
