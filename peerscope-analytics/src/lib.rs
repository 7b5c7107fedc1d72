//! Peer-group analytics core.
//!
//! Pure batch computations over branch-level retail data: behavioral
//! feature building, persona clustering, within-cluster health scoring,
//! gap-to-best analysis, and the bundle recommendation engine. No I/O
//! lives here; loading and artifact publication belong to
//! `peerscope-pipeline`.

pub mod bundling;
pub mod clustering;
pub mod cooccurrence;
pub mod error;
pub mod features;
pub mod gap;
pub mod health;
pub mod math;
pub mod pca;
pub mod thresholds;
