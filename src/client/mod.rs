//! Producer client
//!
//! Publishes a tree and its execution steps to a relay:
//! - Connecting to `/ws/accept` and introducing the tree under a room id
//! - Emitting steps, transparently reconnecting after long idle gaps

pub mod config;
pub mod producer;

pub use config::ProducerConfig;
pub use producer::TraceProducer;
