//! Subscription manager
//!
//! Room groups keyed by room id. A viewer joins a group explicitly and leaves
//! every group at once when it disconnects; there is no explicit leave.

pub mod manager;

pub use manager::SubscriptionManager;
