//! Subscriber persistence.
//!
//! [`SubscriberStore`] is the capability the handlers depend on. Two
//! backends implement it; `main` picks one from the configuration.

mod json;
mod models;
mod mongo;
mod store;
mod subscribers;

pub use json::JsonSubscriberStore;
pub use mongo::Database;
pub use store::SubscriberStore;
pub use subscribers::MongoSubscriberStore;

#[cfg(test)]
pub use store::MemoryStore;
