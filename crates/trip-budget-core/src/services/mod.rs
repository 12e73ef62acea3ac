//! Shared services used by all clients

mod local_store;
mod store_lock;

pub use local_store::LocalStore;
pub use store_lock::StoreLock;
