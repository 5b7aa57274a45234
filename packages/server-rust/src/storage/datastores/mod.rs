//! [`RequestStore`](crate::traits::RequestStore) implementations.

pub mod memory;
#[cfg(feature = "redb")]
pub mod redb;

pub use memory::MemoryRequestStore;
#[cfg(feature = "redb")]
pub use self::redb::RedbRequestStore;
