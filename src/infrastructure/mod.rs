//! Adapters behind the domain ports: stores, the asset indexer and the
//! transfer service client.

pub mod helius;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod transfer;
