// kampus-api: gateways to the remote collection service and blob storage
//
// The `CollectionGateway` and `BlobStorage` traits are the only surface the
// core crate depends on. `RestClient` / `StorageClient` speak the PostgREST
// and storage-object HTTP dialects; `MemoryGateway` / `MemoryStorage` keep
// everything in process for tests and offline runs.

pub mod error;
pub mod gateway;
pub mod memory;
pub mod query;
pub mod rest;
pub mod transport;

pub use error::Error;
pub use gateway::{BlobStorage, CollectionGateway, Row, RowKey};
pub use memory::{MemoryGateway, MemoryStorage};
pub use query::{Direction, Filter, FilterOp, Order, Query};
pub use rest::{RestClient, StorageClient};
pub use transport::{TlsMode, TransportConfig};
