// HTTP implementations of the gateway traits.

mod client;
mod storage;

pub use client::RestClient;
pub use storage::StorageClient;
