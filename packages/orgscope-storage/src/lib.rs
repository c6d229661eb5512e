pub mod cache;
pub mod db;
pub mod memory;
pub mod models;
pub mod records;
pub mod schema;

mod error;

pub use cache::{CacheStore, MemoryCache};
pub use error::Error;
pub use memory::MemoryStore;
pub use records::{BoxFuture, RecordStore, Removal};

pub type Result<T, E = Error> = std::result::Result<T, E>;
