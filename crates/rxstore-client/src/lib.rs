pub mod cache;
pub mod client;
pub mod error;
pub mod resolver;
pub(crate) mod retry;
pub mod store;

pub use cache::RequestCache;
pub use client::StorefrontClient;
pub use error::{ClientError, StoreError};
pub use resolver::{Resolution, RouteResolver};
pub use store::{
    load_recently_viewed, record_recently_viewed, JsonFileStore, MemoryStore, StateStore, StoreKey,
};
