//! Store adapters — the persistent key-value storage the engine reads and
//! writes wholesale.
//!
//! The engine keeps the whole binding set under [`BINDINGS_KEY`] and the
//! display theme under [`THEME_KEY`], both as opaque JSON values. Any
//! backend that can get and set a value by key can host it.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

pub mod fast_path;
pub mod file;
pub mod memory;

pub use fast_path::{FastPath, FileFastPath, MemoryFastPath};
pub use file::FileStore;
pub use memory::MemoryStore;

/// Key holding the serialized binding set.
pub const BINDINGS_KEY: &str = "shortcuts";

/// Key holding the display theme.
pub const THEME_KEY: &str = "theme";

/// Errors returned by store adapters.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend refused the operation (quota, offline, closed).
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous key-value storage.
///
/// `get` of a key never written returns `Ok(None)`. Both calls are
/// awaited to completion before the engine returns to its caller.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>, StoreError>> + Send;

    fn set(&self, key: &str, value: Value) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Several execution contexts share one store.
impl<S: KeyValueStore> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>, StoreError>> + Send {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).set(key, value)
    }
}
