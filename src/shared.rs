//! Shared schema for concurrent readers.
//!
//! Readers take a cheap `Arc` snapshot and never block. Writers are
//! serialized; each change is applied to a private copy and published with a
//! single atomic swap, so a reader never sees a half-applied registration.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::debug;

use crate::directory::DirectorySchema;
use crate::error::Result;

pub struct SharedSchema {
    current: ArcSwap<DirectorySchema>,
    writer: Mutex<()>,
}

impl SharedSchema {
    pub fn new(schema: DirectorySchema) -> Self {
        Self {
            current: ArcSwap::from_pointee(schema),
            writer: Mutex::new(()),
        }
    }

    /// The currently published schema
    pub fn snapshot(&self) -> Arc<DirectorySchema> {
        self.current.load_full()
    }

    /// Publish `schema` wholesale, returning the one it replaced
    pub fn replace(&self, schema: DirectorySchema) -> Arc<DirectorySchema> {
        let _guard = self.writer.lock();
        self.current.swap(Arc::new(schema))
    }

    /// Apply `f` to a copy of the current schema and publish the copy if `f`
    /// succeeds. On error nothing is published.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut DirectorySchema) -> Result<T>,
    {
        let _guard = self.writer.lock();
        let mut next = DirectorySchema::clone(&self.current.load());
        let value = f(&mut next)?;
        debug!(size = next.size(), "publishing schema snapshot");
        self.current.store(Arc::new(next));
        Ok(value)
    }
}

impl Default for SharedSchema {
    fn default() -> Self {
        Self::new(DirectorySchema::default())
    }
}

impl std::fmt::Debug for SharedSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSchema")
            .field("size", &self.current.load().size())
            .finish()
    }
}
