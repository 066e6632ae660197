//! Directory Schema Registry
//!
//! Hierarchical registries for LDAP schema objects (object classes and
//! attribute types), keyed by OID and reachable by any of their names.
//!
//! ## Features
//!
//! - **Name resolution**: case-insensitive names and OIDs resolve to one canonical OID
//! - **Descendant index**: "what inherits from X" is answered from an index
//!   kept current on every register/unregister, diamonds included
//! - **Atomic registration**: a rejected definition (duplicate, cycle, unknown
//!   superior) leaves the registry untouched
//! - **Schema files**: JSON schema loading with an embedded RFC 4512/4519 core
//! - **Shared snapshots**: lock-free readers over copy-and-swap writers
//!
//! ## Architecture
//!
//! ```text
//! DirectorySchema
//! ├── object classes   ── SchemaRegistry
//! └── attribute types  ── SchemaRegistry
//!                          ├── DefinitionStore (OID -> definition)
//!                          │   └── OidResolver (name -> OID)
//!                          └── DescendantIndex (OID -> transitive subtypes)
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod graph;
pub mod loader;
pub mod message;
pub mod oid;
pub mod registry;
pub mod resolver;
pub mod result_code;
pub mod schema;
pub mod shared;
pub mod store;

pub use config::SchemaConfig;
pub use directory::DirectorySchema;
pub use error::{InvalidAttributeValue, Result, SchemaError};
pub use graph::{DescendantIndex, Descendants, HierarchyGraph};
pub use loader::{LoadReport, SchemaLoader};
pub use message::{AssertionValue, CompareRequest, MessageType};
pub use oid::Oid;
pub use registry::{ForwardReferencePolicy, SchemaRegistry, SearchResult};
pub use resolver::OidResolver;
pub use result_code::ResultCode;
pub use schema::{SchemaObject, SchemaObjectType};
pub use shared::SharedSchema;
pub use store::DefinitionStore;
