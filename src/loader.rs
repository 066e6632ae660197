//! Schema Loading
//!
//! Reads JSON schema files from the filesystem or an embedded directory and
//! registers their definitions into a `DirectorySchema`.
//!
//! A load is all-or-nothing: definitions are staged on a copy of the target
//! schema, every cycle in the batch is reported before anything is
//! registered, and the target is replaced only when the whole batch went in.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::LoaderConfig;
use crate::directory::DirectorySchema;
use crate::error::{Result, SchemaError};
use crate::graph::HierarchyGraph;
use crate::oid::Oid;
use crate::registry::SchemaRegistry;
use crate::schema::{SchemaObject, SchemaObjectType};

/// RFC 4512/4519 core definitions compiled into the crate
static CORE_SCHEMAS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/schemas");

/// One JSON schema file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub object_classes: Vec<DefinitionSource>,
    #[serde(default)]
    pub attribute_types: Vec<DefinitionSource>,
}

impl SchemaFile {
    pub fn definitions(&self, kind: SchemaObjectType) -> &[DefinitionSource] {
        match kind {
            SchemaObjectType::ObjectClass => &self.object_classes,
            SchemaObjectType::AttributeType => &self.attribute_types,
        }
    }
}

/// A definition as written in a schema file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionSource {
    pub oid: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default, alias = "sup")]
    pub superiors: Vec<String>,
    #[serde(default, alias = "desc", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub obsolete: bool,
}

impl DefinitionSource {
    pub fn to_object(&self, kind: SchemaObjectType) -> Result<SchemaObject> {
        let mut object = SchemaObject::new(kind, Oid::parse(&self.oid)?)
            .with_names(self.names.iter().map(|n| n.trim()))
            .with_superiors(self.superiors.iter().map(|s| s.trim()))
            .with_obsolete(self.obsolete);
        if let Some(description) = &self.description {
            object = object.with_description(description.clone());
        }
        Ok(object)
    }
}

/// Configuration for collecting schema files
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Skip files whose path below the walked root starts with one of these
    pub skip_prefixes: Vec<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            skip_prefixes: vec![
                "target/".to_string(),
                ".git/".to_string(),
                "node_modules/".to_string(),
            ],
        }
    }
}

/// Outcome of a successful load
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// SHA-256 over the contents of every loaded file, in load order
    pub fingerprint: String,
    pub files: usize,
    /// `name` of each file that declared one
    pub schemas: Vec<String>,
    pub object_classes: usize,
    pub attribute_types: usize,
    pub loaded_at: DateTime<Utc>,
}

impl LoadReport {
    pub fn definitions(&self) -> usize {
        self.object_classes + self.attribute_types
    }
}

/// Collects schema file contents, then registers them in one batch
#[derive(Debug, Default)]
pub struct SchemaLoader {
    config: LoadConfig,
    sources: Vec<(PathBuf, String)>,
}

impl SchemaLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LoadConfig) -> Self {
        Self {
            config,
            sources: Vec::new(),
        }
    }

    /// Number of files collected so far
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Add the contents of one schema file; `origin` is used in error messages
    pub fn add_str(&mut self, origin: impl Into<PathBuf>, content: impl Into<String>) -> &mut Self {
        self.sources.push((origin.into(), content.into()));
        self
    }

    /// Add a `.json` file, or every `.json` file below a directory.
    /// Returns how many files were added.
    pub fn add_path(&mut self, path: &Path) -> Result<usize> {
        if path.is_file() {
            let content = fs::read_to_string(path)?;
            self.add_str(path, content);
            return Ok(1);
        }

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            let file = entry.path();
            if !file.is_file() || file.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            let relative = file.strip_prefix(path).unwrap_or(file).to_string_lossy().replace('\\', "/");
            if self.config.skip_prefixes.iter().any(|p| relative.starts_with(p.as_str())) {
                debug!(path = %file.display(), "skipping schema file");
                continue;
            }
            paths.push(file.to_path_buf());
        }
        if paths.is_empty() && !path.exists() {
            return Err(SchemaError::Load {
                path: path.to_path_buf(),
                message: "no such file or directory".to_string(),
            });
        }

        // Walk order is platform dependent; keep the fingerprint stable
        paths.sort();
        for file in &paths {
            let content = fs::read_to_string(file)?;
            self.add_str(file.clone(), content);
        }
        Ok(paths.len())
    }

    /// Add every `.json` file in an embedded directory tree
    pub fn add_embedded(&mut self, dir: &Dir<'_>) -> usize {
        let mut files: Vec<(&Path, &str)> = Vec::new();
        collect_embedded_files(dir, &mut files);
        files.sort_by(|a, b| a.0.cmp(b.0));
        for (path, content) in &files {
            self.add_str(*path, *content);
        }
        files.len()
    }

    /// Register everything collected into `schema`.
    ///
    /// On error `schema` is left exactly as it was.
    pub fn load_into(&self, schema: &mut DirectorySchema) -> Result<LoadReport> {
        let mut hasher = Sha256::new();
        let mut files: Vec<(&Path, SchemaFile)> = Vec::with_capacity(self.sources.len());
        for (origin, content) in &self.sources {
            hasher.update(content.as_bytes());
            let file: SchemaFile = serde_json::from_str(content).map_err(|e| SchemaError::Load {
                path: origin.clone(),
                message: e.to_string(),
            })?;
            files.push((origin.as_path(), file));
        }

        let mut staged = schema.clone();
        let mut counts: HashMap<SchemaObjectType, usize> = HashMap::new();
        for kind in [SchemaObjectType::AttributeType, SchemaObjectType::ObjectClass] {
            let mut batch = Vec::new();
            for (origin, file) in &files {
                for source in file.definitions(kind) {
                    let object = source.to_object(kind).map_err(|e| SchemaError::Load {
                        path: origin.to_path_buf(),
                        message: e.to_string(),
                    })?;
                    batch.push(object);
                }
            }
            let registered = register_batch(staged.registry_mut(kind), batch)?;
            counts.insert(kind, registered);
        }
        *schema = staged;

        let report = LoadReport {
            fingerprint: format!("{:x}", hasher.finalize()),
            files: files.len(),
            schemas: files.iter().filter_map(|(_, f)| f.name.clone()).collect(),
            object_classes: counts.get(&SchemaObjectType::ObjectClass).copied().unwrap_or(0),
            attribute_types: counts.get(&SchemaObjectType::AttributeType).copied().unwrap_or(0),
            loaded_at: Utc::now(),
        };
        info!(
            files = report.files,
            object_classes = report.object_classes,
            attribute_types = report.attribute_types,
            fingerprint = %report.fingerprint,
            "loaded schema definitions"
        );
        Ok(report)
    }
}

/// Register a batch of one category superiors-first, after checking the batch
/// for duplicate OIDs and for cycles against what is already registered.
fn register_batch(registry: &mut SchemaRegistry, batch: Vec<SchemaObject>) -> Result<usize> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(batch.len());
    for object in &batch {
        if registry.contains(object.oid.as_str()) || !seen.insert(object.oid.as_str()) {
            return Err(SchemaError::DuplicateOid(object.oid.to_string()));
        }
    }

    let order = {
        let graph = HierarchyGraph::from_objects(
            registry.iter().map(|o| o.as_ref()).chain(batch.iter()),
        );
        for group in graph.cycles() {
            warn!(kind = %registry.kind(), members = ?group, "cyclic hierarchy in schema batch");
        }
        graph.superiors_first()?
    };

    let count = batch.len();
    let mut pending: HashMap<String, SchemaObject> = batch
        .into_iter()
        .map(|object| (object.oid.to_string(), object))
        .collect();
    for oid in order {
        if let Some(object) = pending.remove(&oid) {
            registry.register(object)?;
        }
    }
    Ok(count)
}

fn collect_embedded_files<'a>(dir: &'a Dir<'a>, files: &mut Vec<(&'a Path, &'a str)>) {
    for file in dir.files() {
        let path = file.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            if let Some(content) = file.contents_utf8() {
                files.push((path, content));
            }
        }
    }
    for subdir in dir.dirs() {
        collect_embedded_files(subdir, files);
    }
}

/// Load the embedded core schema into `schema`
pub fn load_core(schema: &mut DirectorySchema) -> Result<LoadReport> {
    let mut loader = SchemaLoader::new();
    loader.add_embedded(&CORE_SCHEMAS);
    loader.load_into(schema)
}

/// Load a schema file or directory into `schema`
pub fn load_from_path(schema: &mut DirectorySchema, path: &Path) -> Result<LoadReport> {
    let mut loader = SchemaLoader::new();
    loader.add_path(path)?;
    loader.load_into(schema)
}

/// Load whatever the `[loader]` configuration section names, core schema
/// first when enabled, as one batch
pub fn load_configured(schema: &mut DirectorySchema, config: &LoaderConfig) -> Result<LoadReport> {
    let mut loader = SchemaLoader::with_config(LoadConfig {
        skip_prefixes: config.skip_prefixes.clone(),
    });
    if config.include_core {
        loader.add_embedded(&CORE_SCHEMAS);
    }
    for path in &config.paths {
        loader.add_path(path)?;
    }
    loader.load_into(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEOPLE: &str = r#"{
        "name": "people",
        "objectClasses": [
            { "oid": "2.5.6.7", "names": ["organizationalPerson"], "sup": ["person"] },
            { "oid": "2.5.6.6", "names": ["person"], "superiors": ["top"], "desc": "a person" },
            { "oid": "2.5.6.0", "names": ["top"] }
        ],
        "attributeTypes": [
            { "oid": "2.5.4.3", "names": ["cn", "commonName"], "sup": ["name"] },
            { "oid": "2.5.4.41", "names": ["name"] }
        ]
    }"#;

    #[test]
    fn test_batch_registers_superiors_first() {
        let mut schema = DirectorySchema::new();
        let mut loader = SchemaLoader::new();
        loader.add_str("people.json", PEOPLE);
        let report = loader.load_into(&mut schema).unwrap();

        assert_eq!(report.files, 1);
        assert_eq!(report.schemas, vec!["people"]);
        assert_eq!(report.object_classes, 3);
        assert_eq!(report.attribute_types, 2);
        assert_eq!(report.fingerprint.len(), 64);

        let classes = schema.object_classes();
        assert!(classes.is_descendant_of("organizationalPerson", "top").unwrap());
        assert_eq!(
            classes.lookup("person").unwrap().description.as_deref(),
            Some("a person")
        );
        assert!(schema.attribute_types().is_descendant_of("commonName", "name").unwrap());
    }

    #[test]
    fn test_cycle_leaves_schema_untouched() {
        let mut schema = DirectorySchema::new();
        let mut loader = SchemaLoader::new();
        loader.add_str(
            "cycle.json",
            r#"{ "objectClasses": [
                { "oid": "1.1", "names": ["a"], "sup": ["b"] },
                { "oid": "1.2", "names": ["b"], "sup": ["a"] },
                { "oid": "1.3", "names": ["c"] }
            ] }"#,
        );
        let err = loader.load_into(&mut schema).unwrap_err();
        assert!(matches!(err, SchemaError::CyclicHierarchy { .. }));
        assert!(schema.is_empty());
    }

    #[test]
    fn test_duplicate_oid_across_files() {
        let mut schema = DirectorySchema::new();
        let mut loader = SchemaLoader::new();
        loader.add_str("a.json", r#"{ "objectClasses": [{ "oid": "1.1" }] }"#);
        loader.add_str("b.json", r#"{ "objectClasses": [{ "oid": "1.1" }] }"#);
        assert!(matches!(loader.load_into(&mut schema), Err(SchemaError::DuplicateOid(_))));
        assert!(schema.is_empty());
    }

    #[test]
    fn test_parse_errors_name_the_file() {
        let mut schema = DirectorySchema::new();
        let mut loader = SchemaLoader::new();
        loader.add_str("broken.json", "{ not json");
        match loader.load_into(&mut schema).unwrap_err() {
            SchemaError::Load { path, .. } => assert_eq!(path, PathBuf::from("broken.json")),
            other => panic!("expected Load error, got {other:?}"),
        }

        let mut loader = SchemaLoader::new();
        loader.add_str("bad-oid.json", r#"{ "objectClasses": [{ "oid": "person" }] }"#);
        assert!(matches!(loader.load_into(&mut schema), Err(SchemaError::Load { .. })));
    }

    #[test]
    fn test_second_batch_extends_first() {
        let mut schema = DirectorySchema::core().unwrap();
        let before = schema.size();

        let mut loader = SchemaLoader::new();
        loader.add_str(
            "local.json",
            r#"{ "objectClasses": [
                { "oid": "1.3.6.1.4.1.99.2", "names": ["employee"], "sup": ["inetOrgPerson"] }
            ] }"#,
        );
        loader.load_into(&mut schema).unwrap();

        assert_eq!(schema.size(), before + 1);
        assert!(schema.object_classes().is_descendant_of("employee", "person").unwrap());
    }

    #[test]
    fn test_embedded_core_is_consistent() {
        let mut loader = SchemaLoader::new();
        assert!(loader.add_embedded(&CORE_SCHEMAS) >= 1);

        let mut schema = DirectorySchema::new();
        let report = loader.load_into(&mut schema).unwrap();
        assert!(report.definitions() > 0);
        assert!(schema.object_classes().pending_superiors().is_empty());
        assert!(schema.attribute_types().pending_superiors().is_empty());
    }
}
