//! # Object Catalog
//!
//! Read-only view of the repository metadata the checker needs: which
//! objects exist, whether they are deleted, their last-known digest, and
//! which objects live under a container handle.
//!
//! Containers nest (community > collection > item > object). Resolving a
//! container gathers every object beneath it.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{CheckerError, CheckerResult};
use super::model::ObjectId;

/// Kind of container node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    Item,
    Collection,
    Community,
}

/// What a handle resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Container(ContainerKind),
}

/// A resolved catalog node and every object id beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNode {
    pub kind: NodeKind,
    pub member_object_ids: Vec<ObjectId>,
}

/// One object as the catalog knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogObject {
    pub id: ObjectId,
    #[serde(default)]
    pub deleted: bool,
    /// Digest recorded at ingest, if any
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub algorithm: Option<String>,
}

/// Metadata catalog consumed by the checker.
pub trait Catalog: Send + Sync {
    /// Resolve a handle (object id or container handle) to its objects.
    fn resolve(&self, handle: &str) -> CheckerResult<ResolvedNode>;

    /// Whether the catalog flags the object as deleted.
    ///
    /// Unknown objects are reported as not deleted.
    fn is_deleted(&self, id: &ObjectId) -> CheckerResult<bool>;

    /// Every object the catalog knows about.
    fn objects(&self) -> CheckerResult<Vec<CatalogObject>>;
}

/// A container and its direct children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerEntry {
    pub handle: String,
    pub kind: ContainerKind,
    /// Object ids held directly by this container
    #[serde(default)]
    pub objects: Vec<ObjectId>,
    /// Handles of nested containers
    #[serde(default)]
    pub children: Vec<String>,
}

/// JSON manifest layout read by `MemoryCatalog::load`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CatalogManifest {
    #[serde(default)]
    pub objects: Vec<CatalogObject>,
    #[serde(default)]
    pub containers: Vec<ContainerEntry>,
}

/// Catalog held in memory, optionally loaded from a JSON manifest.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    objects: BTreeMap<ObjectId, CatalogObject>,
    containers: BTreeMap<String, ContainerEntry>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog manifest from a JSON file.
    pub fn load(path: &Path) -> CheckerResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CheckerError::Catalog(format!("Failed to read catalog {}: {}", path.display(), e))
        })?;
        let manifest: CatalogManifest = serde_json::from_str(&content).map_err(|e| {
            CheckerError::Catalog(format!("Failed to parse catalog {}: {}", path.display(), e))
        })?;
        Ok(Self::from_manifest(manifest))
    }

    pub fn from_manifest(manifest: CatalogManifest) -> Self {
        let mut catalog = Self::new();
        for object in manifest.objects {
            catalog.add_object(object);
        }
        for container in manifest.containers {
            catalog.add_container(container);
        }
        catalog
    }

    pub fn add_object(&mut self, object: CatalogObject) {
        self.objects.insert(object.id.clone(), object);
    }

    pub fn add_container(&mut self, container: ContainerEntry) {
        self.containers.insert(container.handle.clone(), container);
    }

    /// Flag an object as deleted (or restore it).
    pub fn set_deleted(&mut self, id: &ObjectId, deleted: bool) {
        if let Some(object) = self.objects.get_mut(id) {
            object.deleted = deleted;
        }
    }

    /// Depth-first walk collecting object ids, visiting each container once.
    fn collect_members(
        &self,
        handle: &str,
        visited: &mut HashSet<String>,
        seen: &mut HashSet<ObjectId>,
        out: &mut Vec<ObjectId>,
    ) -> CheckerResult<()> {
        if !visited.insert(handle.to_string()) {
            return Ok(());
        }
        let container = self
            .containers
            .get(handle)
            .ok_or_else(|| CheckerError::HandleNotFound(handle.to_string()))?;

        for id in &container.objects {
            if seen.insert(id.clone()) {
                out.push(id.clone());
            }
        }
        for child in &container.children {
            self.collect_members(child, visited, seen, out)?;
        }
        Ok(())
    }
}

impl Catalog for MemoryCatalog {
    fn resolve(&self, handle: &str) -> CheckerResult<ResolvedNode> {
        if let Some(container) = self.containers.get(handle) {
            let mut members = Vec::new();
            self.collect_members(
                handle,
                &mut HashSet::new(),
                &mut HashSet::new(),
                &mut members,
            )?;
            return Ok(ResolvedNode {
                kind: NodeKind::Container(container.kind),
                member_object_ids: members,
            });
        }

        let id = ObjectId::new(handle)?;
        if self.objects.contains_key(&id) {
            return Ok(ResolvedNode {
                kind: NodeKind::Object,
                member_object_ids: vec![id],
            });
        }

        Err(CheckerError::HandleNotFound(handle.to_string()))
    }

    fn is_deleted(&self, id: &ObjectId) -> CheckerResult<bool> {
        Ok(self.objects.get(id).map(|o| o.deleted).unwrap_or(false))
    }

    fn objects(&self) -> CheckerResult<Vec<CatalogObject>> {
        Ok(self.objects.values().cloned().collect())
    }
}
