//! In-memory taxonomy source

use std::path::Path;

use ahash::AHashMap;
use serde::Deserialize;
use serde_json::Value;
use tn_core::{ChildLoader, ChildNode, ChildRequest};
use tracing::{debug, info};

use crate::rows::decode_rows;
use crate::DataError;

/// One block of a taxonomy fixture file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChildBlock {
    parent_level: String,
    parent_value: String,
    child_level: String,
    rows: Value,
}

#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    children: Vec<ChildBlock>,
}

/// Child loader answering from a fixed table of
/// `(parent level, parent value, child level)` entries
pub struct MemoryTaxonomy {
    name: String,
    children: AHashMap<ChildRequest, Vec<ChildNode>>,
}

impl MemoryTaxonomy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: AHashMap::new(),
        }
    }

    /// Register the children of one parent, replacing earlier entries
    pub fn insert(&mut self, request: ChildRequest, children: Vec<ChildNode>) {
        self.children.insert(request, children);
    }

    /// Builder form of [`MemoryTaxonomy::insert`] taking plain names
    pub fn with_children(mut self, parent_level: &str, parent_value: &str, child_level: &str, values: &[&str]) -> Self {
        let nodes = values
            .iter()
            .enumerate()
            .map(|(i, v)| ChildNode::new(i as u32, *v, *v))
            .collect();
        self.insert(ChildRequest::new(parent_level, parent_value, child_level), nodes);
        self
    }

    /// Parse a fixture of the form
    /// `{ "children": [ { "parentLevel", "parentValue", "childLevel", "rows": [...] } ] }`
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, DataError> {
        let file: TaxonomyFile = serde_json::from_str(json)?;
        let mut taxonomy = Self::new(name);

        for block in file.children {
            let request = ChildRequest::new(block.parent_level, block.parent_value, block.child_level);
            let nodes = decode_rows(block.rows)?;
            debug!("Fixture: {} children of '{}'", nodes.len(), request.parent_value);
            taxonomy.insert(request, nodes);
        }

        Ok(taxonomy)
    }

    pub fn load(path: &Path) -> Result<Self, DataError> {
        let json = std::fs::read_to_string(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("taxonomy.json")
            .to_string();
        let taxonomy = Self::from_json(name, &json)?;
        info!("Loaded {} parent entries from {}", taxonomy.len(), path.display());
        Ok(taxonomy)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

#[async_trait::async_trait]
impl ChildLoader for MemoryTaxonomy {
    async fn children(&self, request: &ChildRequest) -> anyhow::Result<Vec<ChildNode>> {
        Ok(self.children.get(request).cloned().unwrap_or_default())
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
