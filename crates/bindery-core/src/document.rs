//! Serializable configuration documents
//!
//! A [`ConfigDocument`] is the on-disk form of a configuration tree, read from
//! TOML or JSON and turned into [`ConfigNode`]s with [`ConfigDocument::build`].
//!
//! ```toml
//! id = "root"
//! view = "Card"
//!
//! [[children]]
//! id = "c1"
//! key = "title"
//! view = "Text"
//! params = { text = "Hi" }
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::{derive_id, ConfigNode};
use crate::error::{BindingError, BindingResult};
use crate::value::ParamValue;

/// One node of a configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Node id; derived from the node's position when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(alias = "view")]
    pub view_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binder: Option<String>,
    /// Slot name under the parent; required for every non-root node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub params: IndexMap<String, ParamValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ConfigDocument>,
}

impl ConfigDocument {
    pub fn from_toml_str(source: &str) -> BindingResult<Self> {
        toml::from_str(source).map_err(|e| BindingError::InvalidDocument(e.to_string()))
    }

    pub fn from_json_str(source: &str) -> BindingResult<Self> {
        serde_json::from_str(source).map_err(|e| BindingError::InvalidDocument(e.to_string()))
    }

    /// Read a document, choosing the format from the file extension
    pub fn load(path: impl AsRef<std::path::Path>) -> BindingResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&source),
            _ => Self::from_toml_str(&source),
        }
    }

    /// Build the configuration tree described by this document
    pub fn build(&self) -> BindingResult<Arc<ConfigNode>> {
        self.build_node("", 0)
    }

    fn build_node(&self, parent_id: &str, index: usize) -> BindingResult<Arc<ConfigNode>> {
        let id = match &self.id {
            Some(id) => id.clone(),
            None => derive_id(&(parent_id, self.key.as_deref(), index, self.view_type.as_str())),
        };

        let mut builder = ConfigNode::builder(id.clone(), self.view_type.clone());
        if let Some(binder) = &self.binder {
            builder = builder.binder_type(binder.clone());
        }
        for (key, value) in &self.params {
            builder = builder.param(key.clone(), value.clone());
        }
        for (position, child) in self.children.iter().enumerate() {
            let key = child.key.clone().ok_or_else(|| {
                BindingError::InvalidDocument(format!("child {position} of {id} has no key"))
            })?;
            builder = builder.child(key, child.build_node(&id, position)?);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = r#"
id = "root"
view = "Card"

[[children]]
id = "c1"
key = "title"
view = "Text"
params = { text = "Hi", size = 14 }
"#;

    #[test]
    fn test_toml_document_builds_tree() {
        let root = ConfigDocument::from_toml_str(CARD).unwrap().build().unwrap();
        assert_eq!(root.id(), "root");
        assert_eq!(root.view_type(), "Card");

        let title = root.child_by_key("title").unwrap();
        assert_eq!(title.id(), "c1");
        assert_eq!(title.string_param("text").as_deref(), Some("Hi"));
        assert_eq!(title.int_param("size"), Some(14));
        assert!(Arc::ptr_eq(&title.parent().unwrap(), &root));
    }

    #[test]
    fn test_json_document_with_binder_and_derived_ids() {
        let doc = ConfigDocument::from_json_str(
            r#"{"view_type": "List", "binder": "Feed",
                "children": [{"key": "items", "view": "Text"}, {"key": "items", "view": "Text"}]}"#,
        )
        .unwrap();
        let root = doc.build().unwrap();
        assert_eq!(root.binder_key(), "Feed");

        let items = root.children_with_key("items");
        assert_eq!(items.len(), 2);
        assert_ne!(items[0].id(), items[1].id());
        assert_eq!(doc.build().unwrap().id(), root.id());
    }

    #[test]
    fn test_child_without_key_is_rejected() {
        let result = ConfigDocument::from_json_str(r#"{"id": "r", "view": "Card", "children": [{"view": "Text"}]}"#)
            .unwrap()
            .build();
        assert!(matches!(result, Err(BindingError::InvalidDocument(_))));
    }

    #[test]
    fn test_empty_id_is_rejected() {
        let result = ConfigDocument::from_json_str(r#"{"id": "", "view": "Card"}"#).unwrap().build();
        assert!(matches!(result, Err(BindingError::MissingId)));
    }

    #[test]
    fn test_malformed_source() {
        assert!(matches!(
            ConfigDocument::from_toml_str("view = "),
            Err(BindingError::InvalidDocument(_))
        ));
    }
}
