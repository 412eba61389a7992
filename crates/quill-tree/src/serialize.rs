//! Plain nested-object form of a tree.
//! 树的普通嵌套对象形式。

use crate::node::{Label, Node, NodeId, NodeMeta, Relevant, UnbalancedMarker};
use crate::tree::Tree;
use crate::TreeError;
use quill_recipe::RecipeManager;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// A node id: a sibling index, or the literal `"root"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SerializedId {
    Index(u32),
    Name(String),
}

impl From<Label> for SerializedId {
    fn from(label: Label) -> Self {
        match label {
            Label::Root => SerializedId::Name("root".to_string()),
            Label::Child(id) => SerializedId::Index(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedMarker {
    pub index: usize,
    pub syntax: String,
}

/// Serializable mirror of a node and its subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode {
    /// Path of the parent node, absent for the root.
    pub parent: Option<String>,
    pub id: SerializedId,
    pub meta: NodeMeta,
    pub start: usize,
    pub length: Option<usize>,
    pub relevant: Vec<Relevant>,
    pub children: Vec<SerializedNode>,
    pub unbalanced: Vec<SerializedMarker>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Tree {
    pub fn serialize(&self) -> SerializedNode {
        self.serialize_node(self.root())
    }

    pub fn serialize_node(&self, id: NodeId) -> SerializedNode {
        let node = self.node(id);
        SerializedNode {
            parent: node.parent.filter(|_| !node.is_root()).map(|p| self.path(p)),
            id: node.label.into(),
            meta: node.meta.clone(),
            start: node.start,
            length: node.length,
            relevant: node.relevant.clone(),
            children: node
                .children
                .iter()
                .map(|&child| self.serialize_node(child))
                .collect(),
            unbalanced: node
                .unbalanced
                .iter()
                .map(|marker| SerializedMarker {
                    index: marker.index,
                    syntax: marker.syntax.clone(),
                })
                .collect(),
            data: node.data.clone(),
        }
    }

    /// Rebuild a tree, checking parent paths, ids and syntaxes, then validate it.
    pub fn deserialize(
        source: impl Into<String>,
        recipes: Rc<RecipeManager>,
        serialized: &SerializedNode,
    ) -> Result<Tree, TreeError> {
        if serialized.id != SerializedId::from(Label::Root) {
            return Err(TreeError::IdMismatch {
                path: "root".to_string(),
            });
        }
        let mut tree = Tree::new(source, recipes);
        let root = tree.root();
        tree.fill(root, serialized)?;
        tree.validate("deserialize")?;
        Ok(tree)
    }

    fn fill(&mut self, id: NodeId, serialized: &SerializedNode) -> Result<(), TreeError> {
        let path = self.path(id);
        let expected_parent = self.parent(id).map(|parent| self.path(parent));
        if serialized.parent != expected_parent {
            return Err(TreeError::ParentMismatch {
                path,
                expected: expected_parent.unwrap_or_default(),
                found: serialized.parent.clone().unwrap_or_default(),
            });
        }
        if !self.recipes().has(&serialized.meta.syntax) {
            return Err(TreeError::UnknownSyntax(serialized.meta.syntax.clone()));
        }

        let node = self.node_mut(id);
        node.meta = serialized.meta.clone();
        node.start = serialized.start;
        node.length = serialized.length;
        node.relevant = serialized.relevant.clone();
        node.data = serialized.data.clone();
        node.unbalanced = serialized
            .unbalanced
            .iter()
            .map(|marker| UnbalancedMarker {
                index: marker.index,
                syntax: marker.syntax.clone(),
                attempt: None,
            })
            .collect();

        for (position, child) in serialized.children.iter().enumerate() {
            if child.id != SerializedId::Index(position as u32) {
                return Err(TreeError::IdMismatch {
                    path: format!("{path}/{position}"),
                });
            }
            let child_id = self.alloc(Node::new(child.meta.syntax.clone(), child.start, child.length));
            self.push_child(id, child_id);
            self.fill(child_id, child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipes() -> Rc<RecipeManager> {
        Rc::new(RecipeManager::with_defaults())
    }

    #[test]
    fn test_serialized_shape() {
        let tree = Tree::parse("(a)", recipes()).unwrap();
        let json = serde_json::to_value(tree.serialize()).unwrap();
        assert_eq!(json["id"], "root");
        assert_eq!(json["parent"], serde_json::Value::Null);
        assert_eq!(json["children"][0]["parent"], "root");
        assert_eq!(json["children"][0]["id"], 0);
        assert_eq!(json["children"][0]["relevant"], serde_json::json!([0, 2]));
        assert_eq!(json["children"][0]["children"][0]["parent"], "root/0");
    }

    #[test]
    fn test_deserialize_rebuilds_equivalent_tree() {
        let source = "a,(b|c),,\"d";
        let tree = Tree::parse(source, recipes()).unwrap();
        let serialized = tree.serialize();
        let rebuilt = Tree::deserialize(source, recipes(), &serialized).unwrap();
        assert_eq!(rebuilt.serialize(), serialized);
        assert_eq!(rebuilt.dump(), tree.dump());
    }

    #[test]
    fn test_deserialize_rejects_wrong_parent() {
        let tree = Tree::parse("(a)", recipes()).unwrap();
        let mut serialized = tree.serialize();
        serialized.children[0].parent = Some("root/7".to_string());
        let error = Tree::deserialize("(a)", recipes(), &serialized).unwrap_err();
        assert!(matches!(error, TreeError::ParentMismatch { .. }));
    }

    #[test]
    fn test_deserialize_rejects_unknown_syntax() {
        let tree = Tree::parse("a", recipes()).unwrap();
        let mut serialized = tree.serialize();
        serialized.children[0].meta.syntax = "sparkles".to_string();
        let error = Tree::deserialize("a", recipes(), &serialized).unwrap_err();
        assert!(matches!(error, TreeError::UnknownSyntax(name) if name == "sparkles"));
    }
}
