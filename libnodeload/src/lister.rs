use std::collections::HashMap;

use anyhow::Result;

use crate::error::LookupError;
use crate::models::NodeInfo;

/// Read access to the host's current view of the cluster nodes.
pub trait NodeLister: Send + Sync {
    fn get(&self, node_name: &str) -> Result<NodeInfo>;
}

/// A point-in-time copy of the cluster nodes.
#[derive(Clone, Default)]
pub struct NodeSnapshot {
    nodes: HashMap<String, NodeInfo>,
}

impl NodeSnapshot {
    pub fn new(nodes: Vec<NodeInfo>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.name.clone(), n)).collect(),
        }
    }

    pub fn update_node(&mut self, node: NodeInfo) -> Option<NodeInfo> {
        self.nodes.insert(node.name.clone(), node)
    }

    pub fn remove_node(&mut self, node_name: &str) -> Option<NodeInfo> {
        self.nodes.remove(node_name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl NodeLister for NodeSnapshot {
    fn get(&self, node_name: &str) -> Result<NodeInfo> {
        self.nodes
            .get(node_name)
            .cloned()
            .ok_or_else(|| LookupError::NodeNotFound(node_name.to_string()).into())
    }
}
