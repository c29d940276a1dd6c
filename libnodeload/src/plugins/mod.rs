//! Scheduler extension points.
//!
//! Each extension point is its own trait, a plugin implements the ones it
//! takes part in. Names and status codes follow the Kubernetes scheduler
//! framework, some comments are quoted from the Kubernetes codebase.

use crate::models::{NodeInfo, PodInfo};

pub mod real_node_load;

pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;
}

/// Called once per scheduling cycle before any Filter plugin.
pub trait PreFilterPlugin: Plugin {
    fn pre_filter(&self, pod: &PodInfo) -> Status;
}

/// Evaluates if a node can run a pod. Returns Success or UnschedulableAndUnresolvable.
pub trait FilterPlugin: Plugin {
    fn filter(&self, pod: &PodInfo, node_info: &NodeInfo) -> Status;
}

/// Plugin that ranks nodes passing the filtering phase
pub trait ScorePlugin: Plugin {
    /// Assigns a score to a node (higher = better fit). Must return success.
    fn score(&self, pod: &PodInfo, node_name: &str) -> (i64, Status);

    fn score_extension(&self) -> Option<&dyn ScoreExtension>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeScore {
    pub name: String,
    pub score: i64,
}

pub trait ScoreExtension {
    /// Called after all nodes are scored, before the host combines scores.
    fn normalize_score(&self, pod: &PodInfo, scores: &mut [NodeScore]) -> Status;
}

/// Plugin called before a pod is bound
pub trait PreBindPlugin: Plugin {
    /// Executes before pod binding. All must succeed or pod is rejected.
    fn pre_bind(&self, pod: &PodInfo, node_name: &str) -> Status;
}

/// Plugin responsible for binding a pod to a node
pub trait BindPlugin: Plugin {
    /// Handles pod binding or returns Skip so the next bind plugin runs.
    fn bind(&self, pod: &PodInfo, node_name: &str) -> Status;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub code: Code,
    pub reasons: Vec<String>,
    pub err: String,
    pub plugin: String,
}

impl Default for Status {
    /// Default success status
    fn default() -> Self {
        Self {
            code: Code::Success,
            reasons: vec![],
            err: String::new(),
            plugin: String::new(),
        }
    }
}

impl Status {
    pub fn new(code: Code, reasons: Vec<String>) -> Self {
        Status {
            code,
            reasons,
            ..Default::default()
        }
    }

    pub fn error(error: &str) -> Self {
        Self {
            code: Code::Error,
            err: error.to_string(),
            ..Default::default()
        }
    }

    pub fn with_plugin(mut self, plugin: &str) -> Self {
        self.plugin = plugin.to_string();
        self
    }

    pub fn is_success(&self) -> bool {
        self.code == Code::Success
    }
}

/// Code is the Status code/type which is returned from plugins.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Code {
    /// Success means that plugin ran correctly and found pod schedulable.
    Success,
    /// Error is used for internal plugin errors, unexpected input, etc.
    /// The host retries the pod soon rather than marking it unschedulable.
    Error,
    /// UnschedulableAndUnresolvable is used when a plugin finds a pod unschedulable and
    /// other postFilter plugins like preemption would not change anything.
    UnschedulableAndUnresolvable,
    /// Skip is used when a Bind plugin chooses to skip binding.
    Skip,
}
