use std::sync::Arc;

use log::{debug, error, trace};

use crate::{
    clock::{Clock, SystemClock},
    config::RealNodeLoadArgs,
    lister::NodeLister,
    load::{self, Decision},
    models::{NodeInfo, PodInfo},
    plugins::{
        BindPlugin, Code, FilterPlugin, NodeScore, Plugin, PreBindPlugin, PreFilterPlugin,
        ScoreExtension, ScorePlugin, Status,
    },
};

pub const NAME: &str = "caihcloud-real-node-load-plugin";

/// Filters and scores nodes by the load their agents report in annotations.
///
/// Holds no per-cycle state, so one instance can serve concurrent scheduling
/// cycles.
pub struct RealNodeLoad {
    args: RealNodeLoadArgs,
    lister: Arc<dyn NodeLister>,
    clock: Arc<dyn Clock>,
}

impl RealNodeLoad {
    pub fn new(
        args: RealNodeLoadArgs,
        lister: Arc<dyn NodeLister>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        args.validate()?;
        Ok(Self {
            args,
            lister,
            clock,
        })
    }

    pub fn with_system_clock(
        args: RealNodeLoadArgs,
        lister: Arc<dyn NodeLister>,
    ) -> anyhow::Result<Self> {
        Self::new(args, lister, Arc::new(SystemClock))
    }

    fn score_node(&self, node_info: &NodeInfo) -> i64 {
        trace!(
            "get node {} annotations: {:?}",
            node_info.name, node_info.annotations
        );
        let score = load::score(
            &node_info.annotations,
            self.clock.now(),
            &self.args.annotation_prefix,
        );
        debug!("node {} score: {score}", node_info.name);
        score as i64
    }
}

impl Plugin for RealNodeLoad {
    fn name(&self) -> &str {
        NAME
    }
}

impl PreFilterPlugin for RealNodeLoad {
    fn pre_filter(&self, pod: &PodInfo) -> Status {
        debug!("prefilter pod: {}", pod.name);
        Status::default()
    }
}

impl FilterPlugin for RealNodeLoad {
    fn filter(&self, pod: &PodInfo, node_info: &NodeInfo) -> Status {
        debug!("filter node: {}({})", node_info.name, pod.name);
        match load::is_eligible(
            &node_info.annotations,
            self.clock.now(),
            &self.args.annotation_prefix,
        ) {
            Decision::Accept => Status::default(),
            Decision::Reject(reason) => {
                Status::new(Code::UnschedulableAndUnresolvable, vec![reason]).with_plugin(NAME)
            }
        }
    }
}

impl ScorePlugin for RealNodeLoad {
    fn score(&self, _pod: &PodInfo, node_name: &str) -> (i64, Status) {
        match self.lister.get(node_name) {
            Ok(node_info) => (self.score_node(&node_info), Status::default()),
            Err(e) => {
                error!("score node {node_name} err: {e:?}");
                (
                    0,
                    Status::error(&format!("getting node {node_name:?} from snapshot: {e}"))
                        .with_plugin(NAME),
                )
            }
        }
    }

    fn score_extension(&self) -> Option<&dyn ScoreExtension> {
        Some(self as &dyn ScoreExtension)
    }
}

impl ScoreExtension for RealNodeLoad {
    fn normalize_score(&self, pod: &PodInfo, scores: &mut [NodeScore]) -> Status {
        // Scores are already comparable across nodes.
        for score in scores.iter() {
            debug!("pod {} node {} score: {}", pod.name, score.name, score.score);
        }
        Status::default()
    }
}

impl PreBindPlugin for RealNodeLoad {
    fn pre_bind(&self, pod: &PodInfo, node_name: &str) -> Status {
        match self.lister.get(node_name) {
            Ok(node_info) => {
                trace!("prebind pod: {}, node info: {node_info:?}", pod.name);
                Status::default()
            }
            Err(e) => {
                error!("prebind pod: {}, node {node_name} err: {e:?}", pod.name);
                Status::error(&format!("prebind get node info error: {node_name}"))
                    .with_plugin(NAME)
            }
        }
    }
}

impl BindPlugin for RealNodeLoad {
    /// The host's default binder does the binding.
    fn bind(&self, pod: &PodInfo, node_name: &str) -> Status {
        debug!(
            "skip {NAME} bind stage pod: {}, node: {node_name}",
            pod.name
        );
        Status::new(Code::Skip, vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::ANNOTATION_PREFIX;
    use crate::lister::NodeSnapshot;

    const NOW: i64 = 1_700_000_000;

    fn make_node(name: &str, metrics: &[(&str, f64, f64, f64)]) -> NodeInfo {
        metrics
            .iter()
            .fold(NodeInfo::new(name), |node, (res, value, threshold, weight)| {
                node.with_annotation(
                    &format!("{ANNOTATION_PREFIX}{res}"),
                    &format!("{}:60:{value}:{threshold}:{weight}", NOW - 30),
                )
            })
    }

    fn make_plugin(nodes: Vec<NodeInfo>) -> RealNodeLoad {
        RealNodeLoad::new(
            RealNodeLoadArgs::default(),
            Arc::new(NodeSnapshot::new(nodes)),
            Arc::new(FixedClock(NOW)),
        )
        .unwrap()
    }

    #[test]
    fn test_plugin_name() {
        let plugin = make_plugin(vec![]);
        assert_eq!(plugin.name(), "caihcloud-real-node-load-plugin");
    }

    #[test]
    fn test_new_rejects_empty_prefix() {
        let args = RealNodeLoadArgs {
            annotation_prefix: String::new(),
        };
        let res = RealNodeLoad::new(
            args,
            Arc::new(NodeSnapshot::default()),
            Arc::new(FixedClock(NOW)),
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_pre_filter_succeeds() {
        let plugin = make_plugin(vec![]);
        assert!(plugin.pre_filter(&PodInfo::new("pod")).is_success());
    }

    #[test]
    fn test_filter_overloaded_node() {
        let plugin = make_plugin(vec![]);
        let node = make_node("node1", &[("cpu", 0.9, 0.8, 1.0)]);
        let status = plugin.filter(&PodInfo::new("pod"), &node);
        assert_eq!(status.code, Code::UnschedulableAndUnresolvable);
        assert_eq!(status.reasons, vec!["node load is too high".to_string()]);
        assert_eq!(status.plugin, NAME);
    }

    #[test]
    fn test_filter_healthy_node() {
        let plugin = make_plugin(vec![]);
        let node = make_node("node1", &[("cpu", 0.7, 0.8, 1.0), ("mem", 0.3, 0.9, 1.0)]);
        assert!(plugin.filter(&PodInfo::new("pod"), &node).is_success());
    }

    #[test]
    fn test_filter_uses_injected_clock() {
        let node = make_node("node1", &[("cpu", 0.9, 0.8, 1.0)]);
        let plugin = make_plugin(vec![]);
        assert!(!plugin.filter(&PodInfo::new("pod"), &node).is_success());

        // Ten minutes later the 60s metric is stale and the node passes.
        let later = RealNodeLoad::new(
            RealNodeLoadArgs::default(),
            Arc::new(NodeSnapshot::default()),
            Arc::new(FixedClock(NOW + 600)),
        )
        .unwrap();
        assert!(later.filter(&PodInfo::new("pod"), &node).is_success());
    }

    #[test]
    fn test_score_known_node() {
        let node = make_node("node1", &[("cpu", 0.25, 0.8, 1.0), ("mem", 0.75, 0.8, 1.0)]);
        let plugin = make_plugin(vec![node]);
        let (score, status) = plugin.score(&PodInfo::new("pod"), "node1");
        assert!(status.is_success());
        assert_eq!(score, 50);
    }

    #[test]
    fn test_score_truncates_toward_zero() {
        let node = make_node("node1", &[("cpu", 0.333, 0.8, 1.0)]);
        let plugin = make_plugin(vec![node]);
        let (score, _) = plugin.score(&PodInfo::new("pod"), "node1");
        assert_eq!(score, 66);
    }

    #[test]
    fn test_score_unknown_node() {
        let plugin = make_plugin(vec![]);
        let (score, status) = plugin.score(&PodInfo::new("pod"), "ghost");
        assert_eq!(score, 0);
        assert_eq!(status.code, Code::Error);
        assert!(status.err.contains("\"ghost\""), "{}", status.err);
    }

    #[test]
    fn test_normalize_score_keeps_scores() {
        let plugin = make_plugin(vec![]);
        let mut scores = vec![
            NodeScore {
                name: "node1".to_string(),
                score: 30,
            },
            NodeScore {
                name: "node2".to_string(),
                score: 80,
            },
        ];
        let expected = scores.clone();
        let ext = plugin.score_extension().unwrap();
        assert!(ext.normalize_score(&PodInfo::new("pod"), &mut scores).is_success());
        assert_eq!(scores, expected);
    }

    #[test]
    fn test_pre_bind() {
        let plugin = make_plugin(vec![NodeInfo::new("node1")]);
        assert!(plugin.pre_bind(&PodInfo::new("pod"), "node1").is_success());

        let status = plugin.pre_bind(&PodInfo::new("pod"), "node2");
        assert_eq!(status.code, Code::Error);
        assert_eq!(status.err, "prebind get node info error: node2");
    }

    #[test]
    fn test_bind_skips() {
        let plugin = make_plugin(vec![NodeInfo::new("node1")]);
        let status = plugin.bind(&PodInfo::new("pod"), "node1");
        assert_eq!(status.code, Code::Skip);
    }
}
