//! Node eligibility and scoring from load annotations.
//!
//! Bad telemetry is handled differently on the two paths. The filter fails
//! open: one unparseable or stale metric lets the whole node through, so a
//! broken agent can never make a node unschedulable. A confirmed overload, on
//! the other hand, rejects the node right away. The scorer never aborts; a bad
//! metric just drops out of the weighted average.

use std::collections::{BTreeMap, HashMap};

use log::{error, trace, warn};

use crate::error::ParseError;
use crate::metrics::LoadSample;

/// Reason reported for nodes rejected by the filter.
pub const LOAD_TOO_HIGH: &str = "node load is too high";

/// Score of a fully idle resource before weighting.
pub const MAX_RESOURCE_SCORE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject(String),
}

/// One load annotation of a node, as read at evaluation time.
#[derive(Debug, Clone)]
pub struct Reading<'a> {
    pub raw: &'a str,
    parsed: Result<LoadSample, ParseError>,
    now: i64,
}

impl Reading<'_> {
    /// The sample if it parses and is fresh.
    pub fn sample(&self) -> Result<LoadSample, ParseError> {
        let sample = self.parsed.clone()?;
        sample.check_fresh(self.now)?;
        Ok(sample)
    }

    /// The sample as the scorer sees it.
    ///
    /// Unparseable and stale samples are all zeros, so their weight is zero
    /// and they drop out of the node score.
    pub fn scoring_sample(&self) -> LoadSample {
        self.sample().unwrap_or_default()
    }
}

/// All load metrics of one node, keyed by annotation key.
///
/// Iterates in key order so short-circuiting decisions do not depend on the
/// order of the annotation map.
#[derive(Debug, Clone)]
pub struct NodeLoadView<'a> {
    readings: BTreeMap<&'a str, Reading<'a>>,
}

impl<'a> NodeLoadView<'a> {
    pub fn new(annotations: &'a HashMap<String, String>, prefix: &str, now: i64) -> Self {
        let readings = annotations
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, raw)| {
                let reading = Reading {
                    raw: raw.as_str(),
                    parsed: LoadSample::parse_fields(raw),
                    now,
                };
                (key.as_str(), reading)
            })
            .collect();
        Self { readings }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &Reading<'a>)> {
        self.readings.iter().map(|(key, reading)| (*key, reading))
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Decides whether a node may take new work given its load annotations.
pub fn is_eligible(annotations: &HashMap<String, String>, now: i64, prefix: &str) -> Decision {
    let view = NodeLoadView::new(annotations, prefix, now);
    for (resource, reading) in view.iter() {
        let sample = match reading.sample() {
            Ok(sample) => sample,
            Err(e) => {
                warn!("parse annotation {resource}:{} invalid: {e}", reading.raw);
                return Decision::Accept;
            }
        };
        if !sample.has_threshold() {
            continue;
        }
        if sample.value > sample.threshold {
            error!(
                "filter out node with {resource}, value/threshold: {}/{}",
                sample.value, sample.threshold
            );
            return Decision::Reject(LOAD_TOO_HIGH.to_string());
        }
    }
    Decision::Accept
}

/// Weighted average of the per-resource desirability. Lies in `[0, 100]` when
/// weights are non-negative and every usage is in `[0, 1]`; a negative usage
/// can push it above 100.
///
/// Returns `0` when the weights sum to zero, including the case of a node
/// without load annotations.
pub fn score(annotations: &HashMap<String, String>, now: i64, prefix: &str) -> f64 {
    let view = NodeLoadView::new(annotations, prefix, now);
    let mut node_score = 0.0;
    let mut weight_sum = 0.0;
    for (resource, reading) in view.iter() {
        if let Err(e) = reading.sample() {
            warn!("parse annotation {resource}:{} invalid: {e}", reading.raw);
        }
        let sample = reading.scoring_sample();
        let resource_score = desirability(sample.value);
        trace!(
            "resource: {resource}, weight: {}, resource score: {resource_score}",
            sample.weight
        );
        node_score += resource_score * MAX_RESOURCE_SCORE * sample.weight;
        weight_sum += sample.weight;
    }

    if weight_sum == 0.0 {
        warn!(
            "total weight of {} load metrics is zero, scoring node as 0",
            view.len()
        );
        return 0.0;
    }
    let score = node_score / weight_sum;
    if !score.is_finite() {
        warn!("load score {score} is not finite, scoring node as 0");
        return 0.0;
    }
    score
}

/// The more of a resource is left unused, the higher the score.
pub fn desirability(usage: f64) -> f64 {
    if usage == 0.0 || usage > 1.0 {
        return 0.0;
    }
    1.0 - usage
}
