//! Load-aware scheduling for rk8s.
//!
//! Nodes carry their recently observed resource load as annotations written by
//! an external agent. This crate parses those annotations, filters out nodes
//! whose load is over threshold and scores the remaining ones by spare capacity.
//!
//! The building blocks are pure functions of `(annotations, now)`:
//! - [`metrics`] parses one annotation value into a [`LoadSample`].
//! - [`load`] holds the eligibility filter and the weighted load scorer.
//! - [`plugins`] wires both into scheduler extension points through
//!   [`RealNodeLoad`].

pub mod clock;
pub mod config;
pub mod error;
pub mod lister;
pub mod load;
pub mod metrics;
pub mod models;
pub mod plugins;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ANNOTATION_PREFIX, RealNodeLoadArgs, load_args};
pub use error::{Field, LookupError, NumberError, ParseError};
pub use lister::{NodeLister, NodeSnapshot};
pub use load::{Decision, NodeLoadView, desirability, is_eligible, score};
pub use metrics::LoadSample;
pub use plugins::real_node_load::RealNodeLoad;
