//! Core alerting engine for vigil.
//!
//! `vigil-engine` watches a stream of parsed reverse-proxy request events in
//! a blue/green deployment and decides when to alert on two conditions:
//! traffic failing over between backend pools, and elevated 5xx error rates
//! over a sliding window of recent requests.
//!
//! The engine is deliberately synchronous and pure: it holds state (window,
//! last-seen pool, breach/cooldown records) but every decision is a function
//! of the events seen so far, the maintenance flag, and a caller-supplied
//! clock. Log tailing and alert delivery live in sibling crates.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use vigil_engine::{
//!     parse_line, AlertPolicy, Observation, PolicyConfig, PoolTracker, SlidingWindow,
//! };
//!
//! let mut window = SlidingWindow::new(4).unwrap();
//! let mut tracker = PoolTracker::new("blue");
//! let mut policy = AlertPolicy::new(PolicyConfig {
//!     error_rate_threshold: 50.0,
//!     cooldown_secs: 300,
//! });
//!
//! let event = parse_line("pool:blue release:v1 upstream_status:502 upstream:10.0.0.1:8080").unwrap();
//! let failover = tracker.observe(&event.pool);
//! window.record(event);
//!
//! let alerts = policy.evaluate(
//!     &Observation {
//!         failover,
//!         error_rate: window.error_rate(),
//!         window_len: window.len(),
//!         maintenance_active: false,
//!     },
//!     Utc::now(),
//! );
//! assert_eq!(alerts.len(), 1); // 100% > 50% -> breach
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod gate;
pub mod parser;
pub mod policy;
pub mod tracker;
pub mod types;
pub mod window;

// Re-export main types at crate root
pub use error::{EngineError, ParseError, Result};
pub use gate::MaintenanceGate;
pub use parser::parse_line;
pub use policy::{AlertPolicy, Observation, PolicyConfig};
pub use tracker::PoolTracker;
pub use types::{AlertEvent, AlertKind, ErrorRateState, FailoverSignal, RequestEvent};
pub use window::SlidingWindow;
