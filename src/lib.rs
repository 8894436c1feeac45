//! # Flow Atlas
//!
//! Workspace facade over the flow analysis crates:
//!
//! - [`flow_math`]: array shapes, growth rates, error metrics and baseline
//!   forecasters
//! - [`flow_analysis`]: flow records, node catalogs, tensor reconstruction,
//!   aggregation, ranking and corridor analysis
//!
//! ## Example
//!
//! ```
//! use flow_atlas_workspace::analysis::{build_tensor, FillPolicy};
//! use flow_atlas_workspace::analysis::data::{FlowRecord, Period};
//! use flow_atlas_workspace::analysis::utils::date_parser::parse_instant;
//!
//! let t0 = parse_instant("2022-01-11T08:00:00Z").unwrap();
//! let records = vec![FlowRecord::new(t0, 1, 2, 10.0, "state").unwrap()];
//! let period = Period::parse("2022-01-11", "2022-01-12").unwrap();
//!
//! let tensor = build_tensor(&records, &period, FillPolicy::Zero);
//! assert_eq!((tensor.t(), tensor.n()), (1, 2));
//! assert_eq!(tensor.get(0, 0, 1), Some(10.0));
//! assert_eq!(tensor.get(0, 1, 0), Some(0.0));
//! ```

pub use flow_analysis as analysis;
pub use flow_math as math;

/// Version of the workspace facade
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
