//! # Flow Analysis
//!
//! Ranked, aggregated and compared views of origin/destination (OD) flow
//! between geographic nodes.
//!
//! ## Features
//!
//! - Dense `T×N×N` tensors and `N×N` relation matrices from sparse records,
//!   with a configurable fill policy for missing cells
//! - Daily or period-total aggregation by node or province, sending or
//!   arriving side
//! - Dense ranking with deterministic tie order
//! - Top-K corridors, split into intra- and inter-province classes
//! - Growth rates, RMSE/MAE/MAPE and baseline forecasts via [`flow_math`]
//!
//! ## Quick Start
//!
//! ```rust
//! use flow_analysis::data::{AggregationRequest, DateMode, FlowRecord, GeoNode, Period};
//! use flow_analysis::utils::date_parser::parse_instant;
//! use flow_analysis::{FlowAnalyzer, InMemoryCatalog, InMemorySource};
//!
//! # fn main() -> flow_analysis::Result<()> {
//! let t0 = parse_instant("2022-01-11T00:00:00Z")?;
//! let source = InMemorySource::new(vec![
//!     FlowRecord::new(t0, 1, 2, 10.0, "state")?,
//!     FlowRecord::new(t0, 2, 1, 4.0, "state")?,
//! ]);
//! let catalog = InMemoryCatalog::new(vec![
//!     GeoNode::city(1, "Nanjing", "Jiangsu"),
//!     GeoNode::city(2, "Hangzhou", "Zhejiang"),
//! ]);
//! let analyzer = FlowAnalyzer::new(source, catalog);
//!
//! let period = Period::parse("2022-01-11", "2022-01-12")?;
//! let request = AggregationRequest::new("daily", period).with_date_mode(DateMode::Total);
//! let report = analyzer.province_flow(&request)?;
//!
//! assert_eq!(report.data[0].group_key, "Jiangsu");
//! assert_eq!(report.data[0].rank, 1);
//! # Ok(())
//! # }
//! ```

pub mod aggregation;
pub mod analyzer;
pub mod catalog;
pub mod config;
pub mod corridors;
pub mod data;
pub mod error;
pub mod ranking;
pub mod source;
pub mod tensor;
pub mod utils;

// Re-export commonly used types
pub use crate::aggregation::{aggregate, aggregate_tensor, AggregatedFlow, DataQuality};
pub use crate::analyzer::{CorridorRequest, FlowAnalyzer, FlowReport};
pub use crate::catalog::{InMemoryCatalog, NodeCatalog};
pub use crate::config::AnalysisConfig;
pub use crate::corridors::{top_city_corridors, top_province_corridors, CorridorRecord};
pub use crate::error::{AnalysisError, Result};
pub use crate::ranking::rank;
pub use crate::source::{FlowSource, InMemorySource};
pub use crate::tensor::{build_matrix, build_tensor, FillPolicy, FlowTensor};
pub use flow_math::{forecast, growth, metrics, MetricsResult, NumArray};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
