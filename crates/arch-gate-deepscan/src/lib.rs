//! # arch-gate-deepscan
//!
//! Finds dependency-rule violations hidden behind dependency injection.
//!
//! A file may import only what its component is allowed to, yet receive a
//! concrete type from a forbidden component through an abstract parameter
//! (a "gate"). This crate walks usage trees produced by a language
//! front-end and reports every such injection:
//!
//! - [`UsageScanner`] trait for pluggable front-ends
//! - [`JsonUsageScanner`] serving usage trees exported as JSON
//! - [`DeepScan`] engine checking components on a bounded worker pool
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use arch_gate_core::{PlainRenderer, WalkProjectFilesResolver};
//! use arch_gate_deepscan::{DeepScan, JsonUsageScanner};
//! use tokio_util::sync::CancellationToken;
//!
//! let scanner = JsonUsageScanner::from_file("usages.json".as_ref(), spec.root())?;
//! let engine = DeepScan::new(
//!     Arc::new(WalkProjectFilesResolver::new()),
//!     Arc::new(PlainRenderer::new()),
//!     Arc::new(scanner),
//! );
//! let result = engine.check(Arc::new(spec), CancellationToken::new()).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod collector;
pub mod engine;
pub mod json_scanner;
pub mod usage;

pub use collector::{Progress, ViolationCollector};
pub use engine::{workers_count, DeepScan, DeepScanError};
pub use json_scanner::JsonUsageScanner;
pub use usage::{
    Criteria, CriteriaBuilder, CriteriaError, Gate, Implementation, Injector, ScanError, Target,
    TargetDefinition, Usage, UsageScanner,
};
