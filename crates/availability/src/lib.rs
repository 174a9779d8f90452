//! Package availability derived from component stock.
//!
//! Everything here is pure computation over in-memory data: the component
//! graph, the per-package availability calculator, and the reverse impact
//! lookup. Reading balances out of storage and keeping results fresh is the
//! orchestration layer's job.

pub mod calculator;
pub mod graph;
pub mod impact;

pub use calculator::{AvailabilityResult, ComponentAvailability, calculate, calculate_many};
pub use graph::PackageComponentGraph;
pub use impact::{PackageImpact, ProductImpact, product_impact};
