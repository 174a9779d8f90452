//! Catalog domain module.
//!
//! This crate contains the sellable catalog for a venue: products (the unit
//! of stock-keeping) and packages (bundles of component products sold as
//! one). Business rules are implemented purely as deterministic domain logic
//! (no IO, no HTTP, no storage).

pub mod package;
pub mod product;

pub use package::{Package, PackageComponent, PackageId, PackageType};
pub use product::{Product, ProductId};
