//! Value types shared across the projgen crates.
//!
//! Everything here is plain data: identifiers for build-graph nodes and
//! consolidated targets, domain-tagged file paths, platforms, and product
//! types. None of these types know how to resolve or serialize themselves
//! into a project; that lives in `projgen-generator`.

mod file_path;
mod platform;
mod product;
mod quote;
mod target_id;

pub use file_path::{FileDomain, FilePath};
pub use platform::{Environment, Os, Platform};
pub use product::ProductType;
pub use quote::quoted;
pub use target_id::{ConsolidatedTargetKey, TargetId};
