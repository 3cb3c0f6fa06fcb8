//! Generator inputs for projgen.
//!
//! This crate provides:
//! - Generator configuration format (`projgen.toml`)
//! - Build-graph snapshot parsing (JSON)
//!
//! # Example
//!
//! ```toml
//! # projgen.toml
//! [project]
//! name = "Foo"
//! workspace_output_path = "Foo.xcodeproj"
//!
//! [directories]
//! workspace = "/Users/me/foo"
//! external = "/private/var/tmp/bazel/external"
//! generated = "/private/var/tmp/bazel/bazel-out"
//!
//! [schemes]
//! autogeneration_mode = "auto"
//! ```

mod config;
mod error;
mod graph;

pub use config::{
    CustomSchemeConfig, DirectoriesConfig, GeneratorConfig, ProjectConfig,
    SchemeAutogenerationMode, SchemesConfig,
};
pub use error::{BuildError, Result};
pub use graph::{BuildGraph, ExtensionPointIdentifier, LinkerInputs, Product, Target};
