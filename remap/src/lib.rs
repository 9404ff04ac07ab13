//! Remap is a declarative CSV-to-CSV mapping engine. A template declares an
//! output schema, per-column source mappings, pipelines of named text
//! transforms, optional cross-file key/value lookups and a missing-value
//! policy; the executor applies a template to an input table to produce an
//! output table.
//!
//! This crate provides an API that allows for embedding Remap into another
//! application. For Remap's command line interface, see the `remap-cli`
//! crate.

mod editor;
mod error;
mod fs;
mod lookup;
mod mapper;
mod registry;
mod table;
mod template;
mod transform;

pub use editor::{list_templates, load_text, save, skeleton, slugify, summarize, SavedTemplate};
pub use error::Error;
pub use lookup::{LookupMap, Lookups};
pub use mapper::{apply_template, missing_source_columns};
pub use registry::TemplateRegistry;
pub use table::Table;
pub use template::{validate, ColumnSpec, LookupSpec, Map, MissingPolicy, Template, Validation};
pub use transform::Transform;
