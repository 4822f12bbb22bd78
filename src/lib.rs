//! Configuration-driven HTML extraction
//!
//! Applies a declarative selector schema to a parsed HTML page and returns a
//! structured record:
//! - CSS and XPath rules, extracting text or an attribute
//! - single or `multiple` cardinality
//! - `group` rules whose container matches scope a nested schema
//!
//! Fetching, sessions and output formatting belong to the caller; this crate
//! takes an HTML string and a schema and hands back JSON-shaped data.

pub mod batch;
pub mod config;
pub mod document;
pub mod error;
pub mod extractors;
pub mod ffi;
pub mod schema;
pub mod validator;

pub use batch::*;
pub use config::*;
pub use document::*;
pub use error::*;
pub use extractors::*;
pub use ffi::*;
pub use schema::*;
pub use validator::*;
