//! Resource documents and their value model.
//!
//! - [`value`]: the order-preserving map-view handed to expressions
//! - [`resid`]: group/version/kind and namespace identity rules
//! - [`resource`]: the [`Document`] wrapper with typed accessors
//! - [`parser`]: YAML stream parsing and printing

pub mod parser;
pub mod resid;
pub mod resource;
pub mod value;

pub use resid::{Gvk, ResId};
pub use resource::{Document, DocumentError, StringMap};
pub use value::{Number, Value};
