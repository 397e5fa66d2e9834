//! This module holds typed parameters for various endpoint inputs.
//!
//! By using typed parameters, inputs are validated (by type) and correctly
//! formatted before they reach the domain layer. Bodies that don't deserialize
//! are rejected by axum's `Json` extractor, and query strings that don't parse
//! by its `Query` extractor with 400 Bad Request.

pub(crate) mod post;
pub(crate) mod user;
