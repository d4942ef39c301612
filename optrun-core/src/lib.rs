//! Optrun Core
//!
//! Shared types for the optrun client:
//! - Response model: loosely-typed API responses (status code + JSON-or-text body)
//! - Documents: experiment/optimizer input loading from YAML or JSON files

pub mod document;
pub mod response;

pub use document::{DocumentError, FILE_TYPE_MSG, load_document};
pub use response::{ApiResponse, ResponseBody};
