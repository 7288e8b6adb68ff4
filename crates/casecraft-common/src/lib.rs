//! Casecraft-Common: Shared types and error handling.
//!
//! This crate provides the pieces used by both the metadata store and the
//! HTTP server:
//!
//! - **Typed IDs**: [`ImageId`], the surrogate key of an image record
//! - **Error Handling**: the common [`Error`] taxonomy and [`Result`] alias
//!
//! # Examples
//!
//! ```
//! use casecraft_common::{Error, ImageId, Result};
//!
//! fn lookup(id: ImageId) -> Result<()> {
//!     Err(Error::not_found(format!("image {}", id)))
//! }
//!
//! assert!(lookup(ImageId::from(7)).unwrap_err().is_not_found());
//! ```

pub mod error;
pub mod ids;

pub use error::{Error, Result};
pub use ids::*;
