//! Core types for resource texture management.
//!
//! - [`ffi`] holds the binary-protocol constants (status codes, interface
//!   ids, format codes) and C-repr structs.
//! - [`status`] maps those codes onto [`Error`] / [`Outcome`].
//! - [`format`] describes element formats and validates a [`TextureLayout`].
//! - [`layout`] validates strided 1-3 dimensional buffers and copies update
//!   regions.
//! - [`logging`] installs a `tracing` subscriber.

pub mod ffi;
pub mod format;
pub mod layout;
pub mod logging;
pub mod status;

pub use ffi::{Guid, HRESULT};
pub use format::{
    BufferPrecision, ChannelDepth, ExtendMode, Filter, ResourceTextureProperties, TextureLayout,
};
pub use layout::{copy_region, required_size, tight_strides, validate_buffer, UpdateRegion};
pub use status::{check, to_hresult, Error, Outcome, Result, Status};
