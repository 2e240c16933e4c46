//! CPU-side copy of texture content awaiting a device.

use restex_core::{Guid, Result};

/// Owned copy of everything `Initialize` received, kept until the texture is
/// materialized on a device.
///
/// Buffers are reserved fallibly, so an allocation failure surfaces as
/// [`restex_core::Error::OutOfMemory`]. Anything reserved before the failure
/// is dropped on the way out.
#[derive(Debug)]
pub struct StagingStore {
    token: Option<Guid>,
    data: Vec<u8>,
    strides: Vec<u32>,
}

impl StagingStore {
    /// Copy the caller's buffers. `strides` is empty for one-dimensional data.
    pub fn stage(token: Option<&Guid>, data: &[u8], strides: &[u32]) -> Result<Self> {
        let mut owned_data = Vec::new();
        owned_data.try_reserve_exact(data.len())?;
        owned_data.extend_from_slice(data);

        let mut owned_strides = Vec::new();
        owned_strides.try_reserve_exact(strides.len())?;
        owned_strides.extend_from_slice(strides);

        Ok(Self {
            token: token.copied(),
            data: owned_data,
            strides: owned_strides,
        })
    }

    pub fn token(&self) -> Option<&Guid> {
        self.token.as_ref()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn byte_count(&self) -> usize {
        self.data.len()
    }

    pub fn strides(&self) -> &[u32] {
        &self.strides
    }
}
