//! The two capability interfaces a manager exposes.
//!
//! [`TextureManager`] is what effect authors call to supply content.
//! [`TextureManagerInternal`] is what the effect host calls to connect the
//! manager to a device and fetch the realized texture. One
//! [`crate::ResourceTextureManager`] behind one `Arc` implements both, so
//! either trait object keeps the same instance alive.

use std::sync::Arc;

use restex_core::{Guid, Outcome, ResourceTextureProperties, Result};

use crate::device::{DeviceContext, ResourceTexture};

/// Content-facing interface.
pub trait TextureManager: Send + Sync {
    /// Supply the layout and initial content of the texture.
    ///
    /// With no device attached the bytes are validated and staged. With a
    /// device attached the texture is created on it directly. `data` is
    /// required; `strides` is required when there is more than one dimension.
    /// Fails with [`restex_core::Error::NotValidState`] if content was already
    /// supplied.
    fn initialize(
        &self,
        id: Option<&Guid>,
        props: &ResourceTextureProperties<'_>,
        data: Option<&[u8]>,
        strides: Option<&[u32]>,
    ) -> Result<Outcome>;

    /// Overwrite a box of the texture, or all of it when both bounds are
    /// absent.
    ///
    /// Only a realized texture can be updated; staged content reports
    /// [`restex_core::Error::NotImplemented`].
    fn update(
        &self,
        minimum: Option<&[u32]>,
        maximum: Option<&[u32]>,
        strides: &[u32],
        dimensions: u32,
        data: &[u8],
    ) -> Result<Outcome>;
}

/// Host-facing interface.
pub trait TextureManagerInternal: Send + Sync {
    /// Attach the device context. The first call wins; later calls return
    /// [`Outcome::AlreadyInitialized`] and keep the stored context.
    fn attach_device_context(
        &self,
        context: Arc<dyn DeviceContext>,
        expected_dimensions: Option<u32>,
    ) -> Result<Outcome>;

    /// The device-backed texture, materializing staged content on first use.
    fn realized_resource(&self) -> Result<Arc<dyn ResourceTexture>>;
}
