//! Host collaborator interfaces.
//!
//! The host runtime owns the real device. The manager only sees it through
//! these traits: a [`DeviceContext`] that can create resource textures and
//! hand out its runtime-wide [`DeviceLock`], and the [`ResourceTexture`]
//! objects it creates. Whatever status a host call returns is passed back to
//! the manager's caller unchanged.

use std::any::Any;
use std::sync::Arc;

use restex_core::{Guid, Result, TextureLayout, UpdateRegion};

/// Runtime-wide mutual exclusion shared by every object touching one device.
///
/// `enter` blocks until the section is available. Calls are always paired;
/// use [`crate::sync::DeviceLockGuard`] rather than calling these directly.
pub trait DeviceLock: Send + Sync {
    fn enter(&self);
    fn leave(&self);
}

/// A device-resident resource texture.
pub trait ResourceTexture: Send + Sync {
    /// Downcast to a concrete type. Used by hosts and tests to reach
    /// implementation-specific state.
    fn as_any(&self) -> &dyn Any;

    /// Overwrite `region` with the contents of a caller buffer.
    ///
    /// `region` has already been checked against the texture's extents and
    /// `data` against the region's own shape and `strides`.
    fn update(&self, region: &UpdateRegion, strides: &[u32], data: &[u8]) -> Result<()>;
}

/// The host device / effect context.
pub trait DeviceContext: Send + Sync {
    /// Downcast to a concrete type.
    fn as_any(&self) -> &dyn Any;

    /// The runtime-wide lock guarding this device's objects.
    ///
    /// Called once per manager, when the context is first attached.
    fn device_lock(&self) -> Result<Arc<dyn DeviceLock>>;

    /// Create a resource texture from a validated layout and matching bytes.
    ///
    /// `id`, when present, lets the host share one texture between effects.
    /// `strides` has `layout.dimensions() - 1` entries.
    fn create_resource_texture(
        &self,
        id: Option<&Guid>,
        layout: &TextureLayout,
        data: &[u8],
        strides: &[u32],
    ) -> Result<Arc<dyn ResourceTexture>>;
}

/// Compare two contexts by identity, ignoring vtable pointers.
pub(crate) fn same_context(a: &Arc<dyn DeviceContext>, b: &Arc<dyn DeviceContext>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}
