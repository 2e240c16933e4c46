//! Resource texture manager.
//!
//! A [`ResourceTextureManager`] accepts the layout and content of a 1-3
//! dimensional lookup texture before or after a device exists. Content
//! supplied early is staged in CPU memory and realized on the device the
//! first time the host asks for it; content supplied after a device is
//! attached is realized immediately.
//!
//! - [`interface`] defines the two capability traits callers hold.
//! - [`device`] defines what the host provides: a device context, its lock,
//!   and the textures it creates.
//! - [`object`] exposes the manager as a reference-counted dual-interface
//!   object over a C ABI.
//! - [`software`] is a CPU-memory device for hosts without a GPU and for
//!   tests.

pub mod device;
pub mod interface;
pub mod manager;
pub mod object;
pub mod software;
pub mod staging;
pub mod sync;

#[cfg(target_os = "windows")]
pub mod windows_interop;

pub use device::{DeviceContext, DeviceLock, ResourceTexture};
pub use interface::{TextureManager, TextureManagerInternal};
pub use manager::{Phase, ResourceTextureManager};
pub use object::{
    create_resource_texture_manager, DeviceContextHandle, ManagerObject, ResourceTextureHandle,
};
pub use software::{DeviceEvent, SoftwareDevice, SoftwareLock, SoftwareTexture};
