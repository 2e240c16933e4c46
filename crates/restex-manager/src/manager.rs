//! The resource texture manager and its lifecycle.
//!
//! ```text
//!   Empty ──initialize──▶ StagedNoDevice ──attach──▶ StagedWithDevice
//!     │                                                    │
//!   attach                                          realized_resource
//!     ▼                                                    ▼
//!   AwaitingData ─────────────initialize──────────────▶ Realized
//! ```
//!
//! Every transition runs under the instance mutex. Anything that touches the
//! device context or the realized texture additionally runs inside the
//! device-wide critical section (see [`crate::sync`]).

use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use restex_core::{
    validate_buffer, Error, Guid, Outcome, ResourceTextureProperties, Result, TextureLayout,
    UpdateRegion,
};
use tracing::{debug, error, warn};

use crate::device::{DeviceContext, ResourceTexture};
use crate::interface::{TextureManager, TextureManagerInternal};
use crate::staging::StagingStore;
use crate::sync::DeviceBinding;

/// Observable lifecycle phase of a manager.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    /// No content, no device.
    Empty,
    /// Device attached, no content yet.
    AwaitingData,
    StagedNoDevice,
    StagedWithDevice,
    Realized,
}

enum Contents {
    Empty,
    Staged(StagingStore),
    Realized(Arc<dyn ResourceTexture>),
}

struct ManagerState {
    layout: Option<TextureLayout>,
    contents: Contents,
    device: Option<DeviceBinding>,
    expected_dimensions: Option<u32>,
}

impl ManagerState {
    fn phase(&self) -> Phase {
        match (&self.contents, self.device.is_some()) {
            (Contents::Empty, false) => Phase::Empty,
            (Contents::Empty, true) => Phase::AwaitingData,
            (Contents::Staged(_), false) => Phase::StagedNoDevice,
            (Contents::Staged(_), true) => Phase::StagedWithDevice,
            (Contents::Realized(_), _) => Phase::Realized,
        }
    }
}

impl Drop for ManagerState {
    // Release order: realized texture, device context, staged buffers,
    // layout, device lock.
    fn drop(&mut self) {
        let staged = match mem::replace(&mut self.contents, Contents::Empty) {
            Contents::Realized(resource) => {
                match &self.device {
                    Some(binding) => binding.locked(|_| drop(resource)),
                    None => drop(resource),
                }
                None
            }
            Contents::Staged(store) => Some(store),
            Contents::Empty => None,
        };

        let lock = self.device.take().map(DeviceBinding::release);
        drop(staged);
        self.layout = None;
        drop(lock);
    }
}

/// A resource texture manager.
///
/// Create one with [`ResourceTextureManager::new`] and share it as
/// `Arc<dyn TextureManager>` / `Arc<dyn TextureManagerInternal>`; both views
/// keep the same instance alive.
pub struct ResourceTextureManager {
    state: Mutex<ManagerState>,
}

impl Default for ResourceTextureManager {
    fn default() -> Self {
        Self {
            state: Mutex::new(ManagerState {
                layout: None,
                contents: Contents::Empty,
                device: None,
                expected_dimensions: None,
            }),
        }
    }
}

impl std::fmt::Debug for ResourceTextureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_state();
        f.debug_struct("ResourceTextureManager")
            .field("phase", &state.phase())
            .field("layout", &state.layout)
            .finish()
    }
}

impl ResourceTextureManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // Transitions never leave torn state across a panic, so a poisoned
    // mutex still guards consistent data.
    fn lock_state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> Phase {
        self.lock_state().phase()
    }

    /// Layout supplied by `initialize`, if any.
    pub fn layout(&self) -> Option<TextureLayout> {
        self.lock_state().layout
    }

    /// Copy of the staged bytes, or `None` once realized (or before any data).
    pub fn staged_data(&self) -> Option<Vec<u8>> {
        match &self.lock_state().contents {
            Contents::Staged(store) => Some(store.data().to_vec()),
            _ => None,
        }
    }

    /// Identifier supplied with staged content.
    pub fn staged_token(&self) -> Option<Guid> {
        match &self.lock_state().contents {
            Contents::Staged(store) => store.token().copied(),
            _ => None,
        }
    }
}

fn resolve_strides<'a>(layout: &TextureLayout, strides: Option<&'a [u32]>) -> Result<&'a [u32]> {
    let needed = layout.dimensions() as usize - 1;
    match strides {
        None if needed == 0 => Ok(&[]),
        None => Err(Error::NullPointer),
        Some(strides) if strides.len() < needed => Err(Error::InvalidArgument),
        Some(strides) => Ok(&strides[..needed]),
    }
}

impl TextureManager for ResourceTextureManager {
    fn initialize(
        &self,
        id: Option<&Guid>,
        props: &ResourceTextureProperties<'_>,
        data: Option<&[u8]>,
        strides: Option<&[u32]>,
    ) -> Result<Outcome> {
        let data = data.ok_or(Error::NullPointer)?;
        let layout = TextureLayout::new(props)?;
        let strides = resolve_strides(&layout, strides)?;
        validate_buffer(layout.element_size(), layout.extents(), strides, data.len())?;

        let mut guard = self.lock_state();
        let state = &mut *guard;

        if !matches!(state.contents, Contents::Empty) {
            return Err(Error::NotValidState);
        }
        if let Some(expected) = state.expected_dimensions {
            if expected != layout.dimensions() {
                warn!(
                    expected,
                    dimensions = layout.dimensions(),
                    "layout contradicts the expected dimension count"
                );
                return Err(Error::InvalidArgument);
            }
        }

        match &state.device {
            Some(binding) => {
                let contents = &mut state.contents;
                binding.locked(|context| -> Result<()> {
                    let resource = context.create_resource_texture(id, &layout, data, strides)?;
                    *contents = Contents::Realized(resource);
                    Ok(())
                })?;
            }
            None => state.contents = Contents::Staged(StagingStore::stage(id, data, strides)?),
        }
        state.layout = Some(layout);

        debug!(
            phase = ?state.phase(),
            dimensions = layout.dimensions(),
            bytes = data.len(),
            "resource texture initialized"
        );
        Ok(Outcome::Applied)
    }

    fn update(
        &self,
        minimum: Option<&[u32]>,
        maximum: Option<&[u32]>,
        strides: &[u32],
        dimensions: u32,
        data: &[u8],
    ) -> Result<Outcome> {
        let guard = self.lock_state();
        let state = &*guard;

        let layout = match (&state.layout, &state.contents) {
            (Some(layout), Contents::Staged(_) | Contents::Realized(_)) => layout,
            _ => return Err(Error::NotValidState),
        };

        let region = UpdateRegion::new(layout.extents(), dimensions, minimum, maximum)?;
        region.validate(layout.element_size(), strides, data.len())?;
        let strides = &strides[..dimensions as usize - 1];

        match (&state.contents, &state.device) {
            (Contents::Realized(resource), Some(binding)) => {
                binding.locked(|_| resource.update(&region, strides, data))?;
                debug!(
                    minimum = ?region.minimum(),
                    extents = ?region.extents(),
                    "resource texture updated"
                );
                Ok(Outcome::Applied)
            }
            // Updating staged bytes before a device exists is not supported.
            (Contents::Staged(_), _) => Err(Error::NotImplemented),
            _ => Err(Error::NotValidState),
        }
    }
}

impl TextureManagerInternal for ResourceTextureManager {
    fn attach_device_context(
        &self,
        context: Arc<dyn DeviceContext>,
        expected_dimensions: Option<u32>,
    ) -> Result<Outcome> {
        let mut guard = self.lock_state();
        let state = &mut *guard;

        if let Some(binding) = &state.device {
            if !binding.holds(&context) {
                warn!("a different device context was offered; keeping the first one");
            }
            return Ok(Outcome::AlreadyInitialized);
        }

        if let Some(expected) = expected_dimensions {
            if !(1..=restex_core::ffi::MAX_DIMENSIONS).contains(&expected) {
                return Err(Error::InvalidArgument);
            }
            if let Some(layout) = &state.layout {
                if layout.dimensions() != expected {
                    warn!(
                        expected,
                        dimensions = layout.dimensions(),
                        "staged layout contradicts the expected dimension count"
                    );
                    return Err(Error::InvalidArgument);
                }
            }
        }

        state.device = Some(DeviceBinding::acquire(context)?);
        if expected_dimensions.is_some() {
            state.expected_dimensions = expected_dimensions;
        }

        debug!(phase = ?state.phase(), "device context attached");
        Ok(Outcome::Applied)
    }

    fn realized_resource(&self) -> Result<Arc<dyn ResourceTexture>> {
        let mut guard = self.lock_state();
        let ManagerState {
            layout,
            contents,
            device,
            ..
        } = &mut *guard;

        let binding = device.as_ref().ok_or(Error::NotValidState)?;
        binding.locked(|context| {
            let resource = match &*contents {
                Contents::Realized(resource) => return Ok(resource.clone()),
                Contents::Empty => return Err(Error::NotValidState),
                Contents::Staged(store) => {
                    let layout = layout.as_ref().ok_or(Error::NotValidState)?;
                    debug!(bytes = store.byte_count(), "materializing staged resource texture");
                    context
                        .create_resource_texture(store.token(), layout, store.data(), store.strides())
                        .map_err(|err| {
                            error!(%err, "materializing staged resource texture failed");
                            err
                        })?
                }
            };

            // Dropping the staged contents frees the CPU copy.
            *contents = Contents::Realized(resource.clone());
            debug!("resource texture realized");
            Ok(resource)
        })
    }
}
