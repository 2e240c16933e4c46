//! In-memory reference device.
//!
//! Stores texels in CPU memory, so the manager's lifecycle can be exercised
//! without a GPU. Every creation, update and drop is recorded in a shared
//! [`EventLog`], together with whether the device lock was held at the time.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use restex_core::{
    copy_region, required_size, tight_strides, Error, Guid, Result, TextureLayout, UpdateRegion,
};
use tracing::debug;

use crate::device::{DeviceContext, DeviceLock, ResourceTexture};

/// Counter for generating unique texture ids.
static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Lock shared by every device created with [`SoftwareDevice::shared`].
static RUNTIME_LOCK: Lazy<Arc<SoftwareLock>> = Lazy::new(SoftwareLock::new);

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// SoftwareLock
// ---------------------------------------------------------------------------

/// Non-reentrant enter/leave lock built on a mutex and condition variable.
#[derive(Debug, Default)]
pub struct SoftwareLock {
    held: Mutex<bool>,
    released: Condvar,
    entries: AtomicU64,
}

impl SoftwareLock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The process-wide lock used by [`SoftwareDevice::shared`].
    pub fn runtime() -> Arc<Self> {
        RUNTIME_LOCK.clone()
    }

    pub fn is_held(&self) -> bool {
        *lock_ignoring_poison(&self.held)
    }

    /// Number of times the lock has been entered.
    pub fn entries(&self) -> u64 {
        self.entries.load(Ordering::Relaxed)
    }
}

impl DeviceLock for SoftwareLock {
    fn enter(&self) {
        let mut held = lock_ignoring_poison(&self.held);
        while *held {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *held = true;
        self.entries.fetch_add(1, Ordering::Relaxed);
    }

    fn leave(&self) {
        *lock_ignoring_poison(&self.held) = false;
        self.released.notify_one();
    }
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// Something the reference device observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    TextureCreated {
        texture: u64,
        id: Option<Guid>,
        bytes: usize,
        lock_held: bool,
    },
    TextureUpdated {
        texture: u64,
        lock_held: bool,
    },
    TextureDropped {
        texture: u64,
    },
    DeviceDropped,
}

/// Append-only record of [`DeviceEvent`]s, shared by a device and its
/// textures.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<DeviceEvent>>,
}

impl EventLog {
    fn push(&self, event: DeviceEvent) {
        lock_ignoring_poison(&self.events).push(event);
    }

    pub fn events(&self) -> Vec<DeviceEvent> {
        lock_ignoring_poison(&self.events).clone()
    }

    pub fn creations(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, DeviceEvent::TextureCreated { .. }))
            .count()
    }
}

// ---------------------------------------------------------------------------
// SoftwareTexture
// ---------------------------------------------------------------------------

/// A resource texture held in tightly packed CPU memory.
#[derive(Debug)]
pub struct SoftwareTexture {
    texture: u64,
    id: Option<Guid>,
    layout: TextureLayout,
    strides: Vec<u32>,
    texels: Mutex<Vec<u8>>,
    lock: Arc<SoftwareLock>,
    log: Arc<EventLog>,
}

impl SoftwareTexture {
    pub fn texture(&self) -> u64 {
        self.texture
    }

    pub fn id(&self) -> Option<Guid> {
        self.id
    }

    pub fn layout(&self) -> &TextureLayout {
        &self.layout
    }

    /// Densely packed strides of the stored texels.
    pub fn strides(&self) -> &[u32] {
        &self.strides
    }

    pub fn texels(&self) -> Vec<u8> {
        lock_ignoring_poison(&self.texels).clone()
    }
}

impl ResourceTexture for SoftwareTexture {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn update(&self, region: &UpdateRegion, strides: &[u32], data: &[u8]) -> Result<()> {
        let mut texels = lock_ignoring_poison(&self.texels);
        copy_region(
            &mut texels,
            &self.strides,
            data,
            strides,
            region,
            self.layout.element_size(),
        )?;
        self.log.push(DeviceEvent::TextureUpdated {
            texture: self.texture,
            lock_held: self.lock.is_held(),
        });
        Ok(())
    }
}

impl Drop for SoftwareTexture {
    fn drop(&mut self) {
        self.log.push(DeviceEvent::TextureDropped {
            texture: self.texture,
        });
    }
}

// ---------------------------------------------------------------------------
// SoftwareDevice
// ---------------------------------------------------------------------------

/// Reference [`DeviceContext`] backed by CPU memory.
#[derive(Debug)]
pub struct SoftwareDevice {
    lock: Arc<SoftwareLock>,
    log: Arc<EventLog>,
    fail_next_create: Mutex<Option<Error>>,
}

impl SoftwareDevice {
    /// A device with its own private lock.
    pub fn new() -> Arc<Self> {
        Self::with_lock(SoftwareLock::new())
    }

    /// A device using the process-wide [`SoftwareLock::runtime`] lock.
    pub fn shared() -> Arc<Self> {
        Self::with_lock(SoftwareLock::runtime())
    }

    pub fn with_lock(lock: Arc<SoftwareLock>) -> Arc<Self> {
        Arc::new(Self {
            lock,
            log: Arc::new(EventLog::default()),
            fail_next_create: Mutex::new(None),
        })
    }

    pub fn lock(&self) -> Arc<SoftwareLock> {
        self.lock.clone()
    }

    /// The event log; it outlives the device so drops can be observed.
    pub fn log(&self) -> Arc<EventLog> {
        self.log.clone()
    }

    /// Make the next `create_resource_texture` call fail with `err`.
    pub fn fail_next_create(&self, err: Error) {
        *lock_ignoring_poison(&self.fail_next_create) = Some(err);
    }
}

impl DeviceContext for SoftwareDevice {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn device_lock(&self) -> Result<Arc<dyn DeviceLock>> {
        Ok(self.lock.clone())
    }

    fn create_resource_texture(
        &self,
        id: Option<&Guid>,
        layout: &TextureLayout,
        data: &[u8],
        strides: &[u32],
    ) -> Result<Arc<dyn ResourceTexture>> {
        if let Some(err) = lock_ignoring_poison(&self.fail_next_create).take() {
            return Err(err);
        }

        let element_size = layout.element_size();
        let tight = tight_strides(element_size, layout.extents())?;
        let size = required_size(element_size, layout.extents(), &tight)? as usize;

        let mut texels = Vec::new();
        texels.try_reserve_exact(size)?;
        texels.resize(size, 0);
        copy_region(
            &mut texels,
            &tight,
            data,
            strides,
            &UpdateRegion::whole(layout.extents())?,
            element_size,
        )?;

        let texture = NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed);
        self.log.push(DeviceEvent::TextureCreated {
            texture,
            id: id.copied(),
            bytes: size,
            lock_held: self.lock.is_held(),
        });
        debug!(texture, bytes = size, "software texture created");

        Ok(Arc::new(SoftwareTexture {
            texture,
            id: id.copied(),
            layout: *layout,
            strides: tight,
            texels: Mutex::new(texels),
            lock: self.lock.clone(),
            log: self.log.clone(),
        }))
    }
}

impl Drop for SoftwareDevice {
    fn drop(&mut self) {
        self.log.push(DeviceEvent::DeviceDropped);
    }
}
