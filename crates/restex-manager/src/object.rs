//! Binary dual-interface manager object.
//!
//! One heap allocation answers to two interface identities. Its head holds
//! two vtable pointers: the primary interface is the object base, the
//! secondary interface is the base plus [`SECONDARY_OFFSET`]. Entry points
//! reached through the secondary vtable subtract that offset to get back to
//! the base. Both identities share one intrusive reference count, and the
//! allocation is freed inside the `Release` that takes the count to zero.
//!
//! Device contexts and realized textures cross this boundary as opaque boxed
//! handles ([`DeviceContextHandle`], [`ResourceTextureHandle`]).

#![allow(improper_ctypes_definitions)]

use std::ffi::c_void;
use std::mem::offset_of;
use std::ptr;
use std::slice;
use std::sync::atomic::{fence, AtomicU32, Ordering};
use std::sync::Arc;

use restex_core::ffi::*;
use restex_core::format::{decode_channels, decode_extend_mode, decode_filter, decode_precision};
use restex_core::{to_hresult, Error, ExtendMode, Outcome, ResourceTextureProperties, Result};
use tracing::trace;

use crate::device::{DeviceContext, ResourceTexture};
use crate::interface::{TextureManager, TextureManagerInternal};
use crate::manager::ResourceTextureManager;

// ---------------------------------------------------------------------------
// Vtables
// ---------------------------------------------------------------------------

pub type QueryInterfaceFn =
    unsafe extern "system" fn(this: *mut c_void, riid: *const Guid, ppv: *mut *mut c_void) -> HRESULT;
pub type AddRefFn = unsafe extern "system" fn(this: *mut c_void) -> u32;
pub type ReleaseFn = unsafe extern "system" fn(this: *mut c_void) -> u32;

/// Primary interface: content supply.
#[repr(C)]
pub struct PrimaryVtbl {
    pub query_interface: QueryInterfaceFn,
    pub add_ref: AddRefFn,
    pub release: ReleaseFn,
    pub initialize: unsafe extern "system" fn(
        this: *mut c_void,
        resource_id: *const Guid,
        props: *const ResourceTexturePropertiesRaw,
        data: *const u8,
        strides: *const u32,
        data_size: u32,
    ) -> HRESULT,
    pub update: unsafe extern "system" fn(
        this: *mut c_void,
        minimum_extents: *const u32,
        maximum_extents: *const u32,
        strides: *const u32,
        dimensions: u32,
        data: *const u8,
        data_count: u32,
    ) -> HRESULT,
}

/// Secondary interface: device attachment.
#[repr(C)]
pub struct SecondaryVtbl {
    pub query_interface: QueryInterfaceFn,
    pub add_ref: AddRefFn,
    pub release: ReleaseFn,
    pub attach_device_context: unsafe extern "system" fn(
        this: *mut c_void,
        context: *const DeviceContextHandle,
        expected_dimensions: *const u32,
    ) -> HRESULT,
    pub get_realized_resource: unsafe extern "system" fn(
        this: *mut c_void,
        resource: *mut *mut ResourceTextureHandle,
    ) -> HRESULT,
}

static PRIMARY_VTBL: PrimaryVtbl = PrimaryVtbl {
    query_interface: primary_query_interface,
    add_ref: primary_add_ref,
    release: primary_release,
    initialize: primary_initialize,
    update: primary_update,
};

static SECONDARY_VTBL: SecondaryVtbl = SecondaryVtbl {
    query_interface: secondary_query_interface,
    add_ref: secondary_add_ref,
    release: secondary_release,
    attach_device_context: secondary_attach_device_context,
    get_realized_resource: secondary_get_realized_resource,
};

// ---------------------------------------------------------------------------
// Opaque handles
// ---------------------------------------------------------------------------

/// A host device context as passed to `AttachDeviceContext`.
pub struct DeviceContextHandle {
    context: Arc<dyn DeviceContext>,
}

impl DeviceContextHandle {
    pub fn new(context: Arc<dyn DeviceContext>) -> Self {
        Self { context }
    }
}

/// A realized texture returned by `GetRealizedResource`.
///
/// The caller owns the box; reclaim it with [`ResourceTextureHandle::from_raw`].
pub struct ResourceTextureHandle {
    resource: Arc<dyn ResourceTexture>,
}

impl ResourceTextureHandle {
    pub fn resource(&self) -> &Arc<dyn ResourceTexture> {
        &self.resource
    }

    /// # Safety
    ///
    /// `ptr` must come from `GetRealizedResource` and not have been reclaimed.
    pub unsafe fn from_raw(ptr: *mut ResourceTextureHandle) -> Box<Self> {
        unsafe { Box::from_raw(ptr) }
    }
}

// ---------------------------------------------------------------------------
// ManagerObject
// ---------------------------------------------------------------------------

/// Heap layout of a binary manager object.
#[repr(C)]
pub struct ManagerObject {
    primary: &'static PrimaryVtbl,
    secondary: &'static SecondaryVtbl,
    ref_count: AtomicU32,
    manager: ResourceTextureManager,
}

/// Byte distance from the object base to the secondary interface pointer.
pub const SECONDARY_OFFSET: usize = offset_of!(ManagerObject, secondary);

impl ManagerObject {
    /// Allocate a new object with a reference count of one and return its
    /// primary interface pointer.
    pub fn create() -> *mut c_void {
        let object = Box::new(ManagerObject {
            primary: &PRIMARY_VTBL,
            secondary: &SECONDARY_VTBL,
            ref_count: AtomicU32::new(1),
            manager: ResourceTextureManager::default(),
        });
        trace!("manager object created");
        Box::into_raw(object).cast()
    }

    fn from_primary(this: *mut c_void) -> *mut ManagerObject {
        this.cast()
    }

    fn from_secondary(this: *mut c_void) -> *mut ManagerObject {
        this.cast::<u8>().wrapping_sub(SECONDARY_OFFSET).cast()
    }

    /// # Safety
    ///
    /// `object` must be a live manager object.
    unsafe fn add_ref(object: *mut ManagerObject) -> u32 {
        let count = unsafe { (*object).ref_count.fetch_add(1, Ordering::Relaxed) } + 1;
        trace!(count, "manager object add_ref");
        count
    }

    /// # Safety
    ///
    /// `object` must be a live manager object; if this returns zero it is
    /// freed and must not be touched again.
    unsafe fn release(object: *mut ManagerObject) -> u32 {
        let count = unsafe { (*object).ref_count.fetch_sub(1, Ordering::Release) } - 1;
        trace!(count, "manager object release");
        if count == 0 {
            fence(Ordering::Acquire);
            drop(unsafe { Box::from_raw(object) });
        }
        count
    }

    /// # Safety
    ///
    /// `object` must be a live manager object; `riid` and `ppv` are checked
    /// for null but must otherwise be valid.
    unsafe fn query_interface(
        object: *mut ManagerObject,
        riid: *const Guid,
        ppv: *mut *mut c_void,
    ) -> HRESULT {
        if ppv.is_null() {
            return E_POINTER;
        }
        if riid.is_null() {
            unsafe { *ppv = ptr::null_mut() };
            return E_POINTER;
        }

        let riid = unsafe { *riid };
        let interface = if riid == IID_IUNKNOWN || riid == IID_RESOURCE_TEXTURE_MANAGER {
            object.cast::<c_void>()
        } else if riid == IID_RESOURCE_TEXTURE_MANAGER_INTERNAL {
            object.cast::<u8>().wrapping_add(SECONDARY_OFFSET).cast()
        } else {
            unsafe { *ppv = ptr::null_mut() };
            return E_NOINTERFACE;
        };

        unsafe {
            Self::add_ref(object);
            *ppv = interface;
        }
        S_OK
    }

    /// # Safety
    ///
    /// `object` must be a live manager object, borrowed for the call.
    unsafe fn manager<'a>(object: *mut ManagerObject) -> &'a ResourceTextureManager {
        unsafe { &(*object).manager }
    }
}

/// Factory: `*out` receives a new object's primary interface.
///
/// # Safety
///
/// `out` must be null or valid for writes.
pub unsafe extern "system" fn create_resource_texture_manager(out: *mut *mut c_void) -> HRESULT {
    if out.is_null() {
        return E_POINTER;
    }
    unsafe { *out = ManagerObject::create() };
    S_OK
}

/// Read the primary vtable of an interface pointer.
///
/// # Safety
///
/// `this` must be a live primary interface pointer.
pub unsafe fn primary_vtbl<'a>(this: *mut c_void) -> &'a PrimaryVtbl {
    unsafe { *this.cast::<&'static PrimaryVtbl>() }
}

/// Read the secondary vtable of an interface pointer.
///
/// # Safety
///
/// `this` must be a live secondary interface pointer.
pub unsafe fn secondary_vtbl<'a>(this: *mut c_void) -> &'a SecondaryVtbl {
    unsafe { *this.cast::<&'static SecondaryVtbl>() }
}

// ---------------------------------------------------------------------------
// Argument decoding
// ---------------------------------------------------------------------------

/// # Safety
///
/// Non-null pointers must be valid for `len` elements.
unsafe fn required_slice<'a, T>(ptr: *const T, len: usize) -> Result<&'a [T]> {
    if ptr.is_null() {
        return Err(Error::NullPointer);
    }
    Ok(unsafe { slice::from_raw_parts(ptr, len) })
}

/// # Safety
///
/// Non-null pointers must be valid for `len` elements.
unsafe fn optional_slice<'a, T>(ptr: *const T, len: usize) -> Option<&'a [T]> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { slice::from_raw_parts(ptr, len) })
    }
}

fn checked_dimensions(dimensions: u32) -> Result<usize> {
    if (1..=MAX_DIMENSIONS).contains(&dimensions) {
        Ok(dimensions as usize)
    } else {
        Err(Error::InvalidArgument)
    }
}

unsafe fn initialize_impl(
    manager: &ResourceTextureManager,
    resource_id: *const Guid,
    props: *const ResourceTexturePropertiesRaw,
    data: *const u8,
    strides: *const u32,
    data_size: u32,
) -> Result<Outcome> {
    if props.is_null() {
        return Err(Error::NullPointer);
    }
    let raw = unsafe { *props };
    let dimensions = checked_dimensions(raw.dimensions)?;

    let extents = unsafe { required_slice(raw.extents, dimensions)? };
    let raw_modes = unsafe { required_slice(raw.extendModes, dimensions)? };
    let mut modes = [ExtendMode::default(); 3];
    for (mode, &raw_mode) in modes.iter_mut().zip(raw_modes) {
        *mode = decode_extend_mode(raw_mode)?;
    }

    let props = ResourceTextureProperties {
        extents,
        extend_modes: &modes[..dimensions],
        precision: decode_precision(raw.bufferPrecision)?,
        channels: decode_channels(raw.channelDepth)?,
        filter: decode_filter(raw.filter)?,
    };

    let data = unsafe { required_slice(data, data_size as usize)? };
    let strides = unsafe { optional_slice(strides, dimensions - 1) };
    let id = unsafe { resource_id.as_ref() };

    manager.initialize(id, &props, Some(data), strides)
}

unsafe fn update_impl(
    manager: &ResourceTextureManager,
    minimum: *const u32,
    maximum: *const u32,
    strides: *const u32,
    dimensions: u32,
    data: *const u8,
    data_count: u32,
) -> Result<Outcome> {
    let used = checked_dimensions(dimensions)?;
    let minimum = unsafe { optional_slice(minimum, used) };
    let maximum = unsafe { optional_slice(maximum, used) };
    let strides: &[u32] = match unsafe { optional_slice(strides, used - 1) } {
        Some(strides) => strides,
        None if used == 1 => &[],
        None => return Err(Error::NullPointer),
    };
    let data = unsafe { required_slice(data, data_count as usize)? };

    manager.update(minimum, maximum, strides, dimensions, data)
}

// ---------------------------------------------------------------------------
// Primary entry points
// ---------------------------------------------------------------------------

unsafe extern "system" fn primary_query_interface(
    this: *mut c_void,
    riid: *const Guid,
    ppv: *mut *mut c_void,
) -> HRESULT {
    unsafe { ManagerObject::query_interface(ManagerObject::from_primary(this), riid, ppv) }
}

unsafe extern "system" fn primary_add_ref(this: *mut c_void) -> u32 {
    unsafe { ManagerObject::add_ref(ManagerObject::from_primary(this)) }
}

unsafe extern "system" fn primary_release(this: *mut c_void) -> u32 {
    unsafe { ManagerObject::release(ManagerObject::from_primary(this)) }
}

unsafe extern "system" fn primary_initialize(
    this: *mut c_void,
    resource_id: *const Guid,
    props: *const ResourceTexturePropertiesRaw,
    data: *const u8,
    strides: *const u32,
    data_size: u32,
) -> HRESULT {
    let manager = unsafe { ManagerObject::manager(ManagerObject::from_primary(this)) };
    to_hresult(unsafe { initialize_impl(manager, resource_id, props, data, strides, data_size) })
}

unsafe extern "system" fn primary_update(
    this: *mut c_void,
    minimum_extents: *const u32,
    maximum_extents: *const u32,
    strides: *const u32,
    dimensions: u32,
    data: *const u8,
    data_count: u32,
) -> HRESULT {
    let manager = unsafe { ManagerObject::manager(ManagerObject::from_primary(this)) };
    to_hresult(unsafe {
        update_impl(
            manager,
            minimum_extents,
            maximum_extents,
            strides,
            dimensions,
            data,
            data_count,
        )
    })
}

// ---------------------------------------------------------------------------
// Secondary entry points
// ---------------------------------------------------------------------------

unsafe extern "system" fn secondary_query_interface(
    this: *mut c_void,
    riid: *const Guid,
    ppv: *mut *mut c_void,
) -> HRESULT {
    unsafe { ManagerObject::query_interface(ManagerObject::from_secondary(this), riid, ppv) }
}

unsafe extern "system" fn secondary_add_ref(this: *mut c_void) -> u32 {
    unsafe { ManagerObject::add_ref(ManagerObject::from_secondary(this)) }
}

unsafe extern "system" fn secondary_release(this: *mut c_void) -> u32 {
    unsafe { ManagerObject::release(ManagerObject::from_secondary(this)) }
}

unsafe extern "system" fn secondary_attach_device_context(
    this: *mut c_void,
    context: *const DeviceContextHandle,
    expected_dimensions: *const u32,
) -> HRESULT {
    let Some(context) = (unsafe { context.as_ref() }) else {
        return E_POINTER;
    };
    let expected = unsafe { expected_dimensions.as_ref() }.copied();
    let manager = unsafe { ManagerObject::manager(ManagerObject::from_secondary(this)) };
    to_hresult(manager.attach_device_context(context.context.clone(), expected))
}

unsafe extern "system" fn secondary_get_realized_resource(
    this: *mut c_void,
    resource: *mut *mut ResourceTextureHandle,
) -> HRESULT {
    if resource.is_null() {
        return E_POINTER;
    }
    unsafe { *resource = ptr::null_mut() };

    let manager = unsafe { ManagerObject::manager(ManagerObject::from_secondary(this)) };
    match manager.realized_resource() {
        Ok(realized) => {
            let handle = Box::new(ResourceTextureHandle { resource: realized });
            unsafe { *resource = Box::into_raw(handle) };
            S_OK
        }
        Err(err) => err.hresult(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secondary_interface_sits_one_pointer_in() {
        assert_eq!(offset_of!(ManagerObject, primary), 0);
        assert_eq!(SECONDARY_OFFSET, std::mem::size_of::<usize>());
    }

    #[test]
    fn factory_rejects_null_output() {
        assert_eq!(
            unsafe { create_resource_texture_manager(ptr::null_mut()) },
            E_POINTER
        );
    }
}
