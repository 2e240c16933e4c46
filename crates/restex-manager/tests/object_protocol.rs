//! Tests for the binary dual-interface object: identity, reference counting
//! and the C entry points.

use std::ffi::c_void;
use std::ptr;

use restex_core::ffi::*;
use restex_manager::object::{primary_vtbl, secondary_vtbl, SECONDARY_OFFSET};
use restex_manager::software::DeviceEvent;
use restex_manager::{
    create_resource_texture_manager, DeviceContextHandle, ResourceTextureHandle, SoftwareDevice,
    SoftwareTexture,
};

struct Texture1d {
    extents: [u32; 1],
    modes: [u32; 1],
}

impl Texture1d {
    fn new(width: u32) -> Self {
        Self {
            extents: [width],
            modes: [EXTEND_MODE_CLAMP],
        }
    }

    /// Four bytes per element.
    fn raw(&self) -> ResourceTexturePropertiesRaw {
        ResourceTexturePropertiesRaw {
            extents: self.extents.as_ptr(),
            dimensions: 1,
            bufferPrecision: BUFFER_PRECISION_8BPC_UNORM,
            channelDepth: CHANNEL_DEPTH_4,
            filter: FILTER_MIN_MAG_MIP_LINEAR,
            extendModes: self.modes.as_ptr(),
        }
    }
}

fn create() -> *mut c_void {
    let mut object = ptr::null_mut();
    let hr = unsafe { create_resource_texture_manager(&mut object) };
    assert_eq!(hr, S_OK);
    assert!(!object.is_null());
    object
}

unsafe fn query(object: *mut c_void, iid: &Guid) -> (HRESULT, *mut c_void) {
    let mut out = ptr::null_mut();
    let hr = unsafe { (primary_vtbl(object).query_interface)(object, iid, &mut out) };
    (hr, out)
}

unsafe fn add_ref(object: *mut c_void) -> u32 {
    unsafe { (primary_vtbl(object).add_ref)(object) }
}

unsafe fn release(object: *mut c_void) -> u32 {
    unsafe { (primary_vtbl(object).release)(object) }
}

#[test]
fn interfaces_resolve_to_base_and_offset() {
    let object = create();
    unsafe {
        let (hr, unknown) = query(object, &IID_IUNKNOWN);
        assert_eq!(hr, S_OK);
        assert_eq!(unknown, object);

        let (hr, primary) = query(object, &IID_RESOURCE_TEXTURE_MANAGER);
        assert_eq!(hr, S_OK);
        assert_eq!(primary, object);

        let (hr, secondary) = query(object, &IID_RESOURCE_TEXTURE_MANAGER_INTERNAL);
        assert_eq!(hr, S_OK);
        assert_eq!(secondary as usize - object as usize, SECONDARY_OFFSET);
        assert_ne!(SECONDARY_OFFSET, 0);

        // 1 + three successful queries
        assert_eq!(add_ref(object), 5);
        assert_eq!(release(object), 4);
        release(unknown);
        release(primary);
        (secondary_vtbl(secondary).release)(secondary);
        assert_eq!(release(object), 0);
    }
}

#[test]
fn query_interface_rejects_unknown_ids_and_null_slots() {
    let object = create();
    unsafe {
        let other = Guid::from_u128(0xDEAD_BEEF_0000_0000_0000_000000000000);
        let (hr, out) = query(object, &other);
        assert_eq!(hr, E_NOINTERFACE);
        assert!(out.is_null());

        let mut out = object;
        let hr = (primary_vtbl(object).query_interface)(object, ptr::null(), &mut out);
        assert_eq!(hr, E_POINTER);
        assert!(out.is_null());

        let hr = (primary_vtbl(object).query_interface)(
            object,
            &IID_IUNKNOWN,
            ptr::null_mut(),
        );
        assert_eq!(hr, E_POINTER);

        assert_eq!(release(object), 0);
    }
}

#[test]
fn secondary_pointer_shares_the_count() {
    let object = create();
    unsafe {
        let (_, secondary) = query(object, &IID_RESOURCE_TEXTURE_MANAGER_INTERNAL);
        let vtbl = secondary_vtbl(secondary);
        assert_eq!((vtbl.add_ref)(secondary), 3);
        assert_eq!(release(object), 2);

        // Querying through the secondary identity lands on the same base.
        let mut primary = ptr::null_mut();
        let hr = (vtbl.query_interface)(secondary, &IID_RESOURCE_TEXTURE_MANAGER, &mut primary);
        assert_eq!(hr, S_OK);
        assert_eq!(primary, object);

        assert_eq!((vtbl.release)(secondary), 2);
        assert_eq!(release(primary), 1);
        assert_eq!((vtbl.release)(secondary), 0);
    }
}

#[test]
fn initialize_attach_and_realize_through_the_binary_surface() {
    let device = SoftwareDevice::new();
    let log = device.log();
    let lock = device.lock();
    let handle = DeviceContextHandle::new(device);

    let object = create();
    let texture = Texture1d::new(4);
    let props = texture.raw();
    let data: Vec<u8> = (0..16).collect();

    unsafe {
        let primary = primary_vtbl(object);
        let short = (primary.initialize)(object, ptr::null(), &props, data.as_ptr(), ptr::null(), 15);
        assert_eq!(short, E_NOT_SUFFICIENT_BUFFER);

        let hr = (primary.initialize)(object, ptr::null(), &props, data.as_ptr(), ptr::null(), 16);
        assert_eq!(hr, S_OK);

        let hr = (primary.update)(
            object,
            ptr::null(),
            ptr::null(),
            ptr::null(),
            1,
            data.as_ptr(),
            16,
        );
        assert_eq!(hr, E_NOTIMPL);

        let (_, secondary) = query(object, &IID_RESOURCE_TEXTURE_MANAGER_INTERNAL);
        let internal = secondary_vtbl(secondary);

        let mut resource = ptr::null_mut();
        let hr = (internal.get_realized_resource)(secondary, &mut resource);
        assert_eq!(hr, E_NOT_VALID_STATE);
        assert!(resource.is_null());

        let expected = 1u32;
        assert_eq!((internal.attach_device_context)(secondary, &handle, &expected), S_OK);
        assert_eq!((internal.attach_device_context)(secondary, &handle, ptr::null()), S_FALSE);
        assert_eq!(
            (internal.attach_device_context)(secondary, ptr::null(), ptr::null()),
            E_POINTER
        );

        let hr = (internal.get_realized_resource)(secondary, &mut resource);
        assert_eq!(hr, S_OK);
        let realized = ResourceTextureHandle::from_raw(resource);
        let software = realized
            .resource()
            .as_any()
            .downcast_ref::<SoftwareTexture>()
            .map(SoftwareTexture::texels);
        assert_eq!(software, Some(data.clone()));

        let patch = [0xAAu8; 4];
        let (minimum, maximum) = ([2u32], [3u32]);
        let hr = (primary.update)(
            object,
            minimum.as_ptr(),
            maximum.as_ptr(),
            ptr::null(),
            1,
            patch.as_ptr(),
            4,
        );
        assert_eq!(hr, S_OK);

        drop(realized);
        (internal.release)(secondary);
        assert_eq!(release(object), 0);
    }

    drop(handle);
    let events = log.events();
    assert!(matches!(events.first(), Some(DeviceEvent::TextureCreated { .. })));
    assert!(matches!(events.get(1), Some(DeviceEvent::TextureUpdated { lock_held: true, .. })));
    assert!(matches!(events.get(2), Some(DeviceEvent::TextureDropped { .. })));
    assert_eq!(events.get(3), Some(&DeviceEvent::DeviceDropped));
    assert_eq!(events.len(), 4);
    assert!(!lock.is_held());
}

#[test]
fn final_release_tears_down_once() {
    let device = SoftwareDevice::new();
    let log = device.log();
    let object = create();

    unsafe {
        let handle = DeviceContextHandle::new(device);
        let (_, secondary) = query(object, &IID_RESOURCE_TEXTURE_MANAGER_INTERNAL);
        assert_eq!(
            (secondary_vtbl(secondary).attach_device_context)(secondary, &handle, ptr::null()),
            S_OK
        );
        drop(handle);

        let texture = Texture1d::new(1);
        let props = texture.raw();
        let data = [1u8, 2, 3, 4];
        let hr = (primary_vtbl(object).initialize)(
            object,
            ptr::null(),
            &props,
            data.as_ptr(),
            ptr::null(),
            4,
        );
        assert_eq!(hr, S_OK);

        for _ in 0..4 {
            add_ref(object);
        }
        for _ in 0..4 {
            assert!(release(object) > 0);
        }
        assert_eq!((secondary_vtbl(secondary).release)(secondary), 1);
        assert!(!log.events().contains(&DeviceEvent::DeviceDropped));
        assert_eq!(release(object), 0);
    }

    let events = log.events();
    let dropped = events
        .iter()
        .filter(|event| matches!(event, DeviceEvent::TextureDropped { .. }))
        .count();
    assert_eq!(dropped, 1);
    assert_eq!(
        events.iter().filter(|event| **event == DeviceEvent::DeviceDropped).count(),
        1
    );
}

#[test]
fn malformed_arguments_map_to_status_codes() {
    let object = create();
    let texture = Texture1d::new(4);
    let data = [0u8; 16];

    unsafe {
        let initialize = primary_vtbl(object).initialize;

        assert_eq!(
            initialize(object, ptr::null(), ptr::null(), data.as_ptr(), ptr::null(), 16),
            E_POINTER
        );
        assert_eq!(
            initialize(object, ptr::null(), &texture.raw(), ptr::null(), ptr::null(), 16),
            E_POINTER
        );

        let mut raw = texture.raw();
        raw.dimensions = 4;
        assert_eq!(
            initialize(object, ptr::null(), &raw, data.as_ptr(), ptr::null(), 16),
            E_INVALIDARG
        );

        let mut raw = texture.raw();
        raw.bufferPrecision = BUFFER_PRECISION_UNKNOWN;
        assert_eq!(
            initialize(object, ptr::null(), &raw, data.as_ptr(), ptr::null(), 16),
            E_INVALIDARG
        );

        let mut raw = texture.raw();
        raw.channelDepth = 3;
        assert_eq!(
            initialize(object, ptr::null(), &raw, data.as_ptr(), ptr::null(), 16),
            E_INVALIDARG
        );

        let update = primary_vtbl(object).update;
        assert_eq!(
            update(object, ptr::null(), ptr::null(), ptr::null(), 1, data.as_ptr(), 16),
            E_NOT_VALID_STATE
        );
        assert_eq!(
            update(object, ptr::null(), ptr::null(), ptr::null(), 0, data.as_ptr(), 16),
            E_INVALIDARG
        );

        assert_eq!(release(object), 0);
    }
}
