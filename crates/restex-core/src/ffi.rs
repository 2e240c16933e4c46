//! Hardcoded binary-protocol constants and C-repr structs.
//!
//! Status codes follow the HRESULT convention of the host runtime. Format
//! codes match the native enumerations the host uses for resource texture
//! properties, so raw values can cross the boundary unchanged.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

use std::fmt;

/// 32-bit status code returned by every binary entry point.
pub type HRESULT = i32;

// =====================================================================
// Status codes
// =====================================================================

pub const S_OK: HRESULT = 0;
pub const S_FALSE: HRESULT = 1;

pub const E_NOTIMPL: HRESULT = 0x8000_4001_u32 as i32;
pub const E_NOINTERFACE: HRESULT = 0x8000_4002_u32 as i32;
pub const E_POINTER: HRESULT = 0x8000_4003_u32 as i32;
pub const E_FAIL: HRESULT = 0x8000_4005_u32 as i32;
pub const E_OUTOFMEMORY: HRESULT = 0x8007_000E_u32 as i32;
pub const E_INVALIDARG: HRESULT = 0x8007_0057_u32 as i32;
/// `HRESULT_FROM_WIN32(ERROR_INSUFFICIENT_BUFFER)`
pub const E_NOT_SUFFICIENT_BUFFER: HRESULT = 0x8007_007A_u32 as i32;
/// `HRESULT_FROM_WIN32(ERROR_INVALID_STATE)`
pub const E_NOT_VALID_STATE: HRESULT = 0x8007_139F_u32 as i32;

/// Returns `true` for any success code (`S_OK`, `S_FALSE`, ...).
pub const fn SUCCEEDED(hr: HRESULT) -> bool {
    hr >= 0
}

// =====================================================================
// Buffer precision (D2D1_BUFFER_PRECISION)
// =====================================================================
pub const BUFFER_PRECISION_UNKNOWN: u32 = 0;
pub const BUFFER_PRECISION_8BPC_UNORM: u32 = 1;
pub const BUFFER_PRECISION_8BPC_UNORM_SRGB: u32 = 2;
pub const BUFFER_PRECISION_16BPC_UNORM: u32 = 3;
pub const BUFFER_PRECISION_16BPC_FLOAT: u32 = 4;
pub const BUFFER_PRECISION_32BPC_FLOAT: u32 = 5;

// =====================================================================
// Channel depth (D2D1_CHANNEL_DEPTH)
// =====================================================================
pub const CHANNEL_DEPTH_DEFAULT: u32 = 0;
pub const CHANNEL_DEPTH_1: u32 = 1;
pub const CHANNEL_DEPTH_4: u32 = 4;

// =====================================================================
// Extend modes (D2D1_EXTEND_MODE)
// =====================================================================
pub const EXTEND_MODE_CLAMP: u32 = 0;
pub const EXTEND_MODE_WRAP: u32 = 1;
pub const EXTEND_MODE_MIRROR: u32 = 2;

// =====================================================================
// Filters (D2D1_FILTER)
// =====================================================================
pub const FILTER_MIN_MAG_MIP_POINT: u32 = 0x00;
pub const FILTER_MIN_MAG_POINT_MIP_LINEAR: u32 = 0x01;
pub const FILTER_MIN_POINT_MAG_LINEAR_MIP_POINT: u32 = 0x04;
pub const FILTER_MIN_POINT_MAG_MIP_LINEAR: u32 = 0x05;
pub const FILTER_MIN_LINEAR_MAG_MIP_POINT: u32 = 0x10;
pub const FILTER_MIN_LINEAR_MAG_POINT_MIP_LINEAR: u32 = 0x11;
pub const FILTER_MIN_MAG_LINEAR_MIP_POINT: u32 = 0x14;
pub const FILTER_MIN_MAG_MIP_LINEAR: u32 = 0x15;
pub const FILTER_ANISOTROPIC: u32 = 0x55;

/// Highest dimension count a resource texture may have.
pub const MAX_DIMENSIONS: u32 = 3;

// =====================================================================
// GUID
// =====================================================================

/// 16-byte interface / resource identifier, laid out like the native `GUID`.
#[repr(C)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    /// Build a GUID from its canonical 128-bit big-endian form, e.g.
    /// `0x00000000_0000_0000_C000_000000000046`.
    pub const fn from_u128(value: u128) -> Self {
        Self {
            data1: (value >> 96) as u32,
            data2: (value >> 80 & 0xFFFF) as u16,
            data3: (value >> 64 & 0xFFFF) as u16,
            data4: (value as u64).to_be_bytes(),
        }
    }

    pub const fn to_u128(&self) -> u128 {
        ((self.data1 as u128) << 96)
            | ((self.data2 as u128) << 80)
            | ((self.data3 as u128) << 64)
            | u64::from_be_bytes(self.data4) as u128
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7],
        )
    }
}

// =====================================================================
// Interface identifiers
// =====================================================================

/// Base identity every object answers to.
pub const IID_IUNKNOWN: Guid = Guid::from_u128(0x00000000_0000_0000_C000_000000000046);

/// Primary interface: Initialize / Update.
pub const IID_RESOURCE_TEXTURE_MANAGER: Guid =
    Guid::from_u128(0x3C4FC7E4_A419_46CA_B5F6_66EB4FF18D64);

/// Secondary interface: AttachDeviceContext / GetRealizedResource.
pub const IID_RESOURCE_TEXTURE_MANAGER_INTERNAL: Guid =
    Guid::from_u128(0x5CBB1024_8EA1_4689_81BF_8AD190B5EF5D);

// =====================================================================
// C-repr structs
// =====================================================================

/// Resource texture properties as passed across the binary boundary.
///
/// `extents` and `extendModes` each point at `dimensions` elements.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct ResourceTexturePropertiesRaw {
    pub extents: *const u32,
    pub dimensions: u32,
    pub bufferPrecision: u32,
    pub channelDepth: u32,
    pub filter: u32,
    pub extendModes: *const u32,
}
