//! Buffer layout validation and strided region copies.
//!
//! A buffer of `dimensions` (1 to 3) is described by its extents in elements
//! and `dimensions - 1` byte strides: `strides[0]` is the distance between
//! rows, `strides[1]` the distance between planes. The last row of a plane and
//! the last plane of a volume are never padded, so the exact byte size of a
//! buffer is
//!
//! ```text
//! row    = extents[0] * element_size
//! plane  = (extents[1] - 1) * strides[0] + row
//! volume = (extents[2] - 1) * strides[1] + plane
//! ```
//!
//! All arithmetic is checked. Overflow or a stride shorter than what it has to
//! span is [`Error::InvalidArgument`]; a well-formed shape whose size differs
//! from the supplied buffer is [`Error::InsufficientBuffer`].

use std::ops::Range;

use crate::ffi::MAX_DIMENSIONS;
use crate::status::{Error, Result};

fn checked(value: Option<u32>) -> Result<u32> {
    value.ok_or(Error::InvalidArgument)
}

fn check_shape(element_size: u32, extents: &[u32], strides: &[u32]) -> Result<()> {
    let dimensions = extents.len();
    if dimensions == 0 || dimensions > MAX_DIMENSIONS as usize {
        return Err(Error::InvalidArgument);
    }
    if element_size == 0 || extents.contains(&0) {
        return Err(Error::InvalidArgument);
    }
    if strides.len() < dimensions - 1 {
        return Err(Error::InvalidArgument);
    }
    Ok(())
}

/// Exact byte size of a buffer with the given shape.
pub fn required_size(element_size: u32, extents: &[u32], strides: &[u32]) -> Result<u32> {
    check_shape(element_size, extents, strides)?;

    let row_bytes = checked(extents[0].checked_mul(element_size))?;
    if extents.len() == 1 {
        return Ok(row_bytes);
    }

    if row_bytes > strides[0] {
        return Err(Error::InvalidArgument);
    }
    let plane_bytes = checked(
        (extents[1] - 1)
            .checked_mul(strides[0])
            .and_then(|bytes| bytes.checked_add(row_bytes)),
    )?;
    if extents.len() == 2 {
        return Ok(plane_bytes);
    }

    let padded_plane_bytes = checked(extents[1].checked_mul(strides[0]))?;
    if padded_plane_bytes > strides[1] {
        return Err(Error::InvalidArgument);
    }
    checked(
        (extents[2] - 1)
            .checked_mul(strides[1])
            .and_then(|bytes| bytes.checked_add(plane_bytes)),
    )
}

/// Check that `data_size` bytes exactly cover a buffer with the given shape.
pub fn validate_buffer(
    element_size: u32,
    extents: &[u32],
    strides: &[u32],
    data_size: usize,
) -> Result<()> {
    let required = required_size(element_size, extents, strides)?;
    if required as usize != data_size {
        return Err(Error::InsufficientBuffer);
    }
    Ok(())
}

/// Densely packed strides for a texture: one entry per dimension above the
/// first.
pub fn tight_strides(element_size: u32, extents: &[u32]) -> Result<Vec<u32>> {
    check_shape(element_size, extents, &[0; 2])?;
    let mut strides = Vec::with_capacity(extents.len() - 1);
    let mut stride = checked(extents[0].checked_mul(element_size))?;
    for &extent in &extents[1..] {
        strides.push(stride);
        stride = checked(stride.checked_mul(extent))?;
    }
    Ok(strides)
}

/// A validated sub-box of a stored texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UpdateRegion {
    dimensions: u32,
    minimum: [u32; 3],
    extents: [u32; 3],
}

impl UpdateRegion {
    /// Region covering the whole texture.
    pub fn whole(stored: &[u32]) -> Result<Self> {
        Self::new(stored, stored.len() as u32, None, None)
    }

    /// Resolve an optional `(minimum, maximum)` pair against the stored
    /// extents.
    ///
    /// Both bounds absent selects the whole texture. Each supplied dimension
    /// needs `minimum < maximum <= stored`. Dimensions above `dimensions` have
    /// an extent of one.
    pub fn new(
        stored: &[u32],
        dimensions: u32,
        minimum: Option<&[u32]>,
        maximum: Option<&[u32]>,
    ) -> Result<Self> {
        let used = dimensions as usize;
        if used == 0 || used > MAX_DIMENSIONS as usize || used != stored.len() {
            return Err(Error::InvalidArgument);
        }

        let mut region = Self {
            dimensions,
            minimum: [0; 3],
            extents: [1; 3],
        };

        match (minimum, maximum) {
            (None, None) => region.extents[..used].copy_from_slice(stored),
            (Some(minimum), Some(maximum)) => {
                if minimum.len() < used || maximum.len() < used {
                    return Err(Error::InvalidArgument);
                }
                for d in 0..used {
                    if maximum[d] <= minimum[d] || maximum[d] > stored[d] {
                        return Err(Error::InvalidArgument);
                    }
                    let extent = maximum[d] - minimum[d];
                    if extent > stored[d] {
                        return Err(Error::InvalidArgument);
                    }
                    region.minimum[d] = minimum[d];
                    region.extents[d] = extent;
                }
            }
            _ => return Err(Error::InvalidArgument),
        }

        Ok(region)
    }

    pub fn dimensions(&self) -> u32 {
        self.dimensions
    }

    pub fn minimum(&self) -> &[u32] {
        &self.minimum[..self.dimensions as usize]
    }

    /// Exclusive upper corner of the region.
    pub fn maximum(&self) -> [u32; 3] {
        let mut maximum = [1; 3];
        for d in 0..self.dimensions as usize {
            maximum[d] = self.minimum[d] + self.extents[d];
        }
        maximum
    }

    pub fn extents(&self) -> &[u32] {
        &self.extents[..self.dimensions as usize]
    }

    /// Check a caller buffer against this region's own extents.
    pub fn validate(&self, element_size: u32, strides: &[u32], data_size: usize) -> Result<()> {
        validate_buffer(element_size, self.extents(), strides, data_size)
    }
}

fn stride_at(strides: &[u32], index: usize) -> usize {
    strides.get(index).copied().unwrap_or(0) as usize
}

fn byte_range(start: usize, len: usize, limit: usize) -> Result<Range<usize>> {
    let end = start.checked_add(len).ok_or(Error::InvalidArgument)?;
    if end > limit {
        return Err(Error::InsufficientBuffer);
    }
    Ok(start..end)
}

/// Copy `region` out of a caller buffer into a destination texture buffer.
///
/// The destination starts at `minimum[d] * dst_stride[d]` (with the element
/// size as the stride of the first dimension); the source starts at zero.
/// Each row copies exactly `extents[0] * element_size` bytes.
pub fn copy_region(
    dst: &mut [u8],
    dst_strides: &[u32],
    src: &[u8],
    src_strides: &[u32],
    region: &UpdateRegion,
    element_size: u32,
) -> Result<()> {
    let row_bytes = region.extents[0] as usize * element_size as usize;

    let dst_base = region.minimum[0] as usize * element_size as usize
        + region.minimum[1] as usize * stride_at(dst_strides, 0)
        + region.minimum[2] as usize * stride_at(dst_strides, 1);

    for z in 0..region.extents[2] as usize {
        let dst_plane = dst_base + z * stride_at(dst_strides, 1);
        let src_plane = z * stride_at(src_strides, 1);

        for y in 0..region.extents[1] as usize {
            let dst_range = byte_range(dst_plane + y * stride_at(dst_strides, 0), row_bytes, dst.len())?;
            let src_range = byte_range(src_plane + y * stride_at(src_strides, 0), row_bytes, src.len())?;
            dst[dst_range].copy_from_slice(&src[src_range]);
        }
    }

    Ok(())
}
