//! Element formats and the layout description of a resource texture.

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive as _;

use crate::ffi::*;
use crate::status::{Error, Result};

/// Per-channel storage precision.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum BufferPrecision {
    Unknown = BUFFER_PRECISION_UNKNOWN,
    U8Unorm = BUFFER_PRECISION_8BPC_UNORM,
    U8UnormSrgb = BUFFER_PRECISION_8BPC_UNORM_SRGB,
    U16Unorm = BUFFER_PRECISION_16BPC_UNORM,
    F16 = BUFFER_PRECISION_16BPC_FLOAT,
    F32 = BUFFER_PRECISION_32BPC_FLOAT,
}

impl BufferPrecision {
    /// Bytes per channel, or `None` for [`BufferPrecision::Unknown`].
    pub fn bytes_per_channel(self) -> Option<u32> {
        match self {
            BufferPrecision::Unknown => None,
            BufferPrecision::U8Unorm | BufferPrecision::U8UnormSrgb => Some(1),
            BufferPrecision::U16Unorm | BufferPrecision::F16 => Some(2),
            BufferPrecision::F32 => Some(4),
        }
    }
}

/// Number of channels per element.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum ChannelDepth {
    Default = CHANNEL_DEPTH_DEFAULT,
    One = CHANNEL_DEPTH_1,
    Four = CHANNEL_DEPTH_4,
}

impl ChannelDepth {
    /// Explicit channel count, or `None` for [`ChannelDepth::Default`].
    pub fn channels(self) -> Option<u32> {
        match self {
            ChannelDepth::Default => None,
            ChannelDepth::One => Some(1),
            ChannelDepth::Four => Some(4),
        }
    }
}

/// Addressing behavior outside `[0, 1)` along one dimension.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum ExtendMode {
    #[default]
    Clamp = EXTEND_MODE_CLAMP,
    Wrap = EXTEND_MODE_WRAP,
    Mirror = EXTEND_MODE_MIRROR,
}

/// Sampling filter applied when the effect reads the texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum Filter {
    MinMagMipPoint = FILTER_MIN_MAG_MIP_POINT,
    MinMagPointMipLinear = FILTER_MIN_MAG_POINT_MIP_LINEAR,
    MinPointMagLinearMipPoint = FILTER_MIN_POINT_MAG_LINEAR_MIP_POINT,
    MinPointMagMipLinear = FILTER_MIN_POINT_MAG_MIP_LINEAR,
    MinLinearMagMipPoint = FILTER_MIN_LINEAR_MAG_MIP_POINT,
    MinLinearMagPointMipLinear = FILTER_MIN_LINEAR_MAG_POINT_MIP_LINEAR,
    MinMagLinearMipPoint = FILTER_MIN_MAG_LINEAR_MIP_POINT,
    #[default]
    MinMagMipLinear = FILTER_MIN_MAG_MIP_LINEAR,
    Anisotropic = FILTER_ANISOTROPIC,
}

/// Borrowed description of a resource texture, as supplied by a caller.
///
/// Nothing is validated on construction; see [`TextureLayout::new`].
#[derive(Debug, Copy, Clone)]
pub struct ResourceTextureProperties<'a> {
    pub extents: &'a [u32],
    pub extend_modes: &'a [ExtendMode],
    pub precision: BufferPrecision,
    pub channels: ChannelDepth,
    pub filter: Filter,
}

impl<'a> ResourceTextureProperties<'a> {
    pub fn dimensions(&self) -> u32 {
        self.extents.len() as u32
    }
}

/// Validated, owned layout of a resource texture.
///
/// Extents and extend modes live inline so the layout survives after the
/// staged bytes are handed to the device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureLayout {
    dimensions: u32,
    extents: [u32; 3],
    extend_modes: [ExtendMode; 3],
    precision: BufferPrecision,
    channels: ChannelDepth,
    filter: Filter,
    element_size: u32,
}

impl TextureLayout {
    /// Validate caller-supplied properties.
    ///
    /// Fails with [`Error::InvalidArgument`] if the dimension count is outside
    /// `1..=3`, an extent is zero, the extend-mode count does not match, or
    /// the precision/channel combination has no defined element size.
    pub fn new(props: &ResourceTextureProperties<'_>) -> Result<Self> {
        let dimensions = props.dimensions();
        if !(1..=MAX_DIMENSIONS).contains(&dimensions) {
            return Err(Error::InvalidArgument);
        }
        if props.extend_modes.len() != props.extents.len() {
            return Err(Error::InvalidArgument);
        }
        if props.extents.iter().any(|&extent| extent == 0) {
            return Err(Error::InvalidArgument);
        }
        let element_size = element_size(props.precision, props.channels)?;

        let mut extents = [1; 3];
        extents[..props.extents.len()].copy_from_slice(props.extents);
        let mut extend_modes = [ExtendMode::default(); 3];
        extend_modes[..props.extend_modes.len()].copy_from_slice(props.extend_modes);

        Ok(Self {
            dimensions,
            extents,
            extend_modes,
            precision: props.precision,
            channels: props.channels,
            filter: props.filter,
            element_size,
        })
    }

    pub fn dimensions(&self) -> u32 {
        self.dimensions
    }

    /// Extents of the used dimensions only.
    pub fn extents(&self) -> &[u32] {
        &self.extents[..self.dimensions as usize]
    }

    pub fn extend_modes(&self) -> &[ExtendMode] {
        &self.extend_modes[..self.dimensions as usize]
    }

    pub fn precision(&self) -> BufferPrecision {
        self.precision
    }

    pub fn channels(&self) -> ChannelDepth {
        self.channels
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn element_size(&self) -> u32 {
        self.element_size
    }

    /// Borrow the layout back as caller-style properties, e.g. to forward it
    /// to a device.
    pub fn properties(&self) -> ResourceTextureProperties<'_> {
        ResourceTextureProperties {
            extents: self.extents(),
            extend_modes: self.extend_modes(),
            precision: self.precision,
            channels: self.channels,
            filter: self.filter,
        }
    }
}

/// Element size in bytes for a precision/channel combination.
pub fn element_size(precision: BufferPrecision, channels: ChannelDepth) -> Result<u32> {
    let bytes = precision.bytes_per_channel().ok_or(Error::InvalidArgument)?;
    let channels = channels.channels().ok_or(Error::InvalidArgument)?;
    Ok(bytes * channels)
}

/// Decode raw native format codes, rejecting unknown values.
pub fn decode_precision(raw: u32) -> Result<BufferPrecision> {
    BufferPrecision::from_u32(raw).ok_or(Error::InvalidArgument)
}

pub fn decode_channels(raw: u32) -> Result<ChannelDepth> {
    ChannelDepth::from_u32(raw).ok_or(Error::InvalidArgument)
}

pub fn decode_extend_mode(raw: u32) -> Result<ExtendMode> {
    ExtendMode::from_u32(raw).ok_or(Error::InvalidArgument)
}

pub fn decode_filter(raw: u32) -> Result<Filter> {
    Filter::from_u32(raw).ok_or(Error::InvalidArgument)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props<'a>(extents: &'a [u32], modes: &'a [ExtendMode]) -> ResourceTextureProperties<'a> {
        ResourceTextureProperties {
            extents,
            extend_modes: modes,
            precision: BufferPrecision::U8Unorm,
            channels: ChannelDepth::Four,
            filter: Filter::MinMagMipLinear,
        }
    }

    #[test]
    fn element_size_combines_precision_and_channels() {
        assert_eq!(element_size(BufferPrecision::U8Unorm, ChannelDepth::Four), Ok(4));
        assert_eq!(element_size(BufferPrecision::F16, ChannelDepth::One), Ok(2));
        assert_eq!(element_size(BufferPrecision::F32, ChannelDepth::Four), Ok(16));
        assert_eq!(
            element_size(BufferPrecision::Unknown, ChannelDepth::Four),
            Err(Error::InvalidArgument)
        );
        assert_eq!(
            element_size(BufferPrecision::F32, ChannelDepth::Default),
            Err(Error::InvalidArgument)
        );
    }

    #[test]
    fn layout_rejects_bad_dimensions() {
        let modes = [ExtendMode::Clamp; 4];
        assert_eq!(
            TextureLayout::new(&props(&[], &[])),
            Err(Error::InvalidArgument)
        );
        assert_eq!(
            TextureLayout::new(&props(&[1, 2, 3, 4], &modes)),
            Err(Error::InvalidArgument)
        );
        assert_eq!(
            TextureLayout::new(&props(&[4, 0], &modes[..2])),
            Err(Error::InvalidArgument)
        );
        assert_eq!(
            TextureLayout::new(&props(&[4, 4], &modes[..1])),
            Err(Error::InvalidArgument)
        );
    }

    #[test]
    fn layout_keeps_used_dimensions_only() {
        let modes = [ExtendMode::Wrap, ExtendMode::Mirror];
        let layout = TextureLayout::new(&props(&[8, 2], &modes)).unwrap();
        assert_eq!(layout.dimensions(), 2);
        assert_eq!(layout.extents(), &[8, 2]);
        assert_eq!(layout.extend_modes(), &modes);
        assert_eq!(layout.element_size(), 4);
        assert_eq!(layout.properties().extents, &[8, 2]);
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert_eq!(decode_precision(5), Ok(BufferPrecision::F32));
        assert_eq!(decode_precision(6), Err(Error::InvalidArgument));
        assert_eq!(decode_channels(2), Err(Error::InvalidArgument));
        assert_eq!(decode_extend_mode(3), Err(Error::InvalidArgument));
        assert_eq!(decode_filter(0x55), Ok(Filter::Anisotropic));
        assert_eq!(decode_filter(0x56), Err(Error::InvalidArgument));
    }
}
