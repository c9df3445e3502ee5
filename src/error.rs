//! Error type shared by effects, textures and the scheduler.

/// Everything that can go wrong while setting up or switching effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A buffer of `bytes` bytes could not be reserved.
    #[error("failed to allocate {bytes} bytes")]
    Allocation { bytes: usize },

    /// The texture is too big for the signed 8-bit offsets of the warp table.
    #[error("texture {width}x{height} exceeds the 128x128 warp table limit")]
    TextureTooLarge { width: u32, height: u32 },

    /// Texture dimensions and pixel count disagree, or a dimension is zero.
    #[error("texture is {width}x{height} but holds {len} pixels")]
    InvalidTexture { width: u32, height: u32, len: usize },

    /// BMP data could not be parsed.
    #[error("malformed BMP texture")]
    Texture,

    /// A framebuffer slice cannot hold the requested size.
    #[error("framebuffer needs {needed} pixels, slice holds {len}")]
    BufferTooSmall { needed: usize, len: usize },

    /// No effect in the playlist could be initialized.
    #[error("no effect in the playlist could be initialized")]
    NoEffect,

    /// A configuration range is empty or exceeds a fixed capacity.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Reserve a buffer of `len` copies of `value` or fail with
/// [`Error::Allocation`].
pub(crate) fn try_alloc<T: Clone>(len: usize, value: T) -> Result<alloc::vec::Vec<T>, Error> {
    let mut buf = alloc::vec::Vec::new();
    buf.try_reserve_exact(len).map_err(|_| Error::Allocation {
        bytes: len.saturating_mul(core::mem::size_of::<T>()),
    })?;
    buf.resize(len, value);
    Ok(buf)
}

/// Element count of a `width` x `height` buffer with `per_pixel` entries
/// per pixel, or [`Error::Allocation`] if it does not fit in `usize`.
pub(crate) fn buffer_len(width: u32, height: u32, per_pixel: usize) -> Result<usize, Error> {
    let width = usize::try_from(width).ok();
    let height = usize::try_from(height).ok();
    width
        .zip(height)
        .and_then(|(w, h)| w.checked_mul(h))
        .and_then(|n| n.checked_mul(per_pixel))
        .ok_or(Error::Allocation { bytes: usize::MAX })
}
