//! Sample-format agnostic audio kernels: mixing, volume scaling, channel remapping and sample
//! conversion.
//!
//! Every operation is looked up per [`SampleFormat`] in a [`Kernels`] registry. The registry is
//! filled with portable kernels and, when the CPU allows it, block-optimized kernels are installed
//! on top of them. Optimized kernels fall back to the portable ones for shapes they do not handle.
//!
//! # Example
//! ```rust
//! use sample_kernels::{kernels, ChannelVolume, MemPool, MixInput, SampleFormat, SampleSpec, Volume};
//!
//! let spec = SampleSpec::new(SampleFormat::S16NE, 48000, 1);
//! let pool = MemPool::new();
//!
//! // two mono streams
//! let a: Vec<u8> = [1000i16; 64].iter().flat_map(|s| s.to_ne_bytes()).collect();
//! let b: Vec<u8> = [-500i16; 64].iter().flat_map(|s| s.to_ne_bytes()).collect();
//!
//! let inputs = [
//!     MixInput::new(pool.allocate_from(&a), ChannelVolume::norm(1)),
//!     MixInput::new(pool.allocate_from(&b), ChannelVolume::new(&[Volume::from_linear(0.5)])),
//! ];
//!
//! let mut out = vec![0u8; 128];
//! let length = kernels().mix(&inputs, &mut out, &spec, None, false);
//! assert_eq!(length, 128);
//! assert_eq!(i16::from_ne_bytes([out[0], out[1]]), 750);
//! ```

/// Maximum number of channels supported by the volume, mix and remap kernels
pub const MAX_CHANNELS: usize = 32;

mod accel;
pub mod alloc;
pub mod convert;
pub mod cpu;
pub mod dispatch;
pub mod endian;
pub mod format;
pub mod g711;
pub mod mix;
pub mod remap;
pub mod sample;
pub mod scale;
pub mod volume;

pub use alloc::{MemBlock, MemChunk, MemPool};
pub use cpu::{CpuArch, CpuFeatures, CpuInfo};
pub use dispatch::{kernels, Kernels};
pub use format::{silence_memory, InvalidSampleFormat, SampleFormat, SampleSpec};
pub use mix::{MixInput, MixStream};
pub use remap::{RemapKind, RemapMatrix, RemapPlan};
pub use volume::{ChannelVolume, Volume, VolumeFactors};

/// Assert that the channel count is valid for the sample kernels
///
/// # Panics
///
/// This function panics if given count is zero or greater than [`MAX_CHANNELS`]
///
#[track_caller]
#[inline(always)]
pub(crate) fn assert_valid_number_of_channels(number_of_channels: usize) {
    assert!(
        number_of_channels > 0 && number_of_channels <= MAX_CHANNELS,
        "NotSupportedError - Invalid number of channels: {:?} is outside range [1, {:?}]",
        number_of_channels,
        MAX_CHANNELS
    );
}

/// Assert that the given channel count is covered by the given volume
///
/// # Panics
///
/// This function panics if the volume holds fewer channels than requested
///
#[track_caller]
#[inline(always)]
pub(crate) fn assert_valid_volume_channels(volume_channels: usize, number_of_channels: usize) {
    assert!(
        number_of_channels <= volume_channels,
        "IndexSizeError - Volume holds {:?} channels but {:?} are required",
        volume_channels,
        number_of_channels
    );
}
