//! Per-channel volume scaling of interleaved samples
use std::sync::Arc;

use crate::alloc::MemChunk;
use crate::dispatch::{Kernels, VolumeKernel};
use crate::endian::{BigEndian, LittleEndian};
use crate::format::{SampleFormat, SampleSpec};
use crate::sample::{Alaw, FloatSample, NarrowSample, S16, S24, S24In32, S32, Ulaw, WideSample, F32, U8};
use crate::volume::{mul_fixed, mul_fixed_wide, ChannelVolume, VolumeFactors};
use crate::{assert_valid_number_of_channels, assert_valid_volume_channels};

fn scale_narrow<C: NarrowSample>(samples: &mut [u8], factors: &VolumeFactors, channels: usize) {
    let gains = &factors.fixed()[..channels];
    samples
        .chunks_exact_mut(C::SIZE)
        .zip(gains.iter().cycle())
        .for_each(|(s, &gain)| {
            let v = mul_fixed(C::load(s), gain);
            C::store(s, v);
        });
}

fn scale_wide<C: WideSample>(samples: &mut [u8], factors: &VolumeFactors, channels: usize) {
    let gains = &factors.fixed()[..channels];
    samples
        .chunks_exact_mut(C::SIZE)
        .zip(gains.iter().cycle())
        .for_each(|(s, &gain)| {
            let v = mul_fixed_wide(C::load(s), gain);
            C::store(s, v);
        });
}

fn scale_float<C: FloatSample>(samples: &mut [u8], factors: &VolumeFactors, channels: usize) {
    let gains = &factors.float()[..channels];
    samples
        .chunks_exact_mut(C::SIZE)
        .zip(gains.iter().cycle())
        .for_each(|(s, &gain)| {
            let v = if gain > 0. { C::load(s) * gain } else { 0. };
            C::store(s, v)
        });
}

pub(crate) fn portable_volume(format: SampleFormat) -> VolumeKernel {
    match format {
        SampleFormat::U8 => Arc::new(scale_narrow::<U8>),
        SampleFormat::Alaw => Arc::new(scale_narrow::<Alaw>),
        SampleFormat::Ulaw => Arc::new(scale_narrow::<Ulaw>),
        SampleFormat::S16Le => Arc::new(scale_narrow::<S16<LittleEndian>>),
        SampleFormat::S16Be => Arc::new(scale_narrow::<S16<BigEndian>>),
        SampleFormat::Float32Le => Arc::new(scale_float::<F32<LittleEndian>>),
        SampleFormat::Float32Be => Arc::new(scale_float::<F32<BigEndian>>),
        SampleFormat::S32Le => Arc::new(scale_wide::<S32<LittleEndian>>),
        SampleFormat::S32Be => Arc::new(scale_wide::<S32<BigEndian>>),
        SampleFormat::S24Le => Arc::new(scale_wide::<S24<LittleEndian>>),
        SampleFormat::S24Be => Arc::new(scale_wide::<S24<BigEndian>>),
        SampleFormat::S24_32Le => Arc::new(scale_wide::<S24In32<LittleEndian>>),
        SampleFormat::S24_32Be => Arc::new(scale_wide::<S24In32<BigEndian>>),
    }
}

impl Kernels {
    /// Scale interleaved samples in place, sample `i` by `factors[i % channels]`
    ///
    /// # Panics
    ///
    /// This function panics if `channels` is zero, exceeds [`crate::MAX_CHANNELS`], or exceeds
    /// the channels covered by `factors`
    #[track_caller]
    pub fn apply_volume(
        &self,
        format: SampleFormat,
        samples: &mut [u8],
        factors: &VolumeFactors,
        channels: usize,
    ) {
        assert_valid_number_of_channels(channels);
        assert_valid_volume_channels(factors.channels(), channels);

        (self.volume_kernel(format))(samples, factors, channels)
    }

    /// Scale a chunk in place
    ///
    /// Unity volume leaves the chunk untouched and a muted volume silences it. Otherwise the
    /// chunk is detached from shared memory before it is scaled.
    #[track_caller]
    pub fn scale_chunk(&self, chunk: &mut MemChunk, spec: &SampleSpec, volume: &ChannelVolume) {
        assert_valid_volume_channels(volume.channels(), spec.channels);

        if volume.is_norm() {
            return;
        }

        if volume.is_muted() {
            chunk.silence(spec.format);
            return;
        }

        let factors = VolumeFactors::from_volume(volume);
        chunk.make_writable();
        self.apply_volume(spec.format, &mut chunk.acquire_mut(), &factors, spec.channels);
    }
}
