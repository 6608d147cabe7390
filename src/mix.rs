//! Summing of independently scaled input streams into one output buffer
use std::sync::Arc;

use arrayvec::ArrayVec;

use crate::alloc::{Acquired, MemChunk};
use crate::dispatch::{Kernels, MixKernel};
use crate::endian::{BigEndian, LittleEndian};
use crate::format::{silence_memory, SampleFormat, SampleSpec};
use crate::sample::{Alaw, FloatSample, NarrowSample, S16, S24, S24In32, S32, Ulaw, WideSample, F32, U8};
use crate::volume::{mul_fixed, ChannelVolume, VolumeFactors};

/// Maximum number of inputs of a single mix call
pub const MAX_MIX_INPUTS: usize = 32;

/// A chunk to be mixed with its per-channel volume
#[derive(Debug, Clone)]
pub struct MixInput {
    pub chunk: MemChunk,
    pub volume: ChannelVolume,
}

impl MixInput {
    pub fn new(chunk: MemChunk, volume: ChannelVolume) -> Self {
        Self { chunk, volume }
    }
}

/// Read cursor over the samples of one input, valid for the duration of a mix call
#[derive(Debug)]
pub struct MixStream<'a> {
    samples: &'a [u8],
    pos: usize,
    volume: VolumeFactors,
}

impl<'a> MixStream<'a> {
    pub fn new(samples: &'a [u8], volume: VolumeFactors) -> Self {
        Self {
            samples,
            pos: 0,
            volume,
        }
    }

    /// Bytes left after the cursor
    pub fn remaining(&self) -> &'a [u8] {
        &self.samples[self.pos..]
    }

    /// Move the cursor forward by `n` bytes
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.samples.len());
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn volume(&self) -> &VolumeFactors {
        &self.volume
    }
}

fn mix_narrow<C: NarrowSample>(streams: &mut [MixStream<'_>], channels: usize, dst: &mut [u8]) {
    for (i, d) in dst.chunks_exact_mut(C::SIZE).enumerate() {
        let channel = i % channels;
        let mut sum: i32 = 0;

        for stream in streams.iter_mut() {
            let gain = stream.volume.fixed()[channel];
            if gain > 0 {
                let v = C::load(stream.remaining());
                sum = sum.saturating_add(mul_fixed(v, gain));
            }
            stream.advance(C::SIZE);
        }

        C::store(d, sum);
    }
}

fn mix_wide<C: WideSample>(streams: &mut [MixStream<'_>], channels: usize, dst: &mut [u8]) {
    for (i, d) in dst.chunks_exact_mut(C::SIZE).enumerate() {
        let channel = i % channels;
        let mut sum: i64 = 0;

        for stream in streams.iter_mut() {
            let gain = stream.volume.fixed()[channel];
            if gain > 0 {
                let v = i64::from(C::load(stream.remaining()));
                sum += (v * i64::from(gain)) >> 16;
            }
            stream.advance(C::SIZE);
        }

        let sum = sum.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        C::store(d, sum);
    }
}

fn mix_float<C: FloatSample>(streams: &mut [MixStream<'_>], channels: usize, dst: &mut [u8]) {
    for (i, d) in dst.chunks_exact_mut(C::SIZE).enumerate() {
        let channel = i % channels;
        let mut sum: f32 = 0.;

        for stream in streams.iter_mut() {
            let gain = stream.volume.float()[channel];
            if gain > 0. {
                sum += C::load(stream.remaining()) * gain;
            }
            stream.advance(C::SIZE);
        }

        C::store(d, sum);
    }
}

pub(crate) fn portable_mix(format: SampleFormat) -> MixKernel {
    match format {
        SampleFormat::U8 => Arc::new(mix_narrow::<U8>),
        SampleFormat::Alaw => Arc::new(mix_narrow::<Alaw>),
        SampleFormat::Ulaw => Arc::new(mix_narrow::<Ulaw>),
        SampleFormat::S16Le => Arc::new(mix_narrow::<S16<LittleEndian>>),
        SampleFormat::S16Be => Arc::new(mix_narrow::<S16<BigEndian>>),
        SampleFormat::Float32Le => Arc::new(mix_float::<F32<LittleEndian>>),
        SampleFormat::Float32Be => Arc::new(mix_float::<F32<BigEndian>>),
        SampleFormat::S32Le => Arc::new(mix_wide::<S32<LittleEndian>>),
        SampleFormat::S32Be => Arc::new(mix_wide::<S32<BigEndian>>),
        SampleFormat::S24Le => Arc::new(mix_wide::<S24<LittleEndian>>),
        SampleFormat::S24Be => Arc::new(mix_wide::<S24<BigEndian>>),
        SampleFormat::S24_32Le => Arc::new(mix_wide::<S24In32<LittleEndian>>),
        SampleFormat::S24_32Be => Arc::new(mix_wide::<S24In32<BigEndian>>),
    }
}

impl Kernels {
    /// Mix `inputs` into `dst`, returning the number of bytes written
    ///
    /// The length is that of the shortest input, limited to `dst` and rounded down to whole
    /// frames. When `mute` is set, the master volume is muted or there are no inputs, all of
    /// `dst` is silenced and its full length is returned.
    ///
    /// # Panics
    ///
    /// This function panics if
    /// - the master volume does not have exactly `spec.channels` channels
    /// - an input volume covers fewer than `spec.channels` channels
    /// - there are more than [`MAX_MIX_INPUTS`] inputs
    /// - an input block is mutably acquired elsewhere
    #[track_caller]
    pub fn mix(
        &self,
        inputs: &[MixInput],
        dst: &mut [u8],
        spec: &SampleSpec,
        master: Option<&ChannelVolume>,
        mute: bool,
    ) -> usize {
        if let Some(master) = master {
            assert_eq!(
                master.channels(),
                spec.channels,
                "IndexSizeError - Master volume has {:?} channels, stream has {:?}",
                master.channels(),
                spec.channels
            );
        }
        assert!(
            inputs.len() <= MAX_MIX_INPUTS,
            "NotSupportedError - Cannot mix more than {:?} inputs",
            MAX_MIX_INPUTS
        );

        if mute || inputs.is_empty() || master.is_some_and(|m| m.is_muted()) {
            silence_memory(dst, spec.format);
            return dst.len();
        }

        let frame_size = spec.frame_size();
        let length = inputs
            .iter()
            .map(|input| input.chunk.len())
            .fold(dst.len(), usize::min);
        let length = length - length % frame_size;

        let guards: ArrayVec<Acquired<'_>, MAX_MIX_INPUTS> =
            inputs.iter().map(|input| input.chunk.acquire()).collect();

        let mut streams: ArrayVec<MixStream<'_>, MAX_MIX_INPUTS> = guards
            .iter()
            .zip(inputs)
            .map(|(samples, input)| {
                let volume = VolumeFactors::combined(&input.volume, master, spec.channels);
                MixStream::new(&samples[..length], volume)
            })
            .collect();

        (self.mix_kernel(spec.format))(&mut streams[..], spec.channels, &mut dst[..length]);

        length
    }
}
