//! Channel remapping through an output × input gain matrix
//!
//! A [`RemapPlan`] holds the matrix in 16.16 fixed point and float, and the kernel selected for
//! it. Common topologies get a dedicated kernel, everything else runs the generic matrix kernel.
//! Only native 16 bit and native float samples can be remapped.

use std::fmt;
use std::sync::Arc;

use arrayvec::ArrayVec;

use crate::dispatch::{Kernels, RemapKernel, RemapSelector};
use crate::endian::NativeEndian;
use crate::format::SampleFormat;
use crate::sample::{FloatSample, NarrowSample, F32, S16};
use crate::volume::{mul_fixed, Volume, FIXED_NORM};
use crate::{assert_valid_number_of_channels, MAX_CHANNELS};

type S16Ne = S16<NativeEndian>;
type F32Ne = F32<NativeEndian>;

const FIXED_HALF: i32 = 0x8000;

/// Kernel family selected for a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemapKind {
    /// One input duplicated to two outputs at unity gain
    MonoToStereo,
    /// Average of two inputs
    StereoToMono,
    /// Two inputs to any number of outputs
    StereoToMany,
    /// 5.1 (FL, FR, RL, RR, FC, LFE) to stereo with a symmetric matrix
    SurroundToStereo,
    /// Left and right exchanged
    StereoSwap,
    /// Generic matrix
    Matrix,
}

/// Linear output × input gain matrix
#[derive(Debug, Clone, PartialEq)]
pub struct RemapMatrix {
    inputs: usize,
    outputs: usize,
    gains: Vec<f32>,
}

impl RemapMatrix {
    /// All zero matrix
    ///
    /// # Panics
    ///
    /// This function panics if a channel count is zero or exceeds [`MAX_CHANNELS`]
    #[track_caller]
    pub fn new(inputs: usize, outputs: usize) -> Self {
        assert_valid_number_of_channels(inputs);
        assert_valid_number_of_channels(outputs);

        Self {
            inputs,
            outputs,
            gains: vec![0.; inputs * outputs],
        }
    }

    /// Matrix with one row per output channel
    ///
    /// # Panics
    ///
    /// This function panics if the rows differ in length
    #[track_caller]
    pub fn from_rows(rows: &[&[f32]]) -> Self {
        let inputs = rows.first().map_or(0, |r| r.len());
        let mut matrix = Self::new(inputs, rows.len());

        for (o, row) in rows.iter().enumerate() {
            assert_eq!(
                row.len(),
                inputs,
                "IndexSizeError - Remap matrix rows must have equal length"
            );
            for (i, gain) in row.iter().enumerate() {
                matrix.set(o, i, *gain);
            }
        }

        matrix
    }

    /// Every output channel takes the same input channel
    #[track_caller]
    pub fn identity(channels: usize) -> Self {
        let mut matrix = Self::new(channels, channels);
        (0..channels).for_each(|c| matrix.set(c, c, 1.));
        matrix
    }

    /// A single input copied to every output
    #[track_caller]
    pub fn upmix_mono(outputs: usize) -> Self {
        let mut matrix = Self::new(1, outputs);
        (0..outputs).for_each(|o| matrix.set(o, 0, 1.));
        matrix
    }

    /// Every input averaged into a single output
    #[track_caller]
    pub fn average(inputs: usize) -> Self {
        let mut matrix = Self::new(inputs, 1);
        let gain = 1. / inputs as f32;
        (0..inputs).for_each(|i| matrix.set(0, i, gain));
        matrix
    }

    /// 5.1 (FL, FR, RL, RR, FC, LFE) to stereo
    ///
    /// Center and LFE are both mixed into each output at `center` gain.
    pub fn surround_to_stereo(front: f32, rear: f32, center: f32) -> Self {
        Self::from_rows(&[
            &[front, 0., rear, 0., center, center],
            &[0., front, 0., rear, center, center],
        ])
    }

    pub fn inputs(&self) -> usize {
        self.inputs
    }

    pub fn outputs(&self) -> usize {
        self.outputs
    }

    pub fn get(&self, output: usize, input: usize) -> f32 {
        assert!(input < self.inputs);
        self.gains[output * self.inputs + input]
    }

    pub fn set(&mut self, output: usize, input: usize, gain: f32) {
        assert!(input < self.inputs);
        self.gains[output * self.inputs + input] = gain;
    }
}

/// Remapping between two channel layouts, with its selected kernel
#[derive(Clone)]
pub struct RemapPlan {
    format: SampleFormat,
    inputs: usize,
    outputs: usize,
    map_fixed: Vec<i32>,
    map_float: Vec<f32>,
    kind: RemapKind,
    kernel: RemapKernel,
    selector: Option<RemapSelector>,
}

/// Assert the sample format can be remapped
///
/// # Panics
///
/// This function panics for anything but native 16 bit or native float
#[track_caller]
fn assert_valid_remap_format(format: SampleFormat) {
    assert!(
        format == SampleFormat::S16NE || format == SampleFormat::FLOAT32NE,
        "NotSupportedError - Cannot remap samples of format {}",
        format
    );
}

fn to_fixed(gain: f32) -> i32 {
    Volume::from_linear(f64::from(gain)).to_fixed()
}

fn to_float(gain: f32) -> f32 {
    if gain > 0. {
        gain
    } else {
        0.
    }
}

impl RemapPlan {
    /// Build a plan, consulting the remap selector installed in `kernels` first
    ///
    /// # Panics
    ///
    /// This function panics if `format` is not native 16 bit or native float
    #[track_caller]
    pub fn new(kernels: &Kernels, format: SampleFormat, matrix: &RemapMatrix) -> Self {
        assert_valid_remap_format(format);

        let mut plan = Self {
            format,
            inputs: matrix.inputs,
            outputs: matrix.outputs,
            map_fixed: matrix.gains.iter().map(|g| to_fixed(*g)).collect(),
            map_float: matrix.gains.iter().map(|g| to_float(*g)).collect(),
            kind: RemapKind::Matrix,
            kernel: Arc::new(remap_channels_matrix),
            selector: kernels.remap_selector().cloned(),
        };
        plan.select();

        plan
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    pub fn input_channels(&self) -> usize {
        self.inputs
    }

    pub fn output_channels(&self) -> usize {
        self.outputs
    }

    pub fn kind(&self) -> RemapKind {
        self.kind
    }

    /// 16.16 fixed point gain from `input` to `output`
    pub fn gain_fixed(&self, output: usize, input: usize) -> i32 {
        self.map_fixed[output * self.inputs + input]
    }

    /// Float gain from `input` to `output`
    pub fn gain_float(&self, output: usize, input: usize) -> f32 {
        self.map_float[output * self.inputs + input]
    }

    /// Change a single gain and select the kernel again
    pub fn set_gain(&mut self, output: usize, input: usize, gain: f32) {
        assert!(input < self.inputs && output < self.outputs);
        let i = output * self.inputs + input;
        self.map_fixed[i] = to_fixed(gain);
        self.map_float[i] = to_float(gain);
        self.select();
    }

    /// Replace the matrix, channel counts included, and select the kernel again
    pub fn set_matrix(&mut self, matrix: &RemapMatrix) {
        self.inputs = matrix.inputs;
        self.outputs = matrix.outputs;
        self.map_fixed = matrix.gains.iter().map(|g| to_fixed(*g)).collect();
        self.map_float = matrix.gains.iter().map(|g| to_float(*g)).collect();
        self.select();
    }

    fn select(&mut self) {
        let selected = self.selector.as_ref().and_then(|select| select(self));
        let (kind, kernel) = selected.unwrap_or_else(|| select_portable(self));

        log::debug!(
            "Using {:?} remapping for {} -> {} channels",
            kind,
            self.inputs,
            self.outputs
        );

        self.kind = kind;
        self.kernel = kernel;
    }

    /// Remap `frames` interleaved frames from `src` to `dst`
    ///
    /// # Panics
    ///
    /// This function panics if either buffer holds fewer than `frames` frames
    #[track_caller]
    pub fn remap(&self, dst: &mut [u8], src: &[u8], frames: usize) {
        let size = self.format.sample_size();
        assert!(
            src.len() >= frames * self.inputs * size && dst.len() >= frames * self.outputs * size,
            "IndexSizeError - Remap buffers hold fewer than {:?} frames",
            frames
        );

        (self.kernel)(self, dst, src, frames)
    }
}

impl fmt::Debug for RemapPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemapPlan")
            .field("format", &self.format)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("map_fixed", &self.map_fixed)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Pattern match the fixed point matrix against the specialized kernels
fn select_portable(plan: &RemapPlan) -> (RemapKind, RemapKernel) {
    let m = |o, i| plan.gain_fixed(o, i);

    match (plan.inputs, plan.outputs) {
        (1, 2) if m(0, 0) == FIXED_NORM && m(1, 0) == FIXED_NORM => {
            (RemapKind::MonoToStereo, Arc::new(remap_mono_to_stereo))
        }
        (2, 1) if m(0, 0) == FIXED_HALF && m(0, 1) == FIXED_HALF => {
            (RemapKind::StereoToMono, Arc::new(remap_stereo_to_mono))
        }
        (2, _) => (RemapKind::StereoToMany, Arc::new(remap_stereo_to_many)),
        (6, 2) if is_symmetric_surround(plan) => {
            (RemapKind::SurroundToStereo, Arc::new(remap_surround_to_stereo))
        }
        _ => (RemapKind::Matrix, Arc::new(remap_channels_matrix)),
    }
}

fn is_symmetric_surround(plan: &RemapPlan) -> bool {
    let m = |o, i| plan.gain_fixed(o, i);

    m(0, 0) == m(1, 1)
        && m(0, 2) == m(1, 3)
        && m(0, 1) == 0
        && m(1, 0) == 0
        && m(0, 3) == 0
        && m(1, 2) == 0
        && m(0, 4) == m(1, 4)
        && m(0, 4) == m(0, 5)
        && m(0, 4) == m(1, 5)
}

/// Walk matching input and output frames, four at a time and then the remainder
#[inline(always)]
fn for_each_frame(
    src: &[u8],
    in_frame: usize,
    dst: &mut [u8],
    out_frame: usize,
    mut f: impl FnMut(&[u8], &mut [u8]),
) {
    let mut src_blocks = src.chunks_exact(4 * in_frame);
    let mut dst_blocks = dst.chunks_exact_mut(4 * out_frame);

    for (s, d) in (&mut src_blocks).zip(&mut dst_blocks) {
        let (d0, d) = d.split_at_mut(out_frame);
        let (d1, d) = d.split_at_mut(out_frame);
        let (d2, d3) = d.split_at_mut(out_frame);
        f(&s[..in_frame], d0);
        f(&s[in_frame..2 * in_frame], d1);
        f(&s[2 * in_frame..3 * in_frame], d2);
        f(&s[3 * in_frame..], d3);
    }

    src_blocks
        .remainder()
        .chunks_exact(in_frame)
        .zip(dst_blocks.into_remainder().chunks_exact_mut(out_frame))
        .for_each(|(s, d)| f(s, d));
}

fn frame_slices<'a, 'b>(
    plan: &RemapPlan,
    dst: &'a mut [u8],
    src: &'b [u8],
    frames: usize,
) -> (&'a mut [u8], &'b [u8], usize) {
    let size = plan.format.sample_size();
    (
        &mut dst[..frames * plan.outputs * size],
        &src[..frames * plan.inputs * size],
        size,
    )
}

fn remap_mono_to_stereo(plan: &RemapPlan, dst: &mut [u8], src: &[u8], frames: usize) {
    let (dst, src, size) = frame_slices(plan, dst, src, frames);

    for_each_frame(src, size, dst, 2 * size, |s, d| {
        d[..size].copy_from_slice(s);
        d[size..].copy_from_slice(s);
    });
}

fn remap_stereo_to_mono(plan: &RemapPlan, dst: &mut [u8], src: &[u8], frames: usize) {
    let (dst, src, size) = frame_slices(plan, dst, src, frames);

    if plan.format == SampleFormat::S16NE {
        src.chunks_exact(2 * size)
            .zip(dst.chunks_exact_mut(size))
            .for_each(|(s, d)| {
                let v = (S16Ne::load(s) >> 1) + (S16Ne::load(&s[size..]) >> 1);
                S16Ne::store(d, v);
            });
    } else {
        src.chunks_exact(2 * size)
            .zip(dst.chunks_exact_mut(size))
            .for_each(|(s, d)| {
                let v = (F32Ne::load(s) + F32Ne::load(&s[size..])) * 0.5;
                F32Ne::store(d, v);
            });
    }
}

/// How a single output channel is produced from two inputs
#[derive(Debug, Clone, Copy)]
enum StereoSource {
    Silence,
    Copy(usize),
    Average,
    Weighted,
}

fn stereo_source(plan: &RemapPlan, output: usize) -> StereoSource {
    let l = plan.gain_fixed(output, 0);
    let r = plan.gain_fixed(output, 1);

    if l <= 0 && r <= 0 {
        StereoSource::Silence
    } else if l == FIXED_NORM && r <= 0 {
        StereoSource::Copy(0)
    } else if r == FIXED_NORM && l <= 0 {
        StereoSource::Copy(1)
    } else if l == FIXED_HALF && r == FIXED_HALF {
        StereoSource::Average
    } else {
        StereoSource::Weighted
    }
}

fn remap_stereo_to_many(plan: &RemapPlan, dst: &mut [u8], src: &[u8], frames: usize) {
    let (dst, src, size) = frame_slices(plan, dst, src, frames);
    let sources: ArrayVec<StereoSource, MAX_CHANNELS> =
        (0..plan.outputs).map(|o| stereo_source(plan, o)).collect();

    let is_s16 = plan.format == SampleFormat::S16NE;

    for_each_frame(src, 2 * size, dst, plan.outputs * size, |s, d| {
        for (o, (source, out)) in sources.iter().zip(d.chunks_exact_mut(size)).enumerate() {
            match *source {
                StereoSource::Silence => out.fill(0),
                StereoSource::Copy(c) => out.copy_from_slice(&s[c * size..(c + 1) * size]),
                StereoSource::Average if is_s16 => {
                    let v = (S16Ne::load(s) >> 1) + (S16Ne::load(&s[size..]) >> 1);
                    S16Ne::store(out, v);
                }
                StereoSource::Average => {
                    let v = (F32Ne::load(s) + F32Ne::load(&s[size..])) * 0.5;
                    F32Ne::store(out, v);
                }
                StereoSource::Weighted if is_s16 => {
                    let l = mul_fixed(S16Ne::load(s), plan.gain_fixed(o, 0));
                    let r = mul_fixed(S16Ne::load(&s[size..]), plan.gain_fixed(o, 1));
                    S16Ne::store(out, l.saturating_add(r));
                }
                StereoSource::Weighted => {
                    let l = F32Ne::load(s) * plan.gain_float(o, 0);
                    let r = F32Ne::load(&s[size..]) * plan.gain_float(o, 1);
                    F32Ne::store(out, l + r);
                }
            }
        }
    });
}

fn remap_surround_to_stereo(plan: &RemapPlan, dst: &mut [u8], src: &[u8], frames: usize) {
    let (dst, src, size) = frame_slices(plan, dst, src, frames);

    if plan.format == SampleFormat::S16NE {
        let front = plan.gain_fixed(0, 0);
        let rear = plan.gain_fixed(0, 2);
        let center = plan.gain_fixed(0, 4);
        let ld = |s: &[u8], c: usize| S16Ne::load(&s[c * size..]);

        src.chunks_exact(6 * size)
            .zip(dst.chunks_exact_mut(2 * size))
            .for_each(|(s, d)| {
                let c = mul_fixed(ld(s, 4), center);
                let lfe = mul_fixed(ld(s, 5), center);
                let l = mul_fixed(ld(s, 0), front)
                    .saturating_add(mul_fixed(ld(s, 2), rear))
                    .saturating_add(c)
                    .saturating_add(lfe);
                let r = mul_fixed(ld(s, 1), front)
                    .saturating_add(mul_fixed(ld(s, 3), rear))
                    .saturating_add(c)
                    .saturating_add(lfe);
                S16Ne::store(d, l);
                S16Ne::store(&mut d[size..], r);
            });
    } else {
        let front = plan.gain_float(0, 0);
        let rear = plan.gain_float(0, 2);
        let center = plan.gain_float(0, 4);
        let ld = |s: &[u8], c: usize| F32Ne::load(&s[c * size..]);

        src.chunks_exact(6 * size)
            .zip(dst.chunks_exact_mut(2 * size))
            .for_each(|(s, d)| {
                let l = ld(s, 0) * front + ld(s, 2) * rear + ld(s, 4) * center + ld(s, 5) * center;
                let r = ld(s, 1) * front + ld(s, 3) * rear + ld(s, 4) * center + ld(s, 5) * center;
                F32Ne::store(d, l);
                F32Ne::store(&mut d[size..], r);
            });
    }
}

/// Generic matrix kernel, valid for every plan
///
/// Inputs with a gain `<= 0` are skipped and unity gains skip the multiply. 16 bit sums are
/// accumulated in 32 bits and saturated on store.
pub fn remap_channels_matrix(plan: &RemapPlan, dst: &mut [u8], src: &[u8], frames: usize) {
    let (dst, src, size) = frame_slices(plan, dst, src, frames);
    let (inputs, outputs) = (plan.inputs, plan.outputs);

    if plan.format == SampleFormat::S16NE {
        src.chunks_exact(inputs * size)
            .zip(dst.chunks_exact_mut(outputs * size))
            .for_each(|(s, d)| {
                for (o, out) in d.chunks_exact_mut(size).enumerate() {
                    let mut acc: i32 = 0;
                    for (i, sample) in s.chunks_exact(size).enumerate() {
                        let gain = plan.gain_fixed(o, i);
                        if gain <= 0 {
                            continue;
                        }
                        let v = S16Ne::load(sample);
                        let v = if gain == FIXED_NORM {
                            v
                        } else {
                            mul_fixed(v, gain)
                        };
                        acc = acc.saturating_add(v);
                    }
                    S16Ne::store(out, acc);
                }
            });
    } else {
        src.chunks_exact(inputs * size)
            .zip(dst.chunks_exact_mut(outputs * size))
            .for_each(|(s, d)| {
                for (o, out) in d.chunks_exact_mut(size).enumerate() {
                    let mut acc: f32 = 0.;
                    for (i, sample) in s.chunks_exact(size).enumerate() {
                        let gain = plan.gain_float(o, i);
                        if gain <= 0. {
                            continue;
                        }
                        let v = F32Ne::load(sample);
                        acc += if gain == 1. { v } else { v * gain };
                    }
                    F32Ne::store(out, acc);
                }
            });
    }
}
