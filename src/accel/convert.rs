use std::sync::Arc;

use super::BLOCK;
use crate::dispatch::Kernels;
use crate::format::SampleFormat;
use crate::sample::{clamp_round_f32, F32_S16_SCALE};

/// Decode `dst.len()` samples of `SIZE` bytes
#[inline(always)]
fn decode<T, const SIZE: usize>(src: &[u8], dst: &mut [T], f: impl Fn([u8; SIZE]) -> T) {
    let src = &src[..dst.len() * SIZE];
    let mut src_blocks = src.chunks_exact(SIZE * BLOCK);
    let mut dst_blocks = dst.chunks_exact_mut(BLOCK);

    for (s, d) in (&mut src_blocks).zip(&mut dst_blocks) {
        let raw: [[u8; SIZE]; BLOCK] =
            std::array::from_fn(|i| std::array::from_fn(|j| s[i * SIZE + j]));
        d.iter_mut().zip(raw).for_each(|(d, r)| *d = f(r));
    }

    src_blocks
        .remainder()
        .chunks_exact(SIZE)
        .zip(dst_blocks.into_remainder())
        .for_each(|(s, d)| *d = f(std::array::from_fn(|j| s[j])));
}

/// Encode `src.len()` samples to `SIZE` bytes each
#[inline(always)]
fn encode<T: Copy, const SIZE: usize>(src: &[T], dst: &mut [u8], f: impl Fn(T) -> [u8; SIZE]) {
    let dst = &mut dst[..src.len() * SIZE];
    let mut src_blocks = src.chunks_exact(BLOCK);
    let mut dst_blocks = dst.chunks_exact_mut(SIZE * BLOCK);

    for (s, d) in (&mut src_blocks).zip(&mut dst_blocks) {
        let raw: [[u8; SIZE]; BLOCK] = std::array::from_fn(|i| f(s[i]));
        d.chunks_exact_mut(SIZE)
            .zip(raw)
            .for_each(|(d, r)| d.copy_from_slice(&r));
    }

    src_blocks
        .remainder()
        .iter()
        .zip(dst_blocks.into_remainder().chunks_exact_mut(SIZE))
        .for_each(|(s, d)| d.copy_from_slice(&f(*s)));
}

#[inline(always)]
fn float_to_s16(v: f32) -> i16 {
    clamp_round_f32(v * F32_S16_SCALE, -F32_S16_SCALE, F32_S16_SCALE - 1.) as i16
}

#[inline(always)]
fn s16_to_float(s: i16) -> f32 {
    f32::from(s) / F32_S16_SCALE
}

#[inline(always)]
fn swapped_f32(b: [u8; 4]) -> f32 {
    f32::from_bits(u32::from_ne_bytes(b).swap_bytes())
}

#[inline(always)]
fn swapped_f32_bytes(v: f32) -> [u8; 4] {
    v.to_bits().swap_bytes().to_ne_bytes()
}

pub(super) fn install(kernels: &mut Kernels) {
    use SampleFormat as F;

    // native 16 bit and native float
    kernels.set_to_float_kernel(
        F::S16NE,
        Arc::new(|src: &[u8], dst: &mut [f32]| {
            decode(src, dst, |b| s16_to_float(i16::from_ne_bytes(b)))
        }),
    );
    kernels.set_from_float_kernel(
        F::S16NE,
        Arc::new(|src: &[f32], dst: &mut [u8]| {
            encode(src, dst, |v| float_to_s16(v).to_ne_bytes())
        }),
    );
    kernels.set_to_s16_kernel(
        F::FLOAT32NE,
        Arc::new(|src: &[u8], dst: &mut [i16]| {
            decode(src, dst, |b| float_to_s16(f32::from_ne_bytes(b)))
        }),
    );
    kernels.set_from_s16_kernel(
        F::FLOAT32NE,
        Arc::new(|src: &[i16], dst: &mut [u8]| {
            encode(src, dst, |s| s16_to_float(s).to_ne_bytes())
        }),
    );

    // reverse endian float with native 16 bit
    kernels.set_to_s16_kernel(
        F::FLOAT32RE,
        Arc::new(|src: &[u8], dst: &mut [i16]| {
            decode(src, dst, |b| float_to_s16(swapped_f32(b)))
        }),
    );
    kernels.set_from_s16_kernel(
        F::FLOAT32RE,
        Arc::new(|src: &[i16], dst: &mut [u8]| {
            encode(src, dst, |s| swapped_f32_bytes(s16_to_float(s)))
        }),
    );

    // reverse endian 16 bit with native float
    kernels.set_to_float_kernel(
        F::S16RE,
        Arc::new(|src: &[u8], dst: &mut [f32]| {
            decode(src, dst, |b| s16_to_float(i16::from_ne_bytes(b).swap_bytes()))
        }),
    );
    kernels.set_from_float_kernel(
        F::S16RE,
        Arc::new(|src: &[f32], dst: &mut [u8]| {
            encode(src, dst, |v| float_to_s16(v).swap_bytes().to_ne_bytes())
        }),
    );

    // 16 bit byte swap
    kernels.set_to_s16_kernel(
        F::S16RE,
        Arc::new(|src: &[u8], dst: &mut [i16]| {
            decode(src, dst, |b| i16::from_ne_bytes(b).swap_bytes())
        }),
    );
    kernels.set_from_s16_kernel(
        F::S16RE,
        Arc::new(|src: &[i16], dst: &mut [u8]| {
            encode(src, dst, |s| s.swap_bytes().to_ne_bytes())
        }),
    );

    kernels.set_from_s16_kernel(
        F::S32NE,
        Arc::new(|src: &[i16], dst: &mut [u8]| {
            encode(src, dst, |s| (i32::from(s) << 16).to_ne_bytes())
        }),
    );
}
