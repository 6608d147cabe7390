use std::sync::Arc;

use super::BLOCK;
use crate::dispatch::{Kernels, RemapKernel};
use crate::format::SampleFormat;
use crate::remap::{RemapKind, RemapPlan};
use crate::volume::FIXED_NORM;

/// Copy every `size` byte sample twice, a block of frames at a time
fn mono_to_stereo(plan: &RemapPlan, dst: &mut [u8], src: &[u8], frames: usize) {
    let size = plan.format().sample_size();
    let src = &src[..frames * size];
    let dst = &mut dst[..2 * frames * size];

    let mut src_blocks = src.chunks_exact(BLOCK * size);
    let mut dst_blocks = dst.chunks_exact_mut(2 * BLOCK * size);

    for (s, d) in (&mut src_blocks).zip(&mut dst_blocks) {
        for (s, d) in s.chunks_exact(size).zip(d.chunks_exact_mut(2 * size)) {
            d[..size].copy_from_slice(s);
            d[size..].copy_from_slice(s);
        }
    }

    src_blocks
        .remainder()
        .chunks_exact(size)
        .zip(dst_blocks.into_remainder().chunks_exact_mut(2 * size))
        .for_each(|(s, d)| {
            d[..size].copy_from_slice(s);
            d[size..].copy_from_slice(s);
        });
}

fn stereo_to_mono_s16ne(_plan: &RemapPlan, dst: &mut [u8], src: &[u8], frames: usize) {
    let src = &src[..4 * frames];
    let dst = &mut dst[..2 * frames];

    let mut src_blocks = src.chunks_exact(4 * BLOCK);
    let mut dst_blocks = dst.chunks_exact_mut(2 * BLOCK);
    let ld = |s: &[u8], i: usize| i16::from_ne_bytes([s[2 * i], s[2 * i + 1]]);

    for (s, d) in (&mut src_blocks).zip(&mut dst_blocks) {
        let v: [i16; BLOCK] = std::array::from_fn(|i| (ld(s, 2 * i) >> 1) + (ld(s, 2 * i + 1) >> 1));
        d.chunks_exact_mut(2)
            .zip(v)
            .for_each(|(d, v)| d.copy_from_slice(&v.to_ne_bytes()));
    }

    src_blocks
        .remainder()
        .chunks_exact(4)
        .zip(dst_blocks.into_remainder().chunks_exact_mut(2))
        .for_each(|(s, d)| {
            let v = (ld(s, 0) >> 1) + (ld(s, 1) >> 1);
            d.copy_from_slice(&v.to_ne_bytes());
        });
}

fn stereo_to_mono_float32ne(_plan: &RemapPlan, dst: &mut [u8], src: &[u8], frames: usize) {
    let src = &src[..8 * frames];
    let dst = &mut dst[..4 * frames];

    let mut src_blocks = src.chunks_exact(8 * BLOCK);
    let mut dst_blocks = dst.chunks_exact_mut(4 * BLOCK);
    let ld = |s: &[u8], i: usize| f32::from_ne_bytes([s[4 * i], s[4 * i + 1], s[4 * i + 2], s[4 * i + 3]]);

    for (s, d) in (&mut src_blocks).zip(&mut dst_blocks) {
        let v: [f32; BLOCK] = std::array::from_fn(|i| (ld(s, 2 * i) + ld(s, 2 * i + 1)) * 0.5);
        d.chunks_exact_mut(4)
            .zip(v)
            .for_each(|(d, v)| d.copy_from_slice(&v.to_ne_bytes()));
    }

    src_blocks
        .remainder()
        .chunks_exact(8)
        .zip(dst_blocks.into_remainder().chunks_exact_mut(4))
        .for_each(|(s, d)| {
            let v = (ld(s, 0) + ld(s, 1)) * 0.5;
            d.copy_from_slice(&v.to_ne_bytes());
        });
}

fn swap_stereo(plan: &RemapPlan, dst: &mut [u8], src: &[u8], frames: usize) {
    let size = plan.format().sample_size();
    let src = &src[..2 * frames * size];
    let dst = &mut dst[..2 * frames * size];

    src.chunks_exact(2 * size)
        .zip(dst.chunks_exact_mut(2 * size))
        .for_each(|(s, d)| {
            d[..size].copy_from_slice(&s[size..]);
            d[size..].copy_from_slice(&s[..size]);
        });
}

fn select(plan: &RemapPlan) -> Option<(RemapKind, RemapKernel)> {
    let m = |o, i| plan.gain_fixed(o, i);
    let is_s16 = plan.format() == SampleFormat::S16NE;

    match (plan.input_channels(), plan.output_channels()) {
        (1, 2) if m(0, 0) == FIXED_NORM && m(1, 0) == FIXED_NORM => {
            Some((RemapKind::MonoToStereo, Arc::new(mono_to_stereo)))
        }
        (2, 1) if m(0, 0) == 0x8000 && m(0, 1) == 0x8000 => {
            let kernel: RemapKernel = if is_s16 {
                Arc::new(stereo_to_mono_s16ne)
            } else {
                Arc::new(stereo_to_mono_float32ne)
            };
            Some((RemapKind::StereoToMono, kernel))
        }
        (2, 2) if m(0, 0) == 0 && m(0, 1) == FIXED_NORM && m(1, 0) == FIXED_NORM && m(1, 1) == 0 => {
            Some((RemapKind::StereoSwap, Arc::new(swap_stereo)))
        }
        _ => None,
    }
}

pub(super) fn install(kernels: &mut Kernels) {
    let previous = kernels.remap_selector().cloned();

    kernels.set_remap_selector(Some(Arc::new(move |plan: &RemapPlan| {
        select(plan).or_else(|| previous.as_ref().and_then(|select| select(plan)))
    })));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remap::RemapMatrix;

    #[test]
    fn test_swap() {
        let mut kernels = Kernels::portable();
        install(&mut kernels);

        let matrix = RemapMatrix::from_rows(&[&[0., 1.], &[1., 0.]]);
        let plan = RemapPlan::new(&kernels, SampleFormat::S16NE, &matrix);
        assert_eq!(plan.kind(), RemapKind::StereoSwap);

        let src: Vec<u8> = [1i16, 2, 3, 4].iter().flat_map(|s| s.to_ne_bytes()).collect();
        let mut dst = vec![0u8; 8];
        plan.remap(&mut dst, &src, 2);

        let expected: Vec<u8> = [2i16, 1, 4, 3].iter().flat_map(|s| s.to_ne_bytes()).collect();
        assert_eq!(dst, expected);
    }

    #[test]
    fn test_declined_shapes_use_portable_ladder() {
        let mut kernels = Kernels::portable();
        install(&mut kernels);

        let plan = RemapPlan::new(
            &kernels,
            SampleFormat::FLOAT32NE,
            &RemapMatrix::surround_to_stereo(0.5, 0.25, 0.125),
        );
        assert_eq!(plan.kind(), RemapKind::SurroundToStereo);
    }

    #[test]
    fn test_stereo_to_mono_matches_portable() {
        let mut optimized = Kernels::portable();
        install(&mut optimized);
        let portable = Kernels::portable();

        let matrix = RemapMatrix::average(2);
        let src: Vec<u8> = (0..38i16)
            .map(|i| i.wrapping_mul(-1733))
            .flat_map(|s| s.to_ne_bytes())
            .collect();

        let mut a = vec![0u8; 38];
        let mut b = vec![0u8; 38];
        RemapPlan::new(&portable, SampleFormat::S16NE, &matrix).remap(&mut a, &src, 19);
        RemapPlan::new(&optimized, SampleFormat::S16NE, &matrix).remap(&mut b, &src, 19);
        assert_eq!(a, b);
    }
}
