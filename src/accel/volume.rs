use std::sync::Arc;

use super::BLOCK;
use crate::dispatch::Kernels;
use crate::format::SampleFormat;
use crate::volume::{mul_fixed, VolumeFactors};

fn scale_s16ne(samples: &mut [u8], gains: &[i32; BLOCK]) {
    let mut blocks = samples.chunks_exact_mut(2 * BLOCK);

    for block in &mut blocks {
        let v: [i32; BLOCK] =
            std::array::from_fn(|i| i32::from(i16::from_ne_bytes([block[2 * i], block[2 * i + 1]])));
        let v: [i16; BLOCK] = std::array::from_fn(|i| {
            mul_fixed(v[i], gains[i]).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
        });
        block
            .chunks_exact_mut(2)
            .zip(v)
            .for_each(|(b, v)| b.copy_from_slice(&v.to_ne_bytes()));
    }

    // blocks hold a whole number of frames, the remainder starts at channel 0
    blocks
        .into_remainder()
        .chunks_exact_mut(2)
        .zip(gains.iter())
        .for_each(|(b, &gain)| {
            let v = mul_fixed(i32::from(i16::from_ne_bytes([b[0], b[1]])), gain);
            let v = v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
            b.copy_from_slice(&v.to_ne_bytes());
        });
}

fn scale_float32ne(samples: &mut [u8], gain: f32) {
    if gain <= 0. {
        let n = samples.len() - samples.len() % 4;
        samples[..n].fill(0);
        return;
    }

    let mut blocks = samples.chunks_exact_mut(4 * BLOCK);

    for block in &mut blocks {
        let v: [f32; BLOCK] = std::array::from_fn(|i| {
            f32::from_ne_bytes([block[4 * i], block[4 * i + 1], block[4 * i + 2], block[4 * i + 3]])
        });
        block
            .chunks_exact_mut(4)
            .zip(v)
            .for_each(|(b, v)| b.copy_from_slice(&(v * gain).to_ne_bytes()));
    }

    blocks.into_remainder().chunks_exact_mut(4).for_each(|b| {
        let v = f32::from_ne_bytes([b[0], b[1], b[2], b[3]]);
        b.copy_from_slice(&(v * gain).to_ne_bytes());
    });
}

fn all_equal<T: PartialEq>(gains: &[T]) -> bool {
    gains.windows(2).all(|w| w[0] == w[1])
}

pub(super) fn install(kernels: &mut Kernels) {
    let fallback = kernels.volume_kernel(SampleFormat::S16NE).clone();
    kernels.set_volume_kernel(
        SampleFormat::S16NE,
        Arc::new(
            move |samples: &mut [u8], factors: &VolumeFactors, channels: usize| {
                let gains = &factors.fixed()[..channels];

                if channels == 2 {
                    let block = std::array::from_fn(|i| gains[i % 2]);
                    scale_s16ne(samples, &block);
                } else if all_equal(gains) {
                    scale_s16ne(samples, &[gains[0]; BLOCK]);
                } else {
                    fallback(samples, factors, channels)
                }
            },
        ),
    );

    let fallback = kernels.volume_kernel(SampleFormat::FLOAT32NE).clone();
    kernels.set_volume_kernel(
        SampleFormat::FLOAT32NE,
        Arc::new(
            move |samples: &mut [u8], factors: &VolumeFactors, channels: usize| {
                let gains = &factors.float()[..channels];

                if all_equal(gains) {
                    scale_float32ne(samples, gains[0]);
                } else {
                    fallback(samples, factors, channels)
                }
            },
        ),
    );
}
