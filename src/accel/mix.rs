use std::sync::Arc;

use crate::dispatch::Kernels;
use crate::format::SampleFormat;
use crate::mix::MixStream;
use crate::volume::mul_fixed;

/// Samples accumulated per pass over the streams
const ACC_LEN: usize = 64;

/// Stream-major mixing, one accumulator block per pass
///
/// Sums are built in stream order, the same order as the portable kernel, so the output is
/// identical.
fn mix_float32ne(streams: &mut [MixStream<'_>], channels: usize, dst: &mut [u8]) {
    for out in dst.chunks_mut(4 * ACC_LEN) {
        let n = out.len() / 4;
        let mut acc = [0f32; ACC_LEN];

        for stream in streams.iter_mut() {
            let gains = stream.volume().float();
            let gains = [gains[0], gains[channels - 1]];
            let input = stream.remaining();

            for (i, (a, s)) in acc[..n].iter_mut().zip(input.chunks_exact(4)).enumerate() {
                let gain = gains[(i % channels).min(1)];
                if gain > 0. {
                    *a += f32::from_ne_bytes([s[0], s[1], s[2], s[3]]) * gain;
                }
            }

            stream.advance(4 * n);
        }

        out.chunks_exact_mut(4)
            .zip(acc)
            .for_each(|(d, v)| d.copy_from_slice(&v.to_ne_bytes()));
    }
}

fn mix_s16ne(streams: &mut [MixStream<'_>], channels: usize, dst: &mut [u8]) {
    for out in dst.chunks_mut(2 * ACC_LEN) {
        let n = out.len() / 2;
        let mut acc = [0i32; ACC_LEN];

        for stream in streams.iter_mut() {
            let gains = stream.volume().fixed();
            let gains = [gains[0], gains[channels - 1]];
            let input = stream.remaining();

            for (i, (a, s)) in acc[..n].iter_mut().zip(input.chunks_exact(2)).enumerate() {
                let gain = gains[(i % channels).min(1)];
                if gain > 0 {
                    let v = i32::from(i16::from_ne_bytes([s[0], s[1]]));
                    *a = a.saturating_add(mul_fixed(v, gain));
                }
            }

            stream.advance(2 * n);
        }

        out.chunks_exact_mut(2).zip(acc).for_each(|(d, v)| {
            let v = v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
            d.copy_from_slice(&v.to_ne_bytes())
        });
    }
}

pub(super) fn install(kernels: &mut Kernels) {
    let fallback = kernels.mix_kernel(SampleFormat::FLOAT32NE).clone();
    kernels.set_mix_kernel(
        SampleFormat::FLOAT32NE,
        Arc::new(
            move |streams: &mut [MixStream<'_>], channels: usize, dst: &mut [u8]| {
                if channels <= 2 {
                    mix_float32ne(streams, channels, dst)
                } else {
                    fallback(streams, channels, dst)
                }
            },
        ),
    );

    let fallback = kernels.mix_kernel(SampleFormat::S16NE).clone();
    kernels.set_mix_kernel(
        SampleFormat::S16NE,
        Arc::new(
            move |streams: &mut [MixStream<'_>], channels: usize, dst: &mut [u8]| {
                if channels <= 2 {
                    mix_s16ne(streams, channels, dst)
                } else {
                    fallback(streams, channels, dst)
                }
            },
        ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::MemPool;
    use crate::format::SampleSpec;
    use crate::mix::MixInput;
    use crate::volume::{ChannelVolume, Volume};

    #[test]
    fn test_stereo_matches_portable() {
        let portable = Kernels::portable();
        let mut optimized = Kernels::portable();
        install(&mut optimized);

        let pool = MemPool::new();
        let spec = SampleSpec::new(SampleFormat::S16NE, 48000, 2);

        // longer than one accumulator pass, odd number of frames
        let a: Vec<u8> = (0..202i16).flat_map(|i| (i * 157).to_ne_bytes()).collect();
        let b: Vec<u8> = (0..202i16).flat_map(|i| (-i * 163).to_ne_bytes()).collect();
        let volume = |l: f64, r: f64| {
            ChannelVolume::new(&[Volume::from_linear(l), Volume::from_linear(r)])
        };
        let inputs = [
            MixInput::new(pool.allocate_from(&a), volume(0.7, 0.)),
            MixInput::new(pool.allocate_from(&b), volume(1.3, 2.)),
        ];

        let mut expected = vec![0u8; a.len()];
        let mut actual = vec![0u8; a.len()];
        let master = volume(0.9, 0.9);
        assert_eq!(
            portable.mix(&inputs, &mut expected, &spec, Some(&master), false),
            optimized.mix(&inputs, &mut actual, &spec, Some(&master), false)
        );
        assert_eq!(expected, actual);
    }
}
