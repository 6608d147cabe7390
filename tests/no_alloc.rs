use alloc_counter::{deny_alloc, AllocCounterSystem};

use sample_kernels::{
    kernels, ChannelVolume, MemChunk, MemPool, MixInput, RemapMatrix, RemapPlan, SampleFormat,
    SampleSpec, Volume, VolumeFactors,
};

#[global_allocator]
static A: AllocCounterSystem = AllocCounterSystem;

#[test]
fn test_kernels_do_not_allocate() {
    let kernels = kernels();
    let pool = MemPool::new();

    for format in [SampleFormat::S16NE, SampleFormat::FLOAT32NE, SampleFormat::Ulaw] {
        let spec = SampleSpec::new(format, 48000, 2);
        let len = 256 * spec.frame_size();

        let inputs = [
            MixInput::new(MemChunk::from_block(pool.allocate(len)), ChannelVolume::norm(2)),
            MixInput::new(
                MemChunk::from_block(pool.allocate(len)),
                ChannelVolume::uniform(2, Volume::from_linear(0.5)),
            ),
        ];
        let master = ChannelVolume::uniform(2, Volume::from_linear(0.9));
        let factors = VolumeFactors::from_volume(&master);
        let mut dst = vec![0u8; len];
        let mut other = vec![0u8; 256 * 2 * 4];

        deny_alloc(|| {
            kernels.mix(&inputs, &mut dst, &spec, Some(&master), false);
            kernels.mix(&inputs, &mut dst, &spec, None, true);
            kernels.apply_volume(format, &mut dst, &factors, 2);
            kernels.convert(format, &dst, SampleFormat::S24_32Be, &mut other[..]);
        });
    }
}

#[test]
fn test_remap_does_not_allocate() {
    let kernels = kernels();

    let row: &[f32] = &[1., 0.5, 0.25];

    for format in [SampleFormat::S16NE, SampleFormat::FLOAT32NE] {
        let plans = [
            RemapPlan::new(kernels, format, &RemapMatrix::upmix_mono(2)),
            RemapPlan::new(kernels, format, &RemapMatrix::surround_to_stereo(0.5, 0.5, 0.5)),
            RemapPlan::new(kernels, format, &RemapMatrix::from_rows(&[row; 4])),
        ];
        let src = vec![0u8; 128 * 6 * 4];
        let mut dst = vec![0u8; 128 * 6 * 4];

        deny_alloc(|| {
            for plan in &plans {
                plan.remap(&mut dst, &src, 128);
            }
        });
    }
}
