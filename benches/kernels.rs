use iai::black_box;

use sample_kernels::{
    kernels, ChannelVolume, MemPool, MixInput, RemapMatrix, RemapPlan, SampleFormat, SampleSpec,
    Volume, VolumeFactors,
};

const FRAMES: usize = 4800;

fn noise(format: SampleFormat, samples: usize) -> Vec<u8> {
    let floats: Vec<f32> = (0..samples)
        .map(|i| ((i * 7919) % 2000) as f32 / 1000. - 1.)
        .collect();
    let mut bytes = vec![0u8; samples * format.sample_size()];
    kernels().from_float32(format, &floats, &mut bytes);
    bytes
}

fn mix(format: SampleFormat) {
    let spec = SampleSpec::new(format, 48000, 2);
    let pool = MemPool::new();
    let inputs: Vec<MixInput> = (0..4)
        .map(|i| {
            let volume = ChannelVolume::uniform(2, Volume::from_linear(0.2 * i as f64));
            MixInput::new(pool.allocate_from(&noise(format, 2 * FRAMES)), volume)
        })
        .collect();

    let mut dst = vec![0u8; FRAMES * spec.frame_size()];
    let length = kernels().mix(black_box(&inputs), &mut dst, &spec, None, false);
    assert_eq!(length, dst.len());
}

pub fn bench_mix_s16() {
    mix(SampleFormat::S16NE)
}

pub fn bench_mix_float() {
    mix(SampleFormat::FLOAT32NE)
}

pub fn bench_mix_s24() {
    mix(SampleFormat::S24Le)
}

pub fn bench_volume_s16() {
    let mut samples = noise(SampleFormat::S16NE, 2 * FRAMES);
    let volume = ChannelVolume::new(&[Volume::from_linear(0.5), Volume::from_linear(0.7)]);
    let factors = VolumeFactors::from_volume(&volume);
    kernels().apply_volume(SampleFormat::S16NE, black_box(&mut samples), &factors, 2);
}

pub fn bench_remap_surround() {
    let src = noise(SampleFormat::FLOAT32NE, 6 * FRAMES);
    let mut dst = vec![0u8; 2 * 4 * FRAMES];
    let plan = RemapPlan::new(
        kernels(),
        SampleFormat::FLOAT32NE,
        &RemapMatrix::surround_to_stereo(0.7, 0.5, 0.35),
    );
    plan.remap(&mut dst, black_box(&src), FRAMES);
}

pub fn bench_convert_ulaw_s24() {
    let src = noise(SampleFormat::Ulaw, 2 * FRAMES);
    let mut dst = vec![0u8; 3 * 2 * FRAMES];
    kernels().convert(
        SampleFormat::Ulaw,
        black_box(&src),
        SampleFormat::S24Be,
        &mut dst,
    );
}

iai::main!(
    bench_mix_s16,
    bench_mix_float,
    bench_mix_s24,
    bench_volume_s16,
    bench_remap_surround,
    bench_convert_ulaw_s24
);
