use sample_kernels::{
    ChannelVolume, CpuInfo, Kernels, MemPool, MixInput, SampleFormat, SampleSpec, Volume,
    VolumeFactors,
};

fn s16ne(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
}

fn read_s16ne(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|b| i16::from_ne_bytes([b[0], b[1]]))
        .collect()
}

fn mono(gain: f64) -> ChannelVolume {
    ChannelVolume::new(&[Volume::from_linear(gain)])
}

fn registries() -> [Kernels; 2] {
    [Kernels::portable(), Kernels::with_cpu(&CpuInfo::detect())]
}

#[test]
fn test_two_streams_with_master_volume() {
    let a = [1000, -2000, 30000, 0, 32767, -32768, 123, -1, 16384, -16384];
    let b = [1000, 5000, 30000, -32768, 32767, -32768, -456, 1, -16384, 8192];

    // 0.8 -> 52429 and 0.3 * 0.8 -> 15729 in 16.16 fixed point
    let expected = [1040, -401, 31200, -7865, 32767, -32768, -12, -1, 9174, -11142];

    for kernels in registries() {
        let pool = MemPool::new();
        let spec = SampleSpec::new(SampleFormat::S16NE, 44100, 1);

        let inputs = [
            MixInput::new(pool.allocate_from(&s16ne(&a)), mono(1.)),
            MixInput::new(pool.allocate_from(&s16ne(&b)), mono(0.3)),
        ];

        let mut dst = vec![0u8; 20];
        let length = kernels.mix(&inputs, &mut dst, &spec, Some(&mono(0.8)), false);
        assert_eq!(length, 20);
        assert_eq!(read_s16ne(&dst), expected);
    }
}

#[test]
fn test_mute_yields_silence_pattern() {
    let kernels = Kernels::portable();
    let pool = MemPool::new();

    for format in SampleFormat::ALL {
        let spec = SampleSpec::new(format, 48000, 2);
        let noise: Vec<u8> = (0..96).map(|i| (i * 37 + 11) as u8).collect();
        let inputs = [MixInput::new(pool.allocate_from(&noise), ChannelVolume::norm(2))];

        let mut dst = vec![0x5au8; 48];
        let length = kernels.mix(&inputs, &mut dst, &spec, None, true);

        assert_eq!(length, 48);
        assert!(
            dst.iter().all(|b| *b == format.silence_byte()),
            "{} is not silenced",
            format
        );
    }
}

#[test]
fn test_zero_gains_yield_silence_pattern() {
    for kernels in registries() {
        for format in SampleFormat::ALL {
            let size = format.sample_size();
            let mut samples: Vec<f32> = (0..24).map(|i| (i as f32 - 12.) / 13.).collect();
            samples[0] = -1.;

            let mut bytes = vec![0u8; samples.len() * size];
            kernels.from_float32(format, &samples, &mut bytes);

            let factors = VolumeFactors::from_volume(&ChannelVolume::muted(2));
            kernels.apply_volume(format, &mut bytes, &factors, 2);

            assert!(
                bytes.iter().all(|b| *b == format.silence_byte()),
                "{} is not silenced",
                format
            );
        }
    }
}

#[test]
fn test_full_scale_saturates() {
    let pool = MemPool::new();

    for kernels in registries() {
        for format in SampleFormat::ALL.into_iter().filter(|f| !f.is_float()) {
            let spec = SampleSpec::new(format, 48000, 1);

            let mut full_scale = vec![0u8; 2 * format.sample_size()];
            kernels.from_float32(format, &[1., -1.], &mut full_scale);

            let inputs = [
                MixInput::new(pool.allocate_from(&full_scale), mono(1.)),
                MixInput::new(pool.allocate_from(&full_scale), mono(1.5)),
            ];

            let mut dst = vec![0u8; full_scale.len()];
            kernels.mix(&inputs, &mut dst, &spec, None, false);
            assert_eq!(dst, full_scale, "{} does not saturate", format);
        }
    }
}

#[test]
fn test_skipped_input_keeps_position() {
    // the second input is silent on the left channel only, its right channel must stay aligned
    let kernels = Kernels::portable();
    let pool = MemPool::new();
    let spec = SampleSpec::new(SampleFormat::S16NE, 48000, 2);

    let volume = ChannelVolume::new(&[Volume::MUTED, Volume::NORM]);
    let inputs = [
        MixInput::new(pool.allocate_from(&s16ne(&[1, 2, 3, 4, 5, 6])), ChannelVolume::norm(2)),
        MixInput::new(pool.allocate_from(&s16ne(&[10, 20, 30, 40, 50, 60])), volume),
    ];

    let mut dst = vec![0u8; 12];
    kernels.mix(&inputs, &mut dst, &spec, None, false);
    assert_eq!(read_s16ne(&dst), [1, 22, 3, 44, 5, 66]);
}

#[test]
fn test_mix_every_format() {
    let pool = MemPool::new();
    let kernels = Kernels::portable();

    for format in SampleFormat::ALL {
        let spec = SampleSpec::new(format, 48000, 1);
        let size = format.sample_size();

        let mut a = vec![0u8; 4 * size];
        let mut b = vec![0u8; 4 * size];
        kernels.from_s16(format, &[8000, -8000, 0, 4000], &mut a);
        kernels.from_s16(format, &[8000, 8000, 0, -4000], &mut b);

        let inputs = [
            MixInput::new(pool.allocate_from(&a), mono(1.)),
            MixInput::new(pool.allocate_from(&b), mono(1.)),
        ];

        let mut dst = vec![0u8; 4 * size];
        kernels.mix(&inputs, &mut dst, &spec, None, false);

        let mut out = [0i16; 4];
        kernels.to_s16(format, &dst, &mut out);

        // companded formats are only accurate to their step size
        let tolerance = match format {
            SampleFormat::U8 => 512,
            SampleFormat::Alaw | SampleFormat::Ulaw => 1024,
            _ => 1,
        };
        for (o, e) in out.iter().zip([16000i16, 0, 0, 0]) {
            assert!(
                (i32::from(*o) - i32::from(e)).abs() <= tolerance,
                "{}: {:?}",
                format,
                out
            );
        }
    }
}
