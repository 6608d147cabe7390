//! Mix WAV files into a single 16 bit WAV file
//!
//! ```text
//! mixdown [-o OUTPUT] [-c CHANNELS] INPUT[:GAIN]...
//! ```
use std::error::Error;
use std::path::PathBuf;

use sample_kernels::{
    kernels, ChannelVolume, MemPool, MixInput, RemapMatrix, RemapPlan, SampleFormat, SampleSpec,
    Volume,
};

struct Input {
    path: PathBuf,
    gain: f64,
}

struct Options {
    output: PathBuf,
    channels: usize,
    inputs: Vec<Input>,
}

fn parse_input(arg: &str) -> Result<Input, Box<dyn Error>> {
    match arg.rsplit_once(':') {
        Some((path, gain)) if !path.is_empty() => Ok(Input {
            path: path.into(),
            gain: gain.parse().map_err(|e| format!("invalid gain {gain:?}: {e}"))?,
        }),
        _ => Ok(Input {
            path: arg.into(),
            gain: 1.,
        }),
    }
}

fn parse_args() -> Result<Options, Box<dyn Error>> {
    let mut options = Options {
        output: "mixdown.wav".into(),
        channels: 2,
        inputs: vec![],
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-o" => options.output = args.next().ok_or("missing value for -o")?.into(),
            "-c" => options.channels = args.next().ok_or("missing value for -c")?.parse()?,
            _ => options.inputs.push(parse_input(&arg)?),
        }
    }

    if options.inputs.is_empty() {
        return Err("usage: mixdown [-o OUTPUT] [-c CHANNELS] INPUT[:GAIN]...".into());
    }
    if options.channels == 0 || options.channels > sample_kernels::MAX_CHANNELS {
        return Err(format!("unsupported channel count {}", options.channels).into());
    }
    if options.inputs.len() > sample_kernels::mix::MAX_MIX_INPUTS {
        return Err(format!(
            "at most {} inputs can be mixed",
            sample_kernels::mix::MAX_MIX_INPUTS
        )
        .into());
    }

    Ok(options)
}

/// Interleaved samples of a WAV file in their closest native format
fn read_wav(input: &Input) -> Result<(SampleSpec, Vec<u8>), Box<dyn Error>> {
    let mut reader = hound::WavReader::open(&input.path)?;
    let hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample,
        sample_format,
    } = reader.spec();

    let (format, bytes): (SampleFormat, Vec<u8>) = match (sample_format, bits_per_sample) {
        (hound::SampleFormat::Float, 32) => {
            let samples = reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?;
            let bytes = samples.iter().flat_map(|s| s.to_ne_bytes()).collect();
            (SampleFormat::FLOAT32NE, bytes)
        }
        (hound::SampleFormat::Int, 8) => {
            let samples = reader.samples::<i8>().collect::<Result<Vec<_>, _>>()?;
            let bytes = samples.iter().map(|s| (*s as u8) ^ 0x80).collect();
            (SampleFormat::U8, bytes)
        }
        (hound::SampleFormat::Int, 16) => {
            let samples = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
            let bytes = samples.iter().flat_map(|s| s.to_ne_bytes()).collect();
            (SampleFormat::S16NE, bytes)
        }
        (hound::SampleFormat::Int, 24) => {
            let samples = reader.samples::<i32>().collect::<Result<Vec<_>, _>>()?;
            let bytes = samples.iter().flat_map(|s| s.to_ne_bytes()).collect();
            (SampleFormat::S24_32NE, bytes)
        }
        (hound::SampleFormat::Int, 32) => {
            let samples = reader.samples::<i32>().collect::<Result<Vec<_>, _>>()?;
            let bytes = samples.iter().flat_map(|s| s.to_ne_bytes()).collect();
            (SampleFormat::S32NE, bytes)
        }
        (format, bits) => {
            return Err(format!(
                "{}: unsupported sample format {:?} with {} bits",
                input.path.display(),
                format,
                bits
            )
            .into())
        }
    };

    let channels = usize::from(channels);
    if channels == 0 || channels > sample_kernels::MAX_CHANNELS {
        return Err(format!("{}: unsupported channel count {}", input.path.display(), channels).into());
    }

    Ok((SampleSpec::new(format, sample_rate, channels), bytes))
}

fn remap_matrix(inputs: usize, outputs: usize) -> RemapMatrix {
    if inputs == outputs {
        RemapMatrix::identity(inputs)
    } else if inputs == 1 {
        RemapMatrix::upmix_mono(outputs)
    } else if outputs == 1 {
        RemapMatrix::average(inputs)
    } else if inputs == 6 && outputs == 2 {
        RemapMatrix::surround_to_stereo(0.5, 0.25, 0.25)
    } else {
        let mut matrix = RemapMatrix::new(inputs, outputs);
        (0..inputs.min(outputs)).for_each(|c| matrix.set(c, c, 1.));
        matrix
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let options = parse_args()?;
    let kernels = kernels();
    let pool = MemPool::new();

    let mut sample_rate = None;
    let mut streams = vec![];

    for input in &options.inputs {
        let (spec, bytes) = read_wav(input)?;
        log::info!(
            "{}: {} {} Hz {} channels, gain {}",
            input.path.display(),
            spec.format,
            spec.rate,
            spec.channels,
            input.gain
        );

        match sample_rate {
            None => sample_rate = Some(spec.rate),
            Some(rate) if rate != spec.rate => {
                return Err(format!(
                    "{}: sample rate {} differs from {}",
                    input.path.display(),
                    spec.rate,
                    rate
                )
                .into())
            }
            Some(_) => (),
        }

        let samples = bytes.len() / spec.format.sample_size();
        let mut float = vec![0u8; samples * 4];
        kernels.convert(spec.format, &bytes, SampleFormat::FLOAT32NE, &mut float);

        let frames = samples / spec.channels;
        let plan = RemapPlan::new(
            kernels,
            SampleFormat::FLOAT32NE,
            &remap_matrix(spec.channels, options.channels),
        );
        log::debug!("{}: {:?}", input.path.display(), plan.kind());

        let mut remapped = vec![0u8; frames * options.channels * 4];
        plan.remap(&mut remapped, &float, frames);

        streams.push((remapped, input.gain));
    }

    let sample_rate = sample_rate.ok_or("no inputs")?;
    let spec = SampleSpec::new(SampleFormat::FLOAT32NE, sample_rate, options.channels);

    // shorter inputs are padded with silence
    let length = streams.iter().map(|(s, _)| s.len()).max().unwrap_or(0);
    let inputs: Vec<MixInput> = streams
        .into_iter()
        .map(|(mut samples, gain)| {
            samples.resize(length, 0);
            let volume = ChannelVolume::uniform(options.channels, Volume::from_linear(gain));
            MixInput::new(pool.allocate_from(&samples), volume)
        })
        .collect();

    let mut mixed = vec![0u8; length];
    let length = kernels.mix(&inputs, &mut mixed, &spec, None, false);

    let mut output = vec![0u8; length / 2];
    let samples = kernels.convert(SampleFormat::FLOAT32NE, &mixed[..length], SampleFormat::S16Le, &mut output);

    let wav_spec = hound::WavSpec {
        channels: u16::try_from(options.channels)?,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&options.output, wav_spec)?;
    for s in output.chunks_exact(2) {
        writer.write_sample(i16::from_le_bytes([s[0], s[1]]))?;
    }
    writer.finalize()?;

    log::info!(
        "Wrote {} frames to {}",
        samples / options.channels,
        options.output.display()
    );

    Ok(())
}
