//! Sample conversion to and from the pivot formats (native `i16` and `f32`)
use std::sync::Arc;

use crate::dispatch::{FromFloatKernel, FromS16Kernel, Kernels, ToFloatKernel, ToS16Kernel};
use crate::endian::{BigEndian, LittleEndian};
use crate::format::SampleFormat;
use crate::sample::{Alaw, Codec, S16, S24, S24In32, S32, Ulaw, F32, U8};

/// Number of samples converted per pass through the stack scratch buffer
const SCRATCH_LEN: usize = 512;

fn to_s16<C: Codec>(src: &[u8], dst: &mut [i16]) {
    let src = &src[..dst.len() * C::SIZE];
    src.chunks_exact(C::SIZE)
        .zip(dst.iter_mut())
        .for_each(|(s, d)| *d = C::to_s16(s));
}

fn from_s16<C: Codec>(src: &[i16], dst: &mut [u8]) {
    let dst = &mut dst[..src.len() * C::SIZE];
    dst.chunks_exact_mut(C::SIZE)
        .zip(src.iter())
        .for_each(|(d, s)| C::from_s16(d, *s));
}

fn to_float<C: Codec>(src: &[u8], dst: &mut [f32]) {
    let src = &src[..dst.len() * C::SIZE];
    src.chunks_exact(C::SIZE)
        .zip(dst.iter_mut())
        .for_each(|(s, d)| *d = C::to_f32(s));
}

fn from_float<C: Codec>(src: &[f32], dst: &mut [u8]) {
    let dst = &mut dst[..src.len() * C::SIZE];
    dst.chunks_exact_mut(C::SIZE)
        .zip(src.iter())
        .for_each(|(d, s)| C::from_f32(d, *s));
}

macro_rules! codec_table {
    ($format:expr, $kernel:ident) => {
        match $format {
            SampleFormat::U8 => Arc::new($kernel::<U8>),
            SampleFormat::Alaw => Arc::new($kernel::<Alaw>),
            SampleFormat::Ulaw => Arc::new($kernel::<Ulaw>),
            SampleFormat::S16Le => Arc::new($kernel::<S16<LittleEndian>>),
            SampleFormat::S16Be => Arc::new($kernel::<S16<BigEndian>>),
            SampleFormat::Float32Le => Arc::new($kernel::<F32<LittleEndian>>),
            SampleFormat::Float32Be => Arc::new($kernel::<F32<BigEndian>>),
            SampleFormat::S32Le => Arc::new($kernel::<S32<LittleEndian>>),
            SampleFormat::S32Be => Arc::new($kernel::<S32<BigEndian>>),
            SampleFormat::S24Le => Arc::new($kernel::<S24<LittleEndian>>),
            SampleFormat::S24Be => Arc::new($kernel::<S24<BigEndian>>),
            SampleFormat::S24_32Le => Arc::new($kernel::<S24In32<LittleEndian>>),
            SampleFormat::S24_32Be => Arc::new($kernel::<S24In32<BigEndian>>),
        }
    };
}

pub(crate) fn portable_to_s16(format: SampleFormat) -> ToS16Kernel {
    codec_table!(format, to_s16)
}

pub(crate) fn portable_from_s16(format: SampleFormat) -> FromS16Kernel {
    codec_table!(format, from_s16)
}

pub(crate) fn portable_to_float(format: SampleFormat) -> ToFloatKernel {
    codec_table!(format, to_float)
}

pub(crate) fn portable_from_float(format: SampleFormat) -> FromFloatKernel {
    codec_table!(format, from_float)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pivot {
    S16,
    Float,
}

fn pivot_for(src: SampleFormat, dst: SampleFormat) -> Pivot {
    if src == SampleFormat::S16NE || dst == SampleFormat::S16NE {
        Pivot::S16
    } else if src == SampleFormat::FLOAT32NE || dst == SampleFormat::FLOAT32NE {
        Pivot::Float
    } else if src.is_narrow() && dst.is_narrow() {
        Pivot::S16
    } else {
        Pivot::Float
    }
}

impl Kernels {
    /// Decode `dst.len()` samples of `format` to native 16 bit
    pub fn to_s16(&self, format: SampleFormat, src: &[u8], dst: &mut [i16]) {
        (self.to_s16_kernel(format))(src, dst)
    }

    /// Encode `src.len()` native 16 bit samples as `format`
    pub fn from_s16(&self, format: SampleFormat, src: &[i16], dst: &mut [u8]) {
        (self.from_s16_kernel(format))(src, dst)
    }

    /// Decode `dst.len()` samples of `format` to native float
    pub fn to_float32(&self, format: SampleFormat, src: &[u8], dst: &mut [f32]) {
        (self.to_float_kernel(format))(src, dst)
    }

    /// Encode `src.len()` native float samples as `format`
    pub fn from_float32(&self, format: SampleFormat, src: &[f32], dst: &mut [u8]) {
        (self.from_float_kernel(format))(src, dst)
    }

    /// Convert every whole sample of `src` from `src_format` to `dst_format`
    ///
    /// Conversion goes through 16 bit when either side is native 16 bit or both sides fit in 16
    /// bits, and through float otherwise. Returns the number of samples converted.
    ///
    /// # Panics
    ///
    /// This function panics if `dst` cannot hold the converted samples
    #[track_caller]
    pub fn convert(
        &self,
        src_format: SampleFormat,
        src: &[u8],
        dst_format: SampleFormat,
        dst: &mut [u8],
    ) -> usize {
        let src_size = src_format.sample_size();
        let dst_size = dst_format.sample_size();
        let n = src.len() / src_size;

        assert!(
            dst.len() >= n * dst_size,
            "IndexSizeError - Destination holds {:?} bytes, {:?} are required",
            dst.len(),
            n * dst_size
        );

        if src_format == dst_format {
            dst[..n * dst_size].copy_from_slice(&src[..n * src_size]);
            return n;
        }

        let src_chunks = src[..n * src_size].chunks(SCRATCH_LEN * src_size);
        let dst_chunks = dst[..n * dst_size].chunks_mut(SCRATCH_LEN * dst_size);

        match pivot_for(src_format, dst_format) {
            Pivot::S16 => {
                let decode = self.to_s16_kernel(src_format);
                let encode = self.from_s16_kernel(dst_format);
                let mut scratch = [0i16; SCRATCH_LEN];

                for (s, d) in src_chunks.zip(dst_chunks) {
                    let scratch = &mut scratch[..s.len() / src_size];
                    decode(s, scratch);
                    encode(scratch, d);
                }
            }
            Pivot::Float => {
                let decode = self.to_float_kernel(src_format);
                let encode = self.from_float_kernel(dst_format);
                let mut scratch = [0f32; SCRATCH_LEN];

                for (s, d) in src_chunks.zip(dst_chunks) {
                    let scratch = &mut scratch[..s.len() / src_size];
                    decode(s, scratch);
                    encode(scratch, d);
                }
            }
        }

        n
    }
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;

    #[test]
    fn test_pivot() {
        assert_eq!(
            pivot_for(SampleFormat::U8, SampleFormat::Ulaw),
            Pivot::S16
        );
        assert_eq!(
            pivot_for(SampleFormat::S16NE, SampleFormat::S32Le),
            Pivot::S16
        );
        assert_eq!(
            pivot_for(SampleFormat::U8, SampleFormat::S24Be),
            Pivot::Float
        );
        assert_eq!(
            pivot_for(SampleFormat::FLOAT32NE, SampleFormat::Alaw),
            Pivot::Float
        );
    }

    #[test]
    fn test_u8_to_float() {
        let kernels = Kernels::portable();
        let mut out = [0f32; 3];
        kernels.to_float32(SampleFormat::U8, &[0x00, 0x80, 0xc0], &mut out);
        assert_float_eq!(out, [-1., 0., 0.5], abs_all <= 0.);
    }

    #[test]
    fn test_from_float_clamps() {
        let kernels = Kernels::portable();
        let mut out = [0u8; 8];
        kernels.from_float32(SampleFormat::S16Le, &[2., -2., 1., 0.], &mut out);
        assert_eq!(out, [0xff, 0x7f, 0x00, 0x80, 0xff, 0x7f, 0x00, 0x00]);
    }

    #[test]
    fn test_convert_u8_to_s16be() {
        let kernels = Kernels::portable();
        let mut out = [0u8; 6];
        let n = kernels.convert(SampleFormat::U8, &[0x80, 0x81, 0x7f], SampleFormat::S16Be, &mut out);
        assert_eq!(n, 3);
        assert_eq!(out, [0x00, 0x00, 0x01, 0x00, 0xff, 0x00]);
    }

    #[test]
    fn test_convert_identity() {
        let kernels = Kernels::portable();
        let src = [1u8, 2, 3, 4, 5];
        let mut out = [0u8; 4];
        let n = kernels.convert(SampleFormat::S16Le, &src, SampleFormat::S16Le, &mut out);
        assert_eq!(n, 2);
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn test_convert_large() {
        // more samples than a single scratch pass
        let kernels = Kernels::portable();
        let src: Vec<u8> = (0..2000i32)
            .flat_map(|i| (i * 1000).to_be_bytes())
            .collect();
        let mut out = vec![0u8; 2000 * 3];

        let n = kernels.convert(SampleFormat::S32Be, &src, SampleFormat::S24Le, &mut out);
        assert_eq!(n, 2000);

        for (i, s) in out.chunks_exact(3).enumerate() {
            let v = i32::from_le_bytes([0, s[0], s[1], s[2]]);
            assert_eq!(v, ((i as i32 * 1000) >> 8) << 8);
        }
    }

    #[test]
    #[should_panic]
    fn test_convert_short_destination() {
        let kernels = Kernels::portable();
        let mut out = [0u8; 3];
        kernels.convert(SampleFormat::U8, &[0, 0], SampleFormat::S16Le, &mut out);
    }
}
