//! Per-format scalar codecs
//!
//! Every sample format is represented by a zero sized codec type. Kernels are generic over the
//! codec, so each (kernel, format) pair is monomorphized without duplicating any arithmetic.
//! Byte order is a type parameter of the multi-byte codecs.
use std::marker::PhantomData;

use crate::endian::ByteOrder;
use crate::g711;

pub(crate) const F32_S16_SCALE: f32 = 0x8000 as f32;
const F64_S32_SCALE: f64 = 0x8000_0000_u32 as f64;

#[inline(always)]
pub(crate) fn clamp_round_f32(v: f32, min: f32, max: f32) -> i32 {
    v.clamp(min, max).round_ties_even() as i32
}

#[inline(always)]
fn f32_to_s32(v: f32) -> i32 {
    (f64::from(v) * F64_S32_SCALE)
        .clamp(-F64_S32_SCALE, F64_S32_SCALE - 1.)
        .round_ties_even() as i32
}

/// Conversion of a single encoded sample to and from the two pivot formats
pub trait Codec: Send + Sync + 'static {
    /// Encoded size of one sample in bytes
    const SIZE: usize;

    fn to_s16(buf: &[u8]) -> i16;
    fn from_s16(buf: &mut [u8], s: i16);
    fn to_f32(buf: &[u8]) -> f32;
    fn from_f32(buf: &mut [u8], v: f32);
}

/// Formats whose samples are mixed and scaled in 32 bit integer arithmetic
pub trait NarrowSample: Codec {
    /// Smallest value of the working range
    const MIN: i32;
    /// Largest value of the working range
    const MAX: i32;

    /// Decode into the working range
    fn load(buf: &[u8]) -> i32;
    /// Clamp to the working range and encode
    fn store(buf: &mut [u8], v: i32);
}

/// Formats whose samples are mixed and scaled in 64 bit integer arithmetic
pub trait WideSample: Codec {
    /// Decode to a full scale 32 bit value
    fn load(buf: &[u8]) -> i32;
    /// Encode a full scale 32 bit value
    fn store(buf: &mut [u8], v: i32);
}

/// Formats carrying IEEE float samples
pub trait FloatSample: Codec {
    fn load(buf: &[u8]) -> f32;
    fn store(buf: &mut [u8], v: f32);
}

/// Unsigned 8 bit
pub struct U8;
/// 8 bit a-Law
pub struct Alaw;
/// 8 bit mu-Law
pub struct Ulaw;
/// Signed 16 bit
pub struct S16<E>(PhantomData<E>);
/// 32 bit float
pub struct F32<E>(PhantomData<E>);
/// Signed 32 bit
pub struct S32<E>(PhantomData<E>);
/// Signed 24 bit in 3 bytes
pub struct S24<E>(PhantomData<E>);
/// Signed 24 bit in the low bits of a 32 bit word
pub struct S24In32<E>(PhantomData<E>);

impl Codec for U8 {
    const SIZE: usize = 1;

    #[inline(always)]
    fn to_s16(buf: &[u8]) -> i16 {
        (i16::from(buf[0]) - 0x80) << 8
    }

    #[inline(always)]
    fn from_s16(buf: &mut [u8], s: i16) {
        buf[0] = ((s >> 8) + 0x80) as u8;
    }

    #[inline(always)]
    fn to_f32(buf: &[u8]) -> f32 {
        (f32::from(buf[0]) - 128.) / 128.
    }

    #[inline(always)]
    fn from_f32(buf: &mut [u8], v: f32) {
        buf[0] = (clamp_round_f32(v * 128., -128., 127.) + 0x80) as u8;
    }
}

impl NarrowSample for U8 {
    const MIN: i32 = -0x80;
    const MAX: i32 = 0x7f;

    #[inline(always)]
    fn load(buf: &[u8]) -> i32 {
        i32::from(buf[0]) - 0x80
    }

    #[inline(always)]
    fn store(buf: &mut [u8], v: i32) {
        buf[0] = (v.clamp(Self::MIN, Self::MAX) + 0x80) as u8;
    }
}

impl Codec for Alaw {
    const SIZE: usize = 1;

    #[inline(always)]
    fn to_s16(buf: &[u8]) -> i16 {
        g711::alaw_to_linear16(buf[0])
    }

    #[inline(always)]
    fn from_s16(buf: &mut [u8], s: i16) {
        buf[0] = g711::linear13_to_alaw(s >> 3);
    }

    #[inline(always)]
    fn to_f32(buf: &[u8]) -> f32 {
        f32::from(g711::alaw_to_linear16(buf[0])) / F32_S16_SCALE
    }

    #[inline(always)]
    fn from_f32(buf: &mut [u8], v: f32) {
        let s = clamp_round_f32(v * 4096., -4096., 4095.);
        buf[0] = g711::linear13_to_alaw(s as i16);
    }
}

impl NarrowSample for Alaw {
    const MIN: i32 = i16::MIN as i32;
    const MAX: i32 = i16::MAX as i32;

    #[inline(always)]
    fn load(buf: &[u8]) -> i32 {
        i32::from(g711::alaw_to_linear16(buf[0]))
    }

    #[inline(always)]
    fn store(buf: &mut [u8], v: i32) {
        buf[0] = g711::linear13_to_alaw((v.clamp(Self::MIN, Self::MAX) >> 3) as i16);
    }
}

impl Codec for Ulaw {
    const SIZE: usize = 1;

    #[inline(always)]
    fn to_s16(buf: &[u8]) -> i16 {
        g711::ulaw_to_linear16(buf[0])
    }

    #[inline(always)]
    fn from_s16(buf: &mut [u8], s: i16) {
        buf[0] = g711::linear14_to_ulaw(s >> 2);
    }

    #[inline(always)]
    fn to_f32(buf: &[u8]) -> f32 {
        f32::from(g711::ulaw_to_linear16(buf[0])) / F32_S16_SCALE
    }

    #[inline(always)]
    fn from_f32(buf: &mut [u8], v: f32) {
        let s = clamp_round_f32(v * 8192., -8192., 8191.);
        buf[0] = g711::linear14_to_ulaw(s as i16);
    }
}

impl NarrowSample for Ulaw {
    const MIN: i32 = i16::MIN as i32;
    const MAX: i32 = i16::MAX as i32;

    #[inline(always)]
    fn load(buf: &[u8]) -> i32 {
        i32::from(g711::ulaw_to_linear16(buf[0]))
    }

    #[inline(always)]
    fn store(buf: &mut [u8], v: i32) {
        buf[0] = g711::linear14_to_ulaw((v.clamp(Self::MIN, Self::MAX) >> 2) as i16);
    }
}

impl<E: ByteOrder> Codec for S16<E> {
    const SIZE: usize = 2;

    #[inline(always)]
    fn to_s16(buf: &[u8]) -> i16 {
        E::read_i16(buf)
    }

    #[inline(always)]
    fn from_s16(buf: &mut [u8], s: i16) {
        E::write_i16(buf, s)
    }

    #[inline(always)]
    fn to_f32(buf: &[u8]) -> f32 {
        f32::from(E::read_i16(buf)) / F32_S16_SCALE
    }

    #[inline(always)]
    fn from_f32(buf: &mut [u8], v: f32) {
        let s = clamp_round_f32(v * F32_S16_SCALE, -F32_S16_SCALE, F32_S16_SCALE - 1.);
        E::write_i16(buf, s as i16)
    }
}

impl<E: ByteOrder> NarrowSample for S16<E> {
    const MIN: i32 = i16::MIN as i32;
    const MAX: i32 = i16::MAX as i32;

    #[inline(always)]
    fn load(buf: &[u8]) -> i32 {
        i32::from(E::read_i16(buf))
    }

    #[inline(always)]
    fn store(buf: &mut [u8], v: i32) {
        E::write_i16(buf, v.clamp(Self::MIN, Self::MAX) as i16)
    }
}

impl<E: ByteOrder> Codec for F32<E> {
    const SIZE: usize = 4;

    #[inline(always)]
    fn to_s16(buf: &[u8]) -> i16 {
        let v = E::read_f32(buf);
        clamp_round_f32(v * F32_S16_SCALE, -F32_S16_SCALE, F32_S16_SCALE - 1.) as i16
    }

    #[inline(always)]
    fn from_s16(buf: &mut [u8], s: i16) {
        E::write_f32(buf, f32::from(s) / F32_S16_SCALE)
    }

    #[inline(always)]
    fn to_f32(buf: &[u8]) -> f32 {
        E::read_f32(buf)
    }

    #[inline(always)]
    fn from_f32(buf: &mut [u8], v: f32) {
        E::write_f32(buf, v)
    }
}

impl<E: ByteOrder> FloatSample for F32<E> {
    #[inline(always)]
    fn load(buf: &[u8]) -> f32 {
        E::read_f32(buf)
    }

    #[inline(always)]
    fn store(buf: &mut [u8], v: f32) {
        E::write_f32(buf, v)
    }
}

impl<E: ByteOrder> Codec for S32<E> {
    const SIZE: usize = 4;

    #[inline(always)]
    fn to_s16(buf: &[u8]) -> i16 {
        (E::read_i32(buf) >> 16) as i16
    }

    #[inline(always)]
    fn from_s16(buf: &mut [u8], s: i16) {
        E::write_i32(buf, i32::from(s) << 16)
    }

    #[inline(always)]
    fn to_f32(buf: &[u8]) -> f32 {
        (f64::from(E::read_i32(buf)) / F64_S32_SCALE) as f32
    }

    #[inline(always)]
    fn from_f32(buf: &mut [u8], v: f32) {
        E::write_i32(buf, f32_to_s32(v))
    }
}

impl<E: ByteOrder> WideSample for S32<E> {
    #[inline(always)]
    fn load(buf: &[u8]) -> i32 {
        E::read_i32(buf)
    }

    #[inline(always)]
    fn store(buf: &mut [u8], v: i32) {
        E::write_i32(buf, v)
    }
}

impl<E: ByteOrder> Codec for S24<E> {
    const SIZE: usize = 3;

    #[inline(always)]
    fn to_s16(buf: &[u8]) -> i16 {
        (<Self as WideSample>::load(buf) >> 16) as i16
    }

    #[inline(always)]
    fn from_s16(buf: &mut [u8], s: i16) {
        E::write_u24(buf, (i32::from(s) as u32) << 8)
    }

    #[inline(always)]
    fn to_f32(buf: &[u8]) -> f32 {
        <Self as WideSample>::load(buf) as f32 / F64_S32_SCALE as f32
    }

    #[inline(always)]
    fn from_f32(buf: &mut [u8], v: f32) {
        <Self as WideSample>::store(buf, f32_to_s32(v))
    }
}

impl<E: ByteOrder> WideSample for S24<E> {
    #[inline(always)]
    fn load(buf: &[u8]) -> i32 {
        (E::read_u24(buf) << 8) as i32
    }

    #[inline(always)]
    fn store(buf: &mut [u8], v: i32) {
        E::write_u24(buf, (v as u32) >> 8)
    }
}

impl<E: ByteOrder> Codec for S24In32<E> {
    const SIZE: usize = 4;

    #[inline(always)]
    fn to_s16(buf: &[u8]) -> i16 {
        (<Self as WideSample>::load(buf) >> 16) as i16
    }

    #[inline(always)]
    fn from_s16(buf: &mut [u8], s: i16) {
        E::write_u32(buf, ((i32::from(s) << 16) as u32) >> 8)
    }

    #[inline(always)]
    fn to_f32(buf: &[u8]) -> f32 {
        <Self as WideSample>::load(buf) as f32 / F64_S32_SCALE as f32
    }

    #[inline(always)]
    fn from_f32(buf: &mut [u8], v: f32) {
        <Self as WideSample>::store(buf, f32_to_s32(v))
    }
}

impl<E: ByteOrder> WideSample for S24In32<E> {
    #[inline(always)]
    fn load(buf: &[u8]) -> i32 {
        (E::read_u32(buf) << 8) as i32
    }

    #[inline(always)]
    fn store(buf: &mut [u8], v: i32) {
        E::write_u32(buf, (v as u32) >> 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::{BigEndian, LittleEndian};

    #[test]
    fn test_u8() {
        assert_eq!(U8::to_s16(&[0x80]), 0);
        assert_eq!(U8::to_s16(&[0x00]), -0x8000);
        assert_eq!(U8::to_s16(&[0xff]), 0x7f00);
        assert_eq!(U8::to_f32(&[0x00]), -1.);
        assert_eq!(U8::to_f32(&[0xc0]), 0.5);

        let mut buf = [0u8];
        U8::from_f32(&mut buf, 1.);
        assert_eq!(buf, [0xff]);
        U8::from_f32(&mut buf, -2.);
        assert_eq!(buf, [0x00]);
        U8::from_s16(&mut buf, -1);
        assert_eq!(buf, [0x7f]);

        U8::store(&mut buf, 1000);
        assert_eq!(buf, [0xff]);
        assert_eq!(U8::load(&buf), 0x7f);
    }

    #[test]
    fn test_s16() {
        let mut buf = [0u8; 2];
        S16::<BigEndian>::from_f32(&mut buf, 1.);
        assert_eq!(buf, [0x7f, 0xff]);
        S16::<BigEndian>::from_f32(&mut buf, -1.);
        assert_eq!(buf, [0x80, 0x00]);
        assert_eq!(S16::<BigEndian>::to_f32(&buf), -1.);

        // ties round to even
        S16::<LittleEndian>::from_f32(&mut buf, 2.5 / 32768.);
        assert_eq!(S16::<LittleEndian>::to_s16(&buf), 2);
        S16::<LittleEndian>::from_f32(&mut buf, 3.5 / 32768.);
        assert_eq!(S16::<LittleEndian>::to_s16(&buf), 4);

        S16::<LittleEndian>::store(&mut buf, -40000);
        assert_eq!(S16::<LittleEndian>::to_s16(&buf), i16::MIN);
    }

    #[test]
    fn test_s32() {
        let mut buf = [0u8; 4];
        S32::<LittleEndian>::from_f32(&mut buf, 1.);
        assert_eq!(S32::<LittleEndian>::load(&buf), i32::MAX);
        S32::<LittleEndian>::from_f32(&mut buf, -1.);
        assert_eq!(S32::<LittleEndian>::load(&buf), i32::MIN);
        assert_eq!(S32::<LittleEndian>::to_f32(&buf), -1.);
        assert_eq!(S32::<LittleEndian>::to_s16(&buf), i16::MIN);

        S32::<BigEndian>::from_s16(&mut buf, 0x1234);
        assert_eq!(buf, [0x12, 0x34, 0, 0]);
    }

    #[test]
    fn test_s24() {
        let mut buf = [0u8; 3];
        S24::<LittleEndian>::from_s16(&mut buf, -2);
        assert_eq!(buf, [0x00, 0xfe, 0xff]);
        assert_eq!(S24::<LittleEndian>::to_s16(&buf), -2);
        assert_eq!(S24::<LittleEndian>::load(&buf), -2 << 16);

        S24::<BigEndian>::from_f32(&mut buf, 1.);
        assert_eq!(buf, [0x7f, 0xff, 0xff]);
        S24::<BigEndian>::from_f32(&mut buf, -0.5);
        assert_eq!(buf, [0xc0, 0x00, 0x00]);
        assert_eq!(S24::<BigEndian>::to_f32(&buf), -0.5);
    }

    #[test]
    fn test_s24_32() {
        let mut buf = [0u8; 4];
        S24In32::<LittleEndian>::from_s16(&mut buf, -1);
        assert_eq!(buf, [0x00, 0xff, 0xff, 0x00]);
        assert_eq!(S24In32::<LittleEndian>::to_s16(&buf), -1);

        S24In32::<BigEndian>::from_f32(&mut buf, 0.25);
        assert_eq!(buf, [0x00, 0x20, 0x00, 0x00]);
        assert_eq!(S24In32::<BigEndian>::to_f32(&buf), 0.25);
    }

    #[test]
    fn test_log_formats() {
        let mut buf = [0u8];
        Ulaw::from_f32(&mut buf, 0.);
        assert_eq!(buf, [0xff]);
        Alaw::from_s16(&mut buf, 0);
        assert_eq!(buf, [0xd5]);

        Ulaw::store(&mut buf, 100_000);
        assert_eq!(buf, [0x80]);
        Alaw::store(&mut buf, -100_000);
        assert_eq!(buf, [0x2a]);
    }
}
