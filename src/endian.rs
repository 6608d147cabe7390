//! Byte order aware loads and stores of raw sample words

/// Reads and writes fixed-width words in a specific byte order
///
/// Implementors are zero sized markers, so every kernel that is generic over `ByteOrder` is
/// monomorphized per byte order.
pub trait ByteOrder: Copy + Send + Sync + 'static {
    fn read_u16(buf: &[u8]) -> u16;
    fn write_u16(buf: &mut [u8], v: u16);
    fn read_u32(buf: &[u8]) -> u32;
    fn write_u32(buf: &mut [u8], v: u32);

    /// Read a packed 24 bit word into the low bits of a `u32`
    fn read_u24(buf: &[u8]) -> u32;
    /// Write the low 24 bits of `v`
    fn write_u24(buf: &mut [u8], v: u32);

    #[inline(always)]
    fn read_i16(buf: &[u8]) -> i16 {
        Self::read_u16(buf) as i16
    }

    #[inline(always)]
    fn write_i16(buf: &mut [u8], v: i16) {
        Self::write_u16(buf, v as u16)
    }

    #[inline(always)]
    fn read_i32(buf: &[u8]) -> i32 {
        Self::read_u32(buf) as i32
    }

    #[inline(always)]
    fn write_i32(buf: &mut [u8], v: i32) {
        Self::write_u32(buf, v as u32)
    }

    #[inline(always)]
    fn read_f32(buf: &[u8]) -> f32 {
        f32::from_bits(Self::read_u32(buf))
    }

    #[inline(always)]
    fn write_f32(buf: &mut [u8], v: f32) {
        Self::write_u32(buf, v.to_bits())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LittleEndian;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BigEndian;

impl ByteOrder for LittleEndian {
    #[inline(always)]
    fn read_u16(buf: &[u8]) -> u16 {
        u16::from_le_bytes([buf[0], buf[1]])
    }

    #[inline(always)]
    fn write_u16(buf: &mut [u8], v: u16) {
        buf[..2].copy_from_slice(&v.to_le_bytes());
    }

    #[inline(always)]
    fn read_u32(buf: &[u8]) -> u32 {
        u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])
    }

    #[inline(always)]
    fn write_u32(buf: &mut [u8], v: u32) {
        buf[..4].copy_from_slice(&v.to_le_bytes());
    }

    #[inline(always)]
    fn read_u24(buf: &[u8]) -> u32 {
        u32::from_le_bytes([buf[0], buf[1], buf[2], 0])
    }

    #[inline(always)]
    fn write_u24(buf: &mut [u8], v: u32) {
        buf[..3].copy_from_slice(&v.to_le_bytes()[..3]);
    }
}

impl ByteOrder for BigEndian {
    #[inline(always)]
    fn read_u16(buf: &[u8]) -> u16 {
        u16::from_be_bytes([buf[0], buf[1]])
    }

    #[inline(always)]
    fn write_u16(buf: &mut [u8], v: u16) {
        buf[..2].copy_from_slice(&v.to_be_bytes());
    }

    #[inline(always)]
    fn read_u32(buf: &[u8]) -> u32 {
        u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]])
    }

    #[inline(always)]
    fn write_u32(buf: &mut [u8], v: u32) {
        buf[..4].copy_from_slice(&v.to_be_bytes());
    }

    #[inline(always)]
    fn read_u24(buf: &[u8]) -> u32 {
        u32::from_be_bytes([0, buf[0], buf[1], buf[2]])
    }

    #[inline(always)]
    fn write_u24(buf: &mut [u8], v: u32) {
        buf[..3].copy_from_slice(&v.to_be_bytes()[1..]);
    }
}

#[cfg(target_endian = "little")]
pub type NativeEndian = LittleEndian;
#[cfg(target_endian = "little")]
pub type SwappedEndian = BigEndian;

#[cfg(target_endian = "big")]
pub type NativeEndian = BigEndian;
#[cfg(target_endian = "big")]
pub type SwappedEndian = LittleEndian;
