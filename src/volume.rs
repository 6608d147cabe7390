//! Linear volumes and their fixed point / float kernel representation
use std::ops::{Index, Mul};

use arrayvec::ArrayVec;

use crate::{assert_valid_number_of_channels, MAX_CHANNELS};

/// 16.16 fixed point unity gain
pub const FIXED_NORM: i32 = 0x10000;

/// Largest fixed point gain kernels will ever see
pub const FIXED_MAX: i32 = 0x2000_0000;

/// Linear gain, `1.0` is unity and anything `<= 0.` is silence
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Volume(f64);

impl Volume {
    pub const NORM: Volume = Volume(1.);
    pub const MUTED: Volume = Volume(0.);

    /// Negative and NaN gains are mapped to [`Volume::MUTED`]
    pub fn from_linear(v: f64) -> Self {
        if v > 0. {
            Self(v)
        } else {
            Self::MUTED
        }
    }

    pub fn linear(self) -> f64 {
        self.0
    }

    /// Gain in decibel, `-inf` maps to [`Volume::MUTED`]
    pub fn from_db(db: f64) -> Self {
        if db == f64::NEG_INFINITY {
            Self::MUTED
        } else {
            Self::from_linear(10_f64.powf(db / 20.))
        }
    }

    pub fn to_db(self) -> f64 {
        if self.is_muted() {
            f64::NEG_INFINITY
        } else {
            20. * self.0.log10()
        }
    }

    /// 16.16 fixed point gain, rounded half to even and clamped to `[0, FIXED_MAX]`
    pub fn to_fixed(self) -> i32 {
        (self.0 * f64::from(FIXED_NORM))
            .round_ties_even()
            .clamp(0., f64::from(FIXED_MAX)) as i32
    }

    pub fn to_float(self) -> f32 {
        self.0 as f32
    }

    pub fn is_muted(self) -> bool {
        self.0 <= 0.
    }

    pub fn is_norm(self) -> bool {
        self.0 == 1.
    }
}

impl Mul for Volume {
    type Output = Volume;

    fn mul(self, rhs: Volume) -> Volume {
        Volume(self.0 * rhs.0)
    }
}

/// One [`Volume`] per channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelVolume {
    values: ArrayVec<Volume, MAX_CHANNELS>,
}

impl ChannelVolume {
    /// # Panics
    ///
    /// This function panics if `volumes` is empty or holds more than [`MAX_CHANNELS`] entries
    #[track_caller]
    pub fn new(volumes: &[Volume]) -> Self {
        assert_valid_number_of_channels(volumes.len());
        Self {
            values: volumes.iter().copied().collect(),
        }
    }

    /// Same volume on every channel
    #[track_caller]
    pub fn uniform(channels: usize, volume: Volume) -> Self {
        assert_valid_number_of_channels(channels);
        Self {
            values: std::iter::repeat(volume).take(channels).collect(),
        }
    }

    #[track_caller]
    pub fn norm(channels: usize) -> Self {
        Self::uniform(channels, Volume::NORM)
    }

    #[track_caller]
    pub fn muted(channels: usize) -> Self {
        Self::uniform(channels, Volume::MUTED)
    }

    pub fn channels(&self) -> usize {
        self.values.len()
    }

    pub fn set(&mut self, channel: usize, volume: Volume) {
        self.values[channel] = volume;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Volume> {
        self.values.iter()
    }

    /// True if every channel is silent
    pub fn is_muted(&self) -> bool {
        self.values.iter().all(|v| v.is_muted())
    }

    /// True if every channel is at unity gain
    pub fn is_norm(&self) -> bool {
        self.values.iter().all(|v| v.is_norm())
    }

    /// Channel-wise product
    ///
    /// # Panics
    ///
    /// This function panics if the channel counts differ
    #[track_caller]
    pub fn multiply(&self, other: &ChannelVolume) -> ChannelVolume {
        assert_eq!(
            self.channels(),
            other.channels(),
            "IndexSizeError - Cannot multiply volumes with different channel counts"
        );
        Self {
            values: self
                .values
                .iter()
                .zip(other.values.iter())
                .map(|(a, b)| *a * *b)
                .collect(),
        }
    }
}

impl Index<usize> for ChannelVolume {
    type Output = Volume;

    fn index(&self, index: usize) -> &Volume {
        &self.values[index]
    }
}

/// Per-channel gains as consumed by the kernels
///
/// Fixed point and float representations are always derived from the same linear value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeFactors {
    fixed: [i32; MAX_CHANNELS],
    float: [f32; MAX_CHANNELS],
    channels: usize,
}

impl VolumeFactors {
    pub fn from_volume(volume: &ChannelVolume) -> Self {
        let mut factors = Self {
            fixed: [0; MAX_CHANNELS],
            float: [0.; MAX_CHANNELS],
            channels: volume.channels(),
        };
        volume
            .iter()
            .enumerate()
            .for_each(|(c, v)| factors.set(c, *v));

        factors
    }

    /// Product of a stream volume and an optional master volume, for the first `channels`
    /// channels
    ///
    /// # Panics
    ///
    /// This function panics if either volume covers fewer than `channels` channels
    #[track_caller]
    pub fn combined(stream: &ChannelVolume, master: Option<&ChannelVolume>, channels: usize) -> Self {
        assert_valid_number_of_channels(channels);
        crate::assert_valid_volume_channels(stream.channels(), channels);
        if let Some(master) = master {
            crate::assert_valid_volume_channels(master.channels(), channels);
        }

        let mut factors = Self {
            fixed: [0; MAX_CHANNELS],
            float: [0.; MAX_CHANNELS],
            channels,
        };

        for c in 0..channels {
            let volume = match master {
                Some(master) => stream[c] * master[c],
                None => stream[c],
            };
            factors.set(c, volume);
        }

        factors
    }

    fn set(&mut self, channel: usize, volume: Volume) {
        self.fixed[channel] = volume.to_fixed();
        self.float[channel] = volume.to_float();
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn fixed(&self) -> &[i32] {
        &self.fixed[..self.channels]
    }

    pub fn float(&self) -> &[f32] {
        &self.float[..self.channels]
    }

    /// True if every channel shares the gain of channel 0
    pub fn is_uniform(&self) -> bool {
        let fixed = self.fixed();
        fixed.iter().all(|&f| f == fixed[0])
    }

    /// True if the first `channels` fixed point gains are all unity
    pub fn is_norm(&self) -> bool {
        self.fixed().iter().all(|&f| f == FIXED_NORM)
    }

    /// True if every fixed point gain is silent
    pub fn is_muted(&self) -> bool {
        self.fixed().iter().all(|&f| f <= 0)
    }
}

/// `v * gain / 0x10000` without overflowing 32 bits for 16 bit inputs
///
/// The gain is split in an integer and a fraction part so both products stay in range.
#[inline(always)]
pub(crate) fn mul_fixed(v: i32, gain: i32) -> i32 {
    let hi = gain >> 16;
    let lo = gain & 0xffff;
    ((v * lo) >> 16) + v * hi
}

/// `v * gain / 0x10000` for full scale 32 bit inputs, clamped to the `i32` range
#[inline(always)]
pub(crate) fn mul_fixed_wide(v: i32, gain: i32) -> i32 {
    let t = (i64::from(v) * i64::from(gain)) >> 16;
    t.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;

    #[test]
    fn test_to_fixed() {
        assert_eq!(Volume::NORM.to_fixed(), 0x10000);
        assert_eq!(Volume::MUTED.to_fixed(), 0);
        assert_eq!(Volume::from_linear(0.8).to_fixed(), 52429);
        assert_eq!(Volume::from_linear(0.24).to_fixed(), 15729);
        assert_eq!(Volume::from_linear(1e9).to_fixed(), FIXED_MAX);
        assert_eq!(Volume::from_linear(-1.), Volume::MUTED);
        assert_eq!(Volume::from_linear(f64::NAN), Volume::MUTED);
    }

    #[test]
    fn test_db() {
        assert_eq!(Volume::from_db(0.), Volume::NORM);
        assert_eq!(Volume::from_db(f64::NEG_INFINITY), Volume::MUTED);
        assert_eq!(Volume::MUTED.to_db(), f64::NEG_INFINITY);
        assert_float_eq!(Volume::from_db(-6.).linear(), 0.501187, abs <= 1e-6);
        assert_float_eq!(Volume::from_linear(0.5).to_db(), -6.0206, abs <= 1e-4);
    }

    #[test]
    fn test_channel_volume() {
        let v = ChannelVolume::norm(2);
        assert!(v.is_norm());
        assert!(!v.is_muted());
        assert!(ChannelVolume::muted(6).is_muted());

        let a = ChannelVolume::new(&[Volume::from_linear(0.5), Volume::from_linear(2.)]);
        let b = ChannelVolume::new(&[Volume::from_linear(0.5), Volume::MUTED]);
        let c = a.multiply(&b);
        assert_eq!(c[0], Volume::from_linear(0.25));
        assert_eq!(c[1], Volume::MUTED);
    }

    #[test]
    #[should_panic]
    fn test_channel_volume_too_many() {
        ChannelVolume::norm(MAX_CHANNELS + 1);
    }

    #[test]
    #[should_panic]
    fn test_multiply_mismatch() {
        ChannelVolume::norm(1).multiply(&ChannelVolume::norm(2));
    }

    #[test]
    fn test_factors() {
        let stream = ChannelVolume::new(&[Volume::NORM, Volume::from_linear(0.3)]);
        let master = ChannelVolume::uniform(2, Volume::from_linear(0.8));

        let factors = VolumeFactors::combined(&stream, Some(&master), 2);
        assert_eq!(factors.fixed(), &[52429, 15729]);
        assert_float_eq!(factors.float(), &[0.8, 0.24][..], abs_all <= 1e-7);
        assert!(!factors.is_uniform());

        let factors = VolumeFactors::combined(&stream, None, 1);
        assert_eq!(factors.fixed(), &[0x10000]);
        assert!(factors.is_norm());
    }

    #[test]
    fn test_mul_fixed() {
        assert_eq!(mul_fixed(1000, FIXED_NORM), 1000);
        assert_eq!(mul_fixed(1000, 52429), 800);
        assert_eq!(mul_fixed(-32768, 0x8000), -16384);
        assert_eq!(mul_fixed(32767, 0xffff), 32766);
        assert_eq!(mul_fixed(20000, 0x30000), 60000);

        assert_eq!(mul_fixed_wide(i32::MAX, 0x20000), i32::MAX);
        assert_eq!(mul_fixed_wide(i32::MIN, 0x20000), i32::MIN);
        assert_eq!(mul_fixed_wide(-(1 << 30), 0x8000), -(1 << 29));
    }
}
