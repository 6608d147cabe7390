//! Format indexed kernel registry
//!
//! Every operation has one kernel per [`SampleFormat`]. A registry starts out with the portable
//! kernels; an optimized backend replaces entries with kernels that handle a subset of shapes
//! faster and call the entry they replaced for everything else.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::cpu::CpuInfo;
use crate::format::{SampleFormat, SAMPLE_FORMAT_COUNT};
use crate::mix::MixStream;
use crate::remap::{RemapKind, RemapPlan};
use crate::volume::VolumeFactors;

/// Decode `dst.len()` samples to 16 bit
pub type ToS16Kernel = Arc<dyn Fn(&[u8], &mut [i16]) + Send + Sync>;
/// Encode `src.len()` samples from 16 bit
pub type FromS16Kernel = Arc<dyn Fn(&[i16], &mut [u8]) + Send + Sync>;
/// Decode `dst.len()` samples to float
pub type ToFloatKernel = Arc<dyn Fn(&[u8], &mut [f32]) + Send + Sync>;
/// Encode `src.len()` samples from float
pub type FromFloatKernel = Arc<dyn Fn(&[f32], &mut [u8]) + Send + Sync>;
/// Scale interleaved samples in place, `(samples, factors, channels)`
pub type VolumeKernel = Arc<dyn Fn(&mut [u8], &VolumeFactors, usize) + Send + Sync>;
/// Sum all streams into the destination, `(streams, channels, dst)`
pub type MixKernel = Arc<dyn Fn(&mut [MixStream<'_>], usize, &mut [u8]) + Send + Sync>;
/// Apply a remap plan, `(plan, dst, src, frames)`
pub type RemapKernel = Arc<dyn Fn(&RemapPlan, &mut [u8], &[u8], usize) + Send + Sync>;
/// Pick a kernel for a remap plan, or decline with `None`
pub type RemapSelector = Arc<dyn Fn(&RemapPlan) -> Option<(RemapKind, RemapKernel)> + Send + Sync>;

/// One kernel per sample format
#[derive(Clone)]
pub struct KernelTable<K> {
    entries: [K; SAMPLE_FORMAT_COUNT],
}

impl<K> KernelTable<K> {
    pub fn from_fn(mut f: impl FnMut(SampleFormat) -> K) -> Self {
        Self {
            entries: std::array::from_fn(|i| f(SampleFormat::from_index(i))),
        }
    }

    pub fn get(&self, format: SampleFormat) -> &K {
        &self.entries[format.index()]
    }

    /// Install a kernel, returning the one it replaces
    pub fn set(&mut self, format: SampleFormat, kernel: K) -> K {
        std::mem::replace(&mut self.entries[format.index()], kernel)
    }
}

/// Registry holding the installed kernel of every operation and format
///
/// Lookups are plain array indexing. Installing requires `&mut self`, so a registry that is
/// shared between threads is immutable.
#[derive(Clone)]
pub struct Kernels {
    pub(crate) to_s16: KernelTable<ToS16Kernel>,
    pub(crate) from_s16: KernelTable<FromS16Kernel>,
    pub(crate) to_float: KernelTable<ToFloatKernel>,
    pub(crate) from_float: KernelTable<FromFloatKernel>,
    pub(crate) volume: KernelTable<VolumeKernel>,
    pub(crate) mix: KernelTable<MixKernel>,
    pub(crate) remap: Option<RemapSelector>,
}

impl Kernels {
    /// Registry with the portable kernels only
    pub fn portable() -> Self {
        Self {
            to_s16: KernelTable::from_fn(crate::convert::portable_to_s16),
            from_s16: KernelTable::from_fn(crate::convert::portable_from_s16),
            to_float: KernelTable::from_fn(crate::convert::portable_to_float),
            from_float: KernelTable::from_fn(crate::convert::portable_from_float),
            volume: KernelTable::from_fn(crate::scale::portable_volume),
            mix: KernelTable::from_fn(crate::mix::portable_mix),
            remap: None,
        }
    }

    /// Registry with the kernels suited for the given CPU
    pub fn with_cpu(cpu: &CpuInfo) -> Self {
        let mut kernels = Self::portable();

        if cpu.has_vector_unit() {
            crate::accel::install(&mut kernels);
        }

        kernels
    }

    /// Registry with the kernels suited for the running CPU
    pub fn detect() -> Self {
        let cpu = CpuInfo::detect();
        log::info!("Detected CPU: {}", cpu);
        Self::with_cpu(&cpu)
    }

    pub fn to_s16_kernel(&self, format: SampleFormat) -> &ToS16Kernel {
        self.to_s16.get(format)
    }

    pub fn set_to_s16_kernel(&mut self, format: SampleFormat, kernel: ToS16Kernel) -> ToS16Kernel {
        self.to_s16.set(format, kernel)
    }

    pub fn from_s16_kernel(&self, format: SampleFormat) -> &FromS16Kernel {
        self.from_s16.get(format)
    }

    pub fn set_from_s16_kernel(
        &mut self,
        format: SampleFormat,
        kernel: FromS16Kernel,
    ) -> FromS16Kernel {
        self.from_s16.set(format, kernel)
    }

    pub fn to_float_kernel(&self, format: SampleFormat) -> &ToFloatKernel {
        self.to_float.get(format)
    }

    pub fn set_to_float_kernel(
        &mut self,
        format: SampleFormat,
        kernel: ToFloatKernel,
    ) -> ToFloatKernel {
        self.to_float.set(format, kernel)
    }

    pub fn from_float_kernel(&self, format: SampleFormat) -> &FromFloatKernel {
        self.from_float.get(format)
    }

    pub fn set_from_float_kernel(
        &mut self,
        format: SampleFormat,
        kernel: FromFloatKernel,
    ) -> FromFloatKernel {
        self.from_float.set(format, kernel)
    }

    pub fn volume_kernel(&self, format: SampleFormat) -> &VolumeKernel {
        self.volume.get(format)
    }

    pub fn set_volume_kernel(&mut self, format: SampleFormat, kernel: VolumeKernel) -> VolumeKernel {
        self.volume.set(format, kernel)
    }

    pub fn mix_kernel(&self, format: SampleFormat) -> &MixKernel {
        self.mix.get(format)
    }

    pub fn set_mix_kernel(&mut self, format: SampleFormat, kernel: MixKernel) -> MixKernel {
        self.mix.set(format, kernel)
    }

    /// Selector consulted before the portable remap ladder, if any
    pub fn remap_selector(&self) -> Option<&RemapSelector> {
        self.remap.as_ref()
    }

    pub fn set_remap_selector(&mut self, selector: Option<RemapSelector>) -> Option<RemapSelector> {
        std::mem::replace(&mut self.remap, selector)
    }
}

impl Default for Kernels {
    fn default() -> Self {
        Self::portable()
    }
}

impl fmt::Debug for Kernels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernels")
            .field("formats", &SAMPLE_FORMAT_COUNT)
            .field("remap_selector", &self.remap.is_some())
            .finish_non_exhaustive()
    }
}

static KERNELS: OnceLock<Kernels> = OnceLock::new();

/// Process wide registry for the running CPU, initialized on first use
pub fn kernels() -> &'static Kernels {
    KERNELS.get_or_init(Kernels::detect)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_send_sync() {
        assert_send_sync::<Kernels>();
    }

    #[test]
    fn test_table_set_returns_previous() {
        let mut table = KernelTable::from_fn(|f| f.index());
        assert_eq!(*table.get(SampleFormat::S16Be), 4);

        let prev = table.set(SampleFormat::S16Be, 100);
        assert_eq!(prev, 4);
        assert_eq!(*table.get(SampleFormat::S16Be), 100);
        assert_eq!(*table.get(SampleFormat::S16Le), 3);
    }

    #[test]
    fn test_override_and_restore() {
        let mut kernels = Kernels::portable();

        let replacement: ToS16Kernel = Arc::new(|_src: &[u8], dst: &mut [i16]| dst.fill(7));
        let previous = kernels.set_to_s16_kernel(SampleFormat::U8, replacement);

        let mut out = [0i16; 2];
        kernels.to_s16(SampleFormat::U8, &[0x80, 0x80], &mut out);
        assert_eq!(out, [7, 7]);

        // other formats are untouched
        kernels.to_s16(SampleFormat::Alaw, &[0xd5, 0xd5], &mut out);
        assert_eq!(out, [8, 8]);

        kernels.set_to_s16_kernel(SampleFormat::U8, previous);
        kernels.to_s16(SampleFormat::U8, &[0x80, 0x80], &mut out);
        assert_eq!(out, [0, 0]);
    }

    #[test]
    fn test_global() {
        let a = kernels() as *const Kernels;
        let b = kernels() as *const Kernels;
        assert_eq!(a, b);
    }
}
