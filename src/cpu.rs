//! CPU capability probe, used to decide which kernels get installed
use std::fmt;

/// Processor family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuArch {
    X86,
    Arm,
    Other,
}

/// Vector extensions relevant to the block-optimized kernels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuFeatures {
    pub sse2: bool,
    pub sse4_1: bool,
    pub avx2: bool,
    pub neon: bool,
}

/// Result of the CPU probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuInfo {
    pub arch: CpuArch,
    pub features: CpuFeatures,
}

impl CpuInfo {
    /// Probe the running CPU
    pub fn detect() -> Self {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        {
            Self {
                arch: CpuArch::X86,
                features: CpuFeatures {
                    sse2: is_x86_feature_detected!("sse2"),
                    sse4_1: is_x86_feature_detected!("sse4.1"),
                    avx2: is_x86_feature_detected!("avx2"),
                    neon: false,
                },
            }
        }

        #[cfg(target_arch = "aarch64")]
        {
            // NEON is always available on aarch64
            Self {
                arch: CpuArch::Arm,
                features: CpuFeatures {
                    neon: true,
                    ..CpuFeatures::default()
                },
            }
        }

        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
        {
            Self::portable()
        }
    }

    /// A CPU without any usable vector extension
    pub fn portable() -> Self {
        Self {
            arch: CpuArch::Other,
            features: CpuFeatures::default(),
        }
    }

    /// True if the block-optimized kernels are worth installing
    pub fn has_vector_unit(&self) -> bool {
        let f = &self.features;
        f.sse2 || f.sse4_1 || f.avx2 || f.neon
    }
}

impl fmt::Display for CpuInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.arch)?;

        let flags = [
            ("sse2", self.features.sse2),
            ("sse4.1", self.features.sse4_1),
            ("avx2", self.features.avx2),
            ("neon", self.features.neon),
        ];
        for (name, _) in flags.iter().filter(|(_, enabled)| *enabled) {
            write!(f, " {}", name)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portable() {
        let cpu = CpuInfo::portable();
        assert!(!cpu.has_vector_unit());
        assert_eq!(cpu.to_string(), "Other");
    }

    #[test]
    fn test_display() {
        let cpu = CpuInfo {
            arch: CpuArch::X86,
            features: CpuFeatures {
                sse2: true,
                avx2: true,
                ..CpuFeatures::default()
            },
        };
        assert!(cpu.has_vector_unit());
        assert_eq!(cpu.to_string(), "X86 sse2 avx2");
    }

    #[test]
    fn test_detect() {
        let cpu = CpuInfo::detect();

        #[cfg(target_arch = "x86_64")]
        assert!(cpu.features.sse2);
        #[cfg(target_arch = "aarch64")]
        assert!(cpu.features.neon);

        let _ = cpu.has_vector_unit();
    }
}
