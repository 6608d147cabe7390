//! Block-optimized kernels for the common native formats
//!
//! The kernels work on fixed size blocks of samples so the compiler can keep a whole block in
//! vector registers. Each of them produces exactly the output of the portable kernel it replaces.
//! Shapes a kernel does not handle are passed on to the kernel that was installed before it.

mod convert;
mod mix;
mod remap;
mod volume;

use crate::dispatch::Kernels;

/// Number of samples processed per block
pub(crate) const BLOCK: usize = 8;

/// Install the block-optimized kernels on top of the ones currently in `kernels`
pub(crate) fn install(kernels: &mut Kernels) {
    log::info!("Initialising block-optimized volume functions");
    volume::install(kernels);

    log::info!("Initialising block-optimized mix functions");
    mix::install(kernels);

    log::info!("Initialising block-optimized remap functions");
    remap::install(kernels);

    log::info!("Initialising block-optimized sample conversion functions");
    convert::install(kernels);
}
