//! Reference counted sample memory, recycled through a pool
//!
//! A [`MemBlock`] is a shared byte buffer. A [`MemChunk`] is a window into a block, which is
//! what the kernels read from and write to. Dropping the last handle of a block returns its
//! buffer to the [`MemPool`] it came from, so steady state processing does not allocate.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::ops::{Deref, DerefMut, Range};
use std::rc::Rc;

use crate::format::{silence_memory, SampleFormat};

/// Recycles the byte buffers of dropped [`MemBlock`]s
#[derive(Clone)]
pub struct MemPool {
    inner: Rc<PoolInner>,
}

struct PoolInner {
    free: RefCell<Vec<Vec<u8>>>,
}

impl MemPool {
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create a pool holding `n` free buffers of `len` bytes
    pub fn with_capacity(n: usize, len: usize) -> Self {
        let free = (0..n).map(|_| Vec::with_capacity(len)).collect();
        let inner = PoolInner {
            free: RefCell::new(free),
        };

        Self {
            inner: Rc::new(inner),
        }
    }

    /// Block of `len` zeroed bytes
    pub fn allocate(&self, len: usize) -> MemBlock {
        let data = self.inner.take(len);

        MemBlock {
            inner: Rc::new(BlockInner {
                len,
                data: RefCell::new(data),
                pins: Cell::new(0),
                pool: Rc::clone(&self.inner),
            }),
        }
    }

    /// Chunk spanning a new block filled with a copy of `data`
    pub fn allocate_from(&self, data: &[u8]) -> MemChunk {
        let block = self.allocate(data.len());
        block.acquire_mut().copy_from_slice(data);
        MemChunk::from_block(block)
    }

    /// Number of free buffers
    pub fn pool_size(&self) -> usize {
        self.inner.free.borrow().len()
    }
}

impl Default for MemPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemPool")
            .field("pool_size", &self.pool_size())
            .finish()
    }
}

impl PoolInner {
    fn take(&self, len: usize) -> Vec<u8> {
        let mut free = self.free.borrow_mut();

        let mut data = match free.iter().position(|b| b.capacity() >= len) {
            // re-use from pool
            Some(i) => free.swap_remove(i),
            // allocate
            None => Vec::with_capacity(len),
        };

        data.clear();
        data.resize(len, 0);
        data
    }

    fn push(&self, data: Vec<u8>) {
        self.free
            .borrow_mut() // infallible when single threaded
            .push(data);
    }
}

/// Shared byte buffer, cheap to clone
///
/// Clones refer to the same bytes. Use [`MemChunk::make_writable`] to get a private copy before
/// writing to memory that may be shared.
#[derive(Clone)]
pub struct MemBlock {
    inner: Rc<BlockInner>,
}

struct BlockInner {
    len: usize,
    data: RefCell<Vec<u8>>,
    pins: Cell<usize>,
    pool: Rc<PoolInner>,
}

impl Drop for BlockInner {
    fn drop(&mut self) {
        let data = std::mem::take(self.data.get_mut());
        self.pool.push(data);
    }
}

impl MemBlock {
    pub fn len(&self) -> usize {
        self.inner.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of handles sharing this block
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// True while an [`Acquired`] or [`AcquiredMut`] guard is alive
    pub fn is_acquired(&self) -> bool {
        self.inner.pins.get() > 0
    }

    /// Read access to the whole block, released when the guard is dropped
    pub fn acquire(&self) -> Acquired<'_> {
        self.acquire_range(0..self.len())
    }

    /// Write access to the whole block, released when the guard is dropped
    ///
    /// # Panics
    ///
    /// This function panics if the block is currently acquired
    #[track_caller]
    pub fn acquire_mut(&self) -> AcquiredMut<'_> {
        self.acquire_range_mut(0..self.len())
    }

    #[track_caller]
    fn acquire_range(&self, range: Range<usize>) -> Acquired<'_> {
        let data = Ref::map(self.inner.data.borrow(), |d| &d[range]);
        self.inner.pins.set(self.inner.pins.get() + 1);

        Acquired {
            data,
            pins: &self.inner.pins,
        }
    }

    #[track_caller]
    fn acquire_range_mut(&self, range: Range<usize>) -> AcquiredMut<'_> {
        let data = RefMut::map(self.inner.data.borrow_mut(), |d| &mut d[range]);
        self.inner.pins.set(self.inner.pins.get() + 1);

        AcquiredMut {
            data,
            pins: &self.inner.pins,
        }
    }

    fn pool(&self) -> MemPool {
        MemPool {
            inner: Rc::clone(&self.inner.pool),
        }
    }
}

impl fmt::Debug for MemBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemBlock")
            .field("len", &self.len())
            .field("ref_count", &self.ref_count())
            .field("pins", &self.inner.pins.get())
            .finish()
    }
}

/// Scoped read access to block memory
pub struct Acquired<'a> {
    data: Ref<'a, [u8]>,
    pins: &'a Cell<usize>,
}

impl Deref for Acquired<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl Drop for Acquired<'_> {
    fn drop(&mut self) {
        self.pins.set(self.pins.get() - 1);
    }
}

/// Scoped write access to block memory
pub struct AcquiredMut<'a> {
    data: RefMut<'a, [u8]>,
    pins: &'a Cell<usize>,
}

impl Deref for AcquiredMut<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for AcquiredMut<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for AcquiredMut<'_> {
    fn drop(&mut self) {
        self.pins.set(self.pins.get() - 1);
    }
}

/// Byte range of a shared [`MemBlock`]
///
/// A MemChunk has copy-on-write semantics through [`MemChunk::make_writable`], so it is cheap to
/// clone.
#[derive(Clone, Debug)]
pub struct MemChunk {
    block: MemBlock,
    index: usize,
    length: usize,
}

impl MemChunk {
    /// # Panics
    ///
    /// This function panics if the range does not fit in the block
    #[track_caller]
    pub fn new(block: MemBlock, index: usize, length: usize) -> Self {
        assert!(
            index
                .checked_add(length)
                .map_or(false, |end| end <= block.len()),
            "IndexSizeError - Chunk {:?}..+{:?} exceeds block length {:?}",
            index,
            length,
            block.len()
        );

        Self {
            block,
            index,
            length,
        }
    }

    /// Chunk spanning the whole block
    pub fn from_block(block: MemBlock) -> Self {
        let length = block.len();
        Self {
            block,
            index: 0,
            length,
        }
    }

    pub fn block(&self) -> &MemBlock {
        &self.block
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    fn range(&self) -> Range<usize> {
        self.index..self.index + self.length
    }

    /// Read access to the chunk bytes
    pub fn acquire(&self) -> Acquired<'_> {
        self.block.acquire_range(self.range())
    }

    /// Write access to the chunk bytes
    ///
    /// Writes are visible to every chunk sharing the block, call [`MemChunk::make_writable`]
    /// first to detach.
    #[track_caller]
    pub fn acquire_mut(&self) -> AcquiredMut<'_> {
        self.block.acquire_range_mut(self.range())
    }

    /// Make sure this chunk is the only user of its block
    ///
    /// Shared blocks are copied into a new block from the same pool.
    pub fn make_writable(&mut self) {
        if self.block.ref_count() == 1 {
            return;
        }

        let new = self.block.pool().allocate(self.length);
        new.acquire_mut().copy_from_slice(&self.acquire());

        self.block = new;
        self.index = 0;
    }

    /// Overwrite the chunk with the silence pattern of `format`, detaching it first
    pub fn silence(&mut self, format: SampleFormat) {
        self.make_writable();
        silence_memory(&mut self.acquire_mut(), format);
    }
}
