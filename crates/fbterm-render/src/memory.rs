// SPDX-License-Identifier: MIT
//
// Buffer allocation — the injected allocator capability.
//
// Safety: this module turns raw allocator blocks into typed slices. Every
// `RawBuffer` is fully initialized before it is handed out, is never
// aliased, and is released exactly once by its owner. The backend owns the
// allocator and all its buffers, so teardown can always reach both.
//
// The backend never touches a global allocator. Whoever builds it passes
// a `BufferAllocator`, and every buffer (font tables, grid, queue, map,
// canvas) is carved out of it at init. That works with a kernel heap, a
// bump arena over a static region, or the Rust global allocator through
// `HeapAllocator`.
//
// Init allocates several buffers in a row. If a later one fails, the
// earlier ones must go back to the allocator. `Rollback` records each
// block as it is handed out and frees them all on drop unless committed.

#![allow(unsafe_code)]

use core::alloc::Layout;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};
use core::ptr::NonNull;

use crate::error::InitError;

// ─── BufferAllocator ─────────────────────────────────────────────────────────

/// The allocate/free pair the backend is built with.
///
/// # Safety
///
/// `allocate` must return either `None` or a block valid for reads and
/// writes of `layout.size()` bytes, aligned to `layout.align()`, and not
/// handed out again until it is passed back to `deallocate`.
pub unsafe trait BufferAllocator {
    /// Allocate a block for `layout`. `layout.size()` is never zero.
    fn allocate(&mut self, layout: Layout) -> Option<NonNull<u8>>;

    /// Release a block.
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this allocator with the same
    /// `layout`, and must not be used afterwards.
    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, layout: Layout);
}

// SAFETY: forwards to the underlying allocator unchanged.
unsafe impl<A: BufferAllocator + ?Sized> BufferAllocator for &mut A {
    fn allocate(&mut self, layout: Layout) -> Option<NonNull<u8>> {
        (**self).allocate(layout)
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: the caller's contract is passed through.
        unsafe { (**self).deallocate(ptr, layout) }
    }
}

// ─── HeapAllocator ───────────────────────────────────────────────────────────

/// [`BufferAllocator`] over the Rust global allocator.
#[cfg(any(test, feature = "alloc"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapAllocator;

// SAFETY: `alloc::alloc::alloc` satisfies the trait contract for non-zero
// sizes, which is all the backend ever requests.
#[cfg(any(test, feature = "alloc"))]
unsafe impl BufferAllocator for HeapAllocator {
    fn allocate(&mut self, layout: Layout) -> Option<NonNull<u8>> {
        // SAFETY: layout.size() is non-zero per the trait contract.
        NonNull::new(unsafe { ::alloc::alloc::alloc(layout) })
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: ptr/layout come from `allocate` above.
        unsafe { ::alloc::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

// ─── RawBuffer ───────────────────────────────────────────────────────────────

/// A fixed-length, fully initialized slice owned through a `BufferAllocator`.
///
/// There is no `Drop`: the owner releases it with [`RawBuffer::release`]
/// using the same allocator. Zero-length buffers never touch the allocator.
pub struct RawBuffer<T: Copy> {
    ptr: NonNull<T>,
    len: usize,
    _owns: PhantomData<T>,
}

// SAFETY: a RawBuffer is a uniquely owned `[T]`.
unsafe impl<T: Copy + Send> Send for RawBuffer<T> {}
// SAFETY: shared access only hands out `&[T]`.
unsafe impl<T: Copy + Sync> Sync for RawBuffer<T> {}

impl<T: Copy> RawBuffer<T> {
    /// An empty buffer that owns no memory.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            _owns: PhantomData,
        }
    }

    fn layout(len: usize) -> Result<Layout, InitError> {
        Layout::array::<T>(len).map_err(|_| InitError::LayoutOverflow { len })
    }

    /// Allocate `len` elements, each set to `value`.
    pub fn filled(alloc: &mut impl BufferAllocator, len: usize, value: T) -> Result<Self, InitError> {
        let layout = Self::layout(len)?;
        if layout.size() == 0 {
            return Ok(Self::empty());
        }
        let ptr = alloc
            .allocate(layout)
            .ok_or(InitError::OutOfMemory {
                size: layout.size(),
            })?
            .cast::<T>();
        for i in 0..len {
            // SAFETY: i < len and the block holds `len` elements of T.
            unsafe { ptr.add(i).write(value) };
        }
        Ok(Self {
            ptr,
            len,
            _owns: PhantomData,
        })
    }

    /// Allocate a copy of `src`.
    pub fn copied(alloc: &mut impl BufferAllocator, src: &[T]) -> Result<Self, InitError> {
        let layout = Self::layout(src.len())?;
        if layout.size() == 0 {
            return Ok(Self::empty());
        }
        let ptr = alloc
            .allocate(layout)
            .ok_or(InitError::OutOfMemory {
                size: layout.size(),
            })?
            .cast::<T>();
        // SAFETY: the fresh block cannot overlap `src` and holds src.len() Ts.
        unsafe { core::ptr::copy_nonoverlapping(src.as_ptr(), ptr.as_ptr(), src.len()) };
        Ok(Self {
            ptr,
            len: src.len(),
            _owns: PhantomData,
        })
    }

    /// Size of the underlying block.
    #[cfg(test)]
    pub(crate) fn size_bytes(&self) -> usize {
        self.len * core::mem::size_of::<T>()
    }

    /// Hand the memory back.
    ///
    /// # Safety
    ///
    /// `alloc` must be the allocator this buffer was created with.
    pub unsafe fn release(self, alloc: &mut impl BufferAllocator) {
        if let Ok(layout) = Self::layout(self.len) {
            if layout.size() != 0 {
                // SAFETY: same allocator and layout as in `filled`/`copied`.
                unsafe { alloc.deallocate(self.ptr.cast(), layout) };
            }
        }
    }

    /// Erased block descriptor, used by [`Rollback`].
    fn block(&self) -> Option<(NonNull<u8>, Layout)> {
        let layout = Self::layout(self.len).ok()?;
        (layout.size() != 0).then(|| (self.ptr.cast(), layout))
    }
}

impl<T: Copy> Deref for RawBuffer<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        // SAFETY: ptr is valid and initialized for len elements (or dangling
        // with len 0).
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Copy> DerefMut for RawBuffer<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: as above, and `&mut self` guarantees uniqueness.
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Copy + core::fmt::Debug> core::fmt::Debug for RawBuffer<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawBuffer").field("len", &self.len).finish_non_exhaustive()
    }
}

// ─── Rollback ────────────────────────────────────────────────────────────────

/// Most buffers a single init allocates.
const MAX_BLOCKS: usize = 8;

/// Init-time allocation guard: frees everything it handed out unless
/// [`commit`](Rollback::commit) is called.
pub(crate) struct Rollback<'a, A: BufferAllocator> {
    alloc: &'a mut A,
    blocks: [Option<(NonNull<u8>, Layout)>; MAX_BLOCKS],
    count: usize,
}

impl<'a, A: BufferAllocator> Rollback<'a, A> {
    pub(crate) const fn new(alloc: &'a mut A) -> Self {
        Self {
            alloc,
            blocks: [None; MAX_BLOCKS],
            count: 0,
        }
    }

    fn track<T: Copy>(&mut self, buf: RawBuffer<T>) -> RawBuffer<T> {
        debug_assert!(self.count < MAX_BLOCKS);
        if let Some(slot) = self.blocks.get_mut(self.count) {
            *slot = buf.block();
            self.count += 1;
        }
        buf
    }

    pub(crate) fn filled<T: Copy>(&mut self, len: usize, value: T) -> Result<RawBuffer<T>, InitError> {
        let buf = RawBuffer::filled(&mut *self.alloc, len, value)?;
        Ok(self.track(buf))
    }

    pub(crate) fn copied<T: Copy>(&mut self, src: &[T]) -> Result<RawBuffer<T>, InitError> {
        let buf = RawBuffer::copied(&mut *self.alloc, src)?;
        Ok(self.track(buf))
    }

    /// Keep everything allocated so far.
    pub(crate) fn commit(mut self) {
        self.count = 0;
    }
}

impl<A: BufferAllocator> Drop for Rollback<'_, A> {
    fn drop(&mut self) {
        for (ptr, layout) in self.blocks[..self.count].iter().flatten() {
            // SAFETY: every tracked block came from `self.alloc` with this
            // layout, and the RawBuffers pointing at it were dropped with
            // the failed init.
            unsafe { self.alloc.deallocate(*ptr, *layout) };
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
