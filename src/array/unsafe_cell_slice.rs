/// An unsafe cell slice.
///
/// This is used internally for concurrent chunk decoding.
/// Tasks write to disjoint subsets of a slice without locking; disjointness is guaranteed by the
/// chunk indexer, which produces non-overlapping output regions.
#[derive(Copy, Clone)]
pub struct UnsafeCellSlice<'a, T>(&'a [std::cell::UnsafeCell<T>]);

unsafe impl<T: Send + Sync> Send for UnsafeCellSlice<'_, T> {}
unsafe impl<T: Send + Sync> Sync for UnsafeCellSlice<'_, T> {}

impl<'a, T: Copy> UnsafeCellSlice<'a, T> {
    pub fn new(slice: &'a mut [T]) -> Self {
        let ptr = std::ptr::from_mut::<[T]>(slice) as *const [std::cell::UnsafeCell<T>];
        Self(unsafe { &*ptr })
    }

    /// # Safety
    /// Callers must only write to elements no other holder of this slice accesses concurrently.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn get(&self) -> &mut [T] {
        if self.0.is_empty() {
            return &mut [];
        }
        let ptr = self.0[0].get();
        std::slice::from_raw_parts_mut(ptr, self.0.len())
    }
}
