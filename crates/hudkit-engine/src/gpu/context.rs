use super::{BindingCache, GpuDriver};

/// A driver paired with the bind-state cache that fronts it.
///
/// All buffer operations take this instead of the bare driver so that binds are
/// deduplicated and data calls can be checked against the cached binding.
#[derive(Debug)]
pub struct GpuContext<D: GpuDriver> {
    pub(crate) driver: D,
    pub(crate) bindings: BindingCache,
}

impl<D: GpuDriver> GpuContext<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            bindings: BindingCache::new(),
        }
    }

    #[inline]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Direct driver access.
    ///
    /// Binding buffers through the returned reference bypasses the cache; call
    /// [`BindingCache::invalidate`] via [`invalidate_bindings`](Self::invalidate_bindings)
    /// afterwards.
    #[inline]
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    #[inline]
    pub fn bindings(&self) -> &BindingCache {
        &self.bindings
    }

    #[inline]
    pub fn invalidate_bindings(&mut self) {
        self.bindings.invalidate();
    }

    pub fn into_driver(self) -> D {
        self.driver
    }
}
