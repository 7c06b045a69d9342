use super::{BufferId, BufferTarget, GpuDriver};

/// Remembers which buffer is bound to which target and skips redundant binds.
///
/// A frame typically binds the same buffer many times through different code
/// paths; only the first bind after a change reaches the driver.
#[derive(Debug, Default, Clone)]
pub struct BindingCache {
    current: Option<(BufferId, BufferTarget)>,
    hits: u64,
    misses: u64,
}

impl BindingCache {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `buffer` to `target`, returning `true` if a driver call was issued.
    pub fn bind<D: GpuDriver + ?Sized>(
        &mut self,
        driver: &mut D,
        buffer: BufferId,
        target: BufferTarget,
    ) -> bool {
        if self.current == Some((buffer, target)) {
            self.hits += 1;
            return false;
        }
        driver.bind_buffer(target, buffer);
        self.current = Some((buffer, target));
        self.misses += 1;
        true
    }

    /// The (buffer, target) pair last bound through this cache.
    #[inline]
    pub fn current(&self) -> Option<(BufferId, BufferTarget)> {
        self.current
    }

    #[inline]
    pub fn current_buffer(&self) -> Option<BufferId> {
        self.current.map(|(b, _)| b)
    }

    #[inline]
    pub fn is_current(&self, buffer: BufferId) -> bool {
        self.current_buffer() == Some(buffer)
    }

    /// Forgets `buffer` if it is the cached one, so the next bind is not skipped.
    pub fn unbind_if_current(&mut self, buffer: BufferId) -> bool {
        if self.is_current(buffer) {
            self.current = None;
            true
        } else {
            false
        }
    }

    /// Forgets everything. Use after external code touched driver bind state.
    #[inline]
    pub fn invalidate(&mut self) {
        self.current = None;
    }

    /// Binds that were skipped because the pair was already current.
    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Binds that reached the driver.
    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{DriverCall, RecordingDriver};

    fn bind_calls(driver: &RecordingDriver) -> usize {
        driver.count(|c| matches!(c, DriverCall::BindBuffer { .. }))
    }

    #[test]
    fn repeated_bind_reaches_driver_once() {
        let mut driver = RecordingDriver::new();
        let mut cache = BindingCache::new();
        let buf = driver.create_buffer();

        assert!(cache.bind(&mut driver, buf, BufferTarget::Array));
        assert!(!cache.bind(&mut driver, buf, BufferTarget::Array));
        assert!(!cache.bind(&mut driver, buf, BufferTarget::Array));

        assert_eq!(bind_calls(&driver), 1);
        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn target_change_is_a_miss() {
        let mut driver = RecordingDriver::new();
        let mut cache = BindingCache::new();
        let buf = driver.create_buffer();

        cache.bind(&mut driver, buf, BufferTarget::Array);
        assert!(cache.bind(&mut driver, buf, BufferTarget::ElementArray));
        assert_eq!(bind_calls(&driver), 2);
        assert_eq!(cache.current(), Some((buf, BufferTarget::ElementArray)));
    }

    #[test]
    fn switching_buffers_rebinds() {
        let mut driver = RecordingDriver::new();
        let mut cache = BindingCache::new();
        let a = driver.create_buffer();
        let b = driver.create_buffer();

        cache.bind(&mut driver, a, BufferTarget::Array);
        cache.bind(&mut driver, b, BufferTarget::Array);
        cache.bind(&mut driver, a, BufferTarget::Array);
        assert_eq!(bind_calls(&driver), 3);
        assert!(cache.is_current(a));
    }

    #[test]
    fn unbind_if_current_only_clears_matching_buffer() {
        let mut driver = RecordingDriver::new();
        let mut cache = BindingCache::new();
        let a = driver.create_buffer();
        let b = driver.create_buffer();

        cache.bind(&mut driver, a, BufferTarget::Array);
        assert!(!cache.unbind_if_current(b));
        assert!(cache.is_current(a));

        assert!(cache.unbind_if_current(a));
        assert_eq!(cache.current(), None);

        // The next bind must not be skipped.
        assert!(cache.bind(&mut driver, a, BufferTarget::Array));
    }
}
