/// Number of distinct depth ranks. Matches the precision a signed 16-bit
/// depth channel can tell apart.
pub const DEPTH_RANGE: u32 = i16::MAX as u32;

#[inline]
pub(crate) fn depth_for_rank(rank: u32) -> f32 {
    -(rank.min(DEPTH_RANGE - 1) as f32) / DEPTH_RANGE as f32
}

/// Hands out increasing depth ranks until the range is used up.
#[derive(Debug, Default, Clone)]
pub(crate) struct DepthCursor {
    next: u32,
    /// Set once compaction could not free a rank; cleared when `live` drops
    /// back under the range.
    pinned: bool,
    warned_saturated: bool,
    compactions: u32,
}

impl DepthCursor {
    /// Next free rank, or `None` once the range is exhausted.
    #[inline]
    pub(crate) fn advance(&mut self) -> Option<u32> {
        if self.next >= DEPTH_RANGE {
            return None;
        }
        let rank = self.next;
        self.next += 1;
        Some(rank)
    }

    /// Restarts allocation after the live ranks were renumbered to `0..live`.
    #[inline]
    pub(crate) fn reset_to(&mut self, live: u32) {
        self.next = live;
        self.compactions = self.compactions.wrapping_add(1);
    }

    #[inline]
    pub(crate) fn is_pinned(&self) -> bool {
        self.pinned
    }

    #[inline]
    pub(crate) fn unpin(&mut self) {
        self.pinned = false;
    }

    #[inline]
    pub(crate) fn compactions(&self) -> u32 {
        self.compactions
    }

    /// Rank used when more elements are live than the range can order.
    pub(crate) fn saturated(&mut self) -> u32 {
        self.pinned = true;
        if !self.warned_saturated {
            log::warn!(
                "more than {DEPTH_RANGE} overlay elements live; newest elements share a depth"
            );
            self.warned_saturated = true;
        }
        DEPTH_RANGE - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_zero_is_front_plane() {
        assert_eq!(depth_for_rank(0), 0.0);
    }

    #[test]
    fn depth_stays_above_minus_one() {
        assert!(depth_for_rank(DEPTH_RANGE - 1) > -1.0);
        assert_eq!(depth_for_rank(u32::MAX), depth_for_rank(DEPTH_RANGE - 1));
    }

    #[test]
    fn cursor_exhausts_then_resumes_after_reset() {
        let mut c = DepthCursor::default();
        c.reset_to(DEPTH_RANGE - 1);
        assert_eq!(c.advance(), Some(DEPTH_RANGE - 1));
        assert_eq!(c.advance(), None);
        c.reset_to(3);
        assert_eq!(c.advance(), Some(3));
    }
}
