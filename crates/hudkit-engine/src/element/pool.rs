use crate::coords::{SubRect, VirtualRect, VirtualViewport};
use crate::texture::TextureInfo;

use super::depth::{DepthCursor, DEPTH_RANGE};
use super::{ElementHandle, VisualElement};

/// Sub-region precision: offsets and sizes are stored in 1/16 texel steps.
pub const SUB_TEXEL_SCALE: f32 = 16.0;

#[inline]
fn sub_units(texels: f32) -> i16 {
    // `as` saturates, so absurd sub-regions clamp instead of wrapping.
    (texels * SUB_TEXEL_SCALE).round() as i16
}

#[inline]
fn alpha_byte(a: f32) -> u8 {
    (a.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Arena of element slots with a LIFO free-list.
///
/// Freed slots stay in place (the compositor skips them) and are handed out
/// again before the arena grows, so steady-state create/free churn allocates
/// nothing.
///
/// Draw order is carried by depth, not by slot order: every allocation takes
/// the next depth rank, so a later element lands in front even when it reuses
/// a slot that sits early in the array.
#[derive(Debug)]
pub struct ElementPool {
    viewport: VirtualViewport,
    slots: Vec<VisualElement>,
    free: Vec<u32>,
    live: usize,
    depth: DepthCursor,
}

impl ElementPool {
    pub fn new(viewport: VirtualViewport) -> Self {
        Self::with_capacity(viewport, 0)
    }

    pub fn with_capacity(viewport: VirtualViewport, slots: usize) -> Self {
        debug_assert!(viewport.is_valid(), "invalid virtual viewport: {viewport:?}");
        Self {
            viewport,
            slots: Vec::with_capacity(slots),
            free: Vec::with_capacity(slots),
            live: 0,
            depth: DepthCursor::default(),
        }
    }

    #[inline]
    pub fn viewport(&self) -> VirtualViewport {
        self.viewport
    }

    /// Allocates an element, reusing the most recently freed slot if any.
    ///
    /// `bounds` is in virtual units; `sub` selects the texels of `texture` to show.
    pub fn create(&mut self, texture: TextureInfo, bounds: VirtualRect, sub: SubRect) -> ElementHandle {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(VisualElement::vacant());
                (self.slots.len() - 1) as u32
            }
        };

        let depth_rank = self.next_depth_rank();
        let [x, y, w, h] = self.viewport.normalize(bounds);

        let e = &mut self.slots[index as usize];
        e.x = x;
        e.y = y;
        e.w = w;
        e.h = h;
        e.depth_rank = depth_rank;
        e.atlas = texture.atlas_rect();
        e.sub_offset = [sub_units(sub.x), sub_units(sub.y)];
        e.sub_size = [sub_units(sub.w), sub_units(sub.h)];
        e.color = [255; 4];
        e.free = false;

        self.live += 1;
        ElementHandle {
            index,
            generation: e.generation,
        }
    }

    /// Returns the element if `handle` still refers to a live slot.
    pub fn get(&self, handle: ElementHandle) -> Option<&VisualElement> {
        self.slots
            .get(handle.index())
            .filter(|e| !e.free && e.generation == handle.generation)
    }

    fn get_mut(&mut self, handle: ElementHandle) -> Option<&mut VisualElement> {
        let e = self
            .slots
            .get_mut(handle.index())
            .filter(|e| !e.free && e.generation == handle.generation);
        if e.is_none() {
            log::trace!("ignoring stale element handle {handle:?}");
        }
        e
    }

    #[inline]
    pub fn is_live(&self, handle: ElementHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Moves the element by `dx`, `dy` virtual units.
    pub fn shift(&mut self, handle: ElementHandle, dx: f32, dy: f32) -> bool {
        let (nx, ny) = (self.viewport.normalize_x(dx), self.viewport.normalize_y(dy));
        let Some(e) = self.get_mut(handle) else { return false };
        e.x += nx;
        e.y += ny;
        true
    }

    /// Replaces position and size (virtual units).
    pub fn set_bounds(&mut self, handle: ElementHandle, bounds: VirtualRect) -> bool {
        let [x, y, w, h] = self.viewport.normalize(bounds);
        let Some(e) = self.get_mut(handle) else { return false };
        e.x = x;
        e.y = y;
        e.w = w;
        e.h = h;
        true
    }

    /// Sets opacity from `0.0..=1.0`; values outside are clamped.
    pub fn set_alpha(&mut self, handle: ElementHandle, alpha: f32) -> bool {
        self.set_alpha_byte(handle, alpha_byte(alpha))
    }

    pub fn set_alpha_byte(&mut self, handle: ElementHandle, alpha: u8) -> bool {
        let Some(e) = self.get_mut(handle) else { return false };
        e.color[3] = alpha;
        true
    }

    /// Sets the RGB tint, keeping alpha.
    pub fn set_tint(&mut self, handle: ElementHandle, r: u8, g: u8, b: u8) -> bool {
        let Some(e) = self.get_mut(handle) else { return false };
        e.color[0] = r;
        e.color[1] = g;
        e.color[2] = b;
        true
    }

    /// Swaps the texture and sub-region, keeping placement, tint and depth.
    pub fn set_texture(&mut self, handle: ElementHandle, texture: TextureInfo, sub: SubRect) -> bool {
        let Some(e) = self.get_mut(handle) else { return false };
        e.atlas = texture.atlas_rect();
        e.sub_offset = [sub_units(sub.x), sub_units(sub.y)];
        e.sub_size = [sub_units(sub.w), sub_units(sub.h)];
        true
    }

    /// Releases the element. Freeing twice, or freeing through a stale
    /// handle, does nothing and returns `false`.
    pub fn free(&mut self, handle: ElementHandle) -> bool {
        let Some(e) = self.get_mut(handle) else { return false };
        e.free = true;
        e.generation = e.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        if self.live < DEPTH_RANGE as usize {
            self.depth.unpin();
        }
        true
    }

    /// Frees every live element. Slots and their capacity are kept.
    pub fn free_all(&mut self) {
        for (index, e) in self.slots.iter_mut().enumerate() {
            if e.free {
                continue;
            }
            e.free = true;
            e.generation = e.generation.wrapping_add(1);
            self.free.push(index as u32);
        }
        self.live = 0;
        self.depth.unpin();
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Total slots, freed ones included.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Every slot in storage order, freed ones included.
    #[inline]
    pub fn slots(&self) -> &[VisualElement] {
        &self.slots
    }

    /// Live elements in storage order.
    pub fn iter_live(&self) -> impl Iterator<Item = (ElementHandle, &VisualElement)> {
        self.slots.iter().enumerate().filter(|(_, e)| !e.free).map(|(i, e)| {
            (
                ElementHandle {
                    index: i as u32,
                    generation: e.generation,
                },
                e,
            )
        })
    }

    fn next_depth_rank(&mut self) -> u32 {
        if let Some(rank) = self.depth.advance() {
            return rank;
        }
        // Compacting again cannot help until enough elements are freed.
        if !self.depth.is_pinned() {
            self.compact_depth();
            if let Some(rank) = self.depth.advance() {
                return rank;
            }
        }
        self.depth.saturated()
    }

    /// Renumbers live ranks to `0..live`, keeping their relative order.
    fn compact_depth(&mut self) {
        let mut order: Vec<u32> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.free)
            .map(|(i, _)| i as u32)
            .collect();
        order.sort_by_key(|&i| self.slots[i as usize].depth_rank);

        for (rank, &i) in order.iter().enumerate() {
            self.slots[i as usize].depth_rank = rank as u32;
        }
        let live = (order.len() as u32).min(DEPTH_RANGE);
        self.depth.reset_to(live);
        log::debug!("compacted overlay depth ranks ({live} live)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    fn pool() -> ElementPool {
        ElementPool::new(VirtualViewport::DEFAULT)
    }

    fn stone() -> TextureInfo {
        TextureInfo::new(0, 16, 0, 16, 16)
    }

    fn add(pool: &mut ElementPool, x: f32) -> ElementHandle {
        pool.create(stone(), VirtualRect::new(x, 0.0, 16.0, 16.0), SubRect::full(16.0, 16.0))
    }

    // ── allocation ────────────────────────────────────────────────────────

    #[test]
    fn create_normalizes_against_viewport() {
        let mut p = pool();
        let h = add(&mut p, 20.0);
        let e = p.get(h).unwrap();
        assert!((e.position()[0] - 0.025).abs() < EPS);
        assert!((e.size()[0] - 0.02).abs() < EPS);
        assert!((e.size()[1] - 16.0 / 480.0).abs() < EPS);
    }

    #[test]
    fn create_resets_tint_and_texture_fields() {
        let mut p = pool();
        let h = p.create(
            TextureInfo::new(1, 4, 8, 32, 16),
            VirtualRect::new(0.0, 0.0, 10.0, 10.0),
            SubRect::new(0.5, 1.0, 8.0, 4.0),
        );
        let e = p.get(h).unwrap();
        assert_eq!(e.color(), [255; 4]);
        assert_eq!(e.atlas_rect(), [4, 1024 + 8, 32, 16]);
        assert_eq!(e.sub_offset(), [8, 16]);
        assert_eq!(e.sub_size(), [128, 64]);
        assert!(!e.is_free());
    }

    #[test]
    fn freed_slot_is_reused_first() {
        let mut p = pool();
        let a = add(&mut p, 0.0);
        assert!(p.free(a));
        let b = add(&mut p, 0.0);
        assert_eq!(a.index(), b.index());
        assert_eq!(p.slot_count(), 1);
    }

    #[test]
    fn free_list_is_lifo() {
        let mut p = pool();
        let a = add(&mut p, 0.0);
        let b = add(&mut p, 0.0);
        p.free(a);
        p.free(b);
        assert_eq!(add(&mut p, 0.0).index(), b.index());
        assert_eq!(add(&mut p, 0.0).index(), a.index());
        assert_eq!(p.slot_count(), 2);
    }

    #[test]
    fn reused_slot_is_fully_reset() {
        let mut p = pool();
        let a = add(&mut p, 0.0);
        p.set_tint(a, 1, 2, 3);
        p.set_alpha(a, 0.25);
        p.shift(a, 100.0, 100.0);
        p.free(a);

        let b = add(&mut p, 40.0);
        let e = p.get(b).unwrap();
        assert_eq!(e.color(), [255; 4]);
        assert!((e.position()[0] - 0.05).abs() < EPS);
        assert_eq!(e.position()[1], 0.0);
    }

    // ── free ──────────────────────────────────────────────────────────────

    #[test]
    fn double_free_is_a_noop() {
        let mut p = pool();
        let a = add(&mut p, 0.0);
        assert!(p.free(a));
        assert!(!p.free(a));
        assert_eq!(p.free_count(), 1);
        assert_eq!(p.live_count(), 0);

        let b = add(&mut p, 0.0);
        let c = add(&mut p, 0.0);
        assert_ne!(b.index(), c.index());
    }

    #[test]
    fn stale_handle_cannot_touch_new_occupant() {
        let mut p = pool();
        let old = add(&mut p, 0.0);
        p.free(old);
        let new = add(&mut p, 0.0);
        assert_eq!(old.index(), new.index());

        assert!(!p.free(old));
        assert!(!p.shift(old, 10.0, 10.0));
        assert!(!p.set_alpha(old, 0.0));
        assert!(p.is_live(new));
        assert_eq!(p.get(new).unwrap().alpha(), 255);
        assert!(p.get(old).is_none());
    }

    #[test]
    fn free_all_releases_everything() {
        let mut p = pool();
        let hs: Vec<_> = (0..4).map(|i| add(&mut p, i as f32)).collect();
        p.free(hs[1]);
        p.free_all();
        assert_eq!(p.live_count(), 0);
        assert_eq!(p.free_count(), 4);
        assert!(hs.iter().all(|&h| !p.is_live(h)));
        assert_eq!(p.iter_live().count(), 0);
    }

    // ── mutation ──────────────────────────────────────────────────────────

    #[test]
    fn shift_takes_virtual_units() {
        let mut p = pool();
        let a = add(&mut p, 0.0);
        assert!(p.shift(a, 8.0, 24.0));
        let e = p.get(a).unwrap();
        assert!((e.position()[0] - 0.01).abs() < EPS);
        assert!((e.position()[1] - 0.05).abs() < EPS);
    }

    #[test]
    fn alpha_is_clamped() {
        let mut p = pool();
        let a = add(&mut p, 0.0);

        p.set_alpha(a, 2.0);
        let over = p.get(a).unwrap().alpha();
        p.set_alpha(a, 1.0);
        assert_eq!(over, 255);
        assert_eq!(p.get(a).unwrap().alpha(), 255);

        p.set_alpha(a, -3.0);
        assert_eq!(p.get(a).unwrap().alpha(), 0);
        p.set_alpha(a, 0.5);
        assert_eq!(p.get(a).unwrap().alpha(), 128);
    }

    #[test]
    fn texture_swap_keeps_depth_and_placement() {
        let mut p = pool();
        let a = add(&mut p, 20.0);
        let before = p.get(a).unwrap().clone();
        p.set_texture(a, TextureInfo::new(0, 64, 64, 8, 8), SubRect::full(8.0, 8.0));
        let after = p.get(a).unwrap();
        assert_eq!(after.atlas_rect(), [64, 64, 8, 8]);
        assert_eq!(after.sub_size(), [128, 128]);
        assert_eq!(after.position(), before.position());
        assert_eq!(after.depth(), before.depth());
    }

    #[test]
    fn set_bounds_normalizes_and_keeps_the_rest() {
        let mut p = pool();
        let a = add(&mut p, 20.0);
        p.set_tint(a, 1, 2, 3);
        let before = p.get(a).unwrap().clone();

        assert!(p.set_bounds(a, VirtualRect::new(200.0, 120.0, 40.0, 24.0)));
        let after = p.get(a).unwrap();
        assert!((after.position()[0] - 0.25).abs() < EPS);
        assert!((after.position()[1] - 0.25).abs() < EPS);
        assert!((after.size()[0] - 0.05).abs() < EPS);
        assert!((after.size()[1] - 0.05).abs() < EPS);
        assert_eq!(after.depth_rank(), before.depth_rank());
        assert_eq!(after.color(), [1, 2, 3, 255]);
        assert_eq!(after.atlas_rect(), before.atlas_rect());
        assert_eq!(after.sub_offset(), before.sub_offset());

        p.free(a);
        assert!(!p.set_bounds(a, VirtualRect::new(0.0, 0.0, 1.0, 1.0)));
        let b = add(&mut p, 0.0);
        assert_eq!(b.index(), a.index());
        assert!(!p.set_bounds(a, VirtualRect::new(0.0, 0.0, 1.0, 1.0)));
        assert!((p.get(b).unwrap().size()[0] - 0.02).abs() < EPS);
    }

    // ── depth ─────────────────────────────────────────────────────────────

    #[test]
    fn later_elements_are_strictly_in_front() {
        let mut p = pool();
        let hs: Vec<_> = (0..100).map(|i| add(&mut p, i as f32)).collect();
        for pair in hs.windows(2) {
            let a = p.get(pair[0]).unwrap().depth();
            let b = p.get(pair[1]).unwrap().depth();
            assert!(b < a, "{b} should be below {a}");
        }
        assert_eq!(p.get(hs[0]).unwrap().depth(), 0.0);
    }

    #[test]
    fn reused_slot_still_draws_in_front() {
        let mut p = pool();
        let a = add(&mut p, 0.0);
        let b = add(&mut p, 0.0);
        p.free(a);
        let c = add(&mut p, 0.0);
        assert_eq!(c.index(), a.index());
        assert!(p.get(c).unwrap().depth() < p.get(b).unwrap().depth());
    }

    #[test]
    fn compaction_preserves_order_and_range() {
        let mut p = pool();
        let a = add(&mut p, 0.0);
        let b = add(&mut p, 0.0);
        for _ in 0..(DEPTH_RANGE + 10) {
            let t = add(&mut p, 0.0);
            p.free(t);
        }
        let c = add(&mut p, 0.0);

        let (da, db, dc) = (
            p.get(a).unwrap().depth(),
            p.get(b).unwrap().depth(),
            p.get(c).unwrap().depth(),
        );
        assert!(da > db && db > dc);
        assert!(dc > -1.0);
        assert!(p.get(c).unwrap().depth_rank() < DEPTH_RANGE);
    }

    #[test]
    fn depth_saturates_when_range_is_full() {
        let mut p = ElementPool::with_capacity(VirtualViewport::DEFAULT, DEPTH_RANGE as usize + 1);
        let hs: Vec<_> = (0..=DEPTH_RANGE).map(|_| add(&mut p, 0.0)).collect();
        let last = p.get(hs[hs.len() - 1]).unwrap();
        let prev = p.get(hs[hs.len() - 2]).unwrap();
        assert_eq!(last.depth(), prev.depth());
        assert!(last.depth() > -1.0);
    }

    #[test]
    fn saturated_pool_compacts_once_until_freed() {
        let mut p = ElementPool::with_capacity(VirtualViewport::DEFAULT, DEPTH_RANGE as usize + 6);
        let mut hs: Vec<_> = (0..=DEPTH_RANGE).map(|_| add(&mut p, 0.0)).collect();
        assert_eq!(p.depth.compactions(), 1);

        for _ in 0..5 {
            hs.push(add(&mut p, 0.0));
        }
        assert_eq!(p.depth.compactions(), 1);

        for h in hs.drain(hs.len() - 10..) {
            p.free(h);
        }
        assert!(p.live_count() < DEPTH_RANGE as usize);

        let fresh = add(&mut p, 0.0);
        assert_eq!(p.depth.compactions(), 2);
        let newest_old = p.get(hs[hs.len() - 1]).unwrap().depth();
        assert!(p.get(fresh).unwrap().depth() < newest_old);
    }
}
