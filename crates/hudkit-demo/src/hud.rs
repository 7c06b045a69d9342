use std::collections::VecDeque;

use hudkit_engine::coords::{SubRect, VirtualRect};
use hudkit_engine::element::ElementHandle;
use hudkit_engine::gpu::GpuError;
use hudkit_engine::render::{FrameStats, WgpuDriver};
use hudkit_engine::texture::TextureTable;
use hudkit_engine::{Overlay, OverlayConfig};

const HOTBAR_SLOTS: usize = 9;
const SLOT_SIZE: f32 = 40.0;
const HOTBAR_X: f32 = 400.0 - SLOT_SIZE * HOTBAR_SLOTS as f32 / 2.0;
const HOTBAR_Y: f32 = 480.0 - SLOT_SIZE - 4.0;
const MAX_SPARKS: usize = 24;
const SPARK_EVERY: u64 = 6;

const FULL_TILE: SubRect = SubRect::full(16.0, 16.0);

/// Demo HUD: crosshair, hotbar with a movable selector, a pulsing banner and
/// a stream of short-lived sparks that keeps the free-list busy.
pub struct Hud {
    overlay: Overlay<WgpuDriver>,
    textures: TextureTable,
    selector: ElementHandle,
    selected: usize,
    banner: ElementHandle,
    sparks: VecDeque<ElementHandle>,
    seed: u32,
    frames: u64,
}

impl Hud {
    pub fn new(driver: WgpuDriver, textures: TextureTable) -> Self {
        let mut overlay = Overlay::new(driver, OverlayConfig::with_slots(64));

        // Backdrop first so everything else lands in front of it.
        let backdrop = overlay.create_named(
            &textures,
            "solid",
            VirtualRect::new(HOTBAR_X - 4.0, HOTBAR_Y - 4.0, SLOT_SIZE * HOTBAR_SLOTS as f32 + 8.0, SLOT_SIZE + 8.0),
            FULL_TILE,
        );
        overlay.set_tint(backdrop, 0, 0, 0);
        overlay.set_alpha(backdrop, 0.35);

        for i in 0..HOTBAR_SLOTS {
            overlay.create_named(&textures, "slot", slot_rect(i), FULL_TILE);
        }
        let selector = overlay.create_named(&textures, "selector", slot_rect(0), FULL_TILE);

        // Stone tiled 4x across the banner through the sub-rectangle.
        let banner = overlay.create_named(
            &textures,
            "stone",
            VirtualRect::new(272.0, 16.0, 256.0, 32.0),
            SubRect::new(0.0, 0.0, 64.0, 8.0),
        );
        // Not in the atlas: shows the missing-texture checker.
        overlay.create_named(&textures, "logo", VirtualRect::new(8.0, 8.0, 32.0, 32.0), FULL_TILE);

        overlay.create_named(&textures, "stone", VirtualRect::new(398.0, 238.0, 4.0, 4.0), FULL_TILE);

        Self {
            overlay,
            textures,
            selector,
            selected: 0,
            banner,
            sparks: VecDeque::with_capacity(MAX_SPARKS),
            seed: 0x9e37_79b9,
            frames: 0,
        }
    }

    /// Moves the selector by `delta` slots, wrapping around the hotbar.
    pub fn step_selection(&mut self, delta: isize) {
        let next = (self.selected as isize + delta).rem_euclid(HOTBAR_SLOTS as isize) as usize;
        self.select(next);
    }

    pub fn select(&mut self, slot: usize) {
        if slot >= HOTBAR_SLOTS || slot == self.selected {
            return;
        }
        let dx = (slot as f32 - self.selected as f32) * SLOT_SIZE;
        self.overlay.shift_element(self.selector, dx, 0.0);
        self.selected = slot;
    }

    /// Advances animations by one frame and draws the overlay.
    pub fn frame(&mut self, seconds: f32) -> Result<FrameStats, GpuError> {
        self.frames += 1;

        let pulse = (seconds * 2.0).sin() * 0.5 + 0.5;
        self.overlay.set_alpha(self.banner, 0.4 + 0.6 * pulse);

        if self.frames % SPARK_EVERY == 0 {
            self.spawn_spark();
        }
        for &spark in &self.sparks {
            self.overlay.shift_element(spark, 0.0, -1.5);
        }

        let stats = self.overlay.render_frame()?;
        if self.frames % 300 == 0 {
            log::debug!(
                "frame {}: {} live, {} slots, {:?}",
                self.frames,
                self.overlay.pool().live_count(),
                self.overlay.pool().slot_count(),
                stats
            );
        }
        Ok(stats)
    }

    fn spawn_spark(&mut self) {
        if self.sparks.len() == MAX_SPARKS {
            if let Some(old) = self.sparks.pop_front() {
                self.overlay.free_element(old);
            }
        }

        let x = 40.0 + (self.next_random() % 720) as f32;
        let y = 200.0 + (self.next_random() % 200) as f32;
        let spark = self.overlay.create_named(
            &self.textures,
            "solid",
            VirtualRect::new(x, y, 6.0, 6.0),
            FULL_TILE,
        );
        let [r, g, b, _] = (self.next_random() | 0x0040_4040).to_le_bytes();
        self.overlay.set_tint(spark, r, g, b);
        self.overlay.set_alpha(spark, 0.8);
        self.sparks.push_back(spark);
    }

    // xorshift32
    fn next_random(&mut self) -> u32 {
        let mut x = self.seed;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.seed = x;
        x
    }

    #[inline]
    pub fn driver_mut(&mut self) -> &mut WgpuDriver {
        self.overlay.driver_mut()
    }

    pub fn shutdown(self) {
        let live = self.overlay.pool().live_count();
        drop(self.overlay.destroy());
        log::info!("overlay shut down ({live} elements live)");
    }
}

fn slot_rect(i: usize) -> VirtualRect {
    VirtualRect::new(HOTBAR_X + i as f32 * SLOT_SIZE, HOTBAR_Y, SLOT_SIZE, SLOT_SIZE)
}
