use hudkit_engine::texture::{TextureInfo, TextureTable, ATLAS_SIZE, MISSING_TEXTURE};

const TILE: u32 = 16;

type Paint = fn(u32, u32) -> [u8; 4];

/// Tiles painted into the first row of page 0, left to right.
const TILES: [(&str, Paint); 5] = [
    (MISSING_TEXTURE, paint_missing),
    ("stone", paint_stone),
    ("solid", paint_solid),
    ("slot", paint_slot),
    ("selector", paint_selector),
];

/// Procedurally painted single-page atlas.
pub struct Atlas {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub textures: TextureTable,
}

impl Atlas {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let size = u32::from(ATLAS_SIZE);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("demo atlas"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        // One strip of `TILE` rows holds every tile.
        let row_bytes = size * 4;
        let mut strip = vec![0u8; (row_bytes * TILE) as usize];
        let mut textures = TextureTable::new();

        for (i, (name, paint)) in TILES.iter().enumerate() {
            let origin = i as u32 * TILE;
            for y in 0..TILE {
                for x in 0..TILE {
                    let at = (y * row_bytes + (origin + x) * 4) as usize;
                    strip[at..at + 4].copy_from_slice(&paint(x, y));
                }
            }
            textures.insert(
                *name,
                TextureInfo::new(0, origin as u16, 0, TILE as u16, TILE as u16),
            );
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &strip,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(row_bytes),
                rows_per_image: Some(TILE),
            },
            wgpu::Extent3d {
                width: size,
                height: TILE,
                depth_or_array_layers: 1,
            },
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });
        log::debug!("atlas uploaded ({} textures)", textures.len());

        Self {
            _texture: texture,
            view,
            textures,
        }
    }
}

fn hash(x: u32, y: u32) -> u8 {
    let mut h = x.wrapping_mul(374_761_393) ^ y.wrapping_mul(668_265_263);
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    (h >> 24) as u8
}

fn paint_missing(x: u32, y: u32) -> [u8; 4] {
    if (x / 8 + y / 8) % 2 == 0 {
        [248, 0, 248, 255]
    } else {
        [0, 0, 0, 255]
    }
}

fn paint_stone(x: u32, y: u32) -> [u8; 4] {
    let v = 104 + hash(x, y) / 6;
    [v, v, v, 255]
}

fn paint_solid(_: u32, _: u32) -> [u8; 4] {
    [255; 4]
}

fn border(x: u32, y: u32, width: u32) -> bool {
    x < width || y < width || x >= TILE - width || y >= TILE - width
}

fn paint_slot(x: u32, y: u32) -> [u8; 4] {
    if border(x, y, 1) {
        [139, 139, 139, 255]
    } else {
        [40, 40, 40, 160]
    }
}

fn paint_selector(x: u32, y: u32) -> [u8; 4] {
    if border(x, y, 2) {
        [255, 255, 255, 255]
    } else {
        [0, 0, 0, 0]
    }
}
