#![no_main]
use std::sync::atomic::{AtomicU64, Ordering};

use libfuzzer_sys::{
    arbitrary::{self, Arbitrary},
    fuzz_target,
};
use strike_cache::{HandleWidth, ImageHandle, Rasterizer, Strike, StrikeDesc, Transform};

const INVISIBLE: u64 = u32::MAX as u64;

#[derive(Debug, Arbitrary)]
struct Input {
    num_glyphs: u16,
    point_size: f32,
    matrix: [f32; 4],
    narrow: bool,
    ops: Vec<Op>,
}

#[derive(Debug, Arbitrary)]
enum Op {
    Image(u32),
    Advance(u32),
    Batch(Vec<u32>),
}

/// Hands out sequential handles and checks that each is released at most once.
struct Counter {
    width: HandleWidth,
    next: AtomicU64,
    released: AtomicU64,
}

impl Rasterizer for Counter {
    fn glyph_image(&self, _code: u32, _desc: &StrikeDesc) -> ImageHandle {
        ImageHandle::new(self.next.fetch_add(1, Ordering::Relaxed)).unwrap()
    }

    fn glyph_advance(&self, code: u32, desc: &StrikeDesc) -> f32 {
        code as f32 * desc.point_size
    }

    fn image_advance(&self, image: ImageHandle) -> f32 {
        image.get() as f32
    }

    fn invisible_image(&self) -> ImageHandle {
        ImageHandle::new(INVISIBLE).unwrap()
    }

    fn release_image(&self, image: ImageHandle) {
        assert_ne!(image.get(), INVISIBLE);
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    fn handle_width(&self) -> HandleWidth {
        self.width
    }
}

fuzz_target!(|input: Input| {
    let [xx, yx, xy, yy] = input.matrix;
    let transform = Transform {
        xx,
        yx,
        xy,
        yy,
        dx: 0.0,
        dy: 0.0,
    };
    let num_glyphs = input.num_glyphs as u32;
    let desc = StrikeDesc::new(num_glyphs, input.point_size).with_transform(transform);
    let width = if input.narrow {
        HandleWidth::Narrow
    } else {
        HandleWidth::Wide
    };
    let raster = Counter {
        width,
        next: AtomicU64::new(1),
        released: AtomicU64::new(0),
    };
    let strike = Strike::new(desc, &raster);
    for op in input.ops {
        match op {
            Op::Image(code) => {
                let image = strike.glyph_image(code);
                if code < desc.num_glyphs && code < 0xFFFE {
                    assert_eq!(strike.glyph_image(code), image);
                }
            }
            Op::Advance(code) => {
                let _ = strike.glyph_advance(code);
            }
            Op::Batch(codes) => {
                let mut images = vec![raster.invisible_image(); codes.len()];
                let count = strike.slot0_glyph_images(&codes, &mut images);
                assert!(count <= codes.len());
            }
        }
    }
    drop(strike);
    // every rendered image was released exactly once
    let rendered = raster.next.load(Ordering::Relaxed) - 1;
    assert_eq!(raster.released.load(Ordering::Relaxed), rendered);
});
