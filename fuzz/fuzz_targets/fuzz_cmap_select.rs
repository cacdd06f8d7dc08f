#![no_main]
use std::error::Error;

use libfuzzer_sys::fuzz_target;
use read_cmap::{
    tables::cmap::{Charmap, CmapSelector},
    FontData, FontRef, GlyphMapper,
};

const CJK_VARIATION_1: u32 = 0xFE00;
const EMOJI_PRESENTATION: u32 = 0xFE0F;

fn do_charmap_things(charmap: &Charmap) {
    let _ = charmap.is_null();
    let _ = charmap.subtable().format();
    let _ = charmap.has_variant_map();

    for cp in (0..0x3_0000u32).step_by(61).chain(0x200C..0x2070) {
        let _ = charmap.map(cp);
        let _ = charmap.map_variant(cp, CJK_VARIATION_1);
        let _ = charmap.map_variant(cp, EMOJI_PRESENTATION);
    }
    if let Some(variations) = charmap.variations() {
        for record in variations.records() {
            for cp in record.unicode_values() {
                let _ = charmap.map_variant(*cp, record.selector());
            }
        }
    }
}

fn do_cmap_things(data: &[u8]) -> Result<(), Box<dyn Error>> {
    let selector = CmapSelector::default();

    // the input as a bare cmap table
    do_charmap_things(&selector.select_or_null(FontData::new(data)));

    // and as a font
    let font = FontRef::new(data)?;
    let mapper = GlyphMapper::from_font(&selector, &font)?;
    do_charmap_things(mapper.charmap());
    let text = [0x41, 0xD83D, 0xDE00, 0xDC00, 0x0D, 0xD800];
    let mut glyphs = [0; 6];
    mapper.chars_to_glyphs(&text, &mut glyphs);

    Ok(())
}

fuzz_target!(|data: &[u8]| {
    // we don't care about the result, just that we don't panic, hang, etc
    let _ = do_cmap_things(data);
});
