//! Decoding with `encoding_rs`, plus the Johab encoding it lacks.

use encoding_rs::{Encoding, BIG5, EUC_KR, GBK, SHIFT_JIS};

use super::{LegacyDecoder, LegacyEncoding};

/// The default [`LegacyDecoder`].
///
/// Johab Hangul syllables are composed from their jamo bit fields; the
/// remaining Johab codes are rearranged into KS X 1001 and decoded as
/// EUC-KR.
#[derive(Clone, Copy, Debug, Default)]
pub struct EncodingRsDecoder;

impl LegacyDecoder for EncodingRsDecoder {
    fn decode(&self, encoding: LegacyEncoding, bytes: &[u8]) -> Option<char> {
        match encoding {
            LegacyEncoding::ShiftJis => decode_single(SHIFT_JIS, bytes),
            LegacyEncoding::Gbk => decode_single(GBK, bytes),
            LegacyEncoding::Big5 => decode_single(BIG5, bytes),
            LegacyEncoding::Wansung => decode_single(EUC_KR, bytes),
            LegacyEncoding::Johab => decode_johab(bytes),
        }
    }
}

fn decode_single(encoding: &'static Encoding, bytes: &[u8]) -> Option<char> {
    let text = encoding.decode_without_bom_handling_and_without_replacement(bytes)?;
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}

fn decode_johab(bytes: &[u8]) -> Option<char> {
    let [lead, trail] = *bytes else {
        return None;
    };
    match lead {
        0x84..=0xD3 => hangul_syllable(u16::from_be_bytes([lead, trail])),
        _ => ksc_bytes(lead, trail).and_then(|euc| decode_single(EUC_KR, &euc)),
    }
}

const SYLLABLE_BASE: u32 = 0xAC00;
const MEDIAL_COUNT: u32 = 21;
const FINAL_COUNT: u32 = 28;

/// Composes a precomposed syllable from the three 5 bit jamo fields.
///
/// Codes with a fill value in the initial or medial position are partial
/// jamo and are not decoded.
fn hangul_syllable(code: u16) -> Option<char> {
    let initial = match (code >> 10) & 0x1F {
        value @ 2..=20 => value - 2,
        _ => return None,
    };
    let medial = match (code >> 5) & 0x1F {
        value @ 3..=7 => value - 3,
        value @ 10..=15 => value - 5,
        value @ 18..=23 => value - 7,
        value @ 26..=29 => value - 9,
        _ => return None,
    };
    let last = match code & 0x1F {
        1 => 0,
        value @ 2..=17 => value - 1,
        value @ 19..=29 => value - 2,
        _ => return None,
    };
    let index = (initial as u32 * MEDIAL_COUNT + medial as u32) * FINAL_COUNT + last as u32;
    char::from_u32(SYLLABLE_BASE + index)
}

/// Maps a Johab symbol or hanja code to its EUC-KR bytes.
fn ksc_bytes(lead: u8, trail: u8) -> Option<[u8; 2]> {
    if !matches!(lead, 0xD9..=0xDE | 0xE0..=0xF9) || !matches!(trail, 0x31..=0x7E | 0x91..=0xFE) {
        return None;
    }
    // this block would overlap the Hangul syllables of KS X 1001
    if lead == 0xDA && (0xA1..=0xD3).contains(&trail) {
        return None;
    }
    let mut row = if lead < 0xE0 {
        2 * (lead - 0xD9)
    } else {
        (2 * lead as u16 - 0x197) as u8
    };
    let col = if trail < 0x91 {
        trail - 0x31
    } else {
        trail - 0x43
    };
    let (row_adjust, col) = if col < 0x5E {
        (0, col)
    } else {
        (1, col - 0x5E)
    };
    row += row_adjust + 0x21;
    Some([row | 0x80, (col + 0x21) | 0x80])
}
