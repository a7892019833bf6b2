// Copyright (c) 2026 rezky_nightky

use std::char;

use rand::{
    distr::{Distribution, Uniform},
    Rng,
};

use crate::error::{RainError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Charset(u32);

impl Charset {
    pub const NONE: Charset = Charset(0);
    pub const UPPERCASE: Charset = Charset(0x1);
    pub const DIGITS: Charset = Charset(0x2);
    pub const SYMBOLS: Charset = Charset(0x4);
    pub const KATAKANA: Charset = Charset(0x8);
    pub const BINARY: Charset = Charset(0x10);
    pub const PUNCTUATION: Charset = Charset(0x20);

    pub const MATRIX: Charset = Charset(0xF);
    pub const ASCII_SAFE: Charset = Charset(0x23);

    pub fn contains(self, other: Charset) -> bool {
        (self.0 & other.0) != 0
    }

    pub fn union(self, other: Charset) -> Charset {
        Charset(self.0 | other.0)
    }
}

const RAIN_SYMBOLS: &str = ".:=*+-<>¦|╌";

pub fn parse_user_hex_chars(s: &str) -> Result<Vec<char>> {
    let mut out = Vec::new();
    for (i, part) in s.split(',').enumerate() {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let v = u32::from_str_radix(part, 16)
            .map_err(|_| RainError::invalid(format!("invalid hex char at index {}", i + 1)))?;
        let ch = char::from_u32(v).ok_or_else(|| {
            RainError::invalid(format!("invalid unicode scalar at index {}", i + 1))
        })?;
        out.push(ch);
    }
    Ok(out)
}

pub fn charset_from_str(spec: &str, default_to_ascii: bool) -> Result<Charset> {
    let spec = spec.trim().to_ascii_lowercase();
    match spec.as_str() {
        "auto" => Ok(if default_to_ascii {
            Charset::ASCII_SAFE
        } else {
            Charset::MATRIX
        }),
        "matrix" => Ok(Charset::MATRIX),
        "katakana" => Ok(Charset::KATAKANA),
        "ascii" => Ok(Charset::ASCII_SAFE),
        "digits" | "dec" | "decimal" => Ok(Charset::DIGITS),
        "bin" | "binary" | "01" => Ok(Charset::BINARY),
        "matrix-ascii" => Ok(Charset::MATRIX.union(Charset::PUNCTUATION)),
        "none" => Ok(Charset::NONE),
        _ => Err(RainError::invalid(format!(
            "unsupported charset: {} (see --list-charsets)",
            spec
        ))),
    }
}

fn push_range(out: &mut Vec<char>, start: u32, end: u32) {
    for v in start..=end {
        if let Some(ch) = char::from_u32(v) {
            out.push(ch);
        }
    }
}

pub fn build_chars(charset: Charset, user_ranges: &[(char, char)]) -> Vec<char> {
    let mut out: Vec<char> = Vec::new();

    if charset.contains(Charset::KATAKANA) {
        // half-width forms: ｦ through ﾝ
        push_range(&mut out, 0xFF66, 0xFF9D);
    }
    if charset.contains(Charset::DIGITS) {
        push_range(&mut out, 0x30, 0x39);
    }
    if charset.contains(Charset::UPPERCASE) {
        push_range(&mut out, 0x41, 0x5A);
    }
    if charset.contains(Charset::SYMBOLS) {
        out.extend(RAIN_SYMBOLS.chars());
    }
    if charset.contains(Charset::PUNCTUATION) {
        out.extend(".:=*+-<>|".chars());
    }
    if charset.contains(Charset::BINARY) {
        push_range(&mut out, 0x30, 0x31);
    }

    for &(a, b) in user_ranges {
        push_range(&mut out, a as u32, b as u32);
    }

    if out.is_empty() {
        out.push('0');
        out.push('1');
    }

    out
}

/// Fixed palette of rain glyphs with a uniform picker.
#[derive(Clone, Debug)]
pub struct GlyphSource {
    chars: Vec<char>,
    pick: Uniform<usize>,
}

impl GlyphSource {
    pub fn new(mut chars: Vec<char>) -> Result<Self> {
        if chars.is_empty() {
            chars = vec!['0', '1'];
        }
        let pick = Uniform::new(0, chars.len())?;
        Ok(Self { chars, pick })
    }

    pub fn next_glyph<R: Rng + ?Sized>(&self, rng: &mut R) -> char {
        self.chars[self.pick.sample(rng)]
    }

    #[cfg(test)]
    pub fn contains(&self, ch: char) -> bool {
        self.chars.contains(&ch)
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }
}

pub fn print_list_charsets() {
    println!("AVAILABLE CHARSET PRESETS:");
    println!();
    println!("VALUE        DESCRIPTION");
    println!("auto         matrix on UTF-8 locales, ascii otherwise");
    println!("matrix       Katakana + digits + uppercase + rain symbols");
    println!("matrix-ascii matrix + ASCII symbols");
    println!("katakana     Half-width katakana only");
    println!("ascii        Digits + uppercase + ASCII symbols");
    println!("digits       Digits only (aliases: dec, decimal)");
    println!("binary       0 and 1 (aliases: bin, 01)");
    println!("none         Only the ranges given with --chars");
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn parse_user_hex_chars_parses_hex_codepoints() {
        let v = parse_user_hex_chars("30,31").unwrap();
        assert_eq!(v, vec!['0', '1']);
    }

    #[test]
    fn parse_user_hex_chars_rejects_garbage() {
        let err = parse_user_hex_chars("30,zz").unwrap_err();
        assert!(err.to_string().contains("index 2"));
    }

    #[test]
    fn charset_auto_selects_ascii_safe_when_non_utf() {
        assert_eq!(charset_from_str("auto", true).unwrap(), Charset::ASCII_SAFE);
        assert_eq!(charset_from_str("AUTO", false).unwrap(), Charset::MATRIX);
    }

    #[test]
    fn matrix_palette_has_katakana_digits_letters_and_symbols() {
        let out = build_chars(Charset::MATRIX, &[]);
        for ch in ['ﾊ', 'ｦ', '0', '9', 'A', 'Z', '¦', '╌'] {
            assert!(out.contains(&ch), "missing {ch}");
        }
        assert!(!out.contains(&'a'));
    }

    #[test]
    fn ascii_palette_is_ascii_only() {
        let out = build_chars(Charset::ASCII_SAFE, &[]);
        assert!(out.iter().all(|c| c.is_ascii()));
    }

    #[test]
    fn every_listed_preset_parses() {
        let cases = [
            ("matrix", Charset::MATRIX),
            ("matrix-ascii", Charset::MATRIX.union(Charset::PUNCTUATION)),
            ("katakana", Charset::KATAKANA),
            ("ascii", Charset::ASCII_SAFE),
            ("digits", Charset::DIGITS),
            ("dec", Charset::DIGITS),
            ("binary", Charset::BINARY),
            ("01", Charset::BINARY),
            ("none", Charset::NONE),
            (" Matrix ", Charset::MATRIX),
        ];
        for (name, want) in cases {
            assert_eq!(charset_from_str(name, false).unwrap(), want, "{name}");
        }
    }

    #[test]
    fn double_width_presets_are_rejected() {
        let err = charset_from_str("kanji", false).unwrap_err();
        assert_eq!(err.to_string(), "unsupported charset: kanji (see --list-charsets)");
    }

    #[test]
    fn empty_selection_falls_back_to_binary() {
        let out = build_chars(Charset::NONE, &[]);
        assert_eq!(out, vec!['0', '1']);
    }

    #[test]
    fn next_glyph_draws_from_palette() {
        let glyphs = GlyphSource::new(build_chars(Charset::KATAKANA, &[])).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let ch = glyphs.next_glyph(&mut rng);
            assert!(glyphs.contains(ch));
        }
    }
}
