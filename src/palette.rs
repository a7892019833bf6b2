// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::runtime::ColorMode;

/// Brightness tier of a rendered glyph. Ordered from dimmest to brightest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Faint,
    Dark,
    Mid,
    Bright,
    Glow,
    Head,
}

impl Tier {
    pub const ALL: [Tier; 6] = [
        Tier::Faint,
        Tier::Dark,
        Tier::Mid,
        Tier::Bright,
        Tier::Glow,
        Tier::Head,
    ];

    /// Tier of a trail entry `distance` rows behind the newest one.
    pub fn from_distance(distance: usize) -> Tier {
        match distance {
            0 => Tier::Head,
            1 => Tier::Glow,
            2..=3 => Tier::Bright,
            4..=8 => Tier::Mid,
            9..=13 => Tier::Dark,
            _ => Tier::Faint,
        }
    }

    fn rgb(self) -> (u8, u8, u8) {
        match self {
            Tier::Head => (235, 255, 235),
            Tier::Glow => (120, 255, 120),
            Tier::Bright => (0, 255, 70),
            Tier::Mid => (0, 200, 50),
            Tier::Dark => (0, 135, 35),
            Tier::Faint => (0, 85, 20),
        }
    }

    fn bold(self) -> bool {
        matches!(self, Tier::Head | Tier::Glow)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Style {
    pub fg: Option<Color>,
    pub bold: bool,
}

#[derive(Clone, Debug)]
pub struct Palette {
    styles: [Style; 6],
}

impl Palette {
    pub fn style(&self, tier: Tier) -> Style {
        self.styles[tier as usize]
    }
}

fn dist2(r0: u8, g0: u8, b0: u8, r1: u8, g1: u8, b1: u8) -> i32 {
    let dr = (r0 as i32) - (r1 as i32);
    let dg = (g0 as i32) - (g1 as i32);
    let db = (b0 as i32) - (b1 as i32);
    (dr * dr) + (dg * dg) + (db * db)
}

fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let r6 = ((r as u16 * 5) + 127) / 255;
    let g6 = ((g as u16 * 5) + 127) / 255;
    let b6 = ((b as u16 * 5) + 127) / 255;

    let cr = CUBE_LEVELS[r6 as usize];
    let cg = CUBE_LEVELS[g6 as usize];
    let cb = CUBE_LEVELS[b6 as usize];
    let cube_idx = 16 + (36 * r6 as u8) + (6 * g6 as u8) + (b6 as u8);
    let cube_dist = dist2(r, g, b, cr, cg, cb);

    let avg = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    let gray_idx = if avg < 8 {
        16
    } else if avg > 238 {
        231
    } else {
        232 + ((avg - 8) / 10)
    };
    let (gr, gg, gb) = if gray_idx == 16 {
        (0, 0, 0)
    } else if gray_idx == 231 {
        (255, 255, 255)
    } else {
        let v = 8 + 10 * (gray_idx - 232);
        (v, v, v)
    };
    let gray_dist = dist2(r, g, b, gr, gg, gb);

    if gray_dist < cube_dist {
        gray_idx
    } else {
        cube_idx
    }
}

fn rgb_to_color16(r: u8, g: u8, b: u8) -> Color {
    const TABLE: [(Color, (u8, u8, u8)); 8] = [
        (Color::Black, (0, 0, 0)),
        (Color::DarkGrey, (128, 128, 128)),
        (Color::Grey, (192, 192, 192)),
        (Color::White, (255, 255, 255)),
        (Color::DarkGreen, (0, 128, 0)),
        (Color::Green, (0, 255, 0)),
        (Color::DarkCyan, (0, 128, 128)),
        (Color::Cyan, (0, 255, 255)),
    ];

    let mut best = Color::White;
    let mut best_d = i32::MAX;
    for (c, (cr, cg, cb)) in TABLE {
        let d = dist2(r, g, b, cr, cg, cb);
        if d < best_d {
            best_d = d;
            best = c;
        }
    }
    best
}

fn tier_color(mode: ColorMode, tier: Tier) -> Option<Color> {
    let (r, g, b) = tier.rgb();
    match mode {
        ColorMode::Mono => None,
        ColorMode::TrueColor => Some(Color::Rgb { r, g, b }),
        ColorMode::Color256 => Some(Color::AnsiValue(rgb_to_ansi256(r, g, b))),
        ColorMode::Color16 => Some(rgb_to_color16(r, g, b)),
    }
}

pub fn build_palette(mode: ColorMode) -> Palette {
    let styles = Tier::ALL.map(|tier| Style {
        fg: tier_color(mode, tier),
        bold: tier.bold(),
    });
    Palette { styles }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_zero_is_head_and_one_is_glow() {
        assert_eq!(Tier::from_distance(0), Tier::Head);
        assert_eq!(Tier::from_distance(1), Tier::Glow);
        assert_eq!(Tier::from_distance(3), Tier::Bright);
        assert_eq!(Tier::from_distance(8), Tier::Mid);
        assert_eq!(Tier::from_distance(13), Tier::Dark);
        assert_eq!(Tier::from_distance(14), Tier::Faint);
        assert_eq!(Tier::from_distance(500), Tier::Faint);
    }

    #[test]
    fn tier_never_brightens_with_distance() {
        for d in 0..64 {
            assert!(Tier::from_distance(d) >= Tier::from_distance(d + 1));
        }
    }

    #[test]
    fn head_and_glow_are_bold() {
        let p = build_palette(ColorMode::Color256);
        assert!(p.style(Tier::Head).bold);
        assert!(p.style(Tier::Glow).bold);
        assert!(!p.style(Tier::Bright).bold);
        assert!(!p.style(Tier::Faint).bold);
    }

    #[test]
    fn ansi256_tiers_are_distinct() {
        let p = build_palette(ColorMode::Color256);
        let mut seen = Vec::new();
        for tier in Tier::ALL {
            let fg = p.style(tier).fg.unwrap();
            assert!(!seen.contains(&fg), "{tier:?} shares {fg:?}");
            seen.push(fg);
        }
    }

    #[test]
    fn color16_maps_head_to_white_and_tail_to_dark_green() {
        let p = build_palette(ColorMode::Color16);
        assert_eq!(p.style(Tier::Head).fg, Some(Color::White));
        assert_eq!(p.style(Tier::Faint).fg, Some(Color::DarkGreen));
    }

    #[test]
    fn mono_has_no_foreground() {
        let p = build_palette(ColorMode::Mono);
        assert!(Tier::ALL.iter().all(|&t| p.style(t).fg.is_none()));
    }

    #[test]
    fn rgb_to_ansi256_picks_cube_white_for_white() {
        assert_eq!(rgb_to_ansi256(255, 255, 255), 231);
        assert_eq!(rgb_to_ansi256(0, 0, 0), 16);
    }
}
