// Copyright (c) 2026 rezky_nightky

use std::collections::VecDeque;

use rand::{
    distr::{Distribution, Uniform},
    Rng,
};

use crate::charset::GlyphSource;
use crate::error::Result;

const SPEED_LOW: f32 = 0.2;
const SPEED_HIGH: f32 = 1.0;
const LENGTH_LOW: u16 = 8;
const LENGTH_HIGH: u16 = 25;
const RESPAWN_HIGHEST: i32 = -30;
const RESPAWN_LOWEST: i32 = -5;
const TRAIL_CAPACITY: usize = 35;
const FLICKER_CHANCE: f32 = 0.03;
const FLICKER_GUARD: usize = 2;

/// Distributions shared by every droplet of a field.
#[derive(Clone, Debug)]
pub struct DropletParams {
    speed: Uniform<f32>,
    length: Uniform<u16>,
    respawn_row: Uniform<i32>,
    pub capacity: usize,
    pub flicker_chance: f32,
    pub flicker_guard: usize,
}

impl DropletParams {
    /// `speed_scale` multiplies the base range of 0.2..=1.0 rows per tick.
    pub fn new(speed_scale: f32) -> Result<Self> {
        Ok(Self {
            speed: Uniform::new_inclusive(SPEED_LOW * speed_scale, SPEED_HIGH * speed_scale)?,
            length: Uniform::new_inclusive(LENGTH_LOW, LENGTH_HIGH)?,
            respawn_row: Uniform::new_inclusive(RESPAWN_HIGHEST, RESPAWN_LOWEST)?,
            capacity: TRAIL_CAPACITY,
            flicker_chance: FLICKER_CHANCE,
            flicker_guard: FLICKER_GUARD,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrailGlyph {
    pub glyph: char,
    pub row: i32,
}

/// One falling stream, bound to a single column for its whole life.
#[derive(Clone, Debug)]
pub struct Droplet {
    column: u16,
    head_row: i32,
    fall_speed: f32,
    trail_length: u16,
    trail: VecDeque<TrailGlyph>,
    accumulator: f32,
}

impl Droplet {
    /// Starts above the visible area, somewhere within one field height.
    pub fn spawn<R: Rng + ?Sized>(
        column: u16,
        field_height: u16,
        params: &DropletParams,
        rng: &mut R,
    ) -> Self {
        let span = i32::from(field_height.max(1));
        Self {
            column,
            head_row: rng.random_range(-span..=-1),
            fall_speed: params.speed.sample(rng),
            trail_length: params.length.sample(rng),
            trail: VecDeque::with_capacity(params.capacity),
            accumulator: 0.0,
        }
    }

    #[cfg(test)]
    pub fn with_state(column: u16, head_row: i32, fall_speed: f32, trail_length: u16) -> Self {
        Self {
            column,
            head_row,
            fall_speed,
            trail_length,
            trail: VecDeque::new(),
            accumulator: 0.0,
        }
    }

    pub fn column(&self) -> u16 {
        self.column
    }

    #[allow(dead_code)]
    pub fn head_row(&self) -> i32 {
        self.head_row
    }

    #[allow(dead_code)]
    pub fn fall_speed(&self) -> f32 {
        self.fall_speed
    }

    #[allow(dead_code)]
    pub fn trail_length(&self) -> u16 {
        self.trail_length
    }

    pub fn trail(&self) -> &VecDeque<TrailGlyph> {
        &self.trail
    }

    #[allow(dead_code)]
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Moves the head down by whole rows once enough time has accumulated.
    ///
    /// Returns `true` when the droplet left the field and was respawned above it.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        dt_units: f32,
        field_height: u16,
        glyphs: &GlyphSource,
        params: &DropletParams,
        rng: &mut R,
    ) -> bool {
        if dt_units.is_finite() && dt_units > 0.0 {
            self.accumulator += self.fall_speed * dt_units;
        }

        let mut stepped = false;
        while self.accumulator >= 1.0 {
            self.accumulator -= 1.0;
            self.head_row += 1;
            if self.trail.len() >= params.capacity.max(1) {
                self.trail.pop_front();
            }
            self.trail.push_back(TrailGlyph {
                glyph: glyphs.next_glyph(rng),
                row: self.head_row,
            });
            stepped = true;
        }

        if stepped && rng.random::<f32>() < params.flicker_chance {
            self.flicker(glyphs, params, rng);
        }

        if self.head_row > i32::from(field_height) + i32::from(self.trail_length) {
            self.respawn(params, rng);
            return true;
        }
        false
    }

    fn flicker<R: Rng + ?Sized>(&mut self, glyphs: &GlyphSource, params: &DropletParams, rng: &mut R) {
        let eligible = self.trail.len().saturating_sub(params.flicker_guard);
        if eligible == 0 {
            return;
        }
        let idx = rng.random_range(0..eligible);
        if let Some(entry) = self.trail.get_mut(idx) {
            entry.glyph = glyphs.next_glyph(rng);
        }
    }

    fn respawn<R: Rng + ?Sized>(&mut self, params: &DropletParams, rng: &mut R) {
        self.head_row = params.respawn_row.sample(rng);
        self.fall_speed = params.speed.sample(rng);
        self.trail_length = params.length.sample(rng);
        self.trail.clear();
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::charset::{build_chars, Charset};

    fn glyphs() -> GlyphSource {
        GlyphSource::new(build_chars(Charset::MATRIX, &[])).unwrap()
    }

    fn params() -> DropletParams {
        DropletParams::new(1.0).unwrap()
    }

    #[test]
    fn spawn_starts_above_the_field_with_empty_trail() {
        let p = params();
        let mut rng = StdRng::seed_from_u64(1);
        for col in 0..100 {
            let d = Droplet::spawn(col, 24, &p, &mut rng);
            assert_eq!(d.column(), col);
            assert!((-24..=-1).contains(&d.head_row()));
            assert!((0.2..=1.0).contains(&d.fall_speed()));
            assert!((8..=25).contains(&d.trail_length()));
            assert!(d.trail().is_empty());
        }
    }

    #[test]
    fn three_unit_steps_from_minus_three_reach_row_zero() {
        let (g, p) = (glyphs(), params());
        let mut rng = StdRng::seed_from_u64(2);
        let mut d = Droplet::with_state(0, -3, 1.0, 3);
        for _ in 0..3 {
            assert!(!d.advance(1.0, 5, &g, &p, &mut rng));
        }
        assert_eq!(d.head_row(), 0);
        let rows: Vec<i32> = d.trail().iter().map(|t| t.row).collect();
        assert_eq!(rows, vec![-2, -1, 0]);
    }

    #[test]
    fn fractional_speed_accumulates_before_moving() {
        let (g, p) = (glyphs(), params());
        let mut rng = StdRng::seed_from_u64(3);
        let mut d = Droplet::with_state(0, 0, 0.25, 10);
        for _ in 0..3 {
            d.advance(1.0, 20, &g, &p, &mut rng);
            assert_eq!(d.head_row(), 0);
        }
        d.advance(1.0, 20, &g, &p, &mut rng);
        assert_eq!(d.head_row(), 1);
        assert!(d.accumulator() < 1.0);
    }

    #[test]
    fn large_step_moves_several_rows_in_one_call() {
        let (g, p) = (glyphs(), params());
        let mut rng = StdRng::seed_from_u64(4);
        let mut d = Droplet::with_state(0, 0, 1.0, 10);
        d.advance(4.5, 40, &g, &p, &mut rng);
        assert_eq!(d.head_row(), 4);
        assert_eq!(d.trail().len(), 4);
        assert!((d.accumulator() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn non_finite_or_negative_time_is_ignored() {
        let (g, p) = (glyphs(), params());
        let mut rng = StdRng::seed_from_u64(5);
        let mut d = Droplet::with_state(0, 2, 1.0, 10);
        d.advance(f32::NAN, 20, &g, &p, &mut rng);
        d.advance(-3.0, 20, &g, &p, &mut rng);
        d.advance(f32::INFINITY, 20, &g, &p, &mut rng);
        assert_eq!(d.head_row(), 2);
        assert!(d.trail().is_empty());
    }

    #[test]
    fn leaving_the_field_respawns_in_place() {
        let (g, p) = (glyphs(), params());
        let mut rng = StdRng::seed_from_u64(6);
        let mut d = Droplet::with_state(7, 7, 1.0, 3);
        assert!(!d.advance(1.0, 5, &g, &p, &mut rng));
        assert_eq!(d.head_row(), 8);
        assert!(d.advance(1.0, 5, &g, &p, &mut rng));
        assert_eq!(d.column(), 7);
        assert!((-30..=-5).contains(&d.head_row()));
        assert!(d.trail().is_empty());
        assert_eq!(d.accumulator(), 0.0);
    }

    #[test]
    fn flicker_never_moves_rows_or_touches_newest_entries() {
        let g = glyphs();
        let mut p = params();
        p.flicker_chance = 1.0;
        let mut rng = StdRng::seed_from_u64(8);
        let mut d = Droplet::with_state(0, 0, 1.0, 30);
        for _ in 0..20 {
            let before: Vec<TrailGlyph> = d.trail().iter().copied().collect();
            d.advance(1.0, 100, &g, &p, &mut rng);
            let after: Vec<TrailGlyph> = d.trail().iter().copied().collect();
            for (old, new) in before.iter().zip(after.iter()) {
                assert_eq!(old.row, new.row);
            }
            let n = before.len();
            if n >= 1 {
                // the previous head is now second-newest and must be untouched
                assert_eq!(before[n - 1], after[n - 1]);
            }
        }
    }

    proptest! {
        #[test]
        fn trail_never_exceeds_capacity(
            seed in any::<u64>(),
            height in 1u16..80,
            steps in proptest::collection::vec(0.0f32..6.0, 1..200),
        ) {
            let (g, p) = (glyphs(), params());
            let mut rng = StdRng::seed_from_u64(seed);
            let mut d = Droplet::spawn(0, height, &p, &mut rng);
            for dt in steps {
                d.advance(dt, height, &g, &p, &mut rng);
                prop_assert!(d.trail().len() <= p.capacity);
                prop_assert!(d.accumulator() >= 0.0 && d.accumulator() < 1.0);
            }
        }

        #[test]
        fn head_falls_monotonically_until_reset(
            seed in any::<u64>(),
            height in 1u16..60,
            steps in proptest::collection::vec(0.0f32..4.0, 1..300),
        ) {
            let (g, p) = (glyphs(), params());
            let mut rng = StdRng::seed_from_u64(seed);
            let mut d = Droplet::spawn(3, height, &p, &mut rng);
            for dt in steps {
                let before = d.head_row();
                let respawned = d.advance(dt, height, &g, &p, &mut rng);
                if respawned {
                    prop_assert!(d.head_row() < 0);
                    prop_assert!(d.trail().is_empty());
                } else {
                    prop_assert!(d.head_row() >= before);
                    prop_assert!(d.head_row() <= i32::from(height) + i32::from(d.trail_length()));
                }
                prop_assert_eq!(d.column(), 3);
            }
        }

        #[test]
        fn trail_rows_are_consecutive_ending_at_head(
            seed in any::<u64>(),
            steps in proptest::collection::vec(0.0f32..3.0, 1..100),
        ) {
            let (g, p) = (glyphs(), params());
            let mut rng = StdRng::seed_from_u64(seed);
            let mut d = Droplet::spawn(0, 200, &p, &mut rng);
            for dt in steps {
                d.advance(dt, 200, &g, &p, &mut rng);
                if let Some(last) = d.trail().back() {
                    prop_assert_eq!(last.row, d.head_row());
                }
                for pair in d.trail().iter().collect::<Vec<_>>().windows(2) {
                    prop_assert_eq!(pair[0].row + 1, pair[1].row);
                }
            }
        }
    }
}
