// Copyright (c) 2026 rezky_nightky

use rand::rngs::StdRng;
use tracing::debug;

use crate::charset::GlyphSource;
use crate::droplet::{Droplet, DropletParams};
use crate::palette::Tier;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibleCell {
    pub row: u16,
    pub column: u16,
    pub glyph: char,
    pub tier: Tier,
}

/// One droplet per column, rebuilt wholesale on resize.
pub struct DropField {
    width: u16,
    height: u16,
    droplets: Vec<Droplet>,
    glyphs: GlyphSource,
    params: DropletParams,
    rng: StdRng,
}

impl DropField {
    pub fn new(width: u16, height: u16, glyphs: GlyphSource, params: DropletParams, rng: StdRng) -> Self {
        let mut field = Self {
            width: width.max(1),
            height: height.max(1),
            droplets: Vec::new(),
            glyphs,
            params,
            rng,
        };
        field.populate();
        field
    }

    fn populate(&mut self) {
        let (height, params, rng) = (self.height, &self.params, &mut self.rng);
        self.droplets = (0..self.width)
            .map(|col| Droplet::spawn(col, height, params, rng))
            .collect();
    }

    #[allow(dead_code)]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[allow(dead_code)]
    pub fn height(&self) -> u16 {
        self.height
    }

    #[allow(dead_code)]
    pub fn droplets(&self) -> &[Droplet] {
        &self.droplets
    }

    #[cfg(test)]
    pub fn droplets_mut(&mut self) -> &mut [Droplet] {
        &mut self.droplets
    }

    pub fn update(&mut self, dt_units: f32) {
        let mut respawned = 0usize;
        for d in &mut self.droplets {
            if d.advance(dt_units, self.height, &self.glyphs, &self.params, &mut self.rng) {
                respawned += 1;
            }
        }
        if respawned > 0 {
            tracing::trace!(respawned, "droplets respawned");
        }
    }

    /// Every on-screen trail glyph, recomputed from droplet state on each call.
    pub fn visible_cells(&self) -> impl Iterator<Item = VisibleCell> + '_ {
        let (width, height) = (self.width, self.height);
        self.droplets
            .iter()
            .filter(move |d| d.column() < width)
            .flat_map(move |d| {
                let newest = d.trail().len().saturating_sub(1);
                d.trail()
                    .iter()
                    .enumerate()
                    .filter_map(move |(i, t)| {
                        let row = u16::try_from(t.row).ok().filter(|&r| r < height)?;
                        Some(VisibleCell {
                            row,
                            column: d.column(),
                            glyph: t.glyph,
                            tier: Tier::from_distance(newest - i),
                        })
                    })
            })
    }

    /// Respawns every column for the new size. Same size leaves droplets untouched.
    pub fn resize(&mut self, width: u16, height: u16) {
        let (width, height) = (width.max(1), height.max(1));
        if width == self.width && height == self.height {
            return;
        }
        debug!(
            old_width = self.width,
            old_height = self.height,
            width,
            height,
            "drop field resized"
        );
        self.width = width;
        self.height = height;
        self.populate();
    }
}
