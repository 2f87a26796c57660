//! Snapshot structures for observers.
//!
//! An observer owns one reusable buffer shaped like the terrain and refreshes
//! it from the arena on its own cadence, independent of the driver thread.

use std::sync::Arc;

use crate::arena::{Arena, ArenaError};
use crate::config::ObserverConfig;
use crate::dominance::Breed;
use crate::palette::{Palette, Rgb};
use crate::stats::Census;
use crate::terrain::Terrain;

/// Copy of the terrain at one generation
#[derive(Clone, Debug, PartialEq)]
pub struct ArenaSnapshot {
    /// Generation the copy reflects
    pub generation: u64,
    /// Number of breeds in the arena
    pub num_breeds: u8,
    /// cells[row][col]
    pub cells: Vec<Vec<Breed>>,
}

impl ArenaSnapshot {
    /// Empty snapshot sized for the arena
    pub fn for_arena(arena: &Arena) -> Self {
        Self {
            generation: 0,
            num_breeds: arena.num_breeds(),
            cells: Terrain::buffer(arena.arena_size()),
        }
    }

    /// Create a snapshot from the current arena state
    pub fn from_arena(arena: &Arena) -> Result<Self, ArenaError> {
        let mut snapshot = Self::for_arena(arena);
        snapshot.refresh(arena)?;
        Ok(snapshot)
    }

    /// Overwrite this snapshot with the arena's current terrain, reusing the
    /// buffer.
    pub fn refresh(&mut self, arena: &Arena) -> Result<(), ArenaError> {
        self.generation = arena.copy_terrain(&mut self.cells)?;
        Ok(())
    }

    /// Grid dimension
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn census(&self) -> Census {
        Census::from_cells(self.generation, self.num_breeds, &self.cells)
    }

    /// Row-major pixel colours
    pub fn pixels(&self, palette: &Palette) -> Vec<Rgb> {
        self.cells
            .iter()
            .flatten()
            .map(|&breed| palette.color(breed))
            .collect()
    }

    /// One glyph per cell, one line per row
    pub fn to_text(&self, palette: &Palette) -> String {
        let size = self.size();
        let mut text = String::with_capacity(size * (size + 1));
        for row in &self.cells {
            text.extend(row.iter().map(|&breed| palette.glyph(breed)));
            text.push('\n');
        }
        text
    }
}

/// Periodic reader of an arena, mapping breeds to display colours
pub struct Observer {
    arena: Arc<Arena>,
    snapshot: ArenaSnapshot,
    palette: Palette,
    config: ObserverConfig,
}

impl Observer {
    pub fn new(arena: Arc<Arena>, config: ObserverConfig) -> Self {
        let snapshot = ArenaSnapshot::for_arena(&arena);
        let palette = Palette::new(arena.num_breeds());
        Self {
            arena,
            snapshot,
            palette,
            config,
        }
    }

    /// Copy the current terrain into the observer's buffer
    pub fn refresh(&mut self) -> Result<&ArenaSnapshot, ArenaError> {
        self.snapshot.refresh(&self.arena)?;
        Ok(&self.snapshot)
    }

    /// Last copied snapshot
    pub fn snapshot(&self) -> &ArenaSnapshot {
        &self.snapshot
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Generation counter text for the last snapshot
    pub fn generation_text(&self) -> String {
        self.config.format_generation(self.snapshot.generation)
    }

    /// Generation counter text followed by the terrain as glyphs
    pub fn render_text(&self) -> String {
        format!(
            "{}\n{}",
            self.generation_text(),
            self.snapshot.to_text(&self.palette)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaConfig;

    fn arena(arena_size: usize) -> Arc<Arena> {
        Arc::new(
            Arena::new(ArenaConfig {
                num_breeds: 3,
                arena_size,
                seed: Some(11),
            })
            .unwrap(),
        )
    }

    #[test]
    fn test_snapshot_matches_terrain() {
        let arena = arena(3);
        arena
            .replace_terrain(Terrain::from_rows(3, vec![vec![0, 1, 2], vec![2, 1, 0], vec![0, 0, 0]]).unwrap())
            .unwrap();

        let snapshot = ArenaSnapshot::from_arena(&arena).unwrap();
        assert_eq!(snapshot.generation, 0);
        assert_eq!(snapshot.cells[0], vec![0, 1, 2]);
        assert_eq!(snapshot.census().populations, vec![5, 2, 2]);

        let palette = Palette::new(3);
        assert_eq!(snapshot.pixels(&palette).len(), 9);
        assert_eq!(snapshot.to_text(&palette).lines().count(), 3);
    }

    #[test]
    fn test_observer_refresh_tracks_generation() {
        let arena = arena(8);
        let mut observer = Observer::new(Arc::clone(&arena), ObserverConfig::default());
        assert_eq!(observer.refresh().err(), Some(ArenaError::NotInitialized));

        arena.init();
        for _ in 0..25 {
            arena.advance().unwrap();
        }

        let generation = observer.refresh().unwrap().generation;
        assert_eq!(generation, 25);
        assert_eq!(observer.generation_text(), "Generation: 25");
        assert!(observer.render_text().starts_with("Generation: 25\n"));
        assert_eq!(observer.snapshot().census().total(), 64);
    }
}
