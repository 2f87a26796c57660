//! Square toroidal grid of breeds.

use crate::arena::ArenaError;
use crate::dominance::Breed;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fully populated square grid holding one breed per cell.
///
/// Rows and columns wrap around, so every cell has exactly four orthogonal
/// neighbours. A per-breed population count is kept in step with the cells
/// so that absorption can be answered without a scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TerrainRows")]
pub struct Terrain {
    size: usize,
    num_breeds: u8,
    /// cells[row][col]
    cells: Vec<Vec<Breed>>,
    /// populations[breed] = number of cells holding that breed
    populations: Vec<usize>,
}

/// Serialized form of a terrain. Size and populations are derived from the
/// rows on load, so a stored terrain always passes [`Terrain::from_rows`].
#[derive(Deserialize)]
struct TerrainRows {
    num_breeds: u8,
    cells: Vec<Vec<Breed>>,
}

impl TryFrom<TerrainRows> for Terrain {
    type Error = ArenaError;

    fn try_from(raw: TerrainRows) -> Result<Self, Self::Error> {
        Terrain::from_rows(raw.num_breeds, raw.cells)
    }
}

impl Terrain {
    /// Fill every cell independently with a breed drawn uniformly from
    /// `[0, num_breeds)`. `num_breeds` must be non-zero, which the arena
    /// config guarantees.
    pub(crate) fn random<R: Rng + ?Sized>(num_breeds: u8, size: usize, rng: &mut R) -> Self {
        debug_assert!(num_breeds > 0, "terrain needs at least one breed");
        let mut populations = vec![0; num_breeds as usize];
        let cells: Vec<Vec<Breed>> = (0..size)
            .map(|_| {
                (0..size)
                    .map(|_| {
                        let breed = rng.gen_range(0..num_breeds);
                        populations[breed as usize] += 1;
                        breed
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        Self {
            size,
            num_breeds,
            cells,
            populations,
        }
    }

    /// A monoculture of `breed`.
    pub fn filled(num_breeds: u8, size: usize, breed: Breed) -> Result<Self, ArenaError> {
        if breed >= num_breeds {
            return Err(ArenaError::InvalidBreed { breed, num_breeds });
        }
        let mut populations = vec![0; num_breeds as usize];
        populations[breed as usize] = size * size;

        Ok(Self {
            size,
            num_breeds,
            cells: vec![vec![breed; size]; size],
            populations,
        })
    }

    /// Build a terrain from explicit rows, which must form a non-empty square
    /// of valid breed indices.
    pub fn from_rows(num_breeds: u8, rows: Vec<Vec<Breed>>) -> Result<Self, ArenaError> {
        let size = rows.len();
        if size == 0 {
            return Err(ArenaError::InvalidConfig("terrain must have at least one row"));
        }
        if let Some(bad) = rows.iter().find(|row| row.len() != size) {
            return Err(ArenaError::ShapeMismatch {
                expected: size,
                rows: size,
                cols: bad.len(),
            });
        }

        let mut populations = vec![0; num_breeds as usize];
        for &breed in rows.iter().flatten() {
            if breed >= num_breeds {
                return Err(ArenaError::InvalidBreed { breed, num_breeds });
            }
            populations[breed as usize] += 1;
        }

        Ok(Self {
            size,
            num_breeds,
            cells: rows,
            populations,
        })
    }

    /// Side length of the grid
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn num_breeds(&self) -> u8 {
        self.num_breeds
    }

    /// Breed at a cell
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Breed {
        self.cells[row][col]
    }

    /// Overwrite a cell, returning the breed it held before.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, breed: Breed) -> Breed {
        debug_assert!(breed < self.num_breeds, "breed {breed} out of range");
        let previous = std::mem::replace(&mut self.cells[row][col], breed);
        if previous != breed {
            self.populations[previous as usize] -= 1;
            self.populations[breed as usize] += 1;
        }
        previous
    }

    /// The four von Neumann neighbours of a cell under wrap-around
    /// addressing: up, down, left, right.
    #[inline]
    pub fn neighbors_of(&self, row: usize, col: usize) -> [(usize, usize); 4] {
        let n = self.size;
        [
            ((row + n - 1) % n, col),
            ((row + 1) % n, col),
            (row, (col + n - 1) % n),
            (row, (col + 1) % n),
        ]
    }

    /// Cells held by each breed, indexed by breed
    #[inline]
    pub fn populations(&self) -> &[usize] {
        &self.populations
    }

    /// Number of breeds with at least one cell
    pub fn distinct_breeds(&self) -> usize {
        self.populations.iter().filter(|&&count| count > 0).count()
    }

    /// True when a single breed holds every cell.
    #[inline]
    pub fn is_uniform(&self) -> bool {
        self.distinct_breeds() == 1
    }

    /// Row-major view of the cells
    pub fn rows(&self) -> &[Vec<Breed>] {
        &self.cells
    }

    /// Copy every cell into `dest`, which must be `size` rows of `size`
    /// cells each.
    pub fn copy_into(&self, dest: &mut [Vec<Breed>]) -> Result<(), ArenaError> {
        if dest.len() != self.size {
            return Err(ArenaError::ShapeMismatch {
                expected: self.size,
                rows: dest.len(),
                cols: dest.first().map_or(0, Vec::len),
            });
        }
        if let Some(bad) = dest.iter().find(|row| row.len() != self.size) {
            return Err(ArenaError::ShapeMismatch {
                expected: self.size,
                rows: dest.len(),
                cols: bad.len(),
            });
        }

        for (target, source) in dest.iter_mut().zip(&self.cells) {
            target.copy_from_slice(source);
        }
        Ok(())
    }

    /// Recompute populations from the cells by a full scan.
    pub fn recount(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_breeds as usize];
        for &breed in self.cells.iter().flatten() {
            counts[breed as usize] += 1;
        }
        counts
    }

    /// Allocate a zeroed buffer shaped for [`Terrain::copy_into`].
    pub fn buffer(size: usize) -> Vec<Vec<Breed>> {
        vec![vec![0; size]; size]
    }
}
