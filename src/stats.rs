//! Breed census tracking for the simulation.

use crate::arena::{Arena, ArenaError};
use crate::dominance::Breed;
use serde::{Deserialize, Serialize};

/// Population of every breed at a given generation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Census {
    /// Generation the census was taken at
    pub generation: u64,
    /// Cells per breed, indexed by breed
    pub populations: Vec<usize>,
}

impl Census {
    /// Take a census of the arena's current terrain
    pub fn take(arena: &Arena) -> Result<Self, ArenaError> {
        let populations = arena.census()?;
        Ok(Self {
            generation: arena.generation(),
            populations,
        })
    }

    /// Build a census from a row-major grid
    pub fn from_cells(generation: u64, num_breeds: u8, cells: &[Vec<Breed>]) -> Self {
        let mut populations = vec![0; num_breeds as usize];
        for &breed in cells.iter().flatten() {
            if let Some(count) = populations.get_mut(breed as usize) {
                *count += 1;
            }
        }
        Self {
            generation,
            populations,
        }
    }

    /// Total number of cells
    pub fn total(&self) -> usize {
        self.populations.iter().sum()
    }

    /// Breeds still present
    pub fn surviving(&self) -> usize {
        self.populations.iter().filter(|&&c| c > 0).count()
    }

    /// Most populous breed and its count
    pub fn dominant(&self) -> Option<(Breed, usize)> {
        self.populations
            .iter()
            .enumerate()
            .max_by_key(|&(_, &count)| count)
            .filter(|&(_, &count)| count > 0)
            .map(|(breed, &count)| (breed as Breed, count))
    }

    /// Shannon diversity index over breed shares
    pub fn diversity(&self) -> f64 {
        let total = self.total() as f64;
        if total == 0.0 {
            return 0.0;
        }
        self.populations
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let p = c as f64 / total;
                -p * p.ln()
            })
            .sum()
    }

    /// Format the census as a one-line summary
    pub fn summary(&self) -> String {
        let total = self.total().max(1) as f64;
        let shares: Vec<String> = self
            .populations
            .iter()
            .enumerate()
            .map(|(breed, &count)| format!("{}:{:5.1}%", breed, 100.0 * count as f64 / total))
            .collect();
        format!(
            "Gen:{:12} | Breeds:{:2} | H:{:.3} | {}",
            self.generation,
            self.surviving(),
            self.diversity(),
            shares.join(" ")
        )
    }
}

/// Census records taken at a fixed generation interval
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsHistory {
    /// All recorded censuses
    pub snapshots: Vec<Census>,
    /// Recording interval in generations
    pub interval: u64,
    #[serde(skip)]
    next_due: u64,
}

impl StatsHistory {
    /// Create new history with recording interval
    pub fn new(interval: u64) -> Self {
        Self {
            snapshots: Vec::new(),
            interval: interval.max(1),
            next_due: 0,
        }
    }

    /// Whether a census is due at this generation
    pub fn is_due(&self, generation: u64) -> bool {
        generation >= self.next_due
    }

    /// Record a census
    pub fn record(&mut self, census: Census) {
        self.next_due = (census.generation / self.interval + 1) * self.interval;
        self.snapshots.push(census);
    }

    /// Forget all records, e.g. after the arena is reset
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.next_due = 0;
    }

    /// Number of surviving breeds over time
    pub fn surviving_series(&self) -> Vec<(u64, usize)> {
        self.snapshots
            .iter()
            .map(|c| (c.generation, c.surviving()))
            .collect()
    }

    /// Population of one breed over time
    pub fn breed_series(&self, breed: Breed) -> Vec<(u64, usize)> {
        self.snapshots
            .iter()
            .map(|c| {
                let count = c.populations.get(breed as usize).copied().unwrap_or(0);
                (c.generation, count)
            })
            .collect()
    }

    /// Save history to a JSON file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
    }

    /// Load history from a JSON file
    pub fn load(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaConfig;

    #[test]
    fn test_census_from_cells() {
        let census = Census::from_cells(5, 3, &[vec![0, 0], vec![2, 0]]);

        assert_eq!(census.populations, vec![3, 0, 1]);
        assert_eq!(census.total(), 4);
        assert_eq!(census.surviving(), 2);
        assert_eq!(census.dominant(), Some((0, 3)));
    }

    #[test]
    fn test_diversity() {
        let mono = Census {
            generation: 0,
            populations: vec![9, 0, 0],
        };
        assert_eq!(mono.diversity(), 0.0);

        let even = Census {
            generation: 0,
            populations: vec![10, 10],
        };
        assert!((even.diversity() - std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn test_census_take() {
        let arena = Arena::new(ArenaConfig {
            num_breeds: 4,
            arena_size: 10,
            seed: Some(1),
        })
        .unwrap();
        assert!(Census::take(&arena).is_err());

        arena.init();
        let census = Census::take(&arena).unwrap();
        assert_eq!(census.generation, 0);
        assert_eq!(census.total(), 100);
        assert!(census.summary().contains("Breeds:"));
    }

    #[test]
    fn test_stats_history() {
        let mut history = StatsHistory::new(10);

        for i in 0..5u64 {
            let census = Census {
                generation: i * 10,
                populations: vec![(i + 1) as usize * 100, 50],
            };
            assert!(history.is_due(census.generation));
            history.record(census);
            assert!(!history.is_due(i * 10 + 9));
        }

        let series = history.breed_series(0);
        assert_eq!(series.len(), 5);
        assert_eq!(series[0], (0, 100));
        assert_eq!(series[4], (40, 500));
        assert_eq!(history.surviving_series()[2], (20, 2));

        history.clear();
        assert!(history.snapshots.is_empty());
        assert!(history.is_due(0));
    }

    #[test]
    fn test_history_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let path = path.to_str().unwrap();

        let mut history = StatsHistory::new(100);
        history.record(Census {
            generation: 0,
            populations: vec![1, 2, 3],
        });
        history.save(path).unwrap();

        let loaded = StatsHistory::load(path).unwrap();
        assert_eq!(loaded.snapshots, history.snapshots);
        assert_eq!(loaded.interval, 100);
    }
}
