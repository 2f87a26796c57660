//! Cyclic dominance rule between breeds.
//!
//! Breeds are arranged on a circle. A breed beats the breeds that follow it
//! within the nearer half of the cycle and loses to the rest, so with three
//! breeds this is plain rock-paper-scissors: `0` beats `1`, `1` beats `2`,
//! `2` beats `0`.

/// Index of a breed, in `[0, num_breeds)`.
pub type Breed = u8;

/// Returns `true` if `winner` beats `loser` in a cycle of `num_breeds`.
///
/// `winner` dominates `loser` when the forward distance
/// `(loser - winner) mod num_breeds` lies in `[1, num_breeds / 2]`. For an
/// even cycle the exact midpoint is reached from both sides; that pair is
/// settled by index, the higher breed winning.
///
/// Identical breeds never interact, so `winner == loser` is a caller error.
#[inline]
pub fn dominates(winner: Breed, loser: Breed, num_breeds: u8) -> bool {
    debug_assert!(num_breeds >= 2, "cycle needs at least two breeds");
    debug_assert!(winner < num_breeds && loser < num_breeds);
    debug_assert_ne!(winner, loser, "breed compared with itself");

    let n = num_breeds as u16;
    let distance = (loser as u16 + n - winner as u16) % n;
    let half = n / 2;

    if n % 2 == 0 && distance == half {
        winner > loser
    } else {
        distance >= 1 && distance <= half
    }
}

/// Resolves an encounter between two distinct breeds, returning the survivor.
#[inline]
pub fn victor(a: Breed, b: Breed, num_breeds: u8) -> Breed {
    if dominates(a, b, num_breeds) {
        a
    } else {
        b
    }
}
