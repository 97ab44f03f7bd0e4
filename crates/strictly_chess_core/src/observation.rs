//! Board → fixed-shape observation tensor.

use crate::rules::RulesEngine;
use shakmaty::{Color, Piece, Role, Square};
use tracing::instrument;

/// Number of (piece type × color) channels.
pub const CHANNELS: usize = 12;

/// 8×8×12 one-hot piece planes, indexed `[rank][file][channel]`.
///
/// Channels 0–5 hold white pawn, knight, bishop, rook, queen and king;
/// channels 6–11 the same roles for black.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    planes: [[[f32; CHANNELS]; 8]; 8],
}

impl Observation {
    /// All-zero observation (empty board).
    pub fn empty() -> Self {
        Self {
            planes: [[[0.0; CHANNELS]; 8]; 8],
        }
    }

    /// Value at `(rank, file, channel)`. Out-of-range coordinates read as 0.
    pub fn get(&self, rank: usize, file: usize, channel: usize) -> f32 {
        self.planes
            .get(rank)
            .and_then(|r| r.get(file))
            .and_then(|f| f.get(channel))
            .copied()
            .unwrap_or(0.0)
    }

    /// The channel vector of one square.
    pub fn square(&self, square: Square) -> &[f32; CHANNELS] {
        &self.planes[square.rank() as usize][square.file() as usize]
    }

    /// Row-major flat view, rank then file then channel.
    pub fn to_flat(&self) -> Vec<f32> {
        self.planes
            .iter()
            .flat_map(|rank| rank.iter())
            .flat_map(|file| file.iter().copied())
            .collect()
    }

    /// Count of set entries across the whole tensor.
    pub fn occupied(&self) -> usize {
        self.to_flat().iter().filter(|v| **v != 0.0).count()
    }

    /// Stable 64-bit FNV-1a fingerprint of the tensor contents.
    ///
    /// Used as a lookup key that must survive process restarts, so it does
    /// not go through `std::hash`.
    pub fn fingerprint(&self) -> u64 {
        const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0100_0000_01b3;
        self.to_flat().iter().fold(OFFSET, |hash, v| {
            let byte = if *v != 0.0 { 1u8 } else { 0u8 };
            (hash ^ u64::from(byte)).wrapping_mul(PRIME)
        })
    }
}

impl Default for Observation {
    fn default() -> Self {
        Self::empty()
    }
}

/// Channel index for a piece.
pub fn channel(piece: Piece) -> usize {
    let role = match piece.role {
        Role::Pawn => 0,
        Role::Knight => 1,
        Role::Bishop => 2,
        Role::Rook => 3,
        Role::Queen => 4,
        Role::King => 5,
    };
    match piece.color {
        Color::White => role,
        Color::Black => role + 6,
    }
}

/// Encodes the live position of `rules` as an observation.
#[instrument(skip(rules))]
pub fn encode<R: RulesEngine + ?Sized>(rules: &R) -> Observation {
    let mut obs = Observation::empty();
    for square in Square::ALL {
        if let Some(piece) = rules.piece_at(square) {
            obs.planes[square.rank() as usize][square.file() as usize][channel(piece)] = 1.0;
        }
    }
    obs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ShakmatyRules;

    #[test]
    fn test_start_position_has_32_pieces() {
        let obs = encode(&ShakmatyRules::new());
        assert_eq!(obs.occupied(), 32);
        assert_eq!(obs.to_flat().len(), 8 * 8 * CHANNELS);
    }

    #[test]
    fn test_known_squares() {
        let obs = encode(&ShakmatyRules::new());
        // e1 white king, d8 black queen, a2 white pawn
        assert_eq!(obs.get(0, 4, 5), 1.0);
        assert_eq!(obs.get(7, 3, 10), 1.0);
        assert_eq!(obs.get(1, 0, 0), 1.0);
        assert_eq!(obs.get(4, 4, 0), 0.0);
        assert_eq!(obs.get(9, 9, 99), 0.0);
    }

    #[test]
    fn test_at_most_one_channel_per_square() {
        let obs = encode(&ShakmatyRules::new());
        for square in Square::ALL {
            let set = obs.square(square).iter().filter(|v| **v != 0.0).count();
            assert!(set <= 1, "square {square} has {set} channels set");
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let rules = ShakmatyRules::new();
        let a = encode(&rules);
        let b = encode(&rules);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_changes_with_position() {
        let mut rules = ShakmatyRules::new();
        let before = encode(&rules).fingerprint();
        let mv = rules.parse_move("e2e4").expect("legal");
        rules.apply(&mv).expect("applies");
        assert_ne!(before, encode(&rules).fingerprint());
    }
}
