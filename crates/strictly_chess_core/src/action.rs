//! Action space ↔ move templates.
//!
//! The agent speaks in action indices. [`ActionCodec`] is the static table
//! that turns an index into a [`MoveTemplate`] and back. The table is built
//! once against a reference position (the standard start by default) and
//! never changes afterwards, so an index keeps the same meaning for the life
//! of a trained policy.
//!
//! The filter is strict legality. Against the standard start that keeps the
//! twenty opening moves, so every later index outside them decodes to
//! [`Decoded::NoMove`] and the resolver picks the move instead. A looser
//! predicate, accepting any move from an occupied square, would index
//! thousands of templates and fill most of the action space.

use shakmaty::{Chess, File, Move, Position, Rank, Role, Square};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Cardinality of the action space the policy is trained against.
pub const ACTION_SPACE_SIZE: usize = 4672;

/// Promotion choices in enumeration order.
pub const PROMOTIONS: [Option<Role>; 5] = [
    None,
    Some(Role::Queen),
    Some(Role::Rook),
    Some(Role::Bishop),
    Some(Role::Knight),
];

/// A position-independent move: from-square, to-square, promotion.
///
/// Castling is written with the king's destination (`e1g1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveTemplate {
    /// Origin square.
    pub from: Square,
    /// Destination square.
    pub to: Square,
    /// Promotion role, if any.
    pub promotion: Option<Role>,
}

impl MoveTemplate {
    /// Creates a template.
    pub fn new(from: Square, to: Square, promotion: Option<Role>) -> Self {
        Self {
            from,
            to,
            promotion,
        }
    }

    /// Template of a concrete move. `None` for drops, which standard chess
    /// never produces.
    pub fn of(mv: &Move) -> Option<Self> {
        match mv {
            Move::Normal {
                from,
                to,
                promotion,
                ..
            } => Some(Self::new(*from, *to, *promotion)),
            Move::EnPassant { from, to } => Some(Self::new(*from, *to, None)),
            Move::Castle { king, rook } => {
                let file = if rook.file() > king.file() {
                    File::G
                } else {
                    File::C
                };
                Some(Self::new(
                    *king,
                    Square::from_coords(file, king.rank()),
                    None,
                ))
            }
            Move::Put { .. } => None,
        }
    }

    /// True if `mv` is this template.
    pub fn matches(&self, mv: &Move) -> bool {
        Self::of(mv).as_ref() == Some(self)
    }

    /// Reads UCI text such as `e2e4` or `e7e8q`.
    pub fn parse_uci(text: &str) -> Option<Self> {
        let text = text.trim();
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return None;
        }
        let from: Square = text[0..2].parse().ok()?;
        let to: Square = text[2..4].parse().ok()?;
        let promotion = match text[4..].chars().next() {
            None => None,
            Some(c) => Some(Role::from_char(c.to_ascii_lowercase())?),
        };
        Some(Self::new(from, to, promotion))
    }

    /// UCI text for this template.
    pub fn uci(&self) -> String {
        match self.promotion {
            Some(role) => format!("{}{}{}", self.from, self.to, role.char()),
            None => format!("{}{}", self.from, self.to),
        }
    }

    /// Legality predicate against the legal moves of a reference position,
    /// counted per template.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MalformedTemplate`] for a template no position
    /// could ever accept as written: a promotion to pawn or king, or a
    /// promotion whose destination is not a back rank. Returns
    /// [`CodecError::Ambiguous`] when the template matches more than one
    /// legal move.
    pub fn is_legal_in(&self, legal: &HashMap<MoveTemplate, usize>) -> Result<bool, CodecError> {
        if let Some(role) = self.promotion {
            let back_rank = matches!(self.to.rank(), Rank::First | Rank::Eighth);
            if matches!(role, Role::Pawn | Role::King) || !back_rank {
                return Err(CodecError::MalformedTemplate(self.uci()));
            }
        }
        match legal.get(self).copied().unwrap_or(0) {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(CodecError::Ambiguous(self.uci())),
        }
    }
}

impl std::fmt::Display for MoveTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uci())
    }
}

/// Result of decoding an action index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// The index names a template in the table.
    Move(MoveTemplate),
    /// The index is outside the table.
    NoMove,
}

impl Decoded {
    /// The template, if any.
    pub fn template(&self) -> Option<MoveTemplate> {
        match self {
            Decoded::Move(t) => Some(*t),
            Decoded::NoMove => None,
        }
    }
}

/// Construction-time failures of the action table.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum CodecError {
    /// A candidate template cannot be evaluated by the legality predicate.
    #[display("Malformed move template: {}", _0)]
    MalformedTemplate(#[error(not(source))] String),

    /// A template matches more than one legal move of the reference position.
    #[display("Move template {} matches several legal moves", _0)]
    Ambiguous(#[error(not(source))] String),

    /// More templates were accepted than the action space can index.
    #[display("Action table has {} entries, action space holds {}", _0, ACTION_SPACE_SIZE)]
    Overflow(#[error(not(source))] usize),
}

/// Bidirectional index ↔ template table.
#[derive(Debug, Clone)]
pub struct ActionCodec {
    templates: Vec<MoveTemplate>,
    indices: HashMap<MoveTemplate, usize>,
}

impl ActionCodec {
    /// Builds the table against the standard starting position.
    #[instrument]
    pub fn build() -> Result<Self, CodecError> {
        Self::build_against(&Chess::default())
    }

    /// Builds the table against `reference`.
    ///
    /// Phase one enumerates every candidate in from-major, to, promotion-minor
    /// order. Phase two keeps the candidates legal in `reference`.
    #[instrument(skip(reference))]
    pub fn build_against(reference: &Chess) -> Result<Self, CodecError> {
        let mut legal: HashMap<MoveTemplate, usize> = HashMap::new();
        for template in reference.legal_moves().iter().filter_map(MoveTemplate::of) {
            *legal.entry(template).or_default() += 1;
        }

        let mut templates = Vec::new();
        for candidate in candidates() {
            if candidate.is_legal_in(&legal)? {
                templates.push(candidate);
            }
        }

        if templates.len() > ACTION_SPACE_SIZE {
            return Err(CodecError::Overflow(templates.len()));
        }

        let indices = templates
            .iter()
            .enumerate()
            .map(|(index, template)| (*template, index))
            .collect();

        info!(entries = templates.len(), "Action table built");
        Ok(Self { templates, indices })
    }

    /// Decodes an action index. Never fails.
    #[instrument(skip(self))]
    pub fn decode(&self, index: usize) -> Decoded {
        match self.templates.get(index) {
            Some(template) => Decoded::Move(*template),
            None => {
                debug!(index, table = self.templates.len(), "Index outside action table");
                Decoded::NoMove
            }
        }
    }

    /// Reverse lookup of a template.
    pub fn encode(&self, template: &MoveTemplate) -> Option<usize> {
        self.indices.get(template).copied()
    }

    /// Reverse lookup of a concrete move.
    pub fn encode_move(&self, mv: &Move) -> Option<usize> {
        MoveTemplate::of(mv).and_then(|t| self.encode(&t))
    }

    /// Number of templates in the table.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Size of the action space the table indexes into.
    pub fn action_space(&self) -> usize {
        ACTION_SPACE_SIZE
    }

    /// Iterates `(index, template)` in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &MoveTemplate)> {
        self.templates.iter().enumerate()
    }
}

/// Every raw (from, to, promotion) triple the table may contain.
///
/// Same-square pairs and promotions onto a non-back rank are skipped here,
/// so any template reaching the predicate is well formed.
fn candidates() -> impl Iterator<Item = MoveTemplate> {
    Square::ALL.into_iter().flat_map(|from| {
        Square::ALL
            .into_iter()
            .filter(move |to| *to != from)
            .flat_map(move |to| {
                PROMOTIONS
                    .into_iter()
                    .filter(move |promotion| {
                        promotion.is_none() || matches!(to.rank(), Rank::First | Rank::Eighth)
                    })
                    .map(move |promotion| MoveTemplate::new(from, to, promotion))
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_table_has_twenty_entries() {
        let codec = ActionCodec::build().expect("builds");
        assert_eq!(codec.len(), 20);
        assert_eq!(codec.action_space(), ACTION_SPACE_SIZE);
    }

    #[test]
    fn test_enumeration_order() {
        let codec = ActionCodec::build().expect("builds");
        // b1 is the lowest from-square with moves; a3 comes before c3
        assert_eq!(codec.decode(0).template().map(|t| t.uci()), Some("b1a3".into()));
        assert_eq!(codec.decode(1).template().map(|t| t.uci()), Some("b1c3".into()));
        let last = codec.decode(codec.len() - 1).template().expect("entry");
        assert_eq!(last.uci(), "h2h4");
    }

    #[test]
    fn test_decode_out_of_range_is_sentinel() {
        let codec = ActionCodec::build().expect("builds");
        assert_eq!(codec.decode(999_999), Decoded::NoMove);
        assert_eq!(codec.decode(codec.len()), Decoded::NoMove);
        assert_eq!(codec.decode(ACTION_SPACE_SIZE - 1), Decoded::NoMove);
    }

    #[test]
    fn test_round_trip_for_present_moves() {
        let codec = ActionCodec::build().expect("builds");
        for (index, template) in codec.iter() {
            assert_eq!(codec.encode(template), Some(index));
            assert_eq!(codec.decode(index), Decoded::Move(*template));
        }
    }

    #[test]
    fn test_encode_absent_template() {
        let codec = ActionCodec::build().expect("builds");
        let absent = MoveTemplate::parse_uci("e4e5").expect("parses");
        assert_eq!(codec.encode(&absent), None);
    }

    #[test]
    fn test_malformed_promotion_rejected_by_predicate() {
        let template = MoveTemplate::new(Square::E7, Square::E8, Some(Role::King));
        assert!(matches!(
            template.is_legal_in(&HashMap::new()),
            Err(CodecError::MalformedTemplate(_))
        ));
        let mid_board = MoveTemplate::new(Square::E3, Square::E4, Some(Role::Queen));
        assert!(mid_board.is_legal_in(&HashMap::new()).is_err());
    }

    #[test]
    fn test_duplicate_match_is_ambiguous() {
        let template = MoveTemplate::new(Square::E2, Square::E4, None);
        let legal = HashMap::from([(template, 2)]);
        assert_eq!(
            template.is_legal_in(&legal),
            Err(CodecError::Ambiguous("e2e4".to_string()))
        );
        assert_eq!(template.is_legal_in(&HashMap::from([(template, 1)])), Ok(true));
    }

    #[test]
    fn test_candidate_count() {
        // 64*63 plain pairs plus 4 promotions per pair landing on a back rank
        let back_rank_pairs = 64 * 16 - 16;
        assert_eq!(candidates().count(), 64 * 63 + back_rank_pairs * 4);
    }

    #[test]
    fn test_uci_round_trip() {
        for text in ["e2e4", "e7e8q", "a7a8n"] {
            assert_eq!(MoveTemplate::parse_uci(text).map(|t| t.uci()), Some(text.to_string()));
        }
        assert_eq!(MoveTemplate::parse_uci("e2"), None);
        assert_eq!(MoveTemplate::parse_uci("e2e4x"), None);
    }
}
