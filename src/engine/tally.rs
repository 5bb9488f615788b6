//! Vote tallying from message reaction state.

use crate::transport::{Reaction, Symbol};

/// Up/down vote counts for one suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteTotals {
    pub up: u64,
    pub down: u64,
}

impl VoteTotals {
    /// Results text for the display field, one line per symbol.
    pub fn render(&self, up: &Symbol, down: &Symbol) -> String {
        format!("{}x {}\n{}x {}", self.up, up, self.down, down)
    }
}

/// Count votes for both symbols, excluding the engine's own seed reaction
/// from each raw count. Absent reactions count as zero.
pub fn tally(reactions: &[Reaction], up: &Symbol, down: &Symbol) -> VoteTotals {
    let mut totals = VoteTotals::default();
    for reaction in reactions {
        if reaction.symbol == *up {
            totals.up = reaction.count.saturating_sub(1);
        }
        if reaction.symbol == *down {
            totals.down = reaction.count.saturating_sub(1);
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reaction(symbol: &Symbol, count: u64) -> Reaction {
        Reaction {
            symbol: symbol.clone(),
            count,
            members: Vec::new(),
        }
    }

    #[test]
    fn test_seed_reaction_is_excluded() {
        let up = Symbol::default_up();
        let down = Symbol::default_down();
        // 3 members + the engine on up, engine only on down.
        let reactions = vec![reaction(&up, 4), reaction(&down, 1)];

        assert_eq!(tally(&reactions, &up, &down), VoteTotals { up: 3, down: 0 });
    }

    #[test]
    fn test_absent_reactions_count_zero() {
        let up = Symbol::default_up();
        let down = Symbol::default_down();

        assert_eq!(tally(&[], &up, &down), VoteTotals::default());

        // Unrelated symbols are ignored entirely.
        let reactions = vec![reaction(&Symbol::new("🎉"), 12)];
        assert_eq!(tally(&reactions, &up, &down), VoteTotals::default());
    }

    #[test]
    fn test_custom_symbols() {
        let up = Symbol::new("👍");
        let down = Symbol::new("👎");
        let reactions = vec![reaction(&up, 2), reaction(&down, 5)];

        assert_eq!(tally(&reactions, &up, &down), VoteTotals { up: 1, down: 4 });
    }

    #[test]
    fn test_render_format() {
        let up = Symbol::default_up();
        let down = Symbol::default_down();
        let totals = VoteTotals { up: 3, down: 0 };

        assert_eq!(totals.render(&up, &down), "3x \u{2705}\n0x \u{274e}");
    }
}
