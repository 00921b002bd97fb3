use crate::{PlayerStatsheet, Team};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Lineup order
// ---------------------------------------------------------------------------

/// Player id → zero-based batting order slot, for both teams of one game.
///
/// Away and home slots share one key space; player ids are globally unique so
/// the two lineups never collide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineupOrder {
    positions: HashMap<String, usize>,
}

impl LineupOrder {
    pub fn from_teams(away: &Team, home: &Team) -> Self {
        let positions = away
            .lineup
            .iter()
            .enumerate()
            .chain(home.lineup.iter().enumerate())
            .map(|(slot, player_id)| (player_id.clone(), slot))
            .collect();
        Self { positions }
    }

    /// Lineup slot for `player_id`. Players outside both lineups (pitchers,
    /// substitutes) sort as slot 0.
    pub fn position(&self, player_id: &str) -> usize {
        self.positions.get(player_id).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Statsheet aggregation
// ---------------------------------------------------------------------------

impl PlayerStatsheet {
    /// Fold `other` into `self`: counters are summed, identity fields are taken
    /// from `other` (last fragment wins).
    pub fn absorb(&mut self, other: &PlayerStatsheet) {
        macro_rules! sum {
            ($($field:ident),* $(,)?) => {
                $(self.$field += other.$field;)*
            };
        }
        sum!(
            at_bats,
            caught_stealing,
            doubles,
            earned_runs,
            ground_into_dp,
            hit_batters,
            hit_by_pitch,
            hits,
            hits_allowed,
            home_runs,
            losses,
            outs_recorded,
            pitches_thrown,
            quadruples,
            rbis,
            runs,
            stolen_bases,
            strikeouts,
            struckouts,
            triples,
            walks,
            walks_issued,
            wins,
        );

        self.id.clone_from(&other.id);
        self.player_id.clone_from(&other.player_id);
        self.name.clone_from(&other.name);
        self.team.clone_from(&other.team);
        self.team_id.clone_from(&other.team_id);
    }
}

/// Merge raw fragments into one record per player id.
///
/// Groups come out in first-seen order. With a lineup the result is re-sorted
/// by lineup slot; the sort is stable, so equal slots (including players the
/// lineup doesn't know) keep their first-seen order.
pub fn aggregate(fragments: &[PlayerStatsheet], lineup: Option<&LineupOrder>) -> Vec<PlayerStatsheet> {
    let mut slots: HashMap<&str, usize> = HashMap::with_capacity(fragments.len());
    let mut merged: Vec<PlayerStatsheet> = Vec::new();

    for fragment in fragments {
        match slots.get(fragment.player_id.as_str()) {
            Some(&slot) => merged[slot].absorb(fragment),
            None => {
                slots.insert(fragment.player_id.as_str(), merged.len());
                merged.push(fragment.clone());
            }
        }
    }

    if let Some(lineup) = lineup {
        merged.sort_by_key(|sheet| lineup.position(&sheet.player_id));
    }
    merged
}
