// Move selection.
//
// The default player grows chains of its own rivers outward from the mines:
// it walks every mine's owned component and claims the unclaimed river at
// the far end of the longest chain. When nothing reachable is worth taking
// it falls back to the first unclaimed river on the map.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::thread_rng;
use tracing::debug;

use crate::error::Error;
use crate::protocol::Move;
use crate::punter::{GameState, Map, PunterId, RiverId, SiteId};

/// River expansions allowed per route search. Dense owned regions make the
/// number of simple paths explode, so the search stops here and keeps the
/// best chain seen so far.
pub const DEFAULT_SEARCH_BUDGET: usize = 200_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    RouteExtension { budget: usize },
    FirstUnclaimed,
    Random,
}

impl Default for Strategy {
    fn default() -> Strategy {
        Strategy::RouteExtension {
            budget: DEFAULT_SEARCH_BUDGET,
        }
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(name: &str) -> Result<Strategy, Error> {
        match name {
            "route" => Ok(Strategy::default()),
            "first" => Ok(Strategy::FirstUnclaimed),
            "random" => Ok(Strategy::Random),
            _ => Err(Error::Usage(format!(
                "unknown strategy '{}' (expected route, first or random)",
                name
            ))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Strategy::RouteExtension { .. } => write!(f, "route"),
            Strategy::FirstUnclaimed => write!(f, "first"),
            Strategy::Random => write!(f, "random"),
        }
    }
}

impl Strategy {
    /// Pick this turn's move. Passes only when every river is taken.
    pub fn make_move(&self, state: &GameState) -> Move {
        let map = &state.map;
        let choice = match *self {
            Strategy::RouteExtension { budget } => extend_route(map, state.id(), budget)
                .map(|(river, score)| {
                    debug!("extending route with river {} (score {})", river, score);
                    river
                })
                .or_else(|| map.first_unclaimed()),
            Strategy::FirstUnclaimed => map.first_unclaimed(),
            Strategy::Random => {
                let choices = map.unclaimed().collect::<Vec<RiverId>>();
                choices.choose(&mut thread_rng()).cloned()
            }
        };

        match choice {
            Some(id) => {
                let river = map.river(id);
                Move::claim(state.id(), river.source, river.target)
            }
            None => Move::pass(state.id()),
        }
    }
}

/// Best unclaimed river reachable from a mine through rivers `punter`
/// already owns, with its score. Only positive scores are returned.
///
/// An unclaimed river next to a mine scores 1; every owned river walked to
/// reach it adds 1. Mines are tried in map order and ties keep the first
/// river found, so the result depends on nothing but the map.
pub fn extend_route(map: &Map, punter: PunterId, budget: usize) -> Option<(RiverId, u32)> {
    let mut search = RouteSearch {
        map,
        punter,
        visited: vec![false; map.rivers().len()],
        budget,
    };
    let mut best: Option<(RiverId, u32)> = None;
    for &mine in map.mines() {
        if let Some((river, score)) = search.explore(mine) {
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((river, score));
            }
        }
    }
    debug_assert!(search.visited.iter().all(|v| !v));
    best
}

struct RouteSearch<'a> {
    map: &'a Map,
    punter: PunterId,
    // Owned rivers on the current path.
    visited: Vec<bool>,
    budget: usize,
}

impl<'a> RouteSearch<'a> {
    fn explore(&mut self, site: SiteId) -> Option<(RiverId, u32)> {
        let map = self.map;
        let mut best: Option<(RiverId, u32)> = None;
        for &id in map.incident(site) {
            if self.budget == 0 {
                break;
            }
            self.budget -= 1;

            let river = map.river(id);
            let candidate = match river.owner {
                None => Some((id, 1)),
                Some(owner) if owner == self.punter => {
                    if self.visited[id] {
                        continue;
                    }
                    self.visited[id] = true;
                    let beyond = self.explore(river.other_side(site));
                    self.visited[id] = false;
                    beyond
                        .filter(|&(_, score)| score > 0)
                        .map(|(leaf, score)| (leaf, score + 1))
                }
                Some(_) => None,
            };

            if let Some((leaf, score)) = candidate {
                if best.map_or(true, |(_, top)| score > top) {
                    best = Some((leaf, score));
                }
            }
        }
        best
    }
}
