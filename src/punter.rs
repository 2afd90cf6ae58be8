use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::{Move, SetupS};

pub type PunterId = usize;
pub type SiteId = usize;
pub type RiverId = usize;

/// For every site, the indices of the rivers touching it, in river order.
pub type EdgeMatrix = HashMap<SiteId, Vec<RiverId>>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Site {
    pub id: SiteId,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct River {
    pub source: SiteId,
    pub target: SiteId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<PunterId>,
}

impl River {
    pub fn new(source: SiteId, target: SiteId) -> River {
        River {
            source,
            target,
            owner: None,
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.owner.is_some()
    }

    pub fn is_owned_by(&self, punter: PunterId) -> bool {
        self.owner == Some(punter)
    }

    pub fn set_owner(&mut self, punter: PunterId) {
        self.owner = Some(punter)
    }

    /// The far end of the river when standing on `site`. A self-loop leads
    /// back to where it started.
    pub fn other_side(&self, site: SiteId) -> SiteId {
        if site == self.source {
            self.target
        } else {
            self.source
        }
    }
}

#[derive(Deserialize)]
struct RawMap {
    sites: Vec<Site>,
    rivers: Vec<River>,
    mines: Vec<SiteId>,
}

impl From<RawMap> for Map {
    fn from(raw: RawMap) -> Map {
        Map::new(raw.sites, raw.rivers, raw.mines)
    }
}

/// The game board. Only sites, rivers and mines go over the wire; the
/// incidence matrix is derived from them whenever a map is built or decoded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(from = "RawMap")]
pub struct Map {
    sites: Vec<Site>,
    rivers: Vec<River>,
    mines: Vec<SiteId>,

    #[serde(skip)]
    edges: EdgeMatrix,
}

impl Map {
    pub fn new(sites: Vec<Site>, rivers: Vec<River>, mines: Vec<SiteId>) -> Map {
        let mut map = Map {
            sites,
            rivers,
            mines,
            edges: EdgeMatrix::new(),
        };
        map.edges = map.compute_edges();
        map
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn rivers(&self) -> &[River] {
        &self.rivers
    }

    pub fn mines(&self) -> &[SiteId] {
        &self.mines
    }

    pub fn river(&self, id: RiverId) -> &River {
        &self.rivers[id]
    }

    pub fn edges(&self) -> &EdgeMatrix {
        &self.edges
    }

    /// Rivers touching `site`. A self-loop is listed twice.
    pub fn incident(&self, site: SiteId) -> &[RiverId] {
        self.edges.get(&site).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Build the incidence matrix from scratch. Every site gets an entry,
    /// even if no river reaches it.
    pub fn compute_edges(&self) -> EdgeMatrix {
        let mut edges = EdgeMatrix::with_capacity(self.sites.len());
        for site in &self.sites {
            edges.entry(site.id).or_insert_with(Vec::new);
        }
        for (idx, river) in self.rivers.iter().enumerate() {
            edges.entry(river.source).or_insert_with(Vec::new).push(idx);
            edges.entry(river.target).or_insert_with(Vec::new).push(idx);
        }
        edges
    }

    pub fn replace_rivers(&mut self, rivers: Vec<River>) {
        self.rivers = rivers;
        self.edges = self.compute_edges();
    }

    pub fn first_unclaimed(&self) -> Option<RiverId> {
        self.rivers.iter().position(|river| !river.is_claimed())
    }

    pub fn unclaimed(&self) -> impl Iterator<Item = RiverId> + '_ {
        self.rivers
            .iter()
            .enumerate()
            .filter(|(_, river)| !river.is_claimed())
            .map(|(idx, _)| idx)
    }

    /// Locate the river running from `source` to `target`.
    ///
    /// Searches the shorter of the two incidence lists first, then scans all
    /// rivers in case the matrix disagrees with the river list. A river
    /// stored the other way round is accepted only when no river matches
    /// the given orientation.
    pub fn find_river(&self, source: SiteId, target: SiteId) -> Option<RiverId> {
        let from_source = self.incident(source);
        let from_target = self.incident(target);
        let shorter = if from_target.len() < from_source.len() {
            from_target
        } else {
            from_source
        };
        let joins = |idx: RiverId, s: SiteId, t: SiteId| {
            let river = &self.rivers[idx];
            river.source == s && river.target == t
        };

        let exact = shorter
            .iter()
            .cloned()
            .find(|&idx| joins(idx, source, target))
            .or_else(|| (0..self.rivers.len()).find(|&idx| joins(idx, source, target)));
        if exact.is_some() {
            return exact;
        }

        let reversed = shorter.iter().cloned().find(|&idx| joins(idx, target, source));
        if let Some(id) = reversed {
            debug!("claim {}-{} matched river {} in reverse", source, target, id);
        }
        reversed
    }

    /// Mark the river between `source` and `target` as owned by `owner`.
    pub fn claim(&mut self, source: SiteId, target: SiteId, owner: PunterId) -> Result<RiverId> {
        let id = self
            .find_river(source, target)
            .ok_or(Error::UnknownRiver {
                from: source,
                to: target,
            })?;
        let river = &mut self.rivers[id];
        if let Some(previous) = river.owner {
            if previous != owner {
                debug!(
                    "river {} ({}-{}) moves from punter {} to {}",
                    id, source, target, previous, owner
                );
            }
        }
        river.set_owner(owner);
        Ok(id)
    }
}

/// Everything a punter needs to remember between turns.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GameState {
    pub punter: PunterId,
    pub punters: usize,
    pub map: Map,
}

impl GameState {
    pub fn new(setup: SetupS) -> GameState {
        debug!(
            "map has {} sites, {} rivers, mines {:?}",
            setup.map.sites().len(),
            setup.map.rivers().len(),
            setup.map.mines()
        );
        GameState {
            punter: setup.punter,
            punters: setup.punters,
            map: setup.map,
        }
    }

    pub fn id(&self) -> PunterId {
        self.punter
    }

    pub fn apply_claim(
        &mut self,
        source: SiteId,
        target: SiteId,
        owner: PunterId,
    ) -> Result<RiverId> {
        self.map.claim(source, target, owner)
    }

    /// Fold the moves reported since our last turn into the map.
    ///
    /// Claims that match no river are logged and skipped; any other failure
    /// ends the game. Returns the number of claims applied.
    pub fn process_moves(&mut self, moves: &[Move]) -> Result<usize> {
        let mut applied = 0;
        for m in moves {
            match m {
                Move::Claim(claim) => {
                    applied += self.record(claim.source, claim.target, claim.punter)?;
                }
                Move::Splurge(splurge) => {
                    for leg in splurge.route.windows(2) {
                        applied += self.record(leg[0], leg[1], splurge.punter)?;
                    }
                }
                Move::BuyOption(option) => {
                    // The first owner keeps the river in our model.
                    match self.map.find_river(option.source, option.target) {
                        Some(id) => {
                            debug!("punter {} bought an option on river {}", option.punter, id)
                        }
                        None => warn!(
                            "punter {} bought an option on unknown river {}-{}",
                            option.punter, option.source, option.target
                        ),
                    }
                }
                Move::Pass(_) => {}
            }
        }
        Ok(applied)
    }

    fn record(&mut self, source: SiteId, target: SiteId, owner: PunterId) -> Result<usize> {
        match self.apply_claim(source, target, owner) {
            Ok(_) => Ok(1),
            Err(e) if e.is_recoverable() => {
                warn!("ignoring claim by punter {}: {}", owner, e);
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }
}
