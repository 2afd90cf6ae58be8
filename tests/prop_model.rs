//! Property-based tests for the map model, the route search and the codec.

use proptest::prelude::*;

use route_punter::framing;
use route_punter::protocol::{Move, MoveP, Moves, ServerMessage, TurnS};
use route_punter::punter::{GameState, Map, PunterId, River, Site, SiteId};
use route_punter::strategy::{extend_route, Strategy as Player, DEFAULT_SEARCH_BUDGET};

/// Games of up to 12 sites where punter 0 (us) and two rivals may already
/// own some rivers. Self-loops and duplicate rivers are allowed.
fn arb_game() -> impl Strategy<Value = GameState> {
    (1usize..12)
        .prop_flat_map(|n| {
            (
                Just(n),
                prop::collection::vec((0..n, 0..n, prop::option::of(0usize..3)), 0..30),
                prop::collection::vec(0..n, 0..4),
            )
        })
        .prop_map(|(n, rivers, mines)| {
            let sites = (0..n).map(|id| Site { id }).collect();
            let rivers = rivers
                .into_iter()
                .map(|(source, target, owner)| River {
                    source,
                    target,
                    owner,
                })
                .collect();
            GameState {
                punter: 0,
                punters: 3,
                map: Map::new(sites, rivers, mines),
            }
        })
}

fn incidence_count(map: &Map, site: SiteId, river: usize) -> usize {
    map.incident(site).iter().filter(|&&r| r == river).count()
}

proptest! {
    /// Every river sits in the lists of exactly its endpoints: once per end,
    /// twice in one list for a self-loop.
    #[test]
    fn prop_incidence_matches_rivers(game in arb_game()) {
        let map = &game.map;
        for (idx, river) in map.rivers().iter().enumerate() {
            for site in map.sites() {
                let expected = match (site.id == river.source, site.id == river.target) {
                    (true, true) => 2,
                    (true, false) | (false, true) => 1,
                    (false, false) => 0,
                };
                prop_assert_eq!(incidence_count(map, site.id, idx), expected);
            }
        }
        let total: usize = map.edges().values().map(Vec::len).sum();
        prop_assert_eq!(total, 2 * map.rivers().len());
        prop_assert_eq!(&map.compute_edges(), map.edges());
    }

    /// The state survives the wire intact, incidence matrix included.
    #[test]
    fn prop_state_round_trips(game in arb_game()) {
        let decoded: GameState = framing::decode(&framing::encode(&game).unwrap()).unwrap();
        prop_assert_eq!(&decoded, &game);

        let reply = MoveP { play: Move::pass(0), state: Some(game.clone()) };
        let decoded: MoveP = framing::decode(&framing::encode(&reply).unwrap()).unwrap();
        prop_assert_eq!(decoded, reply);

        let msg = ServerMessage::Turn(TurnS {
            turn: Moves { moves: vec![Move::claim(1, 0, 0)] },
            state: Some(game),
        });
        let frame = framing::encode(&msg).unwrap();
        prop_assert_eq!(ServerMessage::recv(&mut &frame[..]).unwrap(), msg);
    }

    /// Same state, same move.
    #[test]
    fn prop_route_is_deterministic(game in arb_game()) {
        let player = Player::default();
        prop_assert_eq!(player.make_move(&game), player.make_move(&game));
    }

    /// Pass exactly when nothing is left, and any claim names an open river.
    #[test]
    fn prop_route_is_total(game in arb_game()) {
        let open = game.map.rivers().iter().any(|r| !r.is_claimed());
        match Player::default().make_move(&game) {
            Move::Pass(pass) => {
                prop_assert!(!open);
                prop_assert_eq!(pass.punter, 0);
            }
            Move::Claim(claim) => {
                prop_assert!(open);
                prop_assert_eq!(claim.punter, 0);
                let names_open_river = game.map.rivers().iter().any(|r| {
                    r.source == claim.source && r.target == claim.target && !r.is_claimed()
                });
                prop_assert!(names_open_river);
            }
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    }

    /// With no extension worth taking, the first open river is claimed.
    #[test]
    fn prop_fallback_is_first_open_river(game in arb_game()) {
        if extend_route(&game.map, 0, DEFAULT_SEARCH_BUDGET).is_none() {
            let expected = match game.map.first_unclaimed() {
                Some(idx) => {
                    let river = game.map.river(idx);
                    Move::claim(0, river.source, river.target)
                }
                None => Move::pass(0),
            };
            prop_assert_eq!(Player::default().make_move(&game), expected);
        }
    }

    /// Applying a claim only ever touches the claimed river.
    #[test]
    fn prop_claim_touches_one_river(
        game in arb_game(),
        pick in any::<prop::sample::Index>(),
        owner in 0usize..3,
    ) {
        prop_assume!(!game.map.rivers().is_empty());
        let idx = pick.index(game.map.rivers().len());
        let (source, target) = {
            let river = game.map.river(idx);
            (river.source, river.target)
        };
        let mut after = game.clone();
        let hit = after.apply_claim(source, target, owner as PunterId).unwrap();
        for (i, (before, now)) in game.map.rivers().iter().zip(after.map.rivers()).enumerate() {
            if i == hit {
                prop_assert_eq!(now.owner, Some(owner));
                prop_assert_eq!((now.source, now.target), (source, target));
            } else {
                prop_assert_eq!(before, now);
            }
        }
    }
}
