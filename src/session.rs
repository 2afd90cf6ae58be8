// Game session: handshake, setup, then one reply per server turn until the
// server says stop.
//
// `advance` is the whole game logic as a function of the incoming message
// and whatever state we already hold. `Session` only moves bytes: online it
// keeps the state between turns itself, offline it hands the state to the
// server inside every reply and gets it back with the next message.

use std::io::{BufRead, Write};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::{Config, Mode};
use crate::error::{Error, Result};
use crate::framing::{recv_message, send_message};
use crate::protocol::{
    self, HandshakeS, Move, MoveP, ReadyP, Score, ServerMessage, StopS, TimeoutS, TurnS,
};
use crate::punter::{GameState, PunterId};
use crate::strategy::Strategy;

/// What a server message does to the game.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Ready(GameState),
    Moved(Move, GameState),
    Stopped {
        scores: Vec<Score>,
        state: Option<GameState>,
    },
    TimedOut(Option<GameState>),
}

/// Apply one server message to `state`.
///
/// State embedded in the message wins over `state`, so offline runs never
/// depend on anything kept in memory.
pub fn advance(
    state: Option<GameState>,
    message: ServerMessage,
    strategy: &Strategy,
) -> Result<Transition> {
    match message {
        ServerMessage::Setup(setup) => {
            if state.is_some() {
                warn!("setup arrived mid-game, starting over");
            }
            if let Some(settings) = &setup.settings {
                info!("server settings: {:?}", settings);
            }
            Ok(Transition::Ready(GameState::new(setup)))
        }
        ServerMessage::Turn(TurnS { turn, state: embedded }) => {
            let mut state = embedded.or(state).ok_or(Error::MissingState)?;
            state.process_moves(&turn.moves)?;
            let play = strategy.make_move(&state);
            if let Move::Claim(claim) = &play {
                if let Err(e) = state.apply_claim(claim.source, claim.target, claim.punter) {
                    warn!("could not record our own claim: {}", e);
                }
            }
            Ok(Transition::Moved(play, state))
        }
        ServerMessage::Stop(StopS { stop, state: embedded }) => {
            let state = match embedded.or(state) {
                Some(mut state) => {
                    state.process_moves(&stop.moves)?;
                    Some(state)
                }
                None => None,
            };
            Ok(Transition::Stopped {
                scores: stop.scores,
                state,
            })
        }
        ServerMessage::Timeout(TimeoutS { timeout }) => {
            warn!("server timed us out (limit {}s)", timeout);
            Ok(Transition::TimedOut(state))
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ready(PunterId),
    Moved(Move),
    Stopped(Vec<Score>),
    TimedOut,
}

pub struct Session<S> {
    stream: S,
    name: String,
    mode: Mode,
    strategy: Strategy,
}

impl<S: BufRead + Write> Session<S> {
    pub fn new(stream: S, config: &Config) -> Session<S> {
        Session {
            stream,
            name: config.name.clone(),
            mode: config.mode,
            strategy: config.strategy,
        }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    pub fn handshake(&mut self) -> Result<String> {
        send_message(&mut self.stream, &protocol::handshake(self.name.clone()))?;
        let reply: HandshakeS = recv_message(&mut self.stream)?;
        info!("registered as {}", reply.you);
        Ok(reply.you)
    }

    pub fn run(&mut self) -> Result<Outcome> {
        match self.mode {
            Mode::Online => self.run_online(),
            Mode::Offline => self.run_offline(),
        }
    }

    /// Play a whole game over one connection.
    fn run_online(&mut self) -> Result<Outcome> {
        self.handshake()?;

        let mut message = ServerMessage::recv(&mut self.stream)?;
        if !matches!(message, ServerMessage::Setup(_)) {
            return Err(Error::UnexpectedMessage {
                expected: "setup",
                found: message.kind(),
            });
        }

        let mut state = None;
        loop {
            let begin = Instant::now();
            let kind = message.kind();
            let transition = advance(state.take(), message, &self.strategy)?;
            let (outcome, kept) = self.respond(transition)?;
            let took = begin.elapsed();
            debug!("{} took {}.{:09}s", kind, took.as_secs(), took.subsec_nanos());
            if let Outcome::Stopped(_) = outcome {
                return Ok(outcome);
            }
            state = kept;
            message = ServerMessage::recv(&mut self.stream)?;
        }
    }

    /// Handle exactly one server message and exit.
    fn run_offline(&mut self) -> Result<Outcome> {
        self.handshake()?;
        let begin = Instant::now();
        let message = ServerMessage::recv(&mut self.stream)?;
        let kind = message.kind();
        let transition = advance(None, message, &self.strategy)?;
        let (outcome, _) = self.respond(transition)?;
        let took = begin.elapsed();
        debug!("{} took {}.{:09}s", kind, took.as_secs(), took.subsec_nanos());
        Ok(outcome)
    }

    /// Send whatever reply `transition` calls for. Returns the state to keep
    /// in memory, which is always `None` offline.
    fn respond(&mut self, transition: Transition) -> Result<(Outcome, Option<GameState>)> {
        let embed = self.mode == Mode::Offline;
        match transition {
            Transition::Ready(state) => {
                let ready = state.id();
                info!("we are punter {} of {}", ready, state.punters);
                let (attached, kept) = split_state(embed, state);
                send_message(&mut self.stream, &ReadyP { ready, state: attached })?;
                Ok((Outcome::Ready(ready), kept))
            }
            Transition::Moved(play, state) => {
                debug!("playing {:?}", play);
                let (attached, kept) = split_state(embed, state);
                let reply = MoveP {
                    play: play.clone(),
                    state: attached,
                };
                send_message(&mut self.stream, &reply)?;
                Ok((Outcome::Moved(play), kept))
            }
            Transition::Stopped { scores, state } => {
                report_scores(&scores, state.as_ref().map(GameState::id));
                Ok((Outcome::Stopped(scores), None))
            }
            Transition::TimedOut(state) => Ok((Outcome::TimedOut, state)),
        }
    }
}

/// Decide whether `state` rides along with the reply or stays in memory.
fn split_state(embed: bool, state: GameState) -> (Option<GameState>, Option<GameState>) {
    if embed {
        (Some(state), None)
    } else {
        (None, Some(state))
    }
}

fn report_scores(scores: &[Score], me: Option<PunterId>) {
    info!("game over");
    for score in scores {
        if Some(score.punter) == me {
            info!("punter {} scored {} (us)", score.punter, score.score);
        } else {
            info!("punter {} scored {}", score.punter, score.score);
        }
    }
}
