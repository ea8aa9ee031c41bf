//! Room actor: an isolated Tokio task that owns one match.
//!
//! The actor is the only holder of the `GameState`. Everything else talks
//! to it through a [`RoomHandle`], and the engine's transition functions
//! run one at a time inside the actor loop.

use std::collections::BTreeMap;

use serde::Serialize;
use tilematch_engine::{Clock, GameState, InvalidAction, RoundEngine};
use tilematch_protocol::{Action, Codec, PlayerId, ProtocolError, Recipient, RoomId, RoundEvent};
use tilematch_tick::TickScheduler;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::{RoomConfig, RoomError, RoomState};

/// An outbound message from the room actor to a subscriber.
///
/// On the wire it is `{"kind": "...", "body": ...}`; see
/// [`RoomOutbound::encode`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "body")]
pub enum RoomOutbound {
    /// Full state snapshot, sent after every change.
    Snapshot(GameState),
    /// Something the engine reported.
    Event(RoundEvent),
    /// One of this subscriber's own actions was refused.
    Rejected(InvalidAction),
}

impl RoomOutbound {
    /// Serializes the message into a frame for a transport to send.
    pub fn encode(&self, codec: &impl Codec) -> Result<Vec<u8>, ProtocolError> {
        codec.encode(self)
    }
}

/// Channel sender for delivering outbound messages to a player or
/// spectator.
pub type Subscriber = mpsc::UnboundedSender<RoomOutbound>;

/// Commands sent to a room actor through its channel. Variants with a
/// `reply` are request/response; the rest are fire-and-forget.
pub(crate) enum RoomCommand {
    Join {
        player_id: PlayerId,
        sender: Subscriber,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    Spectate {
        sender: Subscriber,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// `actor` is `None` for spectators.
    Act {
        actor: Option<PlayerId>,
        action: Action,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    Snapshot {
        reply: oneshot::Sender<Option<GameState>>,
    },

    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },

    Shutdown,
}

/// A snapshot of room metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub state: RoomState,
    pub player_count: usize,
    pub spectator_count: usize,
    pub max_players: usize,
}

/// Handle to a running room actor.
///
/// Cheap to clone: it wraps an `mpsc::Sender`.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Adds a player. The match is set up as soon as `min_players` are
    /// in; later joiners are added to the running match.
    pub async fn join(&self, player_id: PlayerId, sender: Subscriber) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Join {
            player_id,
            sender,
            reply,
        })
        .await?
    }

    pub async fn leave(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Leave { player_id, reply })
            .await?
    }

    /// Subscribes a spectator: snapshots and events, but no actions.
    pub async fn spectate(&self, sender: Subscriber) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Spectate { sender, reply })
            .await?
    }

    /// Submits an action. A refused action comes back as
    /// [`RoomError::Rejected`] to this caller only.
    pub async fn act(&self, actor: Option<PlayerId>, action: Action) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Act {
            actor,
            action,
            reply,
        })
        .await?
    }

    /// Decodes an action payload with `codec` and submits it.
    pub async fn act_encoded(
        &self,
        codec: &impl Codec,
        actor: Option<PlayerId>,
        data: &[u8],
    ) -> Result<(), RoomError> {
        if data.is_empty() {
            return Err(ProtocolError::InvalidMessage("empty action payload".into()).into());
        }
        let action: Action = codec.decode(data)?;
        self.act(actor, action).await
    }

    /// The current game state, or `None` before the match is set up.
    pub async fn snapshot(&self) -> Result<Option<GameState>, RoomError> {
        self.request(|reply| RoomCommand::Snapshot { reply }).await
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::GetInfo { reply }).await
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Sends a command carrying a reply channel and waits for the answer.
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<C: Clock> {
    room_id: RoomId,
    state: RoomState,
    config: RoomConfig,
    engine: RoundEngine<C>,
    game: Option<GameState>,
    /// Roster members and their outbound channels.
    players: BTreeMap<PlayerId, Subscriber>,
    spectators: Vec<Subscriber>,
    scheduler: TickScheduler,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<C: Clock> RoomActor<C> {
    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        info!(room_id = %self.room_id, "room actor started");

        loop {
            tokio::select! {
                // Due ticks first, so a command never observes a state the
                // clock has already moved past.
                biased;

                _ = self.scheduler.wait_for_tick() => {
                    self.handle_tick();
                    self.scheduler.record_tick_end();
                }
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
            }
        }

        info!(room_id = %self.room_id, state = %self.state, "room actor stopped");
    }

    /// Returns `false` when the actor should stop.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                player_id,
                sender,
                reply,
            } => {
                let result = self.handle_join(player_id, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Leave { player_id, reply } => {
                let result = self.handle_leave(player_id);
                let _ = reply.send(result);
            }
            RoomCommand::Spectate { sender, reply } => {
                let result = self.handle_spectate(sender);
                let _ = reply.send(result);
            }
            RoomCommand::Act {
                actor,
                action,
                reply,
            } => {
                let result = self.handle_act(actor, action);
                let _ = reply.send(result);
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.game.clone());
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                info!(room_id = %self.room_id, "room shutting down");
                return false;
            }
        }
        true
    }

    fn handle_join(&mut self, player_id: PlayerId, sender: Subscriber) -> Result<(), RoomError> {
        if !self.state.is_joinable() {
            return Err(RoomError::InvalidState(format!(
                "cannot join room in state {}",
                self.state
            )));
        }
        if self.players.contains_key(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, self.room_id));
        }
        if self.players.len() >= self.config.max_players {
            return Err(RoomError::RoomFull(self.room_id));
        }

        self.players.insert(player_id, sender);
        info!(
            room_id = %self.room_id,
            %player_id,
            players = self.players.len(),
            "player joined room"
        );

        if let Some(game) = self.game.as_mut() {
            let events = self.engine.player_joined(game, player_id);
            self.publish(events);
        } else if self.players.len() >= self.config.min_players {
            self.start_match();
        }

        Ok(())
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> Result<(), RoomError> {
        if self.players.remove(&player_id).is_none() {
            return Err(RoomError::NotInRoom(player_id, self.room_id));
        }
        info!(
            room_id = %self.room_id,
            %player_id,
            players = self.players.len(),
            "player left room"
        );

        // The final standings are frozen once the match is decided.
        if self.state == RoomState::Finished {
            return Ok(());
        }
        if let Some(game) = self.game.as_mut() {
            let events = self.engine.player_left(game, player_id);
            self.publish(events);
        }
        Ok(())
    }

    fn handle_spectate(&mut self, sender: Subscriber) -> Result<(), RoomError> {
        if !self.config.allow_spectators {
            return Err(RoomError::InvalidState("spectators are not allowed".into()));
        }
        if self.config.max_spectators > 0 && self.spectators.len() >= self.config.max_spectators {
            return Err(RoomError::RoomFull(self.room_id));
        }
        if let Some(game) = &self.game {
            let _ = sender.send(RoomOutbound::Snapshot(game.clone()));
        }
        self.spectators.push(sender);
        debug!(room_id = %self.room_id, spectators = self.spectators.len(), "spectator added");
        Ok(())
    }

    fn handle_act(&mut self, actor: Option<PlayerId>, action: Action) -> Result<(), RoomError> {
        let Some(game) = self.game.as_mut() else {
            return Err(RoomError::InvalidState(
                "the match has not been set up".into(),
            ));
        };

        match self.engine.dispatch(game, actor, action) {
            Ok(events) => {
                self.publish(events);
                Ok(())
            }
            Err(reason) => {
                debug!(
                    room_id = %self.room_id,
                    actor = ?actor,
                    %action,
                    %reason,
                    "action rejected"
                );
                if let Some(player) = actor {
                    self.route(Recipient::Player(player), RoomOutbound::Rejected(reason.clone()));
                }
                Err(RoomError::Rejected(reason))
            }
        }
    }

    fn handle_tick(&mut self) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        let events = self.engine.tick(game);
        self.publish(events);
    }

    fn start_match(&mut self) {
        let roster: Vec<PlayerId> = self.players.keys().copied().collect();
        let game = self.engine.setup(&roster);
        self.route(Recipient::All, RoomOutbound::Snapshot(game.clone()));
        self.game = Some(game);
        self.transition(RoomState::InProgress);
        self.scheduler.resume();
        info!(
            room_id = %self.room_id,
            players = roster.len(),
            "match started"
        );
    }

    /// Broadcasts events and the resulting snapshot, and closes the room
    /// once the match is decided.
    fn publish(&mut self, events: Vec<RoundEvent>) {
        if events.is_empty() {
            return;
        }
        let decided = events
            .iter()
            .any(|e| matches!(e, RoundEvent::MatchOver { .. }));

        for event in events {
            self.route(Recipient::All, RoomOutbound::Event(event));
        }
        if let Some(game) = &self.game {
            self.route(Recipient::All, RoomOutbound::Snapshot(game.clone()));
        }

        if decided {
            self.transition(RoomState::Finished);
            self.scheduler.pause();
            info!(room_id = %self.room_id, "match finished");
        }
    }

    /// Delivers one message to the recipient(s). Closed channels are
    /// skipped silently.
    fn route(&self, recipient: Recipient, msg: RoomOutbound) {
        match recipient {
            Recipient::All => {
                for sender in self.players.values().chain(&self.spectators) {
                    let _ = sender.send(msg.clone());
                }
            }
            Recipient::Player(player_id) => self.send_to(player_id, msg),
        }
    }

    fn send_to(&self, player_id: PlayerId, msg: RoomOutbound) {
        if let Some(sender) = self.players.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    fn transition(&mut self, next: RoomState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal room transition {} -> {next}",
            self.state
        );
        debug!(room_id = %self.room_id, from = %self.state, to = %next, "room state changed");
        self.state = next;
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            state: self.state,
            player_count: self.players.len(),
            spectator_count: self.spectators.len(),
            max_players: self.config.max_players,
        }
    }
}

/// Spawns a room actor around `engine` and returns a handle to it.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_room<C: Clock>(room_id: RoomId, config: RoomConfig, engine: RoundEngine<C>) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));

    // Nothing to tick until the match is set up.
    let mut scheduler = TickScheduler::new(config.tick_config());
    scheduler.pause();

    let actor = RoomActor {
        room_id,
        state: RoomState::WaitingForPlayers,
        config,
        engine,
        game: None,
        players: BTreeMap::new(),
        spectators: Vec::new(),
        scheduler,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { room_id, sender: tx }
}
