//! The round engine: setup, actions, the periodic tick and roster changes.
//!
//! Every transition takes the [`GameState`] explicitly and returns the
//! [`RoundEvent`]s it produced. The host guarantees calls never overlap.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tilematch_protocol::{Action, PlayerId, RoundEvent};
use tracing::{debug, info, trace};

use crate::config::countdown_seconds;
use crate::{Clock, GameState, InvalidAction, Pattern, RoundConfig};

/// Owns the match rules and the capabilities they need: the config, the
/// injected clock, and the random source for target patterns.
pub struct RoundEngine<C: Clock, R: Rng = StdRng> {
    config: RoundConfig,
    clock: C,
    rng: R,
}

impl<C: Clock> RoundEngine<C> {
    /// An engine with an OS-seeded RNG.
    pub fn new(config: RoundConfig, clock: C) -> Self {
        Self::with_rng(config, clock, StdRng::from_os_rng())
    }

    /// An engine whose target patterns are reproducible from `seed`.
    pub fn seeded(config: RoundConfig, clock: C, seed: u64) -> Self {
        Self::with_rng(config, clock, StdRng::seed_from_u64(seed))
    }
}

impl<C: Clock, R: Rng> RoundEngine<C, R> {
    pub fn with_rng(config: RoundConfig, clock: C, rng: R) -> Self {
        Self {
            config: config.validated(),
            clock,
            rng,
        }
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // -----------------------------------------------------------------------
    // Setup
    // -----------------------------------------------------------------------

    /// Builds the initial state for the starting roster.
    ///
    /// Every player starts on 0 with a blank grid. The first round starts
    /// after the pre-game grace period unless everyone readies up first.
    pub fn setup(&mut self, roster: &[PlayerId]) -> GameState {
        let now = self.clock.now_millis();
        let blank = Pattern::blank(self.config.grid_size);

        let state = GameState {
            round_start_millis: now + self.config.force_start_millis,
            game_started: false,
            target_pattern: self.generate_pattern(),
            scores: roster.iter().map(|&p| (p, 0)).collect(),
            player_patterns: roster.iter().map(|&p| (p, blank.clone())).collect(),
            player_ready: BTreeMap::new(),
            round_over: false,
            round_end_time: None,
            round_winner: None,
            round_duration: 0.0,
            next_round_start_seconds: countdown_seconds(self.config.force_start_millis),
            match_over: false,
            round: 0,
            player_moves: BTreeMap::new(),
            total_moves: 0,
        };

        info!(
            players = roster.len(),
            starts_at = state.round_start_millis,
            "match set up"
        );
        state
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Routes a player action to its handler.
    ///
    /// `actor` is `None` for spectators, who may not do anything.
    pub fn dispatch(
        &self,
        state: &mut GameState,
        actor: Option<PlayerId>,
        action: Action,
    ) -> Result<Vec<RoundEvent>, InvalidAction> {
        match action {
            Action::MarkReady => {
                let player = actor.ok_or(InvalidAction::Spectator)?;
                Ok(self.mark_ready(state, player))
            }
            Action::InteractWithCell { cell } => self.mutate_cell(state, actor, cell),
        }
    }

    /// Flags a player as ready and, once the whole roster is, pulls the
    /// first round forward to the short all-ready countdown.
    ///
    /// The countdown only ever gets shorter here. Calling this after the
    /// game has started just sets the flag.
    pub fn mark_ready(&self, state: &mut GameState, player: PlayerId) -> Vec<RoundEvent> {
        if !state.is_member(player) {
            debug!(%player, "ready from non-member, ignoring");
            return Vec::new();
        }

        let mut events = Vec::new();
        if state.player_ready.insert(player, true) != Some(true) {
            events.push(RoundEvent::PlayerReady { player });
        }

        if state.game_started || !state.all_ready() {
            return events;
        }

        let shortened = self.clock.now_millis() + self.config.all_ready_start_millis;
        if shortened < state.round_start_millis {
            state.round_start_millis = shortened;
            let seconds = countdown_seconds(self.config.all_ready_start_millis);
            state.next_round_start_seconds = seconds;
            events.push(RoundEvent::Countdown { seconds });
            info!(starts_at = shortened, "all players ready, countdown shortened");
        }

        events
    }

    /// Cycles one cell of the actor's grid and checks for a win.
    ///
    /// Rejected without touching the state when the actor is a spectator
    /// or not on the roster, when no round is running, or when `cell` is
    /// off the grid.
    pub fn mutate_cell(
        &self,
        state: &mut GameState,
        actor: Option<PlayerId>,
        cell: usize,
    ) -> Result<Vec<RoundEvent>, InvalidAction> {
        let actor = actor.ok_or(InvalidAction::Spectator)?;
        if state.match_over {
            return Err(InvalidAction::MatchOver);
        }
        if !state.game_started {
            return Err(InvalidAction::NotStarted);
        }
        if state.round_over {
            return Err(InvalidAction::RoundOver);
        }

        let size = self.config.grid_size;
        let pattern = state
            .player_patterns
            .get_mut(&actor)
            .ok_or(InvalidAction::UnknownPlayer(actor))?;
        let colour = pattern
            .cycle(cell, self.config.colour_count)
            .ok_or(InvalidAction::CellOutOfRange { index: cell, size })?;
        let matched = pattern.matches(&state.target_pattern);

        *state.player_moves.entry(actor).or_insert(0) += 1;
        state.total_moves += 1;

        let mut events = vec![RoundEvent::CellChanged {
            player: actor,
            cell,
            colour,
        }];
        if matched {
            self.finish_round(state, actor, &mut events);
        }
        Ok(events)
    }

    /// Records a round win and either schedules the next round or ends the
    /// match.
    fn finish_round(&self, state: &mut GameState, winner: PlayerId, events: &mut Vec<RoundEvent>) {
        let now = self.clock.now_millis();
        let score = state.scores.entry(winner).or_insert(0);
        *score += 1;
        let score = *score;

        state.round_end_time = Some(now);
        state.round_duration = truncated_seconds(state.round_start_millis, now);
        state.round_over = true;
        state.round_winner = Some(winner);

        info!(
            %winner,
            round = state.round,
            score,
            duration = state.round_duration,
            "round won"
        );
        events.push(RoundEvent::RoundWon {
            winner,
            round: state.round,
            duration_secs: state.round_duration,
            score,
            moves: state.moves(winner),
        });

        if score >= self.config.winning_score {
            state.match_over = true;
            info!(%winner, "match over");
            events.push(RoundEvent::MatchOver {
                ranking: state.scores.clone(),
            });
            return;
        }

        state.round_start_millis = now + self.config.round_start_millis;
        let seconds = countdown_seconds(self.config.round_start_millis);
        state.next_round_start_seconds = seconds;
        events.push(RoundEvent::Countdown { seconds });
    }

    // -----------------------------------------------------------------------
    // Periodic tick
    // -----------------------------------------------------------------------

    /// Advances timing: starts the next round once its countdown has run
    /// out and keeps the countdown display current.
    ///
    /// This is the only path that starts a round. Does nothing once the
    /// match is over.
    pub fn tick(&mut self, state: &mut GameState) -> Vec<RoundEvent> {
        if state.match_over {
            return Vec::new();
        }

        let now = self.clock.now_millis();
        let millis_to_next_round = state.round_start_millis as i64 - now as i64;
        let mut events = Vec::new();

        if (!state.game_started || state.round_over) && millis_to_next_round <= 0 {
            self.reset_round(state);
            events.push(RoundEvent::RoundStarted { round: state.round });
        }

        let seconds = if millis_to_next_round > 0 {
            countdown_seconds(millis_to_next_round as u64)
        } else {
            0
        };
        if seconds != state.next_round_start_seconds {
            state.next_round_start_seconds = seconds;
            events.push(RoundEvent::Countdown { seconds });
        }

        trace!(now, millis_to_next_round, "tick");
        events
    }

    fn reset_round(&mut self, state: &mut GameState) {
        let blank = Pattern::blank(self.config.grid_size);
        for pattern in state.player_patterns.values_mut() {
            *pattern = blank.clone();
        }
        state.target_pattern = self.generate_pattern();
        state.round_over = false;
        state.game_started = true;
        state.round += 1;
        state.player_moves.clear();
        state.total_moves = 0;

        info!(
            round = state.round,
            players = state.player_patterns.len(),
            "round started"
        );
    }

    // -----------------------------------------------------------------------
    // Roster changes
    // -----------------------------------------------------------------------

    /// Adds a player to the roster. Calling it again for someone already
    /// on it keeps their score and grid.
    pub fn player_joined(&self, state: &mut GameState, player: PlayerId) -> Vec<RoundEvent> {
        let mut added = false;
        if !state.scores.contains_key(&player) {
            state.scores.insert(player, 0);
            added = true;
        }
        if !state.player_patterns.contains_key(&player) {
            state
                .player_patterns
                .insert(player, Pattern::blank(self.config.grid_size));
            added = true;
        }

        if !added {
            debug!(%player, "already on the roster");
            return Vec::new();
        }
        info!(%player, players = state.player_patterns.len(), "player joined");
        vec![RoundEvent::PlayerJoined { player }]
    }

    /// Removes a player and everything tracked for them. The result of a
    /// round that already ended stands.
    pub fn player_left(&self, state: &mut GameState, player: PlayerId) -> Vec<RoundEvent> {
        let had_score = state.scores.remove(&player).is_some();
        let had_pattern = state.player_patterns.remove(&player).is_some();
        state.player_ready.remove(&player);
        state.player_moves.remove(&player);

        if !(had_score || had_pattern) {
            debug!(%player, "leave from non-member, ignoring");
            return Vec::new();
        }
        info!(%player, players = state.player_patterns.len(), "player left");
        vec![RoundEvent::PlayerLeft { player }]
    }

    fn generate_pattern(&mut self) -> Pattern {
        Pattern::random(self.config.grid_size, self.config.colour_count, &mut self.rng)
    }
}

/// `to − from` in seconds, truncated (not rounded) to centiseconds.
fn truncated_seconds(from: u64, to: u64) -> f64 {
    let centis = (to as i64 - from as i64).div_euclid(10);
    centis as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualClock, Phase};

    fn engine(clock: &ManualClock) -> RoundEngine<ManualClock> {
        RoundEngine::seeded(RoundConfig::default(), clock.clone(), 42)
    }

    /// Set up two players and run the first round's countdown out.
    fn started(clock: &ManualClock) -> (RoundEngine<ManualClock>, GameState) {
        let mut engine = engine(clock);
        let mut state = engine.setup(&[PlayerId(1), PlayerId(2)]);
        clock.advance(30_000);
        engine.tick(&mut state);
        (engine, state)
    }

    #[test]
    fn test_truncated_seconds_truncates() {
        assert_eq!(truncated_seconds(1_000, 4_259), 3.25);
        assert_eq!(truncated_seconds(0, 9), 0.0);
        assert_eq!(truncated_seconds(0, 12_345), 12.34);
    }

    #[test]
    fn test_setup_seeds_countdown_and_blank_grids() {
        let clock = ManualClock::new(500);
        let state = engine(&clock).setup(&[PlayerId(1), PlayerId(2)]);
        assert_eq!(state.round_start_millis(), 30_500);
        assert_eq!(state.next_round_start_seconds(), 30);
        assert!(!state.game_started());
        assert_eq!(state.phase(), Phase::PreGame);
        assert_eq!(state.target_pattern().len(), 9);
        for player in [PlayerId(1), PlayerId(2)] {
            assert_eq!(state.score(player), Some(0));
            assert_eq!(state.player_pattern(player), Some(&Pattern::blank(9)));
        }
    }

    #[test]
    fn test_tick_before_deadline_only_counts_down() {
        let clock = ManualClock::new(0);
        let mut engine = engine(&clock);
        let mut state = engine.setup(&[PlayerId(1)]);

        clock.advance(1_500);
        let events = engine.tick(&mut state);
        assert_eq!(events, vec![RoundEvent::Countdown { seconds: 29 }]);
        assert!(!state.game_started());

        // Same second: nothing to report.
        clock.advance(100);
        assert!(engine.tick(&mut state).is_empty());
    }

    #[test]
    fn test_tick_at_deadline_starts_first_round() {
        let clock = ManualClock::new(0);
        let mut engine = engine(&clock);
        let mut state = engine.setup(&[PlayerId(1)]);

        clock.advance(30_000);
        let events = engine.tick(&mut state);
        assert_eq!(
            events,
            vec![
                RoundEvent::RoundStarted { round: 1 },
                RoundEvent::Countdown { seconds: 0 },
            ]
        );
        assert_eq!(state.phase(), Phase::InProgress);
        assert_eq!(state.round(), 1);
    }

    #[test]
    fn test_mutate_before_start_is_rejected() {
        let clock = ManualClock::new(0);
        let mut engine = engine(&clock);
        let mut state = engine.setup(&[PlayerId(1)]);
        let before = state.clone();

        let err = engine.mutate_cell(&mut state, Some(PlayerId(1)), 0).unwrap_err();
        assert_eq!(err, InvalidAction::NotStarted);
        assert_eq!(state, before);
    }

    #[test]
    fn test_mutate_out_of_range_is_rejected_unchanged() {
        let clock = ManualClock::new(0);
        let (engine, mut state) = started(&clock);
        let before = state.clone();

        let err = engine.mutate_cell(&mut state, Some(PlayerId(1)), 9).unwrap_err();
        assert_eq!(err, InvalidAction::CellOutOfRange { index: 9, size: 9 });
        assert_eq!(state, before);
    }

    #[test]
    fn test_mutate_counts_moves() {
        let clock = ManualClock::new(0);
        let (engine, mut state) = started(&clock);
        state.target_pattern = Pattern::from(vec![2; 9]);

        for _ in 0..3 {
            engine.mutate_cell(&mut state, Some(PlayerId(1)), 0).unwrap();
        }
        assert_eq!(state.phase(), Phase::InProgress);
        assert_eq!(state.moves(PlayerId(1)), 3);
        assert_eq!(state.moves(PlayerId(2)), 0);
        assert_eq!(state.total_moves(), 3);
    }

    #[test]
    fn test_win_on_last_click() {
        let clock = ManualClock::new(0);
        let (engine, mut state) = started(&clock);
        state.target_pattern = Pattern::from(vec![0, 0, 0, 0, 2, 0, 0, 0, 0]);

        clock.advance(1_234);
        engine.mutate_cell(&mut state, Some(PlayerId(1)), 4).unwrap();
        assert_eq!(state.phase(), Phase::InProgress);

        let events = engine.mutate_cell(&mut state, Some(PlayerId(1)), 4).unwrap();
        assert_eq!(
            events[1],
            RoundEvent::RoundWon {
                winner: PlayerId(1),
                round: 1,
                duration_secs: 1.23,
                score: 1,
                moves: 2,
            }
        );
        assert_eq!(events[2], RoundEvent::Countdown { seconds: 5 });
        assert_eq!(state.round_start_millis(), 31_234 + 5_000);
        assert_eq!(state.round_end_time(), Some(31_234));
    }

    #[test]
    fn test_dispatch_rejects_spectator_ready() {
        let clock = ManualClock::new(0);
        let mut engine = engine(&clock);
        let mut state = engine.setup(&[PlayerId(1)]);
        let err = engine.dispatch(&mut state, None, Action::MarkReady).unwrap_err();
        assert_eq!(err, InvalidAction::Spectator);
    }

    #[test]
    fn test_dispatch_routes_cell_action() {
        let clock = ManualClock::new(0);
        let (engine, mut state) = started(&clock);
        let events = engine
            .dispatch(&mut state, Some(PlayerId(2)), Action::InteractWithCell { cell: 4 })
            .unwrap();
        assert_eq!(
            events[0],
            RoundEvent::CellChanged {
                player: PlayerId(2),
                cell: 4,
                colour: 1
            }
        );
        assert_eq!(state.player_pattern(PlayerId(2)).unwrap().get(4), Some(1));
    }

    #[test]
    fn test_mark_ready_from_non_member_is_ignored() {
        let clock = ManualClock::new(0);
        let mut engine = engine(&clock);
        let mut state = engine.setup(&[PlayerId(1)]);
        let before = state.clone();
        assert!(engine.mark_ready(&mut state, PlayerId(9)).is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn test_mark_ready_twice_reports_once() {
        let clock = ManualClock::new(0);
        let mut engine = engine(&clock);
        let mut state = engine.setup(&[PlayerId(1), PlayerId(2)]);
        assert_eq!(
            engine.mark_ready(&mut state, PlayerId(1)),
            vec![RoundEvent::PlayerReady { player: PlayerId(1) }]
        );
        assert!(engine.mark_ready(&mut state, PlayerId(1)).is_empty());
    }

    #[test]
    fn test_leave_of_unknown_player_is_noop() {
        let clock = ManualClock::new(0);
        let mut engine = engine(&clock);
        let mut state = engine.setup(&[PlayerId(1)]);
        let before = state.clone();
        assert!(engine.player_left(&mut state, PlayerId(5)).is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn test_seeded_engines_agree_on_targets() {
        let clock = ManualClock::new(0);
        let a = engine(&clock).setup(&[PlayerId(1)]);
        let b = engine(&clock).setup(&[PlayerId(1)]);
        assert_eq!(a.target_pattern(), b.target_pattern());
    }
}
