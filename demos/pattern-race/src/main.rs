//! A local match between bots.
//!
//! Every bot readies up, then races to copy each round's target one click
//! at a time with a random human-ish delay between clicks. A spectator
//! subscription narrates the match, encodes what a viewer would receive,
//! and reports the final ranking.
//!
//! Run with `RUST_LOG=debug` to see the room and engine logs as well.

use std::collections::BTreeMap;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tilematch::prelude::*;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

const BOTS: u64 = 3;

/// Slowest and fastest a bot clicks, in milliseconds.
const CLICK_DELAY_MS: std::ops::RangeInclusive<u64> = 80..=400;

// ---------------------------------------------------------------------------
// Bots
// ---------------------------------------------------------------------------

/// Plays until the match is decided or the room goes away.
async fn bot(
    room: RoomHandle,
    player: PlayerId,
    mut inbox: mpsc::UnboundedReceiver<RoomOutbound>,
    mut rng: StdRng,
) -> Result<(), TilematchError> {
    while let Some(msg) = inbox.recv().await {
        match msg {
            RoomOutbound::Event(RoundEvent::RoundStarted { round }) => {
                play_round(&room, player, round, &mut rng).await?;
            }
            RoomOutbound::Event(RoundEvent::MatchOver { .. }) => break,
            _ => {}
        }
    }
    Ok(())
}

/// Clicks towards the current target until done or beaten to it.
async fn play_round(
    room: &RoomHandle,
    player: PlayerId,
    round: u32,
    rng: &mut StdRng,
) -> Result<(), TilematchError> {
    let Some(game) = room.snapshot().await? else {
        return Ok(());
    };
    // A round this bot fell behind on is already gone.
    if game.round() != round || game.phase() != Phase::InProgress {
        return Ok(());
    }
    let Some(grid) = game.player_pattern(player) else {
        return Ok(());
    };

    let colours = RoundConfig::default().colour_count;
    let mut clicks = grid.clicks_to(game.target_pattern(), colours);
    if clicks.is_empty() {
        // Target equals the blank grid: go all the way round once.
        clicks = vec![0; usize::from(colours)];
    }

    for cell in clicks {
        let delay = rng.random_range(CLICK_DELAY_MS);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        match room
            .act(Some(player), Action::InteractWithCell { cell })
            .await
        {
            Ok(()) => {}
            Err(RoomError::Rejected(InvalidAction::RoundOver | InvalidAction::MatchOver)) => {
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// Runs a full match between `bots` bots and returns the final scores.
async fn run_match(bots: u64, seed: u64) -> Result<BTreeMap<PlayerId, u32>, TilematchError> {
    let engine = RoundEngine::seeded(RoundConfig::default(), TokioClock::new(), seed);
    let room = spawn_room(RoomId(1), RoomConfig::default(), engine);

    let (watch_tx, mut watcher) = mpsc::unbounded_channel();
    room.spectate(watch_tx).await?;

    let mut inboxes = Vec::new();
    for id in 1..=bots {
        let (tx, rx) = mpsc::unbounded_channel();
        room.join(PlayerId(id), tx).await?;
        inboxes.push((PlayerId(id), rx));
    }
    for (player, _) in &inboxes {
        room.act(Some(*player), Action::MarkReady).await?;
    }

    let mut players = JoinSet::new();
    for (player, inbox) in inboxes {
        let rng = StdRng::seed_from_u64(seed ^ player.0);
        players.spawn(bot(room.clone(), player, inbox, rng));
    }

    let mut ranking = None;
    while let Some(msg) = watcher.recv().await {
        // What a transport would put on the wire for a viewer.
        match msg.encode(&JsonCodec) {
            Ok(frame) => debug!(bytes = frame.len(), "spectator frame"),
            Err(e) => warn!(error = %e, "spectator frame not encodable"),
        }
        let RoomOutbound::Event(event) = msg else {
            continue;
        };
        match event {
            RoundEvent::RoundStarted { round } => info!(round, "round started"),
            RoundEvent::RoundWon {
                winner,
                round,
                duration_secs,
                moves,
                ..
            } => info!(%winner, round, duration_secs, moves, "round won"),
            RoundEvent::MatchOver { ranking: scores } => {
                ranking = Some(scores);
                break;
            }
            _ => {}
        }
    }

    while let Some(result) = players.join_next().await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "bot stopped with an error"),
            Err(e) => warn!(error = %e, "bot task failed"),
        }
    }
    room.shutdown().await?;

    ranking.ok_or_else(|| {
        RoomError::InvalidState("room closed before the match was decided".into()).into()
    })
}

#[tokio::main]
async fn main() -> Result<(), TilematchError> {
    tilematch::init_tracing();

    let ranking = run_match(BOTS, rand::random()).await?;

    let mut standings: Vec<_> = ranking.into_iter().collect();
    standings.sort_by(|a, b| b.1.cmp(&a.1));
    for (place, (player, score)) in standings.iter().enumerate() {
        println!("{}. {player}  {score}", place + 1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_bots_play_match_to_the_end() {
        let ranking = run_match(3, 11).await.unwrap();
        assert_eq!(ranking.len(), 3);
        assert_eq!(ranking.values().filter(|&&s| s == 5).count(), 1);
        assert!(ranking.values().all(|&s| s <= 5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_bot_wins_alone() {
        let ranking = run_match(1, 3).await.unwrap();
        assert_eq!(ranking.get(&PlayerId(1)), Some(&5));
    }
}
