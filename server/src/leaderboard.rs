//! Leaderboard ranking: a pure function from a registry snapshot to the
//! ordered entry list that every replica renders.

use tiltmaze_shared::protocol::LeaderboardEntryWire;
use tiltmaze_shared::vec3::{horizontal_distance, Vec3};

use crate::player::Player;

/// Rank players for display: everyone who finished first, ascending by
/// finish time, then everyone still racing, ascending by horizontal distance
/// to the goal. Ties keep the order of the input slice (join order, the way
/// the registry hands it over).
pub fn rank(players: &[&Player], goal: Vec3) -> Vec<LeaderboardEntryWire> {
    let mut finished: Vec<(&Player, f64)> = Vec::new();
    let mut racing: Vec<(&Player, f64)> = Vec::new();

    for player in players {
        match player.finish_time {
            Some(t) => finished.push((player, t)),
            None => racing.push((player, horizontal_distance(player.position, goal))),
        }
    }

    finished.sort_by(|a, b| a.1.total_cmp(&b.1));
    racing.sort_by(|a, b| a.1.total_cmp(&b.1));

    finished
        .into_iter()
        .map(|(player, t)| LeaderboardEntryWire {
            player_id: player.id.clone(),
            info: format!("Finished in {:.1}s", t),
        })
        .chain(racing.into_iter().map(|(player, d)| LeaderboardEntryWire {
            player_id: player.id.clone(),
            info: format!("Distance: {:.2}", d),
        }))
        .collect()
}
