//! Random split of confirmed players into two sides.

use rand::Rng;
use rand::seq::SliceRandom;
use uuid::Uuid;

use crate::dao::models::{Roster, TeamSide, Teams};

/// Shuffle `players` and put the first half (rounded up) in team A.
pub fn split<R: Rng + ?Sized>(players: &[Uuid], rng: &mut R) -> Teams {
    let mut shuffled = players.to_vec();
    shuffled.shuffle(rng);
    let team_b = shuffled.split_off(shuffled.len().div_ceil(2));
    Teams {
        team_a: shuffled,
        team_b,
    }
}

/// Record each confirmed player's side.
pub fn assign(roster: &mut Roster, teams: &Teams) {
    for player in &mut roster.confirmed {
        player.team = if teams.team_a.contains(&player.user_id) {
            Some(TeamSide::A)
        } else if teams.team_b.contains(&player.user_id) {
            Some(TeamSide::B)
        } else {
            None
        };
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use time::OffsetDateTime;

    use super::*;

    #[test]
    fn odd_counts_favour_team_a() {
        let players: Vec<Uuid> = (0..7).map(|_| Uuid::new_v4()).collect();
        let teams = split(&players, &mut StdRng::seed_from_u64(7));
        assert_eq!(teams.team_a.len(), 4);
        assert_eq!(teams.team_b.len(), 3);

        let all: HashSet<_> = teams.team_a.iter().chain(&teams.team_b).collect();
        assert_eq!(all.len(), 7);
        assert!(players.iter().all(|player| all.contains(player)));
    }

    #[test]
    fn assignment_marks_every_confirmed_player() {
        let mut roster = Roster::new(2, 10);
        let now = OffsetDateTime::now_utc();
        for _ in 0..4 {
            roster.confirm(Uuid::new_v4(), now).unwrap();
        }
        let ids: Vec<Uuid> = roster.confirmed.iter().map(|p| p.user_id).collect();
        let teams = split(&ids, &mut rand::rng());
        assign(&mut roster, &teams);

        let a = roster.confirmed.iter().filter(|p| p.team == Some(TeamSide::A)).count();
        let b = roster.confirmed.iter().filter(|p| p.team == Some(TeamSide::B)).count();
        assert_eq!((a, b), (2, 2));
    }
}
