//! Counter deltas implied by a finished match.

use crate::dao::models::{GameMode, MatchWinner, ProfileCounters};

/// Outcome of a match and the counters it credits to each participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    pub winner: MatchWinner,
    pub player1: ProfileCounters,
    /// `None` when player 2 is a bot.
    pub player2: Option<ProfileCounters>,
}

/// Compute the winner and counter deltas of a match.
///
/// Every real participant plays one more match. A strictly greater score wins; equal scores are
/// a draw and credit no win. Mode counters follow the same rule, except bot mode which only
/// ever credits player 1. A bot never receives anything.
pub fn tally(mode: GameMode, p1_score: u32, p2_score: u32, player2_is_bot: bool) -> Tally {
    let winner = match p1_score.cmp(&p2_score) {
        std::cmp::Ordering::Greater => MatchWinner::Player1,
        std::cmp::Ordering::Less => MatchWinner::Player2,
        std::cmp::Ordering::Equal => MatchWinner::Draw,
    };

    let mut player1 = ProfileCounters {
        total_played: 1,
        ..Default::default()
    };
    let mut player2 = ProfileCounters {
        total_played: 1,
        ..Default::default()
    };

    match winner {
        MatchWinner::Player1 => player1.total_won += 1,
        MatchWinner::Player2 => player2.total_won += 1,
        MatchWinner::Draw => {}
    }

    match mode {
        GameMode::Local => {
            player1.local_played += 1;
            player2.local_played += 1;
            match winner {
                MatchWinner::Player1 => player1.local_won += 1,
                MatchWinner::Player2 => player2.local_won += 1,
                MatchWinner::Draw => {}
            }
        }
        GameMode::Tournament => {
            player1.tournament_played += 1;
            player2.tournament_played += 1;
            match winner {
                MatchWinner::Player1 => player1.tournament_won += 1,
                MatchWinner::Player2 => player2.tournament_won += 1,
                MatchWinner::Draw => {}
            }
        }
        GameMode::Bot => {
            player1.bot_played += 1;
            if winner == MatchWinner::Player1 {
                player1.bot_won += 1;
            }
        }
    }

    Tally {
        winner,
        player1,
        player2: (!player2_is_bot).then_some(player2),
    }
}
