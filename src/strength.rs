use std::cmp::Ordering;

/// League points for one result: 3 win, 1 draw, 0 loss.
pub fn match_points(team_goals: u16, opponent_goals: u16) -> u8 {
    match team_goals.cmp(&opponent_goals) {
        Ordering::Greater => 3,
        Ordering::Equal => 1,
        Ordering::Less => 0,
    }
}

/// Mean points per match over position-aligned goal sequences.
///
/// Returns 0.0 for an empty window. Pairs past the end of the shorter slice
/// are ignored.
pub fn strength_score(team_goals: &[u16], opponent_goals: &[u16]) -> f64 {
    let mut total = 0u32;
    let mut n = 0usize;
    for (tg, og) in team_goals.iter().zip(opponent_goals) {
        total += u32::from(match_points(*tg, *og));
        n += 1;
    }
    if n == 0 {
        return 0.0;
    }
    f64::from(total) / (n as f64)
}

#[cfg(test)]
mod tests {
    use super::{match_points, strength_score};

    #[test]
    fn points_follow_result() {
        assert_eq!(match_points(2, 1), 3);
        assert_eq!(match_points(1, 1), 1);
        assert_eq!(match_points(0, 4), 0);
    }

    #[test]
    fn empty_window_scores_zero() {
        assert_eq!(strength_score(&[], &[]), 0.0);
    }

    #[test]
    fn mixed_results_average() {
        // W, D, L, W
        let s = strength_score(&[2, 1, 0, 3], &[0, 1, 2, 1]);
        assert!((s - 7.0 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn score_stays_in_range() {
        let all_wins = strength_score(&[5, 5, 5], &[0, 0, 0]);
        let all_losses = strength_score(&[0, 0, 0], &[1, 2, 3]);
        assert_eq!(all_wins, 3.0);
        assert_eq!(all_losses, 0.0);
    }
}
