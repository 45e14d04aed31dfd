//! Randomized checks of the move engine's invariants

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use shared::{GameOutcome, GameSession, Grid, GridPoint, MoveError, Orientation, PlayerId};

fn every_line(grid: &Grid) -> Vec<(GridPoint, Orientation)> {
    let mut lines = Vec::new();
    for point in grid.all_points() {
        if point.x + 1 < grid.width() {
            lines.push((point, Orientation::Horizontal));
        }
        if point.y + 1 < grid.height() {
            lines.push((point, Orientation::Vertical));
        }
    }
    lines
}

fn seated(width: i32, height: i32, players: i32) -> GameSession {
    let mut session = GameSession::new(Grid::new(width, height).unwrap());
    for id in 0..players {
        session.add_player(id, format!("P{}", id), None);
    }
    session.start();
    session
}

/// Plays random full games, checking scores, turns and termination after every move
#[test]
fn random_games_respect_the_rules() {
    let mut rng = StdRng::seed_from_u64(0xD075);

    for _ in 0..200 {
        let width = rng.gen_range(2..7);
        let height = rng.gen_range(2..7);
        let players = rng.gen_range(1..5);
        let mut session = seated(width, height, players);

        let mut lines = every_line(session.grid());
        assert_eq!(
            lines.len() as i32,
            width * (height - 1) + height * (width - 1)
        );
        lines.shuffle(&mut rng);

        let mut history: Vec<(GridPoint, Orientation, PlayerId)> = Vec::new();
        let total = lines.len();

        for (index, (point, orientation)) in lines.into_iter().enumerate() {
            assert!(!session.finished());
            let mover = session.current_player();
            let result = session.apply_move(mover, point, orientation).unwrap();

            assert_eq!(
                result.total_score as usize,
                session.board.claimed_boxes().len()
            );
            if result.scored() {
                if !session.finished() {
                    assert_eq!(session.current_player(), mover);
                }
            } else {
                assert_eq!(session.current_player(), (mover + 1) % players);
            }

            // earlier claims never change hands
            for (point, orientation, owner) in &history {
                assert_eq!(
                    session.board.line_owner(*point, *orientation),
                    Some(*owner)
                );
            }
            history.push((point, orientation, mover));

            let last = index + 1 == total;
            assert_eq!(session.finished(), last);
            assert_eq!(result.outcome.is_some(), last);
        }

        let top = session
            .players
            .iter()
            .map(|(_, player)| player.score)
            .max()
            .unwrap();
        match session.outcome().unwrap() {
            GameOutcome::Winner(id) => {
                assert_eq!(session.players.get(id).unwrap().score, top);
            }
            GameOutcome::Tie(ids) => {
                assert!(ids.len() > 1);
                assert!(ids
                    .iter()
                    .all(|id| session.players.get(*id).unwrap().score == top));
            }
        }
        assert_eq!(session.players.total_score(), session.grid().max_spaces());
    }
}

/// Redrawing any claimed line is refused and leaves the session untouched
#[test]
fn claimed_lines_cannot_be_redrawn() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..50 {
        let mut session = seated(4, 4, 2);
        let mut lines = every_line(session.grid());
        lines.shuffle(&mut rng);
        let played = rng.gen_range(1..lines.len());

        for (point, orientation) in &lines[..played] {
            let mover = session.current_player();
            session.apply_move(mover, *point, *orientation).unwrap();
        }

        let before = session.board.claimed_lines();
        let current = session.current_player();
        let (point, orientation) = *lines[..played].choose(&mut rng).unwrap();
        assert_eq!(
            session.apply_move(current, point, orientation),
            Err(MoveError::LineTaken)
        );
        assert_eq!(session.board.claimed_lines(), before);
        assert_eq!(session.current_player(), current);
    }
}

/// Text forms read back to the same value across the whole legal range
#[test]
fn text_forms_round_trip() {
    let mut rng = StdRng::seed_from_u64(0x6121D);

    for _ in 0..1000 {
        let grid = Grid::new(
            rng.gen_range(Grid::MIN_EXTENT..=Grid::MAX_EXTENT),
            rng.gen_range(Grid::MIN_EXTENT..=Grid::MAX_EXTENT),
        )
        .unwrap();
        assert_eq!(grid.to_string().parse::<Grid>(), Ok(grid));

        let point = GridPoint::new(
            rng.gen_range(-1_000_000..=1_000_000),
            rng.gen_range(-1_000_000..=1_000_000),
        );
        assert_eq!(point.to_string().parse::<GridPoint>(), Ok(point));
    }

    for point in [
        GridPoint::new(i32::MIN, i32::MAX),
        GridPoint::new(-1, 0),
        GridPoint::new(0, -1),
    ] {
        assert_eq!(point.to_string().parse::<GridPoint>(), Ok(point));
    }
}
