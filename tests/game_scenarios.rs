// tests/game_scenarios.rs
use std::path::Path;

use kungfu_chess::game::GAME_OVER_LINGER_MS;
use kungfu_chess::{
    Action, Board, Cell, CommandOutcome, Game, GameConfig, GameEvent, MoveError, PieceTemplateFactory, Side,
};

const PIECES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/pieces");
const GAME_JSON: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/game.json");
const TICK_MS: u64 = 16;

fn game_with(spawns: &[(&str, Side, Cell)]) -> Game {
    let mut factory = PieceTemplateFactory::new(Board::default(), PIECES);
    let pieces: Vec<_> = spawns.iter()
        .map(|(piece_type, side, cell)| factory.create_piece(piece_type, *side, *cell).unwrap())
        .collect();
    let mut game = Game::new(Board::default(), pieces);
    game.start(0);
    game
}

/// Ticks the game from `from` (exclusive) to `to` (inclusive) at a fixed cadence.
fn run(game: &mut Game, from: u64, to: u64) {
    let mut now = from;
    while now < to {
        now = (now + TICK_MS).min(to);
        game.tick(now);
    }
}

#[test]
fn standard_setup_loads_from_the_shipped_config() {
    let config = GameConfig::load(Path::new(GAME_JSON)).unwrap();
    let mut game = Game::from_config(&config).unwrap();
    game.start(0);
    assert_eq!(game.pieces().count(), 32);
    assert_eq!(game.piece_at((0, 4)).unwrap().id(), "KB_0");
    assert_eq!(game.piece_at((7, 3)).unwrap().id(), "QW_0");
    assert_eq!(game.piece("PW_4").unwrap().current_cell(), (6, 4));

    // opening moves: pawn double step and a knight hop are fine, the rook is boxed in
    assert_eq!(game.check_move(Side::White, "PW_4", (4, 4)), Ok(None));
    assert_eq!(game.check_move(Side::White, "NW_0", (5, 2)), Ok(None));
    assert_eq!(game.check_move(Side::White, "RW_0", (5, 0)), Err(MoveError::PathBlocked { from: (7, 0), to: (5, 0) }));
    assert_eq!(game.check_move(Side::White, "BW_0", (5, 4)), Err(MoveError::PathBlocked { from: (7, 2), to: (5, 4) }));
    assert_eq!(game.check_move(Side::Black, "PW_4", (4, 4)), Err(MoveError::NotOwner("PW_4".into())));
}

#[test]
fn sliding_piece_cannot_pass_through_an_ally() {
    let game = game_with(&[("RW", Side::White, (0, 0)), ("NW", Side::White, (0, 1)), ("RB", Side::Black, (0, 2))]);
    assert_eq!(game.check_move(Side::White, "RW_0", (0, 2)), Err(MoveError::PathBlocked { from: (0, 0), to: (0, 2) }));
    assert_eq!(game.check_move(Side::White, "RW_0", (0, 1)), Err(MoveError::OccupiedByOwnSide((0, 1))));
}

#[test]
fn pawn_cannot_capture_straight_ahead() {
    let game = game_with(&[("PW", Side::White, (6, 3)), ("PB", Side::Black, (5, 3))]);
    assert!(matches!(game.check_move(Side::White, "PW_0", (5, 3)), Err(MoveError::PawnRule(_))));
    assert!(matches!(game.check_move(Side::Black, "PB_0", (6, 3)), Err(MoveError::PawnRule(_))));
}

#[test]
fn pawn_double_step_needs_a_clear_middle_cell() {
    let game = game_with(&[("PW", Side::White, (6, 3)), ("NB", Side::Black, (5, 3)), ("PB", Side::Black, (1, 0))]);
    assert!(matches!(game.check_move(Side::White, "PW_0", (4, 3)), Err(MoveError::PawnRule(_))));
    assert_eq!(game.check_move(Side::Black, "PB_0", (3, 0)), Ok(None));
}

#[test]
fn pawn_diagonal_needs_an_enemy() {
    let game = game_with(&[("PW", Side::White, (6, 3)), ("PW", Side::White, (5, 4)), ("PB", Side::Black, (5, 2))]);
    assert!(matches!(game.check_move(Side::White, "PW_0", (5, 4)), Err(MoveError::PawnRule(_))));
    assert_eq!(game.check_move(Side::White, "PW_0", (5, 2)), Ok(Some("PB_0".into())));
}

#[test]
fn pieces_in_motion_are_neither_commandable_nor_capturable() {
    let mut game = game_with(&[("QW", Side::White, (4, 0)), ("RB", Side::Black, (0, 7))]);
    assert_eq!(game.try_move(Side::Black, "RB_0", (7, 7), 0), Ok(None));
    run(&mut game, 0, 2700); // 1.5 m/s: about four cells in
    assert_eq!(game.piece("RB_0").unwrap().current_cell(), (4, 7));
    assert_eq!(game.piece("RB_0").unwrap().state_name(), "move");

    assert_eq!(game.check_move(Side::Black, "RB_0", (4, 6)), Err(MoveError::Rejected(CommandOutcome::RejectedNotIdle)));
    assert_eq!(game.check_move(Side::White, "QW_0", (4, 7)), Err(MoveError::TargetNotIdle("RB_0".into())));
    assert!(game.try_move(Side::White, "QW_0", (4, 7), 2700).is_err());
    assert_eq!(game.piece("QW_0").unwrap().current_cell(), (4, 0));
    assert!(game.piece("QW_0").unwrap().is_idle());
}

#[test]
fn a_move_ends_in_rest_before_the_piece_is_idle_again() {
    let mut game = game_with(&[("NW", Side::White, (7, 1))]);
    assert_eq!(game.try_move(Side::White, "NW_0", (5, 2), 0), Ok(None));
    run(&mut game, 0, 1600); // sqrt(5) m at 1.5 m/s is ~1491 ms
    let knight = game.piece("NW_0").unwrap();
    assert_eq!(knight.state_name(), "long_rest");
    assert_eq!(knight.current_cell(), (5, 2));
    assert!(!knight.is_idle());

    run(&mut game, 1600, 3600);
    let knight = game.piece("NW_0").unwrap();
    assert_eq!(knight.state_name(), "idle");
    assert_eq!(knight.current_cell(), (5, 2));
    assert_eq!(game.check_move(Side::White, "NW_0", (7, 1)), Ok(None));
}

#[test]
fn jumping_piece_dodges_capture_then_rests() {
    let mut game = game_with(&[("KW", Side::White, (7, 4)), ("RB", Side::Black, (0, 4))]);
    assert_eq!(game.try_jump(Side::White, "KW_0", 0), Ok(()));
    assert_eq!(game.check_move(Side::Black, "RB_0", (7, 4)), Err(MoveError::TargetNotIdle("KW_0".into())));

    run(&mut game, 0, 600);
    assert_eq!(game.piece("KW_0").unwrap().state_name(), "short_rest");
    run(&mut game, 600, 1600);
    let king = game.piece("KW_0").unwrap();
    assert!(king.is_idle());
    assert_eq!(king.current_cell(), (7, 4));
}

#[test]
fn capturing_the_king_reports_game_over_exactly_once() {
    let mut game = game_with(&[
        ("RW", Side::White, (7, 4)),
        ("KB", Side::Black, (0, 4)),
        ("RB", Side::Black, (0, 0)),
        ("KW", Side::White, (7, 7)),
    ]);
    game.drain_events();
    assert_eq!(game.try_move(Side::White, "RW_0", (0, 4), 100), Ok(Some("KB_0".into())));
    assert_eq!(game.winner(), Some(Side::White));
    assert_eq!(game.try_move(Side::Black, "RB_0", (7, 0), 120), Err(MoveError::GameOver));
    run(&mut game, 100, 5000);
    assert_eq!(game.piece("RW_0").unwrap().current_cell(), (0, 4));

    let events = game.drain_events();
    let game_overs: Vec<_> = events.iter().filter(|e| matches!(e, GameEvent::GameOver { .. })).collect();
    assert_eq!(game_overs.len(), 1);
    assert!(matches!(events[0], GameEvent::PieceMoved { ref piece_id, captured: Some(_), .. } if piece_id == "RW_0"));
    assert!(game.is_finished(100 + GAME_OVER_LINGER_MS));
}

#[test]
fn cursor_select_and_move_on_the_standard_board() {
    let config = GameConfig::load(Path::new(GAME_JSON)).unwrap();
    let mut game = Game::from_config(&config).unwrap();
    game.start(0);
    game.drain_events();

    game.handle_action(Side::White, Action::Up, 0).unwrap();
    game.handle_action(Side::White, Action::Select, 0).unwrap();
    assert_eq!(game.control(Side::White).selected(), Some("PW_0"));
    // black may not pick up a white piece
    for _ in 0..6 { game.handle_action(Side::Black, Action::Down, 0).unwrap(); }
    game.handle_action(Side::Black, Action::Select, 0).unwrap();
    assert_eq!(game.control(Side::Black).selected(), None);

    game.handle_action(Side::White, Action::Up, 0).unwrap();
    game.handle_action(Side::White, Action::Up, 0).unwrap();
    game.handle_action(Side::White, Action::Up, 0).unwrap();
    assert!(matches!(game.handle_action(Side::White, Action::Select, 0), Err(MoveError::PawnRule(_))));
    assert_eq!(game.control(Side::White).selected(), Some("PW_0"));

    game.handle_action(Side::White, Action::Down, 0).unwrap();
    game.handle_action(Side::White, Action::Select, 0).unwrap();
    assert_eq!(game.control(Side::White).selected(), None);
    assert_eq!(game.piece("PW_0").unwrap().state_name(), "move");
    assert_eq!(game.drain_events(), vec![GameEvent::PieceMoved {
        side: Side::White,
        piece_id: "PW_0".into(),
        from: (6, 0),
        to: (4, 0),
        captured: None,
    }]);

    run(&mut game, 0, 4000);
    assert_eq!(game.piece_at((4, 0)).unwrap().id(), "PW_0");
    assert!(game.piece("PW_0").unwrap().is_idle());
}
