use minesweeper_agent::*;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // --- 1. Initialization ---
    let board = Board::random(8, 8, 8)?;
    let mut game = Game::new(board, AgentConfig::default());

    log::info!(
        "playing a {}x{} board with {} mines",
        game.board.height,
        game.board.width,
        game.board.mine_count()
    );

    // --- 2. Game Loop ---
    while game.game_state == GameState::Playing {
        let Some(mv) = game.step()? else {
            log::warn!("no moves left for the agent");
            break;
        };
        log::info!(
            "move #{}: {:?} {} -> {}",
            game.moves.len(),
            mv.kind,
            mv.cell,
            mv.nearby_mines
                .map_or_else(|| "mine".to_string(), |n| n.to_string())
        );
    }

    // --- 3. Final Result ---
    let guesses = game
        .moves
        .iter()
        .filter(|mv| mv.kind == MoveKind::Random)
        .count();
    match game.game_state {
        GameState::Won => log::info!("the agent won after {} guesses", guesses),
        GameState::Lost => log::info!("the agent hit a mine after {} guesses", guesses),
        GameState::Playing => log::warn!("the game ended unexpectedly"),
    }
    log::info!(
        "known mines: {}, known safes: {}, sentences left: {}",
        game.agent.mines().len(),
        game.agent.safes().len(),
        game.agent.knowledge().len()
    );

    Ok(())
}
