// src/main.rs
use lazy_static::lazy_static;
use regex::Regex;
use std::env;
use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use kungfu_chess::{Action, Game, GameConfig, GameEvent, MoveError, Side};
use tracing::{info, warn, Level};

// --- Constants ---
const DEFAULT_CONFIG_PATH: &str = "assets/game.json";
const MAX_WAIT_MS: u64 = 10 * 60 * 1000; // one wait may not skip more than ten minutes

// --- Input Parsing ---

lazy_static! {
    static ref PLAYER_ACTION: Regex = Regex::new(r"^(?i)(white|black|w|b)\s+(\w+)$").unwrap();
    static ref MOVE_CMD: Regex = Regex::new(r"^(?i)move\s+(\S+)\s+(-?\d+)\s+(-?\d+)$").unwrap();
    static ref JUMP_CMD: Regex = Regex::new(r"^(?i)jump\s+(\S+)$").unwrap();
    static ref WAIT_CMD: Regex = Regex::new(r"^(?i)wait\s+(\d+)$").unwrap();
}

#[derive(Debug, PartialEq)]
enum UserInput {
    Player(Side, Action),       // e.g. "white up", "b select"
    Move(String, i32, i32),     // move <id> <row> <col>
    Jump(String),               // jump <id>
    Wait(u64),                  // advance the clock
    Show,
    Events,
    Help,
    Quit,
}

#[derive(Debug, PartialEq)]
enum InputError {
    UnknownCommand(String),
    UnknownAction(String),
    InvalidArgument(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::UnknownCommand(s) => write!(f, "Unknown command '{}'. Type 'help' for the list.", s),
            InputError::UnknownAction(s) => write!(f, "Unknown action '{}' (up, down, left, right, select, jump, cancel)", s),
            InputError::InvalidArgument(s) => write!(f, "Invalid argument: {}", s),
        }
    }
}

impl Error for InputError {}

/// Parses one line of driver input.
fn parse_user_input(input: &str) -> Result<UserInput, InputError> {
    let trimmed = input.trim();

    match trimmed.to_lowercase().as_str() {
        "show" | "board" => return Ok(UserInput::Show),
        "events" | "history" => return Ok(UserInput::Events),
        "help" | "?" => return Ok(UserInput::Help),
        "quit" | "exit" => return Ok(UserInput::Quit),
        _ => {}
    }

    if let Some(caps) = PLAYER_ACTION.captures(trimmed) {
        let side = match caps[1].to_lowercase().as_str() {
            "white" | "w" => Side::White,
            _ => Side::Black,
        };
        let action = Action::from_name(&caps[2]).ok_or_else(|| InputError::UnknownAction(caps[2].to_string()))?;
        return Ok(UserInput::Player(side, action));
    }
    if let Some(caps) = MOVE_CMD.captures(trimmed) {
        let row = parse_number(&caps[2])?;
        let col = parse_number(&caps[3])?;
        return Ok(UserInput::Move(caps[1].to_string(), row, col));
    }
    if let Some(caps) = JUMP_CMD.captures(trimmed) {
        return Ok(UserInput::Jump(caps[1].to_string()));
    }
    if let Some(caps) = WAIT_CMD.captures(trimmed) {
        let ms: u64 = caps[1].parse().map_err(|_| InputError::InvalidArgument(caps[1].to_string()))?;
        if ms > MAX_WAIT_MS {
            return Err(InputError::InvalidArgument(format!("wait of {} ms is longer than {} ms", ms, MAX_WAIT_MS)));
        }
        return Ok(UserInput::Wait(ms));
    }
    Err(InputError::UnknownCommand(trimmed.to_string()))
}

fn parse_number(s: &str) -> Result<i32, InputError> {
    s.parse().map_err(|_| InputError::InvalidArgument(format!("'{}' is not a board coordinate", s)))
}

// --- Session ---

/// The simulated clock and everything the driver has seen so far.
struct Session {
    game: Game,
    now: u64,
    tick_ms: u64,
    history: Vec<GameEvent>,
}

impl Session {
    fn new(mut game: Game, tick_ms: u64) -> Self {
        game.start(0);
        let mut session = Session { game, now: 0, tick_ms: tick_ms.max(1), history: Vec::new() };
        session.flush_events();
        session
    }

    /// Advances the clock by `ms` in fixed ticks. Stops early once the match is finished.
    fn wait(&mut self, ms: u64) {
        let end = self.now + ms;
        while self.now < end && !self.game.is_finished(self.now) {
            self.now = (self.now + self.tick_ms).min(end);
            self.game.tick(self.now);
        }
        self.flush_events();
    }

    /// Prints new events as JSON lines and keeps them for `events`.
    fn flush_events(&mut self) {
        for event in self.game.drain_events() {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!(error = %e, "could not serialise event"),
            }
            self.history.push(event);
        }
    }

    fn apply(&mut self, input: UserInput) {
        let now = self.now;
        let result = match input {
            UserInput::Player(side, action) => self.game.handle_action(side, action, now),
            UserInput::Move(id, row, col) => match self.game.piece(&id).map(|p| p.side()) {
                Some(side) => self.game.try_move(side, &id, (row, col), now).map(|_| ()),
                None => Err(MoveError::UnknownPiece(id)),
            },
            UserInput::Jump(id) => match self.game.piece(&id).map(|p| p.side()) {
                Some(side) => self.game.try_jump(side, &id, now),
                None => Err(MoveError::UnknownPiece(id)),
            },
            UserInput::Wait(ms) => {
                self.wait(ms);
                println!("Clock: {} ms", self.now);
                Ok(())
            }
            UserInput::Show => {
                println!("Clock: {} ms", self.now);
                println!("{}", self.game);
                Ok(())
            }
            UserInput::Events => {
                match serde_json::to_string_pretty(&self.history) {
                    Ok(text) => println!("{}", text),
                    Err(e) => eprintln!("Error: could not serialise events: {}", e),
                }
                Ok(())
            }
            UserInput::Help => {
                print_help();
                Ok(())
            }
            UserInput::Quit => Ok(()), // handled by the loop
        };
        if let Err(e) = result {
            println!("Rejected: {}", e);
        }
        self.flush_events();
    }
}

// --- Main ---

fn load_config(arg: Option<String>) -> Result<GameConfig, Box<dyn Error>> {
    let path = match arg {
        Some(p) => PathBuf::from(p),
        None if Path::new(DEFAULT_CONFIG_PATH).is_file() => PathBuf::from(DEFAULT_CONFIG_PATH),
        None => {
            info!("no config file, using defaults");
            return Ok(GameConfig::default());
        }
    };
    let config = GameConfig::load(&path)?;
    info!(path = %path.display(), tick_ms = config.tick_ms, "config loaded");
    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::INFO)
        .init();

    let config = load_config(env::args().nth(1))?;
    let game = match Game::from_config(&config) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("Error: could not set up the game: {}", e);
            return Err(e.into());
        }
    };

    println!("==============================");
    println!("|      Kung Fu Chess         |");
    println!("==============================");
    print_help();

    let mut session = Session::new(game, config.tick_ms);
    println!("{}", session.game);

    'game_loop: loop {
        if session.game.is_finished(session.now) {
            println!("------------------------------------------");
            println!("{}", session.game);
            if let Some(winner) = session.game.winner() {
                println!("\n=== GAME OVER: {:?} wins. ===", winner);
            }
            break 'game_loop;
        }

        print!("[{} ms] > ", session.now);
        io::stdout().flush()?;

        let mut input_line = String::new();
        match io::stdin().read_line(&mut input_line) {
            Ok(0) => {
                println!("\nEnd of input detected. Quitting.");
                break 'game_loop;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {}. Try again or use 'quit'.", e);
                continue 'game_loop;
            }
        }

        let input_trimmed = input_line.trim();
        if input_trimmed.is_empty() { continue 'game_loop; }

        match parse_user_input(input_trimmed) {
            Ok(UserInput::Quit) => {
                println!("Quitting.");
                break 'game_loop;
            }
            Ok(input) => session.apply(input),
            Err(e) => println!("Input Error: {}", e),
        }
    }

    println!("\nGame session finished at {} ms.", session.now);
    Ok(())
}

/// Prints available commands.
fn print_help() {
    println!("\nAvailable Commands:");
    println!("  white|black <action>   Player input: up, down, left, right, select, jump, cancel.");
    println!("                         'select' picks an idle piece under the cursor, then moves it");
    println!("                         to the cursor on the next 'select' (same cell deselects).");
    println!("  move <id> <row> <col>  Command a piece directly (e.g. move PW_4 4 4).");
    println!("  jump <id>              Make a piece jump in place.");
    println!("  wait <ms>              Advance the clock; pieces keep moving in real time.");
    println!("  show                   Print the board, cursors and busy pieces.");
    println!("  events                 Print every event so far as JSON.");
    println!("  help                   Show this help message.");
    println!("  quit / exit            Leave the game.");
    println!();
}
