use anyhow::Result;
use boardlens::assets::PieceAssets;
use boardlens::board::Rules;
use boardlens::config::{OpponentConfig, SessionConfig};
use boardlens::eval::{Classification, Overlay};
use boardlens::session::{Intent, Mode, ReplyOutcome, Session, SessionRecord, Side};
use clap::{Parser, ValueEnum};
use cozy_chess::{Color, File, Piece, Rank, Square};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OpponentKind {
    Uci,
    Search,
    Random,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Chess board with square-control overlay and an optional automated opponent", long_about = None)]
struct Args {
    /// JSON session config; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// pvp or pve
    #[arg(long)]
    mode: Option<String>,

    /// Side played by the opponent in pve: white or black
    #[arg(long)]
    engine_side: Option<String>,

    /// Opponent kind
    #[arg(long, value_enum)]
    opponent: Option<OpponentKind>,

    /// UCI engine binary (opponent uci)
    #[arg(long)]
    engine_path: Option<String>,

    /// Search depth (opponent search)
    #[arg(long, default_value_t = 4)]
    depth: u32,

    /// RNG seed (opponent random)
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Time per automated reply in milliseconds
    #[arg(long)]
    think_ms: Option<u64>,

    /// Starting FEN position
    #[arg(long)]
    fen: Option<String>,

    /// Directory with Chess_*45.svg.png piece sprites
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Start with the control overlay hidden
    #[arg(long)]
    no_control: bool,

    /// Start with weak-square marks hidden
    #[arg(long)]
    no_weak: bool,
}

fn parse_mode(s: &str) -> Result<Mode> {
    match s.to_lowercase().as_str() {
        "pvp" => Ok(Mode::Pvp),
        "pve" => Ok(Mode::Pve),
        _ => anyhow::bail!("Invalid mode: use 'pvp' or 'pve'"),
    }
}

fn parse_side(s: &str) -> Result<Side> {
    match s.to_lowercase().as_str() {
        "w" | "white" => Ok(Side::White),
        "b" | "black" => Ok(Side::Black),
        _ => anyhow::bail!("Invalid side: use 'white' or 'black'"),
    }
}

fn build_config(args: &Args) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(m) = &args.mode { config.mode = parse_mode(m)?; }
    if let Some(s) = &args.engine_side { config.automated_side = parse_side(s)?; }
    match args.opponent {
        Some(OpponentKind::Search) => config.opponent = OpponentConfig::Search { depth: args.depth },
        Some(OpponentKind::Random) => config.opponent = OpponentConfig::Random { seed: args.seed },
        Some(OpponentKind::Uci) | None => {
            if args.opponent.is_some() && !matches!(config.opponent, OpponentConfig::Uci { .. }) {
                config.opponent = OpponentConfig::default();
            }
            if let Some(path) = &args.engine_path {
                let options = match &config.opponent {
                    OpponentConfig::Uci { options, .. } => options.clone(),
                    _ => Default::default(),
                };
                config.opponent = OpponentConfig::Uci { path: path.clone(), options };
            }
        }
    }
    if let Some(ms) = args.think_ms { config.think_time_ms = ms; }
    if args.fen.is_some() { config.fen = args.fen.clone(); }
    if args.no_control { config.show_control = false; }
    if args.no_weak { config.show_weakness = false; }
    Ok(config)
}

fn parse_square(s: &str) -> Option<Square> {
    let mut chars = s.chars();
    let file = File::try_index((chars.next()? as u8).checked_sub(b'a')? as usize)?;
    let rank = Rank::try_index((chars.next()? as u8).checked_sub(b'1')? as usize)?;
    if chars.next().is_some() { return None; }
    Some(Square::new(file, rank))
}

fn parse_promotion(c: char) -> Option<Piece> {
    match c.to_ascii_lowercase() {
        'n' => Some(Piece::Knight),
        'b' => Some(Piece::Bishop),
        'r' => Some(Piece::Rook),
        'q' => Some(Piece::Queen),
        _ => None,
    }
}

/// `e2e4` / `e7e8n` as a move attempt.
fn parse_move_intent(s: &str) -> Option<Intent> {
    if !s.is_ascii() || !(4..=5).contains(&s.len()) { return None; }
    let from = parse_square(&s[0..2])?;
    let to = parse_square(&s[2..4])?;
    let promotion = match s[4..].chars().next() {
        Some(c) => Some(parse_promotion(c)?),
        None => None,
    };
    Some(Intent::AttemptMove { from, to, promotion })
}

// Cell layout: piece, controller letter (upper case for strong control),
// then `!` when contested, else w/b/+ for weak squares.
fn render(session: &Session, overlay: &Overlay, assets: &PieceAssets) -> String {
    let pos = session.position();
    let status = session.status();
    let targets: Vec<Square> = session.selection().map(|s| s.targets.iter().map(|m| m.to).collect()).unwrap_or_default();
    let mut out = String::new();
    for rank in Rank::ALL.into_iter().rev() {
        out.push_str(&format!("{} ", rank as usize + 1));
        for file in File::ALL {
            let sq = Square::new(file, rank);
            let piece = match pos.piece_at(sq) {
                Some((c, p)) => assets.glyph(c, p),
                None if targets.contains(&sq) => '*',
                None => '·',
            };
            let ctrl = if session.show_control() {
                match overlay.control.get(sq).classification {
                    Classification::Neutral => ' ',
                    Classification::Tie => '=',
                    Classification::Controlled { by, intensity } => {
                        let strong = intensity >= 188;
                        match (by, strong) {
                            (Color::White, true) => 'W',
                            (Color::White, false) => 'w',
                            (Color::Black, true) => 'B',
                            (Color::Black, false) => 'b',
                        }
                    }
                }
            } else {
                ' '
            };
            let mark = if session.show_control() && overlay.control.get(sq).contested {
                '!'
            } else if session.show_weakness() {
                match (overlay.weak.is_weak(Color::White, sq), overlay.weak.is_weak(Color::Black, sq)) {
                    (true, true) => '+',
                    (true, false) => 'w',
                    (false, true) => 'b',
                    (false, false) => ' ',
                }
            } else {
                ' '
            };
            let open = if Some(sq) == status.checked_king { '[' } else if Some(sq) == session.selection().map(|s| s.square) { '(' } else { ' ' };
            out.push_str(&format!("{}{}{}{} ", open, piece, ctrl, mark));
        }
        out.push('\n');
    }
    out.push_str("   a    b    c    d    e    f    g    h\n");
    let turn = if status.side_to_move == Color::White { "White" } else { "Black" };
    out.push_str(&format!("\nMove {} - {} to play", status.fullmove_number, turn));
    if let Some(san) = &status.last_notation { out.push_str(&format!(" | last: {}", san)); }
    if status.check && !status.checkmate { out.push_str(" | check"); }
    out.push_str(&format!(" | {:?}", status.mode));
    if session.gate().original_mode == Mode::Pve {
        out.push_str(if status.engine_enabled { " (engine on)" } else { " (engine off)" });
    }
    out
}

fn render_mobility(overlay: &Overlay) -> String {
    let mut out = String::new();
    for rank in Rank::ALL.into_iter().rev() {
        out.push_str(&format!("{} ", rank as usize + 1));
        for file in File::ALL {
            out.push_str(&format!("{:>3}", overlay.mobility.get(Square::new(file, rank))));
        }
        out.push('\n');
    }
    out.push_str("    a  b  c  d  e  f  g  h");
    out
}

fn report_outcome(outcome: ReplyOutcome, session: &Session) -> bool {
    match outcome {
        ReplyOutcome::Applied(_) => {
            println!("Opponent plays: {}", session.history().last_notation().unwrap_or("?"));
            false
        }
        ReplyOutcome::Stale(_) => false,
        ReplyOutcome::NoMove | ReplyOutcome::Rejected(_) => {
            println!("Opponent produced no usable move; engine switched off (type 'engine' to retry)");
            true
        }
        ReplyOutcome::Lost => {
            println!("Opponent stopped responding; continuing without it");
            false
        }
    }
}

/// Polls the worker until the in-flight reply settles, ticking a spinner.
fn await_reply(session: &mut Session) -> Result<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    pb.set_message(format!("{} is thinking...", session.opponent_name().unwrap_or("opponent")));
    let mut switch_off = false;
    while session.gate().reply_in_flight {
        if let Some(outcome) = session.wait_reply(Duration::from_millis(80)) {
            pb.finish_and_clear();
            switch_off = report_outcome(outcome, session);
        }
        pb.tick();
    }
    pb.finish_and_clear();
    if switch_off { session.handle(Intent::ToggleEngine); }
    Ok(())
}

fn print_help() {
    println!("Commands: e2e4 | e7e8q | select e2 | undo | redo | reset | engine | control | weak");
    println!("          mobility | pgn | json | save <path> | load <path> | help | quit");
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = build_config(&args)?;
    let assets = PieceAssets::load(args.assets.as_deref());
    let mut session = Session::from_config(&config)?;

    println!("boardlens");
    println!("=========");
    print_help();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        session.tick();
        if session.gate().reply_in_flight { await_reply(&mut session)?; }

        let overlay = session.overlay();
        println!("\n{}", render(&session, &overlay, &assets));
        let status = session.status();
        if status.checkmate {
            let winner = if status.side_to_move == Color::White { "Black" } else { "White" };
            println!("Checkmate! {} wins!", winner);
        } else if status.stalemate {
            println!("Stalemate!");
        } else if status.game_over {
            println!("Draw!");
        }

        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else { continue };
        match cmd {
            "quit" | "exit" => break,
            "help" => print_help(),
            "undo" => session.handle(Intent::Undo),
            "redo" => session.handle(Intent::Redo),
            "reset" => session.handle(Intent::Reset),
            "engine" => {
                if !session.gate().engine_toggleable() { println!("No automated opponent in this session"); }
                session.handle(Intent::ToggleEngine);
            }
            "control" => session.handle(Intent::ToggleControlDisplay),
            "weak" => session.handle(Intent::ToggleWeaknessDisplay),
            "mobility" => println!("{}", render_mobility(&overlay)),
            "pgn" => println!("{}", session.pgn()),
            "json" => println!("{}", serde_json::to_string_pretty(&overlay.report())?),
            "select" => match words.next().and_then(parse_square) {
                Some(sq) => session.handle(Intent::SelectSquare(sq)),
                None => println!("Usage: select e2"),
            },
            "save" => match words.next() {
                Some(path) => match session.record().save(Path::new(path)) {
                    Ok(()) => println!("Saved to {}", path),
                    Err(e) => println!("Could not save {}: {}", path, e),
                },
                None => println!("Usage: save <path>"),
            },
            "load" => match words.next() {
                Some(path) => {
                    let loaded = SessionRecord::load(Path::new(path)).and_then(|r| session.restore(&r));
                    if let Err(e) = loaded { println!("Could not load {}: {}", path, e); }
                }
                None => println!("Usage: load <path>"),
            },
            other => match parse_move_intent(other) {
                Some(intent) => {
                    let before = session.history().len();
                    session.handle(intent);
                    if session.history().len() == before { println!("Illegal move!"); }
                }
                None => println!("Unknown command '{}', type 'help'", other),
            },
        }
    }
    Ok(())
}
