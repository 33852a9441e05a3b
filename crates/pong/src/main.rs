//! FPGA Pong - headless Pong on a DE2i-150 board
//!
//! Usage: fpga-pong [OPTIONS] <COMMAND>

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser as ClapParser, Subcommand};
use de2i::sim::{SimHandle, SimulatedDevice};
use de2i::{diagnostic, Board, Register, DEFAULT_DEVICE};
use fpga_pong::{GameConfig, HardwareInputs, Mirror, Session, SessionConfig};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Raised by SIGINT/SIGTERM; `play` turns it into a clean session stop
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

#[derive(ClapParser, Debug)]
#[command(name = "fpga-pong")]
#[command(author = "FPGA Pong Team")]
#[command(version)]
#[command(about = "Two-player Pong mirrored onto a DE2i-150 FPGA board", long_about = None)]
struct Cli {
    /// FPGA character device
    #[arg(long, global = true, default_value = DEFAULT_DEVICE)]
    device: PathBuf,

    /// Use an in-memory board instead of the device
    #[arg(long, global = true)]
    simulate: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play, mirroring the game onto the board
    Run(RunArgs),
    /// Light test patterns on every output
    Diagnose {
        /// How long each pattern stays up, in milliseconds
        #[arg(long, default_value = "2000")]
        hold_ms: u64,
    },
    /// Read the switches and push buttons once
    Read,
    /// Turn off every LED and display
    Clear,
}

#[derive(ClapArgs, Debug)]
struct RunArgs {
    /// Stop after this many seconds (default: until Enter is pressed)
    #[arg(short, long)]
    duration: Option<u64>,

    /// Game loop rate
    #[arg(long, default_value = "60")]
    game_hz: u32,

    /// Hardware mirror rate
    #[arg(long, default_value = "30")]
    mirror_hz: u32,

    /// Points needed to win
    #[arg(long, default_value = "5")]
    winning_score: u32,

    /// Serve immediately instead of waiting for KEY0
    #[arg(long)]
    autostart: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Run(args) => play(cli, args),
        Command::Diagnose { hold_ms } => {
            let (mut board, _sim) = open_board(cli, true)?;
            let report = diagnostic::pattern_test(&mut board, Duration::from_millis(*hold_ms));
            board.close();
            if !report.passed() {
                for step in report.failures() {
                    if let Err(e) = &step.outcome {
                        eprintln!("{}: {}", step.register, e);
                    }
                }
                bail!("hardware pattern test failed");
            }
            println!("Pattern test complete: check LEDs and displays");
            Ok(())
        }
        Command::Read => {
            let (mut board, _sim) = open_board(cli, true)?;
            for register in Register::INPUTS {
                let value = board
                    .read(register)
                    .with_context(|| format!("reading {register}"))?
                    .unwrap_or_default();
                println!("{register}: {value:#010x}");
            }
            board.close();
            Ok(())
        }
        Command::Clear => {
            let (board, _sim) = open_board(cli, true)?;
            // Taking over the board blanks it; close without a second pass
            let stats = Mirror::new(board, GameConfig::default()).close();
            if stats.faults.failures() > 0 {
                bail!("clearing outputs failed ({} hardware faults)", stats.faults.failures());
            }
            Ok(())
        }
    }
}

fn play(cli: &Cli, args: &RunArgs) -> Result<()> {
    let config = SessionConfig {
        game: GameConfig {
            winning_score: args.winning_score,
            ..GameConfig::default()
        },
        game_hz: args.game_hz,
        mirror_hz: args.mirror_hz,
        autostart: args.autostart,
    };

    let (board, sim) = open_board(cli, false)?;
    let session = Session::start(config, board).context("starting game session")?;
    install_interrupt_handler();

    match args.duration {
        Some(secs) => info!("running for {secs}s (Enter or Ctrl-C stops early)"),
        None => info!("press Enter or Ctrl-C to quit"),
    }
    let stdin_token = session.token();
    // Never joined: it may stay blocked on stdin until the process exits
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || stdin_token.cancel_on_line(std::io::stdin().lock()))
        .context("spawning stdin watcher")?;
    let token = session.token();
    token.wait_or_interrupt(args.duration.map(Duration::from_secs), &INTERRUPTED);

    let report = session.stop()?;
    let last = report.last;
    println!(
        "Final score {}-{} ({:?}) after {} frames",
        last.player1.score, last.player2.score, last.state, report.frames
    );
    if let Some(sim) = sim {
        for register in Register::OUTPUTS {
            println!("{register}: {:#010x}", sim.output(register));
        }
    }
    Ok(())
}

extern "C" fn on_interrupt(_signal: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Route SIGINT and SIGTERM to [`INTERRUPTED`] so the board is cleared on exit
fn install_interrupt_handler() {
    let handler = on_interrupt as extern "C" fn(libc::c_int) as libc::sighandler_t;
    for signal in [libc::SIGINT, libc::SIGTERM] {
        // SAFETY: the handler only stores to an atomic, which is
        // async-signal-safe.
        let previous = unsafe { libc::signal(signal, handler) };
        if previous == libc::SIG_ERR {
            warn!("cannot handle signal {signal}: {}", std::io::Error::last_os_error());
        }
    }
}

/// Open the real or simulated board
///
/// Hardware tools (`required`) fail when the device cannot be opened; the
/// game falls back to running without hardware.
fn open_board(cli: &Cli, required: bool) -> Result<(Board, Option<SimHandle>)> {
    if cli.simulate {
        let (device, handle) = SimulatedDevice::quiet();
        handle.set_input(Register::PushButtons, HardwareInputs::BUTTONS_RELEASED);
        info!("using simulated board");
        return Ok((Board::with_io(Box::new(device)), Some(handle)));
    }

    let board = if required {
        Board::open(&cli.device)?
    } else {
        Board::open_or_absent(&cli.device)
    };
    Ok((board, None))
}
