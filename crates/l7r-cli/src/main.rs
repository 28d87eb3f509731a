//! CLI frontend for the L7R combat simulator.

mod commands;
mod transcript;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "l7r",
    about = "L7R: simulate roll-and-keep melee combat between samurai",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log engine decisions to stderr (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fight one combat and print the transcript
    Fight {
        /// Side A fighter as key=value stats, repeat for each fighter
        #[arg(short = 'a', long = "a", required = true, value_name = "STATS")]
        side_a: Vec<String>,

        /// Side B fighter as key=value stats, repeat for each fighter
        #[arg(short = 'b', long = "b", required = true, value_name = "STATS")]
        side_b: Vec<String>,

        /// RNG seed for the fight
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Trials per pool for a private probability table (default: shared table)
        #[arg(long)]
        trials: Option<u32>,

        /// Deploy in lines only, never encircle a lone fighter
        #[arg(long)]
        line: bool,

        /// Open with an iaijutsu duel (one fighter per side)
        #[arg(long)]
        duel: bool,

        /// Abort after this many rounds
        #[arg(long, default_value = "1000")]
        max_rounds: u32,

        /// Print the combat record as JSON instead of a transcript
        #[arg(long)]
        json: bool,

        /// Write the JSON record to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fight a batch of combats and tabulate the results
    Simulate {
        /// Side A fighter as key=value stats, repeat for each fighter
        #[arg(short = 'a', long = "a", required = true, value_name = "STATS")]
        side_a: Vec<String>,

        /// Side B fighter as key=value stats, repeat for each fighter
        #[arg(short = 'b', long = "b", required = true, value_name = "STATS")]
        side_b: Vec<String>,

        /// Number of combats to fight
        #[arg(short = 'n', long, default_value = "100")]
        count: u32,

        /// Seed of the first combat; each later combat adds one
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Trials per pool for a private probability table (default: shared table)
        #[arg(long)]
        trials: Option<u32>,

        /// Deploy in lines only, never encircle a lone fighter
        #[arg(long)]
        line: bool,

        /// Open every combat with an iaijutsu duel
        #[arg(long)]
        duel: bool,

        /// Abort a combat after this many rounds and count it as undecided
        #[arg(long, default_value = "1000")]
        max_rounds: u32,
    },

    /// Look up hit probabilities and averages for a dice pool
    Odds {
        /// Pool in XkY notation, e.g. 7k3
        pool: String,

        /// Target number to reach (default: a table of common TNs)
        #[arg(long)]
        tn: Option<i32>,

        /// Treat 10s as ordinary faces
        #[arg(long)]
        no_explode: bool,

        /// Trials per pool for a private probability table (default: shared table)
        #[arg(long)]
        trials: Option<u32>,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Fight {
            side_a,
            side_b,
            seed,
            trials,
            line,
            duel,
            max_rounds,
            json,
            output,
        } => {
            let setup = commands::Setup {
                seed,
                trials,
                line,
                duel,
                max_rounds,
            };
            commands::fight::run(&side_a, &side_b, &setup, json, output.as_deref())
        }
        Commands::Simulate {
            side_a,
            side_b,
            count,
            seed,
            trials,
            line,
            duel,
            max_rounds,
        } => {
            let setup = commands::Setup {
                seed,
                trials,
                line,
                duel,
                max_rounds,
            };
            commands::simulate::run(&side_a, &side_b, count, &setup)
        }
        Commands::Odds {
            pool,
            tn,
            no_explode,
            trials,
        } => commands::odds::run(&pool, tn, !no_explode, trials),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
