use clap::{Parser, Subcommand};
use housecast_core::Day;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "housecast", version, about = "Housecast workout display control")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a timer program without touching saved state
    Resolve(commands::resolve::ResolveArgs),
    /// Show or change the active day
    Day {
        #[command(subcommand)]
        action: commands::day::DayAction,
    },
    /// Edit a house's timer program
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Edit a house's workout card
    Workout {
        #[command(subcommand)]
        action: commands::workout::WorkoutAction,
    },
    /// Play, pause, resume or stop a day
    Control {
        #[command(subcommand)]
        action: commands::control::ControlAction,
    },
    /// Print the runtime snapshot as JSON
    Status {
        /// Day to show (defaults to the active day)
        #[arg(long)]
        day: Option<Day>,
    },
    /// Run the tick loop, reading control commands from stdin
    Serve {
        /// Tick period in milliseconds (defaults to runtime.tick_interval_ms)
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Export or import the whole board
    Data {
        #[command(subcommand)]
        action: commands::data::DataAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("HOUSECAST_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Resolve(args) => commands::resolve::run(args),
        Commands::Day { action } => commands::day::run(action).await,
        Commands::Timer { action } => commands::timer::run(action).await,
        Commands::Workout { action } => commands::workout::run(action).await,
        Commands::Control { action } => commands::control::run(action).await,
        Commands::Status { day } => commands::status::run(day).await,
        Commands::Serve { interval_ms } => commands::serve::run(interval_ms).await,
        Commands::Data { action } => commands::data::run(action).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
