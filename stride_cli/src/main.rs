use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use stride_core::config::{DataConfig, InsightConfig, API_KEY_VARS};
use stride_core::insight::ERROR_FALLBACK;
use stride_core::*;

#[derive(Parser)]
#[command(name = "stride")]
#[command(about = "Daily step tracker with calorie and distance estimates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or replace your profile
    Onboard {
        #[arg(long)]
        name: String,

        /// Age in years
        #[arg(long, default_value_t = 30)]
        age: u32,

        /// Weight in kilograms
        #[arg(long, default_value_t = 70.0)]
        weight: f64,

        /// Height in centimeters
        #[arg(long, default_value_t = 170.0)]
        height: f64,

        /// male, female or other
        #[arg(long, default_value = "male")]
        gender: String,

        /// Daily step goal
        #[arg(long, default_value_t = 10_000)]
        goal: u64,
    },

    /// Show today's steps, calories, distance and goal progress (default)
    Status,

    /// Log steps manually
    Add {
        /// Number of steps (defaults to the configured increment)
        #[arg(long, allow_hyphen_values = true)]
        steps: Option<i64>,
    },

    /// Simulate walking for a while
    Walk {
        /// How long to walk
        #[arg(long, default_value_t = 30)]
        seconds: u64,

        /// Override the time between simulated steps
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Show step trends for the past week
    History,

    /// Get a motivational message about today
    Insight,

    /// Delete your profile and today's steps
    Reset,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging
    stride_core::logging::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| config.data.data_dir.clone());

    if let Some(Commands::Walk {
        interval_ms: Some(ms),
        ..
    }) = &cli.command
    {
        config.tracker.simulation_interval_ms = *ms;
        config.validate()?;
    }

    let store = Arc::new(FileStore::new(DataConfig::store_path(&data_dir)));
    let mut tracker = Tracker::open(store, &config.tracker);

    match cli.command {
        Some(Commands::Onboard {
            name,
            age,
            weight,
            height,
            gender,
            goal,
        }) => {
            let profile = UserProfile {
                name,
                age,
                weight,
                height,
                gender: gender.parse()?,
                daily_step_goal: goal,
            };
            cmd_onboard(&mut tracker, profile)
        }
        Some(Commands::Status) | None => cmd_status(&tracker),
        Some(Commands::Add { steps }) => {
            cmd_add(&tracker, steps.unwrap_or(config.tracker.manual_step_increment))
        }
        Some(Commands::Walk { seconds, .. }) => cmd_walk(&mut tracker, seconds).await,
        Some(Commands::History) => cmd_history(&tracker),
        Some(Commands::Insight) => cmd_insight(&tracker, &config.insight).await,
        Some(Commands::Reset) => cmd_reset(&mut tracker),
    }
}

fn cmd_onboard(tracker: &mut Tracker<FileStore>, profile: UserProfile) -> Result<()> {
    let replacing = tracker.state() == TrackerState::HasProfile;
    let name = profile.name.clone();
    tracker.save_profile(profile)?;

    if replacing {
        println!("✓ Profile updated for {}", name);
    } else {
        println!("✓ Welcome, {}! Profile saved.", name);
    }
    display_snapshot(tracker)
}

fn cmd_status(tracker: &Tracker<FileStore>) -> Result<()> {
    display_snapshot(tracker)
}

fn cmd_add(tracker: &Tracker<FileStore>, steps: i64) -> Result<()> {
    let before = tracker.snapshot()?.state.step_count;
    let after = tracker.add_steps(steps)?.step_count;

    if after >= before {
        println!("✓ Added {} steps", format_thousands(after - before));
    } else {
        println!("✓ Removed {} steps", format_thousands(before - after));
    }
    display_snapshot(tracker)
}

async fn cmd_walk(tracker: &mut Tracker<FileStore>, seconds: u64) -> Result<()> {
    let before = tracker.snapshot()?.state.step_count;

    tracker.toggle_walk()?;
    println!("Walking for {} seconds... (Ctrl-C to stop early)", seconds);

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(seconds)) => {}
        _ = tokio::signal::ctrl_c() => {
            println!();
        }
    }
    tracker.stop_walk();

    let after = tracker.snapshot()?.state.step_count;
    println!(
        "✓ Walk finished: {} steps",
        format_thousands(after.saturating_sub(before))
    );
    display_snapshot(tracker)
}

fn cmd_history(tracker: &Tracker<FileStore>) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let summary = tracker.history(today)?;
    let goal = tracker.snapshot()?.goal;

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  STEP TRENDS");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Total steps:  {}", format_thousands(summary.total_steps));
    println!("  Daily avg:    {}", format_thousands(summary.average_steps));
    println!(
        "  Best day:     {} ({} steps)",
        summary.best_day.date,
        format_thousands(summary.best_day.steps)
    );
    println!();
    println!("  Recent activity");
    for day in &summary.recent {
        let marker = if day.met_goal(goal) { "✓" } else { " " };
        println!(
            "  {} {}  {:>7} steps  {:>4} kcal  {:>5.2} km",
            marker,
            day.date,
            format_thousands(day.steps),
            day.calories,
            day.distance_km
        );
    }
    println!();
    Ok(())
}

async fn cmd_insight(tracker: &Tracker<FileStore>, insight: &InsightConfig) -> Result<()> {
    if tracker.state() == TrackerState::NoProfile {
        return Err(Error::NoProfile);
    }

    let message = match InsightConfig::api_key_from_env() {
        Some(key) => match GeminiClient::new(insight, key) {
            Ok(client) => tracker.request_insight(&client).await?,
            Err(e) => {
                tracing::warn!("Unable to build insight client: {}", e);
                ERROR_FALLBACK.to_string()
            }
        },
        None => {
            tracing::warn!(
                "No API key set ({}), using fallback insight",
                API_KEY_VARS.join(" or ")
            );
            ERROR_FALLBACK.to_string()
        }
    };

    println!("\n  RoboFit Insight");
    println!("  \"{}\"\n", message);
    Ok(())
}

fn cmd_reset(tracker: &mut Tracker<FileStore>) -> Result<()> {
    tracker.reset_profile()?;
    println!("✓ Profile and today's steps cleared.");
    Ok(())
}

fn display_snapshot(tracker: &Tracker<FileStore>) -> Result<()> {
    let snapshot = tracker.snapshot()?;
    let name = tracker.profile().map(|p| p.name.as_str()).unwrap_or("");

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  TODAY · {}", name);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!(
        "  Steps:     {} / {}  ({}%)",
        format_thousands(snapshot.state.step_count),
        format_thousands(snapshot.goal),
        snapshot.progress_percentage
    );
    println!("  Calories:  {} kcal", snapshot.state.calories);
    println!("  Distance:  {:.2} km", snapshot.state.distance_km);
    println!();
    Ok(())
}

/// Group digits in threes: 12500 -> "12,500"
fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
