use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use yoga_core::*;

#[derive(Parser)]
#[command(name = "yoga")]
#[command(about = "Condition-based yoga recommendations and guided practice timer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the configured user id
    #[arg(long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the health conditions that can be assessed
    Conditions,

    /// Replace your health assessment
    Assess {
        /// Condition key (repeatable), e.g. back_pain
        #[arg(long = "condition", short = 'c')]
        conditions: Vec<String>,

        /// Submit an assessment with no conditions
        #[arg(long, conflicts_with = "conditions")]
        clear: bool,
    },

    /// Show exercises recommended for your assessment (default)
    Recommend,

    /// Run a timed practice session
    Practice {
        /// Practice the Nth recommendation (1-based)
        #[arg(long, conflicts_with = "exercise")]
        pick: Option<usize>,

        /// Practice a catalog exercise by name
        #[arg(long)]
        exercise: Option<String>,

        /// Session length in minutes
        #[arg(long, conflicts_with = "seconds", allow_hyphen_values = true)]
        minutes: Option<i64>,

        /// Session length in seconds
        #[arg(long, allow_hyphen_values = true)]
        seconds: Option<i64>,

        /// One of the configured preset lengths, in minutes
        #[arg(long, conflicts_with_all = ["minutes", "seconds"])]
        quick: Option<u32>,

        /// Count ticks without waiting (for testing)
        #[arg(long)]
        fast: bool,
    },

    /// Roll up WAL session records to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },

    /// Summarise recent practice
    History {
        /// How many days back to look
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
}

/// File layout under the data directory
struct DataPaths {
    wal_dir: PathBuf,
    wal_path: PathBuf,
    csv_path: PathBuf,
    assessments_path: PathBuf,
}

impl DataPaths {
    fn new(data_dir: &Path) -> Self {
        let wal_dir = data_dir.join("wal");
        Self {
            wal_path: wal_dir.join("practice_sessions.wal"),
            wal_dir,
            csv_path: data_dir.join("sessions.csv"),
            assessments_path: data_dir.join("assessments.json"),
        }
    }
}

fn main() -> Result<()> {
    yoga_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let user_id = cli.user.unwrap_or_else(|| config.user.id.clone());
    let paths = DataPaths::new(&data_dir);
    tracing::debug!("Using data dir {:?} for user '{}'", data_dir, user_id);

    match cli.command {
        Some(Commands::Conditions) => cmd_conditions(&config),
        Some(Commands::Assess { conditions, clear }) => {
            cmd_assess(&paths, &user_id, conditions, clear)
        }
        Some(Commands::Recommend) | None => cmd_recommend(&paths, &user_id, &config),
        Some(Commands::Practice {
            pick,
            exercise,
            minutes,
            seconds,
            quick,
            fast,
        }) => {
            let duration = match (quick, minutes, seconds) {
                (Some(q), _, _) => quick_duration(&config, q)?,
                (None, Some(m), _) => m.saturating_mul(60),
                (None, None, Some(s)) => s,
                (None, None, None) => config.practice.default_duration_seconds,
            };
            cmd_practice(&paths, &user_id, &config, pick, exercise, duration, fast)
        }
        Some(Commands::Rollup { cleanup }) => cmd_rollup(&paths, cleanup),
        Some(Commands::History { days }) => cmd_history(&paths, &user_id, days),
    }
}

/// Load the configured catalog and refuse to run on an invalid one
fn load_catalog(config: &Config) -> Result<Catalog> {
    let catalog = match &config.catalog.path {
        Some(path) => Catalog::load_from(path)?,
        None => get_default_catalog().clone(),
    };
    catalog.ensure_valid()?;
    Ok(catalog)
}

/// Seconds for a configured preset length
fn quick_duration(config: &Config, minutes: u32) -> Result<i64> {
    let presets = &config.practice.quick_minutes;
    if !presets.contains(&minutes) {
        let offered: Vec<String> = presets.iter().map(u32::to_string).collect();
        eprintln!("Quick lengths available: {} minutes", offered.join(", "));
        return Err(Error::Config(format!("{} minutes is not a quick preset", minutes)));
    }
    Ok(i64::from(minutes) * 60)
}

fn cmd_conditions(config: &Config) -> Result<()> {
    let catalog = load_catalog(config)?;

    println!("Known health conditions:\n");
    for condition in Condition::ALL {
        println!(
            "  {:<22} {:<22} {} ({} exercises)",
            condition.key(),
            condition.label(),
            condition.description(),
            catalog.entries_for(condition).len()
        );
    }
    Ok(())
}

fn cmd_assess(paths: &DataPaths, user_id: &str, keys: Vec<String>, clear: bool) -> Result<()> {
    if keys.is_empty() && !clear {
        eprintln!("No conditions given. Use --condition <key> (see `yoga conditions`) or --clear.");
        return Err(Error::Assessment("empty assessment without --clear".into()));
    }

    for key in &keys {
        if Condition::from_key(key).is_none() {
            eprintln!("Unknown condition: {}. Ignoring.", key);
        }
    }
    let conditions = ConditionSet::from_keys(&keys);

    let mut store = JsonAssessmentStore::new(&paths.assessments_path);
    store.replace(user_id, &conditions)?;

    println!("✓ Assessment saved ({} conditions)", conditions.len());
    for condition in conditions.iter() {
        println!("  • {}", condition.label());
    }
    Ok(())
}

fn cmd_recommend(paths: &DataPaths, user_id: &str, config: &Config) -> Result<()> {
    let store = JsonAssessmentStore::new(&paths.assessments_path);
    let conditions = store.condition_set(user_id)?;

    if conditions.is_empty() {
        println!("You haven't selected any health conditions in your assessment.");
        println!("Run `yoga assess --condition <key>` to update it.");
        return Ok(());
    }

    let catalog = load_catalog(config)?;
    let recommendations = resolve(&catalog, &conditions);

    let labels: Vec<String> = conditions.iter().map(Condition::display_key).collect();
    println!("Your conditions: {}\n", labels.join(", "));

    if recommendations.is_empty() {
        println!("No exercises are catalogued for your conditions yet.");
        return Ok(());
    }

    for (index, rec) in recommendations.iter().enumerate() {
        display_recommendation(index + 1, rec);
    }
    println!("Start one with `yoga practice --pick <number>`.");
    Ok(())
}

fn display_recommendation(number: usize, rec: &Recommendation) {
    println!("{:>3}. {}  [for {}]", number, rec.entry.name, rec.condition_label());
    println!("     {}", rec.entry.benefits);
    println!("     ▶ {}", rec.entry.video_url);
    println!();
}

/// Choose what to practice: a numbered recommendation, a named catalog
/// exercise, or the first recommendation
fn select_exercise(
    paths: &DataPaths,
    user_id: &str,
    catalog: &Catalog,
    pick: Option<usize>,
    exercise: Option<String>,
) -> Result<ExerciseMetadata> {
    if let Some(name) = exercise {
        return catalog
            .find_by_name(&name)
            .map(ExerciseMetadata::from)
            .ok_or_else(|| Error::Other(format!("No catalog exercise named '{}'", name)));
    }

    let store = JsonAssessmentStore::new(&paths.assessments_path);
    let recommendations = resolve(catalog, &store.condition_set(user_id)?);
    if recommendations.is_empty() {
        eprintln!("No recommendations available. Update your assessment or pass --exercise.");
        return Err(Error::Other("nothing to practice".into()));
    }

    let number = pick.unwrap_or(1);
    number
        .checked_sub(1)
        .and_then(|i| recommendations.get(i))
        .map(Recommendation::to_exercise)
        .ok_or_else(|| {
            Error::Other(format!(
                "No recommendation #{} (you have {})",
                number,
                recommendations.len()
            ))
        })
}

fn cmd_practice(
    paths: &DataPaths,
    user_id: &str,
    config: &Config,
    pick: Option<usize>,
    exercise: Option<String>,
    duration_seconds: i64,
    fast: bool,
) -> Result<()> {
    let catalog = load_catalog(config)?;
    let exercise = select_exercise(paths, user_id, &catalog, pick, exercise)?;

    std::fs::create_dir_all(&paths.wal_dir)?;
    let sink = JsonlSink::new(&paths.wal_path);
    let mut session = PracticeSession::new(user_id, sink, duration_seconds, exercise)?;

    display_session_intro(&session);

    let token = session
        .start(chrono::Utc::now())
        .ok_or_else(|| Error::Other("session did not start".into()))?;

    let progress = if fast {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(u64::from(session.total_duration()))
    };
    let style = ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}s")
        .map_err(|e| Error::Other(e.to_string()))?;
    progress.set_style(style);
    progress.set_message(session.exercise().name.clone());

    loop {
        if !fast {
            std::thread::sleep(std::time::Duration::from_secs(1));
        }

        match session.tick(token, chrono::Utc::now()) {
            TickOutcome::Counted { .. } => {
                progress.set_position(u64::from(session.elapsed()));
            }
            TickOutcome::Completed(completion) => {
                progress.finish_and_clear();
                display_completion(&completion);
                break;
            }
            TickOutcome::Ignored => {
                progress.abandon();
                return Err(Error::Other(format!(
                    "session stopped unexpectedly ({})",
                    session.state()
                )));
            }
        }
    }

    Ok(())
}

fn display_session_intro<S: SessionSink>(session: &PracticeSession<S>) {
    let exercise = session.exercise();
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  PRACTICE: {}", exercise.category.to_uppercase());
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  {}", exercise.name);
    println!("  Duration: {}", format_clock(session.total_duration()));
    if let Some(ref instructions) = exercise.instructions {
        println!();
        println!("  {}", instructions);
    }
    println!();
}

fn display_completion(completion: &Completion) {
    let record = &completion.record;
    println!("✓ Session complete! Great job.");
    println!(
        "  {} ({} practiced)",
        record.exercise_name,
        format_clock(record.duration_seconds)
    );
    match &completion.warning {
        None => println!("✓ Session logged!"),
        Some(warning) => eprintln!("⚠ Session not saved: {}", warning),
    }
}

fn cmd_rollup(paths: &DataPaths, cleanup: bool) -> Result<()> {
    if !paths.wal_path.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = yoga_core::csv_rollup::wal_to_csv_and_archive(&paths.wal_path, &paths.csv_path)?;

    println!("✓ Rolled up {} sessions to CSV", count);
    println!("  CSV: {}", paths.csv_path.display());

    if cleanup {
        let cleaned = yoga_core::csv_rollup::cleanup_processed_wals(&paths.wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}

fn cmd_history(paths: &DataPaths, user_id: &str, days: i64) -> Result<()> {
    let records = load_recent_records(&paths.wal_path, &paths.csv_path, days)?;
    let summary = PracticeSummary::for_user(&records, user_id);

    println!("Practice in the last {} days", days);
    println!("  Sessions completed: {}", summary.sessions);
    println!(
        "  Time practiced: {}m {}s",
        summary.total_seconds / 60,
        summary.total_seconds % 60
    );
    println!("  Poses completed: {}", summary.exercises.len());
    for name in &summary.exercises {
        println!("    • {}", name);
    }
    if !summary.by_category.is_empty() {
        println!("  By category:");
        for (category, count) in &summary.by_category {
            println!("    {}: {}", category, count);
        }
    }
    Ok(())
}
