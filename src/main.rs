use anyhow::{Context, Result};
use attendance_ledger::export::write_all;
use attendance_ledger::import::load_table;
use attendance_ledger::validation::Severity;
use attendance_ledger::{
    AttendanceConfig, AttendanceEngine, AttendanceReport, DataValidator, RawTable, RunOutcome,
};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Attendance matching and compliance from punch logs and shift schedules
#[derive(Parser)]
#[command(name = "attendance-ledger", version, about)]
struct Cli {
    /// Log per-day matching detail
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate attendance and print the employee summary
    Run {
        #[command(flatten)]
        input: InputArgs,

        /// Write CSV tables and report.json into this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Print the full report as JSON instead of the summary table
        #[arg(long)]
        json: bool,
    },
    /// Check both batches and the configuration without evaluating
    Validate {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Browse results in the terminal viewer
    View {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print the default configuration, or write it to a file
    Config {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Punch records CSV (Name, Department, Date, Time)
    #[arg(long, env = "ATTENDANCE_PUNCHES")]
    punches: PathBuf,

    /// Shift schedule CSV (Name, Shift Date)
    #[arg(long, env = "ATTENDANCE_SHIFTS")]
    shifts: PathBuf,

    /// JSON configuration; defaults apply when omitted
    #[arg(long, env = "ATTENDANCE_CONFIG")]
    config: Option<PathBuf>,
}

struct LoadedInput {
    punches: RawTable,
    shifts: RawTable,
    config: AttendanceConfig,
}

impl InputArgs {
    fn load(&self, verbose: bool) -> Result<LoadedInput> {
        let config = match &self.config {
            Some(path) => AttendanceConfig::from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => AttendanceConfig::default(),
        };

        Ok(LoadedInput {
            punches: load_table(&self.punches)?,
            shifts: load_table(&self.shifts)?,
            config: config.verbose(verbose),
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Run { input, out_dir, json } => run(&input, cli.verbose, out_dir.as_deref(), json),
        Command::Validate { input } => validate(&input, cli.verbose),
        Command::View { input } => view(&input, cli.verbose),
        Command::Config { output } => print_config(output.as_deref()),
    }
}

fn calculate(input: &LoadedInput) -> Result<AttendanceReport> {
    let engine = AttendanceEngine::new(input.config.clone())?;
    let report = engine.calculate(&input.punches, &input.shifts)?;
    Ok(report)
}

fn run(input: &InputArgs, verbose: bool, out_dir: Option<&Path>, json: bool) -> Result<()> {
    let loaded = input.load(verbose)?;
    let report = calculate(&loaded)?;

    if let Some(dir) = out_dir {
        let written = write_all(dir, &report, loaded.config.tolerance())?;
        eprintln!("✓ Wrote {} files to {}", written.len(), dir.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_summary(&report)
}

fn print_summary(report: &AttendanceReport) -> Result<()> {
    println!("📋 Attendance Ledger");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if report.outcome == RunOutcome::NoResults {
        println!("⚠️  No results: nothing to evaluate after cleaning");
        println!("   {}", report.diagnostics.normalization.summary());
        return Ok(());
    }

    println!(
        "{:<24} {:<16} {:>5} {:>5} {:>5} {:>5} {:>8} {:>9}  {}",
        "Employee", "Department", "Days", "Comp", "Inc", "Abs", "Missing", "Rate", "Status"
    );
    for s in &report.summaries {
        println!(
            "{:<24} {:<16} {:>5} {:>5} {:>5} {:>5} {:>8} {:>8.2}%  {}",
            s.employee_id,
            s.department,
            s.total_working_days,
            s.complete_days,
            s.incomplete_days,
            s.absent_days,
            s.missing_checks,
            s.compliance_rate,
            s.final_status
        );
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ {}", report.summary());
    println!("  {}", report.diagnostics.summary());
    println!("  digest {}", report.digest()?);
    Ok(())
}

fn validate(input: &InputArgs, verbose: bool) -> Result<()> {
    let loaded = input.load(verbose)?;
    let report = DataValidator::new(&loaded.config).validate(&loaded.punches, &loaded.shifts);

    for issue in &report.issues {
        let marker = match issue.severity {
            Severity::Critical => "❌",
            Severity::Warning => "⚠️ ",
            Severity::Info => "ℹ️ ",
        };
        println!("{} [{}] {}", marker, issue.dataset, issue.message);
    }
    println!("{}", report.summary());

    if !report.is_valid {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn view(input: &InputArgs, verbose: bool) -> Result<()> {
    use attendance_ledger::ui;

    let loaded = input.load(verbose)?;
    let report = calculate(&loaded)?;

    let mut app = ui::App::new(report);
    ui::run_ui(&mut app)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn view(_input: &InputArgs, _verbose: bool) -> Result<()> {
    eprintln!("❌ Terminal viewer not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    std::process::exit(1);
}

fn print_config(output: Option<&Path>) -> Result<()> {
    let config = AttendanceConfig::default();

    match output {
        Some(path) => {
            config.save(path)?;
            println!("✓ Default configuration written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}
