use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use junkhound::areas::modules::StorageEnvironment;
use junkhound::scanner::{AppJunk, AppScanner, CancelFlag, ProgressObserver};
use junkhound::{
    ClutterRepo, DataAreaManager, ExclusionManager, FileForensics, LocalGateway, ScanSettings,
    StaticPkgRepo,
};

/// junkhound - Forensic file ownership and junk classification for Android storage
#[derive(Parser, Debug)]
#[command(name = "junkhound")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a device snapshot for per-app junk
    Scan(ScanArgs),

    /// Discover and print the data areas of a device snapshot
    Areas(AreasArgs),
}

#[derive(clap::Args, Debug)]
struct ScanArgs {
    /// Directory holding the device snapshot (device paths resolve below it)
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Package snapshot JSON (installed packages and archives)
    #[arg(long, value_name = "FILE")]
    pkgs: PathBuf,

    /// Path to settings file (YAML or TOML)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Exclusion store file
    #[arg(long, value_name = "FILE")]
    exclusions: Option<PathBuf>,

    /// Treat the snapshot as taken with elevated access
    #[arg(long)]
    rooted: bool,

    /// Emit results as JSON instead of a terminal report
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct AreasArgs {
    /// Directory holding the device snapshot
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Treat the snapshot as taken with elevated access
    #[arg(long)]
    rooted: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    info!("junkhound v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Scan(args) => run_scan(&args, cli.quiet),
        Command::Areas(args) => run_areas(&args),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_settings(args: &ScanArgs) -> Result<ScanSettings> {
    let mut settings = if let Some(path) = &args.settings {
        ScanSettings::from_file(path)?
    } else {
        ScanSettings::from_default_locations(&args.root)?
    };
    if args.rooted {
        settings.is_rooted = true;
    }
    Ok(settings)
}

struct SpinnerObserver {
    bar: indicatif::ProgressBar,
}

impl SpinnerObserver {
    fn new() -> Self {
        let bar = indicatif::ProgressBar::new_spinner();
        bar.enable_steady_tick(std::time::Duration::from_millis(120));
        Self { bar }
    }
}

impl ProgressObserver for SpinnerObserver {
    fn update(&self, primary: &str, secondary: &str) {
        self.bar.set_message(format!("{primary} {secondary}"));
    }
}

fn run_scan(args: &ScanArgs, quiet: bool) -> Result<()> {
    let start_time = std::time::Instant::now();

    let settings = load_settings(args)?;
    let gateway = Arc::new(LocalGateway::rooted_at(
        args.root.clone(),
        settings.is_rooted,
    ));

    info!("Loading package snapshot from {}", args.pkgs.display());
    let pkg_repo = Arc::new(
        StaticPkgRepo::from_snapshot(&args.pkgs)
            .into_diagnostic()
            .wrap_err("Failed to load package snapshot")?,
    );

    let clutter_repo = Arc::new(
        ClutterRepo::bundled()
            .into_diagnostic()
            .wrap_err("Failed to load bundled clutter database")?,
    );

    info!("Discovering data areas...");
    let areas = Arc::new(DataAreaManager::with_default_modules(
        gateway.clone(),
        StorageEnvironment::default(),
    ));
    let snapshot = areas.reload();
    info!("Found {} data areas", snapshot.areas.len());

    let forensics = Arc::new(FileForensics::with_default_processors(
        areas.clone(),
        pkg_repo,
        clutter_repo,
        gateway.clone(),
    ));

    let store_path = args
        .exclusions
        .clone()
        .unwrap_or_else(|| args.root.join(".junkhound-exclusions.json"));
    let exclusions = Arc::new(
        ExclusionManager::load(store_path)
            .into_diagnostic()
            .wrap_err("Failed to load exclusion store")?,
    );

    let mut scanner = AppScanner::new(gateway, areas, forensics, exclusions, settings)
        .into_diagnostic()
        .wrap_err("Failed to assemble scanner")?;
    let spinner = if quiet || args.json {
        None
    } else {
        let observer = Arc::new(SpinnerObserver::new());
        scanner = scanner.with_observer(observer.clone());
        Some(observer)
    };

    let junks = scanner
        .scan(&CancelFlag::new())
        .into_diagnostic()
        .wrap_err("Scan failed")?;
    if let Some(observer) = spinner {
        observer.bar.finish_and_clear();
    }

    if args.json {
        print_json(&junks)?;
    } else {
        print_report(&junks, start_time.elapsed());
    }
    Ok(())
}

fn print_report(junks: &[AppJunk], elapsed: std::time::Duration) {
    if junks.is_empty() {
        println!("{}", "No expendable app data found.".green());
        return;
    }

    let mut total: u64 = 0;
    for junk in junks {
        let size = junk.size();
        total += size;
        println!("{} {}", junk.pkg.to_string().bold(), format_size(size).cyan());
        for (filter, items) in &junk.expendables {
            for item in items {
                println!("  [{}] {}", filter, item.lookup.path);
            }
        }
        if let Some(cache) = &junk.inaccessible_cache {
            println!("  {} {}", "inaccessible:".yellow(), cache);
        }
    }
    println!(
        "\n{} packages, {} reclaimable, scanned in {:.2}s",
        junks.len(),
        format_size(total).bold(),
        elapsed.as_secs_f64()
    );
}

fn print_json(junks: &[AppJunk]) -> Result<()> {
    let value = serde_json::json!({
        "packages": junks.iter().map(|junk| {
            serde_json::json!({
                "pkg": junk.pkg.name(),
                "size": junk.size(),
                "inaccessible_cache": junk.inaccessible_cache.as_ref().map(|p| p.raw()),
                "expendables": junk.expendables.iter().map(|(filter, items)| {
                    serde_json::json!({
                        "filter": filter,
                        "paths": items.iter().map(|i| i.lookup.path.raw()).collect::<Vec<_>>(),
                    })
                }).collect::<Vec<_>>(),
            })
        }).collect::<Vec<_>>(),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&value).into_diagnostic()?
    );
    Ok(())
}

fn run_areas(args: &AreasArgs) -> Result<()> {
    let gateway = Arc::new(LocalGateway::rooted_at(args.root.clone(), args.rooted));
    let areas = DataAreaManager::with_default_modules(gateway, StorageEnvironment::default());
    let snapshot = areas.reload();

    if snapshot.areas.is_empty() {
        println!("{}", "No data areas found in this snapshot.".yellow());
        return Ok(());
    }
    for area in &snapshot.areas {
        println!("{area}");
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;
    match bytes {
        b if b >= GIB => format!("{:.2} GiB", b as f64 / GIB as f64),
        b if b >= MIB => format!("{:.2} MiB", b as f64 / MIB as f64),
        b if b >= KIB => format!("{:.2} KiB", b as f64 / KIB as f64),
        b => format!("{b} B"),
    }
}
