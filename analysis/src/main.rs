//! Food Inflation CLI - regional food price inflation from a price table
//!
//! # Main Commands
//!
//! ```bash
//! food-inflation run prices.csv                      # Full analysis, ranked summary
//! food-inflation run prices.csv -o report.json -e out/
//! food-inflation config                              # Show default configuration
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! food-inflation clean prices.csv                    # Cleaned records as JSON
//! food-inflation coverage prices.csv                 # Records per region and year
//! food-inflation inflation prices.csv -g category    # One inflation table as JSON
//! ```

use clap::{Args, Parser, Subcommand};
use food_inflation::logs::log_error;
use food_inflation::{
    clean_file, coverage_counts, export_tables, format_summary, inflation_for, prepare_file, run_analysis,
    write_report, AnalysisConfig, AnalysisReport, GroupField, PriceMethod,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "food-inflation")]
#[command(about = "Regional food price inflation analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of the defaults or a config file
#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// First year of the analysis window
    #[arg(long)]
    start_year: Option<i32>,

    /// First year of the post-shock window
    #[arg(long)]
    post_shock_start: Option<i32>,

    /// Region to exclude (repeatable, replaces the configured list)
    #[arg(long = "exclude", value_name = "REGION")]
    exclude: Vec<String>,

    /// Keep every region
    #[arg(long, conflicts_with = "exclude")]
    include_all: bool,

    /// Rows at each end of a ranking
    #[arg(long)]
    top: Option<usize>,

    /// Fail on unit / price type mismatches
    #[arg(long)]
    strict_units: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Full analysis: clean, scope, split, aggregate, rank
    Run {
        /// Input CSV file
        input: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,

        /// Write the JSON report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write one CSV per table into this directory
        #[arg(short, long)]
        export_dir: Option<PathBuf>,
    },

    /// Load and clean a CSV file, output cleaned records as JSON
    Clean {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show record counts per region and year, and the wholesale decision
    Coverage {
        /// Input CSV file
        input: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Compute one inflation table and output it as JSON
    Inflation {
        /// Input CSV file
        input: PathBuf,

        /// Field to group baskets by
        #[arg(short, long, value_enum, default_value = "region")]
        group_by: GroupField,

        /// Restrict to the post-shock window
        #[arg(long)]
        post_shock: bool,

        /// Use wholesale instead of retail prices
        #[arg(long)]
        wholesale: bool,

        #[command(flatten)]
        config: ConfigArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the default configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            config,
            output,
            export_dir,
        } => cmd_run(&input, &config, output.as_deref(), export_dir.as_deref()),

        Commands::Clean { input, output } => cmd_clean(&input, output.as_deref()),

        Commands::Coverage { input, config } => cmd_coverage(&input, &config),

        Commands::Inflation {
            input,
            group_by,
            post_shock,
            wholesale,
            config,
            output,
        } => cmd_inflation(&input, group_by, post_shock, wholesale, &config, output.as_deref()),

        Commands::Config => cmd_config(),
    };

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn load_config(args: &ConfigArgs) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            eprintln!("⚙️  Config: {}", path.display());
            AnalysisConfig::from_json_file(path)?
        }
        None => AnalysisConfig::default(),
    };

    if let Some(year) = args.start_year {
        config.start_year = year;
    }
    if let Some(year) = args.post_shock_start {
        config.post_shock_start = year;
    }
    if args.include_all {
        config.excluded_regions.clear();
    } else if !args.exclude.is_empty() {
        config.excluded_regions = args.exclude.clone();
    }
    if let Some(top) = args.top {
        config.top_n = top;
    }
    if args.strict_units {
        config.strict_units = true;
    }

    config.validate()?;
    Ok(config)
}

fn cmd_run(
    input: &Path,
    args: &ConfigArgs,
    output: Option<&Path>,
    export_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());
    let config = load_config(args)?;

    let result = run_analysis(input, &config)?;
    let report = AnalysisReport::new(result, &config, input.display().to_string());

    println!("{}", format_summary(&report));

    if let Some(path) = output {
        write_report(&report, path)?;
        eprintln!("💾 Report written to: {}", path.display());
    }

    if let Some(dir) = export_dir {
        let written = export_tables(&report, dir)?;
        eprintln!("💾 {} tables written to: {}", written.len(), dir.display());
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_clean(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Cleaning: {}", input.display());

    let outcome = clean_file(input, &AnalysisConfig::default())?;
    eprintln!("✅ {} records, {} dropped", outcome.records.len(), outcome.dropped.len());

    let json = serde_json::to_string_pretty(&outcome.records)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_coverage(input: &Path, args: &ConfigArgs) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Coverage: {}", input.display());
    let config = load_config(args)?;
    let prepared = prepare_file(input, &config)?;

    for (method, regions) in coverage_counts(&prepared) {
        println!("\n{} records per region and year:", method);
        if regions.is_empty() {
            println!("  (none)");
            continue;
        }
        let years: Vec<i32> = (prepared.summary.start_year..=prepared.summary.end_year).collect();
        let header: Vec<String> = years.iter().map(|y| format!("{y:>6}")).collect();
        println!("  {:<24}{}", "region", header.join(""));
        for (region, counts) in regions {
            let cells: Vec<String> = years
                .iter()
                .map(|y| format!("{:>6}", counts.get(y).copied().unwrap_or(0)))
                .collect();
            println!("  {:<24}{}", region, cells.join(""));
        }
    }

    let coverage = &prepared.wholesale_coverage;
    println!(
        "\nWholesale: {}/{} regions ({:.0}%, minimum {:.0}%) -> {}",
        coverage.wholesale_regions.len(),
        coverage.total_regions,
        coverage.share * 100.0,
        coverage.min_share * 100.0,
        if coverage.usable { "analyzed" } else { "skipped" }
    );

    Ok(())
}

fn cmd_inflation(
    input: &Path,
    group_by: GroupField,
    post_shock: bool,
    wholesale: bool,
    args: &ConfigArgs,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Inflation by {}: {}", group_by.name(), input.display());
    let config = load_config(args)?;
    let prepared = prepare_file(input, &config)?;

    let method = if wholesale { PriceMethod::Wholesale } else { PriceMethod::Retail };
    if method == PriceMethod::Wholesale && !prepared.wholesale_coverage.usable {
        eprintln!("⚠️  Wholesale coverage is below the configured minimum");
    }

    let post_shock_start = post_shock.then_some(config.post_shock_start);
    let table = inflation_for(&prepared, method, group_by, post_shock_start)?;
    eprintln!("✅ {} rows", table.rows.len());

    let json = serde_json::to_string_pretty(&table)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_config() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", AnalysisConfig::default().to_json()?);
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
