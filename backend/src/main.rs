//! csvmap CLI - Turn CSV files into map features
//!
//! # Commands
//!
//! ```bash
//! csvmap derive input.csv                      # Points and regions as JSON
//! csvmap derive input.csv --geojson -o out.json
//! csvmap derive https://example.org/data.csv --start-year 1900 --end-year 1950
//! csvmap parse input.csv                       # Parsed table as JSON
//! csvmap detect input.csv                      # Detected column roles
//! csvmap domain input.csv                      # Year range found in the data
//! ```

use clap::{Parser, Subcommand};
use csvmap::parser::{fetch_url, is_url, parse_bytes_with_limit, read_file};
use csvmap::transform::pipeline::format_delimiter;
use csvmap::{
    detect, process_input, to_feature_collection, year_domain, Config, DeriveOptions,
    FeatureResponse, FieldOverrides, Table, TimelineConfig,
};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "csvmap")]
#[command(about = "Turn CSV files into map points and regions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output the table as JSON
    Parse {
        /// Input CSV file or URL
        input: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the columns detected for each role
    Detect {
        /// Input CSV file or URL
        input: String,
    },

    /// Full pipeline: CSV → points and regions
    Derive {
        /// Input CSV file or URL
        input: String,

        /// Latitude column (overrides detection)
        #[arg(long)]
        lat_field: Option<String>,

        /// Longitude column (overrides detection)
        #[arg(long)]
        lon_field: Option<String>,

        /// Timeline configuration JSON file
        #[arg(long)]
        timeline: Option<PathBuf>,

        /// First visible year (enables the timeline)
        #[arg(long, allow_hyphen_values = true)]
        start_year: Option<i32>,

        /// Last visible year (enables the timeline)
        #[arg(long, allow_hyphen_values = true)]
        end_year: Option<i32>,

        /// First visible day of year (enables the day filter)
        #[arg(long)]
        start_day: Option<u16>,

        /// Last visible day of year (enables the day filter)
        #[arg(long)]
        end_day: Option<u16>,

        /// Output a GeoJSON FeatureCollection
        #[arg(long)]
        geojson: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the year range found in the data
    Domain {
        /// Input CSV file or URL
        input: String,
    },
}

/// Timeline flags of the `derive` command
struct TimelineArgs {
    file: Option<PathBuf>,
    start_year: Option<i32>,
    end_year: Option<i32>,
    start_day: Option<u16>,
    end_day: Option<u16>,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()).await,

        Commands::Detect { input } => cmd_detect(&input).await,

        Commands::Derive {
            input,
            lat_field,
            lon_field,
            timeline,
            start_year,
            end_year,
            start_day,
            end_day,
            geojson,
            output,
        } => {
            let overrides = FieldOverrides {
                lat_field,
                lon_field,
            };
            let timeline = TimelineArgs {
                file: timeline,
                start_year,
                end_year,
                start_day,
                end_day,
            };
            cmd_derive(&input, overrides, timeline, geojson, output.as_deref()).await
        }

        Commands::Domain { input } => cmd_domain(&input).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Read a file or URL and parse it.
async fn load_table(input: &str) -> Result<Table, Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let bytes = if is_url(input) {
        fetch_url(input).await?
    } else {
        read_file(input).await?
    };
    Ok(parse_bytes_with_limit(&bytes, config.max_parse_warnings))
}

async fn cmd_parse(input: &str, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input);

    let table = load_table(input).await?;

    eprintln!("   Encoding: {}", table.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(table.delimiter));
    eprintln!("   Columns: {}", table.headers.join(", "));
    for warning in &table.parse_errors {
        eprintln!("   ⚠️ {}", warning);
    }
    eprintln!("✅ Parsed {} rows", table.total_rows);

    let json = serde_json::to_string_pretty(&table)?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_detect(input: &str) -> Result<(), Box<dyn std::error::Error>> {
    let table = load_table(input).await?;
    let roles = detect(&table.headers);

    println!("{}", serde_json::to_string_pretty(&roles)?);
    Ok(())
}

async fn cmd_domain(input: &str) -> Result<(), Box<dyn std::error::Error>> {
    let table = load_table(input).await?;
    let roles = detect(&table.headers);
    let domain = year_domain(&table.rows, &roles.time, &roles.range);

    let json = json!({
        "yearMin": domain.map(|(min, _)| min),
        "yearMax": domain.map(|(_, max)| max),
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

async fn cmd_derive(
    input: &str,
    overrides: FieldOverrides,
    timeline_args: TimelineArgs,
    geojson: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input);

    let config = Config::from_env()?;
    let options = DeriveOptions {
        overrides,
        timeline: build_timeline(timeline_args)?,
        ..DeriveOptions::from_config(&config)
    };

    let result = process_input(input, &options).await?;

    let json = if geojson {
        serde_json::to_string_pretty(&to_feature_collection(&result.features))?
    } else {
        let response = FeatureResponse::from(result);
        eprintln!("\n📊 Status: {}", response.status);
        serde_json::to_string_pretty(&response)?
    };
    write_output(&json, output)?;

    eprintln!("\n✨ Done!");
    Ok(())
}

/// Timeline from an optional JSON file, then command-line flags on top.
fn build_timeline(args: TimelineArgs) -> Result<TimelineConfig, Box<dyn std::error::Error>> {
    let mut timeline = match args.file {
        Some(path) => TimelineConfig::from_json_file(&path)?,
        None => TimelineConfig::default(),
    };

    if args.start_year.is_some() || args.end_year.is_some() {
        timeline.enabled = true;
        timeline.start_year = args.start_year.or(timeline.start_year);
        timeline.end_year = args.end_year.or(timeline.end_year);
    }
    if args.start_day.is_some() || args.end_day.is_some() {
        timeline.enabled = true;
        timeline.day_filter_enabled = true;
        if let Some(day) = args.start_day {
            timeline.start_day = day;
        }
        if let Some(day) = args.end_day {
            timeline.end_day = day;
        }
    }

    Ok(timeline.normalized())
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
