use chrono::{NaiveDate, Utc};
use clap::Parser;
use serde::Serialize;
use tickerwatch::cli::commands::{Cli, Commands};
use tickerwatch::domain::entities::blacklist_rule::BlacklistRule;
use tickerwatch::domain::entities::message::Message;
use tickerwatch::domain::entities::reference_entry::ReferenceEntry;
use tickerwatch::domain::ports::detection_repository::DetectionFilter;
use tickerwatch::infrastructure::config::settings::Config;
use tickerwatch::TickerWatch;
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            std::process::exit(1);
        }
    };
    config.logging.init();

    let tw = match TickerWatch::new(config) {
        Ok(tw) => tw,
        Err(e) => {
            eprintln!("Error initializing tickerwatch: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_command(tw, cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_command(tw: TickerWatch, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Init => {
            let added = tw.seed_default_rules()?;
            println!("Database ready at {} ({added} default rules added)", tw.config().database_path);
        }
        Commands::Ingest { json } => {
            let value: serde_json::Value = serde_json::from_str(&json)?;
            let messages: Vec<Message> = if value.is_array() {
                serde_json::from_value(value)?
            } else {
                vec![serde_json::from_value(value)?]
            };
            let count = tw.ingest_all(&messages)?;
            println!("Ingested {count} message(s)");
        }
        Commands::Scan { text } => {
            print_json(&tw.scan_text(&text).await?)?;
        }
        Commands::Run { source } => {
            print_json(&tw.run_pass(&source).await?)?;
        }
        Commands::Watch { source } => {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let poller = tw.poller(&source).spawn(shutdown_rx.clone());
            let refresher = tw.snapshot_refresher().spawn(shutdown_rx);

            tokio::signal::ctrl_c().await?;
            info!("shutdown requested, finishing current pass");
            shutdown_tx.send(true)?;
            poller.await?;
            refresher.await?;
        }
        Commands::Detections { symbol, since, limit } => {
            let detections = tw.detections(&DetectionFilter {
                symbol,
                since: parse_date(&since)?,
                limit: Some(limit),
                ..DetectionFilter::default()
            })?;
            print_json(&detections)?;
        }
        Commands::Cursor { source } => match source {
            Some(source) => match tw.cursor(&source)? {
                Some(cursor) => print_json(&cursor)?,
                None => println!(
                    "No cursor for {source}; the next pass starts at {}",
                    tw.load_cursor(&source)?
                ),
            },
            None => print_json(&tw.cursors()?)?,
        },
        Commands::Rollup { date, to } => {
            let from = parse_day(&date)?;
            let rollups = match to {
                Some(to) => tw.rollup_range(from, parse_day(&Some(to))?)?,
                None => tw.rollup(from)?,
            };
            print_json(&rollups)?;
        }
        Commands::Top { date, limit } => {
            print_json(&tw.top_symbols(parse_day(&date)?, limit)?)?;
        }
        Commands::Rules => {
            print_json(&tw.rules()?)?;
        }
        Commands::RuleSet { json } => {
            let rule: BlacklistRule = serde_json::from_str(&json)?;
            print_json(&tw.upsert_rule(&rule)?)?;
        }
        Commands::RuleDelete { symbol } => {
            tw.delete_rule(&symbol)?;
            println!("Rule for {} removed", symbol.to_uppercase());
        }
        Commands::RegistryAdd { json } => {
            let entry: ReferenceEntry = serde_json::from_str(&json)?;
            print_json(&tw.add_reference(&entry)?)?;
        }
        Commands::Verdicts { symbol, limit } => {
            print_json(&tw.arbitration_history(symbol.as_deref(), limit)?)?;
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_day(s: &Option<String>) -> Result<NaiveDate, String> {
    match s {
        None => Ok(Utc::now().date_naive()),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date: {s}. Use YYYY-MM-DD")),
    }
}

fn parse_date(s: &Option<String>) -> Result<Option<chrono::DateTime<chrono::Utc>>, String> {
    match s {
        None => Ok(None),
        Some(s) => {
            if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
                return Ok(Some(dt.with_timezone(&chrono::Utc)));
            }
            if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Ok(Some(date.and_time(chrono::NaiveTime::MIN).and_utc()));
            }
            Err(format!(
                "Invalid date format: {s}. Use YYYY-MM-DD or RFC3339"
            ))
        }
    }
}
