use anyhow::Result;
use chrono::Local;
use clap::Parser;
use reachstat_app::{bootstrap, request_timeout};
use reachstat_metrika::{
    DateRange, MetrikaApi, print_table, save_to_csv, validate_config, validate_dates,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "metrika-report",
    about = "Fetch daily visits, pageviews and users from Yandex.Metrika",
    version,
    long_about = None
)]
struct Args {
    /// Start of the period (YYYY-MM-DD). Defaults to six days ago.
    #[arg(long = "date_from")]
    date_from: Option<String>,

    /// End of the period (YYYY-MM-DD). Defaults to today.
    #[arg(long = "date_to")]
    date_to: Option<String>,

    /// CSV file to write. Defaults to metrika_report_<timestamp>.csv
    #[arg(long)]
    output: Option<PathBuf>,

    /// Configuration file (YAML/TOML/JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Mirror debug logs to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "metrika.report.failed");
            println!("Error: {err:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let (config, _log_file) = bootstrap("metrika-report", args.verbose, args.config.as_deref())?;
    let credentials = validate_config(&config.metrika)?;

    // Both dates or neither: a single date falls back to the default week.
    let range = match (&args.date_from, &args.date_to) {
        (Some(from), Some(to)) => validate_dates(from, to)?,
        _ => DateRange::default_window(Local::now().date_naive()),
    };

    println!(
        "Получение данных за период: {} - {}",
        range.date_from(),
        range.date_to()
    );
    println!("Счётчик: {}", credentials.counter_id);

    let api = MetrikaApi::new(
        &config.metrika.base_url,
        credentials,
        request_timeout(&config),
    )?;
    let report = api.get_report(&range).await?;

    print_table(&report)?;
    save_to_csv(&report, args.output.as_deref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_underscore_flags() {
        let args = Args::try_parse_from([
            "metrika-report",
            "--date_from",
            "2024-01-01",
            "--date_to",
            "2024-01-07",
            "--output",
            "out.csv",
        ])
        .unwrap();
        assert_eq!(args.date_from.as_deref(), Some("2024-01-01"));
        assert_eq!(args.date_to.as_deref(), Some("2024-01-07"));
        assert_eq!(args.output, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn all_flags_are_optional() {
        let args = Args::try_parse_from(["metrika-report"]).unwrap();
        assert!(args.date_from.is_none() && args.date_to.is_none() && args.output.is_none());
    }
}
