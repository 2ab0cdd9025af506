use anyhow::{Result, anyhow};
use clap::Parser;
use reachstat_app::{bootstrap, request_timeout};
use reachstat_common::ReachError;
use reachstat_social::pacing;
use reachstat_social::vk::{PostAnalyzer, VkApi, print_statistics};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "vk-likes",
    about = "Break down who liked a VK wall post by age group and sex",
    version,
    long_about = None
)]
struct Args {
    /// Link to the post, e.g. https://vk.com/wall-84648738_222312
    post_url: String,

    /// VK access token
    #[arg(long, env = "VK_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Also print the statistics as JSON
    #[arg(long)]
    json: bool,

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
            tracing::error!(error = %format!("{err:#}"), "vk.likes.failed");
            println!("Error: {err:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let (config, _log_file) = bootstrap("vk-likes", args.verbose, args.config.as_deref())?;

    let token = args
        .access_token
        .or(config.vk.access_token.clone())
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| anyhow!(ReachError::Config("VK access token is not set".into())))?;

    let api = VkApi::new(
        &config.vk.base_url,
        token,
        config.vk.api_version.as_str(),
        request_timeout(&config),
    )?;
    let pacer = pacing::from_settings(&config.vk.pacing)?;
    let mut analyzer = PostAnalyzer::new(api, &args.post_url, pacer)?;

    println!("Analyzing post {}", analyzer.post());
    println!("Collecting likers...");
    let analysis = analyzer.run_analysis().await;
    for failure in &analysis.failures {
        println!("Warning: {failure}");
    }
    let Some(statistics) = analysis.statistics else {
        println!("Post not found or has no likes");
        return Ok(());
    };

    println!("Found {} likers", analysis.likers);
    print_statistics(&statistics)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&statistics)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_url_is_positional() {
        let args = Args::try_parse_from([
            "vk-likes",
            "https://vk.com/wall-1_2",
            "--access-token",
            "t",
            "--json",
        ])
        .unwrap();
        assert_eq!(args.post_url, "https://vk.com/wall-1_2");
        assert_eq!(args.access_token.as_deref(), Some("t"));
        assert!(args.json);
    }

    #[test]
    fn post_url_is_required() {
        assert!(Args::try_parse_from(["vk-likes"]).is_err());
    }
}
