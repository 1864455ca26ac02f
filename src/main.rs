use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;

use standings_sync::config::SyncConfig;
use standings_sync::store::CmsClient;
use standings_sync::sync::{SyncSummary, load_document, run_sync};

fn main() -> ExitCode {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<SyncSummary> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut cfg = SyncConfig::from_env(parse_html_file_arg(&args))?;
    if has_flag(&args, "--dry-run") {
        cfg.dry_run = true;
    }
    if has_flag(&args, "--no-publish") {
        cfg.publish = false;
    }

    let document = load_document(&cfg.source)?;
    let store = CmsClient::new(&cfg);
    run_sync(&cfg, &document, &store)
}

fn print_summary(summary: &SyncSummary) {
    println!("Standings sync complete");
    println!(
        "Table: {}/{} ({} known teams matched)",
        summary.table_index, summary.tables_found, summary.score
    );
    println!(
        "Updated: {}  Created: {}  Skipped: {}  Published: {}",
        summary.updated, summary.created, summary.skipped, summary.published
    );
    if !summary.missing_from_page.is_empty() {
        println!("Not on page: {}", summary.missing_from_page.len());
        for name in summary.missing_from_page.iter().take(8) {
            println!(" - {name}");
        }
    }
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_html_file_arg(args: &[String]) -> Option<PathBuf> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--html-file=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--html-file"
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}
