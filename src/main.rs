use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result, anyhow};

use mvp_pipeline::config::PipelineConfig;
use mvp_pipeline::pipeline;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let mut cfg = PipelineConfig::from_env()?;
    apply_cli_overrides(&mut cfg)?;
    cfg.validate()?;

    let cancel = AtomicBool::new(false);
    let summary = pipeline::run(&cfg, &cancel)?;

    println!("MVP pipeline complete");
    println!("DB: {}", summary.db_path.display());
    println!(
        "Years: {}..{} ({} seasons)",
        summary.year_start,
        summary.year_end,
        cfg.season_count()
    );
    println!(
        "Seasons: {}/{}",
        summary.seasons_succeeded, summary.seasons_attempted
    );
    println!("Basetable rows: {}", summary.basetable_rows);
    println!("Predictor columns: {}", summary.predictor_columns);
    println!(
        "Join gaps: {} players without votes, {} players without standings, {} standings-only rows",
        summary.merge_report.players_without_votes,
        summary.merge_report.players_without_standings,
        summary.merge_report.standings_only_rows
    );
    if !summary.failures.is_empty() {
        println!("Failed seasons: {}", summary.failures.len());
        for failure in summary.failures.iter().take(8) {
            println!(" - {}", failure.describe());
        }
    }

    Ok(())
}

fn apply_cli_overrides(cfg: &mut PipelineConfig) -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix("--years=") {
            apply_years(cfg, raw)?;
        }
        if arg == "--years"
            && let Some(next) = args.get(idx + 1)
        {
            apply_years(cfg, next)?;
        }
        if let Some(path) = arg.strip_prefix("--db=") {
            apply_path(&mut cfg.db_path, path);
        }
        if arg == "--db"
            && let Some(next) = args.get(idx + 1)
        {
            apply_path(&mut cfg.db_path, next);
        }
        if let Some(path) = arg.strip_prefix("--cache-dir=") {
            apply_path(&mut cfg.cache_root, path);
        }
        if arg == "--cache-dir"
            && let Some(next) = args.get(idx + 1)
        {
            apply_path(&mut cfg.cache_root, next);
        }
        if arg == "--refresh" {
            cfg.force_refresh = true;
        }
    }
    Ok(())
}

fn apply_years(cfg: &mut PipelineConfig, raw: &str) -> Result<()> {
    let Some((start, end)) = raw.split_once(':') else {
        return Err(anyhow!(
            "--years expects START:END with an exclusive end, got {raw}"
        ));
    };
    cfg.year_start = start
        .trim()
        .parse()
        .with_context(|| format!("bad start year in --years: {start}"))?;
    cfg.year_end = end
        .trim()
        .parse()
        .with_context(|| format!("bad end year in --years: {end}"))?;
    Ok(())
}

fn apply_path(target: &mut PathBuf, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        *target = PathBuf::from(trimmed);
    }
}
