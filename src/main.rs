// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use colorful::Colorful;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

use speechcheckr::cli::{collect_wav_files, format_json, format_report, load_wav, Args};
use speechcheckr::config::AnalysisConfig;
use speechcheckr::core::{AudioAnalyzer, ProgressEvent};
use speechcheckr::detection::QcSummary;

const PROGRESS_STEPS: u64 = 1000;

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let analyzer = build_analyzer(&args)?;
    let wav_files = collect_wav_files(&args.input)?;

    if wav_files.is_empty() {
        println!("{}", "No WAV files found!".red());
        return Ok(());
    }

    if !args.json {
        println!("Found {} WAV file(s)\n", wav_files.len());
    }

    for file_path in wav_files {
        if let Err(e) = process_file(&analyzer, &file_path, &args) {
            eprintln!("{} {}: {:#}", "✗".red(), file_path.display(), e);
        }
    }

    Ok(())
}

fn build_analyzer(args: &Args) -> Result<AudioAnalyzer> {
    let config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            AnalysisConfig::from_json(&json)
                .with_context(|| format!("Invalid config: {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };

    let mut builder = AudioAnalyzer::builder().config(config);
    if let Some(target) = args.target {
        builder = builder.normalization_target(target);
    }
    Ok(builder.build())
}

fn process_file(analyzer: &AudioAnalyzer, file_path: &Path, args: &Args) -> Result<()> {
    if !args.json {
        println!("Analyzing: {}", file_path.display().to_string().cyan());
    }

    let buffer = load_wav(file_path)?;

    let show_progress = !args.no_progress && !args.json;
    let bar = if show_progress {
        let bar = ProgressBar::new(PROGRESS_STEPS);
        bar.set_style(
            ProgressStyle::with_template("  [{elapsed_precise}] [{wide_bar:.cyan/blue}] {percent}% {msg}")
                .context("Invalid progress template")?
                .progress_chars("#>-"),
        );
        Some(bar)
    } else {
        None
    };

    let mut on_progress = |event: &ProgressEvent| {
        if let Some(bar) = &bar {
            bar.set_position((event.progress as f64 * PROGRESS_STEPS as f64) as u64);
            bar.set_message(event.message.clone());
        }
    };

    let result = analyzer.analyze(&buffer, Some(&mut on_progress), !args.basic);
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }
    let report = result.with_context(|| format!("Analysis failed: {}", file_path.display()))?;
    let summary = QcSummary::with_criteria(&report, &analyzer.config().qc);

    if args.json {
        println!("{}", format_json(file_path, &report, &summary)?);
    } else {
        print!("{}", format_report(file_path, &report, &summary, args.verbose));
        println!();
    }

    Ok(())
}
