// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::fmt::Write;
use std::path::PathBuf;
use tracing::info;

use crate::config::AppConfig;
use crate::dates::{classify_all, ExpiryReport};
use crate::pipeline::ExpiryPipeline;
use crate::vision::decode_image_bytes;

/// Arguments for the scan command
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Image file to scan
    pub image: PathBuf,

    /// Brand shown in the table (defaults to EXPIRY_BRAND)
    #[arg(long)]
    pub brand: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanJson<'a> {
    image: String,
    regions: usize,
    #[serde(flatten)]
    report: &'a ExpiryReport,
}

/// Plain-text expiry table
pub fn format_report(report: &ExpiryReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<5} {:<20} {:<12} {:<12} {:<8} {}",
        "S.No", "Timestamp", "Brand", "Expiry Date", "Expired", "Life Span (Days)"
    );
    for r in &report.records {
        let _ = writeln!(
            out,
            "{:<5} {:<20} {:<12} {:<12} {:<8} {}",
            r.serial,
            r.analyzed_at,
            r.brand,
            r.expiry_date,
            r.expired_label(),
            r.lifespan_days
        );
    }
    for rejected in &report.rejected {
        let _ = writeln!(
            out,
            "rejected {}: {}",
            rejected.candidate.display(),
            rejected.reason
        );
    }
    out
}

pub async fn run(args: ScanArgs) -> Result<()> {
    run_with_config(args, AppConfig::from_env()?).await
}

/// Scan with an explicit configuration; rejected before any file or network access
pub async fn run_with_config(args: ScanArgs, config: AppConfig) -> Result<()> {
    config.validate()?;

    let data = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("Failed to read {}", args.image.display()))?;
    let (image, _) = decode_image_bytes(&data)?;

    let pipeline = ExpiryPipeline::new(config.build_detector().await?, config.build_reader()?);
    let outcome = pipeline.scan(&image).await?;
    info!(
        "{} regions, {} candidates in {}ms",
        outcome.detections.len(),
        outcome.dates.len(),
        outcome.processing_time_ms
    );

    let brand = args.brand.unwrap_or(config.brand);
    let report = classify_all(&outcome.dates, chrono::Local::now().naive_local(), &brand);

    if args.json {
        let json = ScanJson {
            image: args.image.display().to_string(),
            regions: outcome.detections.len(),
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        print!("{}", format_report(&report));
    }
    Ok(())
}
