// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod extract;
pub mod scan;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Expiry Scan CLI
#[derive(Parser, Debug)]
#[command(name = "expiry-cli")]
#[command(version)]
#[command(about = "Extract and classify expiry dates from text or images", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract date candidates from OCR text lines
    Extract(extract::ExtractArgs),

    /// Run the full detect + OCR pipeline on an image file
    Scan(scan::ScanArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Extract(args) => extract::run(args),
        Commands::Scan(args) => scan::run(args).await,
    }
}
