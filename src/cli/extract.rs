// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Args;
use std::fmt::Write;

use crate::dates::{extract_dates, DateCandidate};

/// Arguments for the extract command
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// OCR text lines to search
    #[arg(required = true)]
    pub texts: Vec<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// One line per candidate
pub fn format_candidates(candidates: &[DateCandidate]) -> String {
    let mut out = String::new();
    if candidates.is_empty() {
        out.push_str("No dates found\n");
        return out;
    }
    for (i, candidate) in candidates.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  year={} month={} day={}",
            i + 1,
            candidate.year,
            candidate.month,
            candidate.day
        );
    }
    out
}

pub fn run(args: ExtractArgs) -> Result<()> {
    let candidates = extract_dates(&args.texts);
    tracing::debug!("{} of {} lines matched", candidates.len(), args.texts.len());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
    } else {
        print!("{}", format_candidates(&candidates));
    }
    Ok(())
}
