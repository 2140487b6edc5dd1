// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTML pages for the upload form and the produce readings table

use ammonia::clean_text;
use std::fmt::Write;

use crate::dates::ExpiryReport;
use crate::freshness::ProduceReading;

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
table{border-collapse:collapse;margin-top:1em}\
th,td{border:1px solid #999;padding:4px 10px;text-align:left}\
.error{color:#a00}";

/// Result of one upload, shown under the form
pub struct ScanView<'a> {
    pub filename: &'a str,
    pub regions: usize,
    pub report: &'a ExpiryReport,
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
         <style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        clean_text(title),
        STYLE,
        body
    )
}

/// Upload form, followed by the expiry table when a scan is given
pub fn index_page(scan: Option<&ScanView<'_>>) -> String {
    let mut body = String::from(
        "<h1>Expiry Date Scanner</h1>\n\
         <form action=\"/process\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"image\" accept=\"image/*\" required>\n\
         <button type=\"submit\">Scan</button>\n\
         </form>\n",
    );

    if let Some(scan) = scan {
        body.push_str(&expiry_section(scan));
    }

    page("Expiry Date Scanner", &body)
}

fn expiry_section(scan: &ScanView<'_>) -> String {
    let mut html = String::new();
    let _ = writeln!(
        html,
        "<h2>Results for {}</h2>\n<p>{} date region(s) detected</p>",
        clean_text(scan.filename),
        scan.regions
    );

    if scan.report.records.is_empty() {
        html.push_str("<p>No expiry dates found.</p>\n");
    } else {
        html.push_str(
            "<table>\n<tr><th>S.No</th><th>Timestamp</th><th>Brand</th>\
             <th>Expiry Date</th><th>Expired</th><th>Expected Life Span (Days)</th></tr>\n",
        );
        for record in &scan.report.records {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                record.serial,
                clean_text(&record.analyzed_at),
                clean_text(&record.brand),
                clean_text(&record.expiry_date),
                record.expired_label(),
                record.lifespan_days
            );
        }
        html.push_str("</table>\n");
    }

    if !scan.report.rejected.is_empty() {
        html.push_str("<h3>Unreadable dates</h3>\n<ul class=\"error\">\n");
        for rejected in &scan.report.rejected {
            let _ = writeln!(
                html,
                "<li>{}: {}</li>",
                clean_text(&rejected.candidate.display()),
                clean_text(&rejected.reason)
            );
        }
        html.push_str("</ul>\n");
    }

    html
}

/// Live feed plus the accumulated produce readings
pub fn findex_page(readings: &[ProduceReading], has_camera: bool) -> String {
    let mut body = String::from("<h1>Produce Freshness</h1>\n");

    if has_camera {
        body.push_str("<img src=\"/video_feed\" alt=\"Live feed\" width=\"640\">\n");
    } else {
        body.push_str("<p class=\"error\">No camera configured.</p>\n");
    }

    if readings.is_empty() {
        body.push_str("<p>No readings yet.</p>\n");
    } else {
        body.push_str(
            "<table>\n<tr><th>Timestamp</th><th>Produce</th>\
             <th>Freshness (1-10)</th><th>Expected Life Span (Days)</th></tr>\n",
        );
        for reading in readings {
            let _ = writeln!(
                body,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                clean_text(&reading.timestamp),
                clean_text(&reading.produce),
                reading.freshness,
                reading.lifespan
            );
        }
        body.push_str("</table>\n");
    }

    page("Produce Freshness", &body)
}
