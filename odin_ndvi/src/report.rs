/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! plain text reports for console output. All functions return strings so that callers decide where
//! they go. Missing values are rendered as `n/a`

use std::fmt::Write;

use crate::{AnalysisResult, HistoryEntry, errors::{Result, op_failed}};

pub const NA: &str = "n/a";
pub const MAX_HISTORY_LINES: usize = 10;

const LINE_WIDTH: usize = 60;

pub fn separator ()->String { "=".repeat( LINE_WIDTH) }

pub fn fmt_value (v: Option<f64>, precision: usize)->String {
    match v {
        Some(v) => format!("{:.*}", precision, v),
        None => NA.to_string()
    }
}

pub fn fmt_signed (v: Option<f64>, precision: usize)->String {
    match v {
        Some(v) => format!("{:+.*}", precision, v),
        None => NA.to_string()
    }
}

fn fmt_percentage (v: Option<f64>)->String {
    match v {
        Some(v) => format!("{:+.2}%", v),
        None => NA.to_string()
    }
}

pub fn format_alert (result: &AnalysisResult)->String {
    match &result.alert {
        Some(alert) if alert.triggered => {
            if alert.is_loss() {
                format!("ALERT: {:.2}% vegetation loss!", alert.change_percentage.abs())
            } else {
                format!("{:.2}% vegetation increase", alert.change_percentage.abs())
            }
        }
        _ => "No alerts".to_string()
    }
}

/// the two line per region summary of a quick check
pub fn quick_check (result: &AnalysisResult)->String {
    format!("{}:\n   NDVI: {} ({})\n   {}",
        result.region,
        fmt_value( result.current_week.stats.mean, 4),
        fmt_percentage( result.change_percentage()),
        format_alert( result))
}

pub fn detailed_summary (result: &AnalysisResult)->String {
    let cw = &result.current_week;
    let stats = &cw.stats;
    let change = &result.change;
    let mut s = String::new();

    // writing to a String cannot fail
    let _ = writeln!( s, "{}", separator());
    let _ = writeln!( s, "VEGETATION ANALYSIS SUMMARY - {}", result.region);
    let _ = writeln!( s, "{}", separator());
    let _ = writeln!( s, "Analysis Date: {}", result.analysis_date);
    let _ = writeln!( s, "Current Week:  {}", cw.window);
    let _ = writeln!( s, "Previous Week: {}", result.previous_week.window);

    let _ = writeln!( s, "\nCurrent Week NDVI Statistics:");
    let _ = writeln!( s, "   Mean NDVI: {}", fmt_value( stats.mean, 4));
    let _ = writeln!( s, "   Median NDVI: {}", fmt_value( stats.median, 4));
    let _ = writeln!( s, "   Std Dev: {}", fmt_value( stats.std_dev, 4));
    let _ = writeln!( s, "   Range (p10-p90): {} - {}", fmt_value( stats.p10, 4), fmt_value( stats.p90, 4));
    let _ = writeln!( s, "   Previous Mean NDVI: {}", fmt_value( result.previous_week.mean, 4));

    let _ = writeln!( s, "\nWeek-over-Week Change:");
    let _ = writeln!( s, "   NDVI Change: {} ({})", fmt_signed( change.mean, 4), fmt_percentage( result.change_percentage()));
    let _ = writeln!( s, "   Min Change: {}", fmt_value( change.min, 4));
    let _ = writeln!( s, "   Max Change: {}", fmt_value( change.max, 4));
    match change.loss_area_hectares {
        Some(ha) => { let _ = writeln!( s, "   Vegetation Loss Area: {:.2} hectares", ha); }
        None => { let _ = writeln!( s, "   Vegetation Loss Area: {}", NA); }
    }

    if let Some(alert) = &result.alert {
        if alert.triggered {
            let _ = writeln!( s, "\n{}", alert.message);
        }
    }
    let _ = write!( s, "{}", separator());
    s
}

/// side-by-side comparison of current NDVI, change and alerts. This needs at least two results
pub fn comparison (results: &[AnalysisResult])->Result<String> {
    if results.len() < 2 {
        return Err( op_failed!("need at least two results to compare, got {}", results.len()))
    }

    let mut s = String::new();
    let _ = writeln!( s, "Current NDVI:");
    for r in results {
        let _ = writeln!( s, "   {:12}: {}", r.region, fmt_value( r.current_week.stats.mean, 4));
    }

    let _ = writeln!( s, "\nWeek-over-Week Change:");
    for r in results {
        let _ = writeln!( s, "   {:12}: {}", r.region, fmt_percentage( r.change_percentage()));
    }

    let _ = writeln!( s, "\nAlerts:");
    for r in results {
        let _ = writeln!( s, "   {:12}: {}", r.region, format_alert( r));
    }
    Ok(s)
}

/// numbered list of the newest record files (store order)
pub fn history_listing (entries: &[HistoryEntry])->String {
    if entries.is_empty() {
        return "No analysis files found".to_string()
    }

    let mut s = String::new();
    for (i, e) in entries.iter().take( MAX_HISTORY_LINES).enumerate() {
        match &e.timestamp {
            Some(ts) => { let _ = writeln!( s, "{:2}. {} - {}", i+1, ts.format("%Y-%m-%d %H:%M:%S"), e.filename()); }
            None => { let _ = writeln!( s, "{:2}. {}", i+1, e.filename()); }
        }
    }

    if entries.len() > MAX_HISTORY_LINES {
        let _ = write!( s, "\n... and {} more files\n", entries.len() - MAX_HISTORY_LINES);
    }
    s
}
