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
#![allow(unused)]

use std::path::PathBuf;
use anyhow::Result;
use chrono::NaiveDate;
use odin_ndvi::{
    AnalysisResult, AnalysisWindow, ChangeResult, CurrentWeek, HistoryEntry, NdviStatistics, PreviousWeek,
    change_percentage, evaluate_alert, report,
};

// run with "cargo test test_xx -- --nocapture"

fn date (d: u32)->NaiveDate { NaiveDate::from_ymd_opt( 2025, 6, d).unwrap() }

fn result (region: &str, previous_mean: Option<f64>, change_mean: Option<f64>, loss_ha: Option<f64>)->AnalysisResult {
    let current = AnalysisWindow::new( date(8), date(15));
    let alert = change_percentage( change_mean, previous_mean).and_then( |pct| evaluate_alert( pct, 5.0));

    AnalysisResult {
        region: region.to_string(),
        analysis_date: date(15),
        current_week: CurrentWeek {
            window: current,
            stats: NdviStatistics { mean: Some(0.37), std_dev: Some(0.1), p10: Some(0.25), median: Some(0.36), p90: Some(0.5) }
        },
        previous_week: PreviousWeek { window: current.preceding(), mean: previous_mean },
        change: ChangeResult { mean: change_mean, min: Some(-0.3), max: Some(0.2), loss_area_hectares: loss_ha },
        alert,
        images: None,
    }
}

#[test]
fn test_format_alert () {
    assert_eq!( report::format_alert( &result( "A", Some(0.4), Some(0.01), None)), "No alerts");
    assert_eq!( report::format_alert( &result( "A", Some(0.4), Some(-0.03), None)), "ALERT: 7.50% vegetation loss!");
    assert_eq!( report::format_alert( &result( "A", Some(0.4), Some(0.04), None)), "10.00% vegetation increase");
    assert_eq!( report::format_alert( &result( "A", None, Some(-0.3), None)), "No alerts");
}

#[test]
fn test_quick_check () {
    let s = report::quick_check( &result( "Jodhpur", Some(0.4), Some(-0.03), Some(1.0)));
    println!("{s}");
    assert!( s.starts_with("Jodhpur:"));
    assert!( s.contains("NDVI: 0.3700 (-7.50%)"));
    assert!( s.contains("ALERT"));

    let s = report::quick_check( &result( "Bikaner", None, None, None));
    println!("{s}");
    assert!( s.contains("(n/a)"));
    assert!( s.contains("No alerts"));
}

#[test]
fn test_detailed_summary () {
    let s = report::detailed_summary( &result( "Jodhpur", Some(0.4), Some(-0.03), Some(1.0)));
    println!("{s}");
    assert!( s.contains("VEGETATION ANALYSIS SUMMARY - Jodhpur"));
    assert!( s.contains("Analysis Date: 2025-06-15"));
    assert!( s.contains("Current Week:  2025-06-08 to 2025-06-15"));
    assert!( s.contains("Previous Week: 2025-06-01 to 2025-06-08"));
    assert!( s.contains("Median NDVI: 0.3600"));
    assert!( s.contains("NDVI Change: -0.0300 (-7.50%)"));
    assert!( s.contains("Vegetation Loss Area: 1.00 hectares"));
    assert!( s.contains("7.50% vegetation change detected!"));

    let s = report::detailed_summary( &result( "Bikaner", None, None, None));
    println!("{s}");
    assert!( s.contains("Previous Mean NDVI: n/a"));
    assert!( s.contains("NDVI Change: n/a (n/a)"));
    assert!( s.contains("Vegetation Loss Area: n/a"));
    assert!( !s.contains("detected"));
}

#[test]
fn test_comparison ()->Result<()> {
    let a = result( "Jodhpur", Some(0.4), Some(-0.03), Some(1.0));
    let b = result( "Bikaner", Some(0.4), Some(0.01), Some(0.0));

    assert!( report::comparison( &[a.clone()]).is_err());

    let s = report::comparison( &[a, b])?;
    println!("{s}");
    assert!( s.contains("Jodhpur     : 0.3700"));
    assert!( s.contains("Bikaner     : +2.50%"));
    assert!( s.contains("Jodhpur     : ALERT: 7.50% vegetation loss!"));
    Ok(())
}

#[test]
fn test_history_listing () {
    assert_eq!( report::history_listing( &[]), "No analysis files found");

    let mut entries: Vec<HistoryEntry> = (1..=12).rev().map( |d| {
        let ts = date(d).and_hms_opt( 6, 0, 0).unwrap();
        HistoryEntry { path: PathBuf::from( format!("/data/analysis_{}.json", ts.format("%Y%m%d_%H%M%S"))), timestamp: Some(ts) }
    }).collect();

    let s = report::history_listing( &entries);
    println!("{s}");
    assert!( s.starts_with(" 1. 2025-06-12 06:00:00 - analysis_20250612_060000.json"));
    assert!( s.contains("10. 2025-06-03 06:00:00 - analysis_20250603_060000.json"));
    assert!( !s.contains("analysis_20250602_060000.json"));
    assert!( s.contains("... and 2 more files"));

    entries.truncate(1);
    entries.push( HistoryEntry { path: PathBuf::from("/data/analysis_latest.json"), timestamp: None });
    let s = report::history_listing( &entries);
    assert!( s.contains(" 2. analysis_latest.json"));
    assert!( !s.contains("more files"));
}
