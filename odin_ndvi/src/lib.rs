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

//! crate to monitor week-over-week vegetation (NDVI) changes of configured regions.
//!
//! All remote sensing computation (cloud filtering, median compositing, band math and spatial reduction)
//! is done by a remote statistics service (see [`stats_service`]). This crate only assembles the requests,
//! unwraps the returned scalar aggregates and derives change percentages and alerts from them. Results are
//! stored as timestamped JSON records ([`history`]) and presented by the `ndvi_monitor` CLI and the
//! `ndvi_dashboard` web server.

use std::fmt;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Serialize,Deserialize};
use strum::Display;

pub mod errors;
pub use errors::{OdinNdviError, Result};

pub mod config;
pub use config::*;

pub mod stats_service;
pub use stats_service::*;

pub mod sim_service;
pub use sim_service::SimulatedStatisticsService;

pub mod analyzer;
pub use analyzer::DistrictChangeAnalyzer;

pub mod history;
pub use history::{HistoryStore, HistoryEntry, AnalysisRecord};

pub mod report;

pub mod web;

pub const SQM_PER_HECTARE: f64 = 10_000.0;

/* #region regions and windows  ********************************************************************************/

/// a generic lon/lat bounding box in degrees
#[derive(Debug,Copy,Clone,Serialize,Deserialize,PartialEq)]
pub struct BoundingBox {
    pub west: f64,  // min lon
    pub south: f64, // min lat
    pub east: f64,  // max lon
    pub north: f64  // max lat
}

impl BoundingBox {
    pub fn new (west: f64, south: f64, east: f64, north: f64)->Self {
        BoundingBox { west, south, east, north }
    }

    /// from a `[min_lon, min_lat, max_lon, max_lat]` array
    pub fn from_wsen (wsen: &[f64;4])->Self {
        BoundingBox { west: wsen[0], south: wsen[1], east: wsen[2], north: wsen[3] }
    }

    pub fn to_wsen (&self)->[f64;4] {
        [self.west, self.south, self.east, self.north]
    }

    pub fn center (&self)->(f64,f64) {
        ( (self.west + self.east) / 2.0, (self.south + self.north) / 2.0 )
    }

    pub fn is_valid (&self)->bool {
        self.west < self.east && self.south < self.north &&
        self.west >= -180.0 && self.east <= 180.0 && self.south >= -90.0 && self.north <= 90.0
    }
}

/// the immutable descriptor of a monitored region (district)
#[derive(Debug,Clone,Serialize,Deserialize,PartialEq)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub bbox: BoundingBox,

    #[serde(default)]
    pub center: Option<(f64,f64)>, // (lon,lat) for map display - bbox center if not set
}

impl Region {
    pub fn new (id: impl ToString, name: impl ToString, bbox: BoundingBox)->Self {
        Region { id: id.to_string(), name: name.to_string(), bbox, center: None }
    }

    pub fn display_center (&self)->(f64,f64) {
        self.center.unwrap_or_else( || self.bbox.center())
    }
}

/// half open `[start,end)` date interval used as one reporting period
#[derive(Debug,Copy,Clone,Serialize,Deserialize,PartialEq,Eq,Hash)]
pub struct AnalysisWindow {
    pub start: NaiveDate,
    pub end: NaiveDate
}

impl AnalysisWindow {
    pub fn new (start: NaiveDate, end: NaiveDate)->Self {
        AnalysisWindow { start, end }
    }

    /// the window of `days` length that ends (exclusive) at `end`
    pub fn ending_at (end: NaiveDate, days: u32)->Self {
        AnalysisWindow { start: end - TimeDelta::days( days as i64), end }
    }

    /// the window of same length that directly precedes this one
    pub fn preceding (&self)->Self {
        AnalysisWindow { start: self.start - (self.end - self.start), end: self.start }
    }

    pub fn days (&self)->i64 { (self.end - self.start).num_days() }

    pub fn contains (&self, date: &NaiveDate)->bool {
        *date >= self.start && *date < self.end
    }
}

impl fmt::Display for AnalysisWindow {
    fn fmt (&self, f: &mut fmt::Formatter<'_>)->fmt::Result {
        write!( f, "{} to {}", self.start, self.end)
    }
}

/// get the (current,previous) windows for a given reference time.
/// current is `[today - days, today)`, previous is `[today - 2*days, today - days)`
pub fn analysis_windows (now: &DateTime<Utc>, days: u32)->(AnalysisWindow,AnalysisWindow) {
    let current = AnalysisWindow::ending_at( now.date_naive(), days);
    let previous = current.preceding();
    (current, previous)
}

/* #endregion regions and windows */

/* #region analysis results  ***********************************************************************************/

// field names follow the JSON record format of the analysis logs

/// NDVI aggregates of one window. `None` means the service had no valid pixels (e.g. all cloud masked)
#[derive(Debug,Clone,Default,Serialize,Deserialize,PartialEq)]
pub struct NdviStatistics {
    #[serde(rename="ndvi_mean")]
    pub mean: Option<f64>,
    #[serde(rename="ndvi_std")]
    pub std_dev: Option<f64>,
    #[serde(rename="ndvi_p10")]
    pub p10: Option<f64>,
    #[serde(rename="ndvi_median")]
    pub median: Option<f64>,
    #[serde(rename="ndvi_p90")]
    pub p90: Option<f64>,
}

#[derive(Debug,Clone,Serialize,Deserialize,PartialEq)]
pub struct CurrentWeek {
    #[serde(flatten)]
    pub window: AnalysisWindow,
    #[serde(flatten)]
    pub stats: NdviStatistics,
}

#[derive(Debug,Clone,Serialize,Deserialize,PartialEq)]
pub struct PreviousWeek {
    #[serde(flatten)]
    pub window: AnalysisWindow,
    #[serde(rename="ndvi_mean")]
    pub mean: Option<f64>,
}

/// per-pixel NDVI difference aggregates between current and previous window
#[derive(Debug,Clone,Default,Serialize,Deserialize,PartialEq)]
pub struct ChangeResult {
    #[serde(rename="ndvi_change_mean")]
    pub mean: Option<f64>,
    #[serde(rename="ndvi_change_min")]
    pub min: Option<f64>,
    #[serde(rename="ndvi_change_max")]
    pub max: Option<f64>,

    /// area for which the per-pixel difference fell below the loss delta
    #[serde(rename="vegetation_loss_area_hectares")]
    pub loss_area_hectares: Option<f64>,
}

#[derive(Debug,Copy,Clone,Serialize,Deserialize,PartialEq,Eq,Display)]
pub enum AlertKind {
    #[serde(rename="vegetation_loss")]
    #[strum(serialize="vegetation loss")]
    Loss,

    #[serde(rename="vegetation_gain")]
    #[strum(serialize="vegetation gain")]
    Gain
}

#[derive(Debug,Clone,Serialize,Deserialize,PartialEq)]
pub struct AlertDecision {
    pub triggered: bool,
    #[serde(rename="type")]
    pub kind: AlertKind,
    pub change_percentage: f64,
    pub message: String,
}

impl AlertDecision {
    pub fn new (change_percentage: f64)->Self {
        let kind = if change_percentage < 0.0 { AlertKind::Loss } else { AlertKind::Gain };
        let message = format!("{:.2}% vegetation change detected!", change_percentage.abs());
        AlertDecision { triggered: true, kind, change_percentage, message }
    }

    pub fn is_loss (&self)->bool { self.kind == AlertKind::Loss }
}

/// the result of analyzing one region for a given date. Created per invocation, never mutated afterwards
#[derive(Debug,Clone,Serialize,Deserialize,PartialEq)]
pub struct AnalysisResult {
    #[serde(rename="district", alias="region")]
    pub region: String,
    pub analysis_date: NaiveDate,
    pub current_week: CurrentWeek,
    pub previous_week: PreviousWeek,
    pub change: ChangeResult,

    #[serde(default, skip_serializing_if="Option::is_none")]
    pub alert: Option<AlertDecision>,

    /// server side image references - these are not part of the record format
    #[serde(skip)]
    pub images: Option<NdviImages>,
}

impl AnalysisResult {
    pub fn change_percentage (&self)->Option<f64> {
        change_percentage( self.change.mean, self.previous_week.mean)
    }

    pub fn has_alert (&self)->bool {
        self.alert.as_ref().map( |a| a.triggered).unwrap_or(false)
    }

    pub fn density (&self, thresholds: &DensityThresholds)->VegetationDensity {
        VegetationDensity::classify( self.current_week.stats.median, thresholds)
    }

    /// a copy without the (non-serialized) image references, which is what we get back from a record
    pub fn without_images (&self)->Self {
        AnalysisResult { images: None, ..self.clone() }
    }
}

/// the server side images an analysis was computed from
#[derive(Debug,Clone,PartialEq)]
pub struct NdviImages {
    pub current: ImageRef,
    pub previous: ImageRef,
    pub change: ImageRef,
}

#[derive(Debug,Copy,Clone,Serialize,Deserialize,PartialEq,Eq,Display)]
#[serde(rename_all="lowercase")]
pub enum VegetationDensity {
    Unknown,
    Low,
    Sparse,
    Moderate,
    Dense
}

impl VegetationDensity {
    pub fn classify (median: Option<f64>, t: &DensityThresholds)->Self {
        match median {
            Some(v) if v > t.dense => VegetationDensity::Dense,
            Some(v) if v > t.moderate => VegetationDensity::Moderate,
            Some(v) if v > t.sparse => VegetationDensity::Sparse,
            Some(_) => VegetationDensity::Low,
            None => VegetationDensity::Unknown
        }
    }
}

/* #endregion analysis results */

/* #region derived values  *************************************************************************************/

/// convert a pixel count into hectares for a given (square) pixel resolution in meters
pub fn pixels_to_hectares (count: f64, resolution: f64)->f64 {
    count * (resolution * resolution) / SQM_PER_HECTARE
}

/// `mean_delta / previous_mean * 100`. This is `None` if either value is missing, or if the previous mean
/// is exactly zero (which is valid data but leaves the percentage undefined)
pub fn change_percentage (mean_delta: Option<f64>, previous_mean: Option<f64>)->Option<f64> {
    match (mean_delta, previous_mean) {
        (Some(delta), Some(prev)) if prev != 0.0 => {
            let pct = delta / prev * 100.0;
            if pct.is_finite() { Some(pct) } else { None }
        }
        _ => None
    }
}

/// alerts are raised if the absolute change percentage strictly exceeds the threshold
pub fn evaluate_alert (change_percentage: f64, threshold: f64)->Option<AlertDecision> {
    if change_percentage.abs() > threshold {
        Some( AlertDecision::new( change_percentage))
    } else {
        None
    }
}

/* #endregion derived values */
