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

//! append-only store of analysis records. Each run is kept as `analysis_YYYYMMDD_HHMMSS.json` that contains a
//! JSON object mapping region ids to (serialized) [`AnalysisResult`] values

use std::{collections::BTreeMap, fs, io::Write, path::{Path,PathBuf}};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::{AnalysisResult, errors::{Result, op_failed}};

pub const RECORD_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

lazy_static! {
    static ref RECORD_RE: Regex = Regex::new( r"^analysis_(.+)\.json$").unwrap();
}

/// a record file in the store. The timestamp is `None` if the filename does not contain a valid one
#[derive(Debug,Clone,PartialEq,Serialize)]
pub struct HistoryEntry {
    pub path: PathBuf,
    pub timestamp: Option<NaiveDateTime>,
}

impl HistoryEntry {
    fn from_path (path: PathBuf)->Option<Self> {
        let fname = path.file_name()?.to_str()?;
        let cap = RECORD_RE.captures( fname)?;
        let timestamp = cap.get(1).and_then( |m| NaiveDateTime::parse_from_str( m.as_str(), RECORD_TIMESTAMP_FORMAT).ok());
        Some( HistoryEntry { path, timestamp } )
    }

    pub fn filename (&self)->&str {
        self.path.file_name().and_then( |f| f.to_str()).unwrap_or("")
    }
}

/// the contents of one record file
#[derive(Debug,Clone,PartialEq)]
pub struct AnalysisRecord {
    pub timestamp: Option<NaiveDateTime>,
    pub results: BTreeMap<String,AnalysisResult>,
}

impl AnalysisRecord {
    pub fn get (&self, region_id: &str)->Option<&AnalysisResult> {
        self.results.get( region_id)
    }
}

pub struct HistoryStore {
    dir: PathBuf
}

impl HistoryStore {
    pub fn new (dir: impl AsRef<Path>)->Self {
        HistoryStore { dir: dir.as_ref().to_path_buf() }
    }

    pub fn dir (&self)->&Path { &self.dir }

    pub fn record_filename (timestamp: &DateTime<Utc>)->String {
        format!("analysis_{}.json", timestamp.format( RECORD_TIMESTAMP_FORMAT))
    }

    /// store a new record for the given results. Records are never overwritten, and partially written
    /// records are never visible in the store
    pub fn save (&self, results: &[AnalysisResult], timestamp: &DateTime<Utc>)->Result<PathBuf> {
        if results.is_empty() { return Err( op_failed!("no results to save")) }

        fs::create_dir_all( &self.dir)?;
        let path = self.dir.join( Self::record_filename( timestamp));
        if path.exists() { return Err( op_failed!("record {:?} already exists", path)) }

        let map: BTreeMap<&str,&AnalysisResult> = results.iter().map( |r| (r.region.as_str(), r)).collect();
        let json = serde_json::to_string_pretty( &map)?;

        // temp files are deleted when dropped, i.e. on all error paths
        let mut file = NamedTempFile::new_in( &self.dir)?;
        file.write_all( json.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist_noclobber( &path)
            .map_err( |e| op_failed!("cannot create record {:?}: {}", path, e.error))?;

        debug!("saved analysis record {:?}", path);
        Ok(path)
    }

    /// all record entries, newest first. Entries without valid timestamp are listed last
    pub fn list (&self)->Result<Vec<HistoryEntry>> {
        if !self.dir.is_dir() { return Ok( Vec::new()) }

        let mut entries: Vec<HistoryEntry> = Vec::new();
        for e in fs::read_dir( &self.dir)? {
            let path = e?.path();
            if path.is_file() {
                if let Some(entry) = HistoryEntry::from_path( path) { entries.push( entry) }
            }
        }

        entries.sort_by( |a,b| {
            b.timestamp.is_some().cmp( &a.timestamp.is_some())
                .then_with( || b.timestamp.cmp( &a.timestamp))
                .then_with( || b.filename().cmp( a.filename()))
        });
        Ok(entries)
    }

    pub fn load (&self, entry: &HistoryEntry)->Result<AnalysisRecord> {
        let data = fs::read_to_string( &entry.path)?;
        let results: BTreeMap<String,AnalysisResult> = serde_json::from_str( data.as_str())?;
        Ok( AnalysisRecord { timestamp: entry.timestamp, results } )
    }

    /// all readable records, newest first. Files that cannot be parsed are skipped
    pub fn load_all (&self)->Result<Vec<AnalysisRecord>> {
        let mut records = Vec::new();
        for entry in self.list()? {
            match self.load( &entry) {
                Ok(record) => records.push( record),
                Err(e) => warn!("could not load {}: {}", entry.filename(), e)
            }
        }
        Ok(records)
    }

    pub fn latest (&self)->Result<Option<AnalysisRecord>> {
        for entry in self.list()? {
            match self.load( &entry) {
                Ok(record) => return Ok( Some(record)),
                Err(e) => warn!("could not load {}: {}", entry.filename(), e)
            }
        }
        Ok(None)
    }

    /// (analysis_date, current mean) of a region over all timestamped records, ordered by analysis date.
    /// Records without the region or without a current mean are skipped, and so are files without a valid
    /// timestamp in their name (e.g. manual copies)
    pub fn trend (&self, region_id: &str)->Result<Vec<(NaiveDate,f64)>> {
        let mut points: Vec<(NaiveDate,f64)> = self.load_all()?.iter().rev()
            .filter( |rec| rec.timestamp.is_some())
            .filter_map( |rec| rec.get( region_id))
            .filter_map( |r| r.current_week.stats.mean.map( |mean| (r.analysis_date, mean)))
            .collect();
        points.sort_by_key( |(date,_)| *date);
        Ok(points)
    }
}
