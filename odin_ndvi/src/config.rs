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

//! RON based configuration of regions, thresholds, the statistics service and the dashboard.
//!
//! Config files are looked up in this order:
//!   1. an explicit path (e.g. from a `--config` command line option)
//!   2. `$ODIN_HOME/configs/odin_ndvi/<file>`
//!   3. `~/.odin/configs/odin_ndvi/<file>`
//!   4. the `configs/` dir of this crate
//!
//! The region/threshold config and the dashboard config have built-in defaults, the statistics service
//! config does not (there is no meaningful default endpoint).

use std::{collections::HashSet, env, net::SocketAddr, path::{Path,PathBuf}, time::Duration};
use serde::{Serialize,Deserialize,Deserializer,de::DeserializeOwned};
use tracing::debug;

use crate::{BoundingBox, Region, errors::{Result, OdinNdviError, config_error}};

pub const CONFIGS: &str = "configs";
pub const NDVI_CONFIG: &str = "ndvi.ron";
pub const STATS_SERVICE_CONFIG: &str = "stats_service.ron";
pub const DASHBOARD_CONFIG: &str = "dashboard.ron";

/* #region config types  ***************************************************************************************/

/// the immutable analysis configuration that is injected into analyzers and servers
#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct NdviConfig {
    pub regions: Vec<Region>,

    /// percentage of absolute week-over-week mean change that triggers an alert
    pub alert_threshold: f64,
    /// per-pixel NDVI difference below which a pixel counts as vegetation loss
    pub loss_delta: f64,

    /// spatial resolution (pixel size) in meters
    pub resolution: f64,
    pub max_pixels: u64,
    /// max cloudy pixel percentage of images that go into composites
    pub cloud_cover_max: f64,
    pub collection: String,

    #[serde(default="default_window_days")]
    pub window_days: u32,

    #[serde(default)]
    pub density: DensityThresholds,

    /// where we keep the analysis records. Defaults to `<odin-home>/data/odin_ndvi`
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_window_days()->u32 { 7 }

impl Default for NdviConfig {
    fn default()->Self {
        let mut jodhpur = Region::new( "Jodhpur", "Jodhpur District", BoundingBox::from_wsen( &[72.8, 26.0, 73.5, 27.0]));
        jodhpur.center = Some( (73.02, 26.28));

        let mut bikaner = Region::new( "Bikaner", "Bikaner District", BoundingBox::from_wsen( &[72.8, 27.5, 73.8, 28.5]));
        bikaner.center = Some( (73.31, 28.01));

        NdviConfig {
            regions: vec![ jodhpur, bikaner ],
            alert_threshold: 5.0,
            loss_delta: -0.1,
            resolution: 10.0,
            max_pixels: 1_000_000_000,
            cloud_cover_max: 20.0,
            collection: "COPERNICUS/S2_SR_HARMONIZED".to_string(),
            window_days: default_window_days(),
            density: DensityThresholds::default(),
            data_dir: None
        }
    }
}

impl NdviConfig {
    /// region lookup by id. We accept ids that only differ in ASCII case since they are mostly typed in by users
    pub fn region (&self, id: &str)->Result<&Region> {
        self.regions.iter().find( |r| r.id == id)
            .or_else( || self.regions.iter().find( |r| r.id.eq_ignore_ascii_case( id)))
            .ok_or_else( || OdinNdviError::RegionNotFound( id.to_string()))
    }

    pub fn region_ids (&self)->Vec<&str> {
        self.regions.iter().map( |r| r.id.as_str()).collect()
    }

    pub fn history_dir (&self)->PathBuf {
        match &self.data_dir {
            Some(dir) => dir.clone(),
            None => odin_home().join("data").join( env!("CARGO_PKG_NAME"))
        }
    }

    pub fn validate (&self)->Result<()> {
        if self.regions.is_empty() { return Err( config_error!("no regions configured")) }

        let mut ids: HashSet<&str> = HashSet::new();
        for r in &self.regions {
            if !ids.insert( r.id.as_str()) { return Err( config_error!("duplicated region id {}", r.id)) }
            if !r.bbox.is_valid() { return Err( config_error!("invalid bounding box for region {}: {:?}", r.id, r.bbox)) }
        }

        if !(self.alert_threshold >= 0.0) { return Err( config_error!("alert_threshold has to be a non-negative percentage")) }
        if !(self.loss_delta < 0.0 && self.loss_delta >= -2.0) { return Err( config_error!("loss_delta has to be within [-2,0)")) }
        if !(self.resolution > 0.0) { return Err( config_error!("resolution has to be positive")) }
        if self.max_pixels == 0 { return Err( config_error!("max_pixels has to be positive")) }
        if !(0.0..=100.0).contains( &self.cloud_cover_max) { return Err( config_error!("cloud_cover_max has to be a percentage")) }
        if self.window_days == 0 { return Err( config_error!("window_days has to be positive")) }

        let d = &self.density;
        if !(d.sparse < d.moderate && d.moderate < d.dense) { return Err( config_error!("density thresholds have to be ascending")) }

        Ok(())
    }
}

/// median NDVI thresholds to classify vegetation density (values are exclusive lower bounds)
#[derive(Debug,Clone,Serialize,Deserialize,PartialEq)]
pub struct DensityThresholds {
    pub sparse: f64,
    pub moderate: f64,
    pub dense: f64,
}

impl Default for DensityThresholds {
    fn default()->Self {
        DensityThresholds { sparse: 0.2, moderate: 0.4, dense: 0.6 }
    }
}

/// where and how to reach the remote statistics service
#[derive(Debug,Clone,Deserialize)]
pub struct StatsServiceConfig {
    pub base_url: String,

    #[serde(default)]
    pub(crate) api_key: Option<String>,

    /// name of an environment variable to read the api key from (if there is no explicit `api_key`)
    #[serde(default)]
    pub api_key_env: Option<String>,

    #[serde(deserialize_with="deserialize_duration", default="default_timeout")]
    pub timeout: Duration,
}

fn default_timeout()->Duration { Duration::from_secs(120) }

impl StatsServiceConfig {
    pub fn new (base_url: impl ToString, timeout: Duration)->Self {
        StatsServiceConfig { base_url: base_url.to_string(), api_key: None, api_key_env: None, timeout }
    }

    pub fn api_key (&self)->Option<String> {
        self.api_key.clone().or_else( || {
            self.api_key_env.as_ref().and_then( |var| env::var(var).ok())
        })
    }
}

#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct DashboardConfig {
    pub sock_addr: SocketAddr,
    pub title: String,
}

impl Default for DashboardConfig {
    fn default()->Self {
        DashboardConfig {
            sock_addr: SocketAddr::from( ([127,0,0,1], 9010)),
            title: "Rajasthan Green Cover Monitoring".to_string()
        }
    }
}

impl DashboardConfig {
    pub fn url (&self)->String { format!("http://{}", self.sock_addr) }
}

pub fn deserialize_duration <'a,D> (deserializer: D)->std::result::Result<Duration,D::Error> where D: Deserializer<'a> {
    String::deserialize(deserializer).and_then( |s| {
        parse_duration::parse( s.as_str()).map_err( |e| serde::de::Error::custom( format!("{:?}",e)))
    })
}

/* #endregion config types */

/* #region config lookup  **************************************************************************************/

/// `$ODIN_HOME` if set, `~/.odin` otherwise
pub fn odin_home ()->PathBuf {
    if let Ok(dir) = env::var("ODIN_HOME") {
        PathBuf::from( dir)
    } else if let Ok(home) = env::var("HOME") {
        Path::new( &home).join(".odin")
    } else {
        PathBuf::from(".odin")
    }
}

pub fn find_config_file (filename: &str)->Option<PathBuf> {
    let crate_name = env!("CARGO_PKG_NAME");

    let mut candidates: Vec<PathBuf> = Vec::with_capacity(3);
    if let Ok(dir) = env::var("ODIN_HOME") {
        candidates.push( Path::new( &dir).join( CONFIGS).join( crate_name).join( filename));
    }
    if let Ok(home) = env::var("HOME") {
        candidates.push( Path::new( &home).join(".odin").join( CONFIGS).join( crate_name).join( filename));
    }
    candidates.push( Path::new( env!("CARGO_MANIFEST_DIR")).join( CONFIGS).join( filename));

    candidates.into_iter().find( |p| p.is_file())
}

pub fn load_config_path<C> (path: impl AsRef<Path>)->Result<C> where C: DeserializeOwned {
    let path = path.as_ref();
    let data = std::fs::read_to_string( path)
        .map_err( |e| config_error!("failed to read config {:?}: {}", path, e))?;
    debug!("loading config {:?}", path);
    Ok( ron::from_str( data.as_str())? )
}

/// load config from explicit path (which has to exist) or from the standard lookup locations
pub fn load_config<C> (filename: &str, explicit: Option<&Path>)->Result<C> where C: DeserializeOwned {
    if let Some(path) = explicit {
        return load_config_path( path)
    }

    match find_config_file( filename) {
        Some(path) => load_config_path( &path),
        None => Err( config_error!("config {} not found", filename))
    }
}

/// same as [`load_config`] but falls back to `C::default()` if there is no explicit path and no config file
pub fn load_config_or_default<C> (filename: &str, explicit: Option<&Path>)->Result<C> where C: DeserializeOwned + Default {
    if explicit.is_none() && find_config_file( filename).is_none() {
        debug!("no {} found, using built-in defaults", filename);
        return Ok( C::default() )
    }
    load_config( filename, explicit)
}

/// load and validate the analysis config
pub fn load_ndvi_config (explicit: Option<&Path>)->Result<NdviConfig> {
    let config: NdviConfig = load_config_or_default( NDVI_CONFIG, explicit)?;
    config.validate()?;
    Ok(config)
}

/* #endregion config lookup */
