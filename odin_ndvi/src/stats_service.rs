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

//! the client side of the remote statistics service. The service filters an image collection by region,
//! date range and cloud cover, computes a per-pixel band expression over median composites and reduces
//! the result over the region into scalar aggregates. We only see the aggregates.

use std::{collections::HashMap, path::Path, sync::Arc};
use async_trait::async_trait;
use serde::{Serialize,Serializer,Deserialize,de::DeserializeOwned};
use reqwest::{Client, StatusCode, header::ACCEPT};
use tracing::{debug,warn};

use crate::{
    AnalysisWindow, BoundingBox, NdviConfig, Region, SimulatedStatisticsService, StatsServiceConfig, STATS_SERVICE_CONFIG,
    load_config, errors::{Result, remote_error}
};

pub const NIR_BAND: &str = "B8";
pub const RED_BAND: &str = "B4";

/* #region request/response types  *****************************************************************************/

/// the aggregate reducers we can ask for
#[derive(Debug,Copy,Clone,PartialEq,Eq,Hash)]
pub enum Reducer {
    Mean,
    StdDev,
    Percentile(u8),
    Min,
    Max,
    Sum
}

impl Reducer {
    /// the key of the respective value in a [`StatisticsResult`]
    pub fn key (&self)->String {
        match self {
            Reducer::Mean => "mean".to_string(),
            Reducer::StdDev => "stdDev".to_string(),
            Reducer::Percentile(p) => format!("p{p}"),
            Reducer::Min => "min".to_string(),
            Reducer::Max => "max".to_string(),
            Reducer::Sum => "sum".to_string(),
        }
    }
}

impl Serialize for Reducer {
    fn serialize<S: Serializer> (&self, s: S)->std::result::Result<S::Ok,S::Error> {
        s.serialize_str( self.key().as_str())
    }
}

/// the per-pixel band math the service evaluates before reducing
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
#[serde(tag="type", rename_all="snake_case")]
pub enum BandExpression {
    /// `(NIR - RED) / (NIR + RED)` of the window composite
    Ndvi,

    /// `ndvi(window) - ndvi(baseline)`
    NdviDifference { baseline: AnalysisWindow },

    /// `1` where `ndvi(window) - ndvi(baseline) < threshold`, `0` otherwise
    NdviDifferenceBelow { baseline: AnalysisWindow, threshold: f64 },
}

impl BandExpression {
    pub fn formula (&self)->String {
        let ndvi = format!("({NIR_BAND} - {RED_BAND}) / ({NIR_BAND} + {RED_BAND})");
        match self {
            BandExpression::Ndvi => ndvi,
            BandExpression::NdviDifference{baseline} => format!("{ndvi} - {ndvi}[{baseline}]"),
            BandExpression::NdviDifferenceBelow{baseline,threshold} => format!("({ndvi} - {ndvi}[{baseline}]) < {threshold}"),
        }
    }
}

#[derive(Debug,Copy,Clone,PartialEq,Eq,Serialize,Deserialize)]
#[serde(rename_all="lowercase")]
pub enum Composite {
    Median
}

/// reference to a server side (composite) image
#[derive(Debug,Clone,PartialEq,Serialize)]
pub struct ImageRef {
    pub collection: String,
    pub bbox: BoundingBox,
    pub window: AnalysisWindow,
    pub cloud_cover_max: f64,
    pub composite: Composite,
    pub expression: BandExpression,
}

impl ImageRef {
    pub fn new (config: &NdviConfig, region: &Region, window: AnalysisWindow, expression: BandExpression)->Self {
        ImageRef {
            collection: config.collection.clone(),
            bbox: region.bbox,
            window,
            cloud_cover_max: config.cloud_cover_max,
            composite: Composite::Median,
            expression
        }
    }
}

#[derive(Debug,Clone,PartialEq,Serialize)]
pub struct StatisticsRequest {
    #[serde(flatten)]
    pub image: ImageRef,
    pub reducers: Vec<Reducer>,
    pub scale: f64,
    pub max_pixels: u64,
}

impl StatisticsRequest {
    pub fn new (config: &NdviConfig, image: ImageRef, reducers: Vec<Reducer>)->Self {
        StatisticsRequest { image, reducers, scale: config.resolution, max_pixels: config.max_pixels }
    }
}

/// the reducer outputs of a request. On the wire this is a plain JSON object such as `{"mean":0.4,"stdDev":null}`.
/// Keys can be missing or null if there were no valid pixels
#[derive(Debug,Clone,Default,PartialEq,Serialize,Deserialize)]
#[serde(transparent)]
pub struct StatisticsResult {
    pub values: HashMap<String,Option<f64>>
}

impl StatisticsResult {
    pub fn new()->Self { StatisticsResult { values: HashMap::new() } }

    pub fn with (mut self, reducer: Reducer, v: f64)->Self {
        self.values.insert( reducer.key(), Some(v));
        self
    }

    pub fn get (&self, reducer: Reducer)->Option<f64> {
        self.values.get( reducer.key().as_str()).copied().flatten()
    }

    pub fn is_empty (&self)->bool {
        self.values.values().all( |v| v.is_none())
    }
}

#[derive(Debug,Deserialize)]
struct TileResponse {
    url_format: String
}

/* #endregion request/response types */

/// the narrow interface to the remote statistics service, which can be replaced by a (deterministic)
/// stub for testing or demonstration purposes
#[async_trait]
pub trait StatisticsService: Send + Sync {
    fn name (&self)->&str;

    async fn request_aggregate_statistics (&self, request: &StatisticsRequest)->Result<StatisticsResult>;

    /// get a tile URL template (with `{z}/{x}/{y}` placeholders) for visualizing an image.
    /// Services that do not support visualization return `None`
    async fn map_tile_url (&self, _image: &ImageRef)->Result<Option<String>> {
        Ok(None)
    }
}

/* #region HTTP service  ***************************************************************************************/

/// JSON-over-HTTP client of the statistics service.
/// Note that requests are not retried - it is up to the caller to repeat the whole analysis
pub struct HttpStatisticsService {
    client: Client,
    config: StatsServiceConfig,
}

impl HttpStatisticsService {
    pub fn new (config: StatsServiceConfig)->Result<Self> {
        let client = Client::builder()
            .timeout( config.timeout)
            .build()?;
        Ok( HttpStatisticsService { client, config } )
    }

    fn url (&self, path: &str)->String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post_json<T,U> (&self, path: &str, data: &T)->Result<U> where T: Serialize + Sync, U: DeserializeOwned {
        let url = self.url( path);
        let mut req = self.client.post( &url)
            .header( ACCEPT, "application/json")
            .json( data);
        if let Some(api_key) = self.config.api_key() {
            req = req.bearer_auth( api_key);
        }

        let response = req.send().await?;
        match response.status() {
            StatusCode::OK => {
                let bytes = response.bytes().await?;
                serde_json::from_slice( &bytes).map_err( |e| remote_error!("invalid response from {}: {}", url, e))
            }
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                Err( remote_error!("not authorized to access {} ({}), check api key", url, status))
            }
            other => {
                warn!("statistics request to {} failed with {}", url, other);
                Err( remote_error!("{} response status {}", url, other))
            }
        }
    }
}

#[async_trait]
impl StatisticsService for HttpStatisticsService {
    fn name (&self)->&str { self.config.base_url.as_str() }

    async fn request_aggregate_statistics (&self, request: &StatisticsRequest)->Result<StatisticsResult> {
        debug!("requesting {:?} of {} for {}", request.reducers, request.image.expression.formula(), request.image.window);
        self.post_json( "reduce", request).await
    }

    async fn map_tile_url (&self, image: &ImageRef)->Result<Option<String>> {
        let response: TileResponse = self.post_json( "tiles", image).await?;
        Ok( Some(response.url_format) )
    }
}

/* #endregion HTTP service */

/// the simulated service in demo mode, the configured HTTP service otherwise. The latter fails if there is
/// no statistics service config
pub fn create_stats_service (demo: bool, seed: u64, explicit_config: Option<&Path>)->Result<Arc<dyn StatisticsService>> {
    if demo {
        Ok( Arc::new( SimulatedStatisticsService::new( seed)) )
    } else {
        let config: StatsServiceConfig = load_config( STATS_SERVICE_CONFIG, explicit_config)?;
        Ok( Arc::new( HttpStatisticsService::new( config)?) )
    }
}
