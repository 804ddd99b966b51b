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

//! the read-mostly web dashboard. It serves a single HTML page plus a small JSON API over the analysis
//! records, and (if there is a statistics service) live analysis of single regions

use std::{collections::BTreeMap, net::SocketAddr, sync::Arc};
use axum::{
    Json, Router,
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use http::StatusCode;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    AnalysisRecord, AnalysisResult, BoundingBox, DashboardConfig, DistrictChangeAnalyzer, HistoryStore, NdviConfig,
    Region, VegetationDensity, errors::{OdinNdviError, Result},
};

const DASHBOARD_PAGE: &str = include_str!("../assets/ndvi_dashboard.html");

/// the read-only state shared by all handlers
pub struct DashboardState {
    pub config: Arc<NdviConfig>,
    pub dashboard: DashboardConfig,
    pub store: HistoryStore,
    pub analyzer: Option<DistrictChangeAnalyzer>,
}

impl DashboardState {
    pub fn new (config: Arc<NdviConfig>, dashboard: DashboardConfig, analyzer: Option<DistrictChangeAnalyzer>)->Self {
        let store = HistoryStore::new( config.history_dir());
        DashboardState { config, dashboard, store, analyzer }
    }

    pub fn with_store (mut self, store: HistoryStore)->Self {
        self.store = store;
        self
    }
}

/* #region API errors  *****************************************************************************************/

#[derive(Debug)]
pub enum ApiError {
    Ndvi(OdinNdviError),
    NoHistory,
    ServiceUnavailable,
}

impl From<OdinNdviError> for ApiError {
    fn from (e: OdinNdviError)->Self { ApiError::Ndvi(e) }
}

impl IntoResponse for ApiError {
    fn into_response (self)->Response {
        let (status, message) = match &self {
            ApiError::Ndvi( e @ OdinNdviError::RegionNotFound(_)) => (StatusCode::NOT_FOUND, e.to_string()),
            ApiError::Ndvi( e @ OdinNdviError::RemoteService(_)) => (StatusCode::BAD_GATEWAY, e.to_string()),
            ApiError::Ndvi(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::NoHistory => (StatusCode::NOT_FOUND, "no analysis records".to_string()),
            ApiError::ServiceUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "no statistics service configured".to_string()),
        };

        if status.is_server_error() { warn!("request failed: {}", message) }
        (status, Json( serde_json::json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T,ApiError>;

/* #endregion API errors */

/* #region response types  *************************************************************************************/

/// an analysis result in record format plus derived values
#[derive(Debug,Serialize)]
pub struct ResultView<'a> {
    #[serde(flatten)]
    pub result: &'a AnalysisResult,
    pub change_percentage: Option<f64>,
    pub density: VegetationDensity,
}

impl<'a> ResultView<'a> {
    pub fn new (result: &'a AnalysisResult, config: &NdviConfig)->Self {
        ResultView { result, change_percentage: result.change_percentage(), density: result.density( &config.density) }
    }
}

#[derive(Debug,Serialize)]
pub struct RegionView {
    pub id: String,
    pub name: String,
    pub bbox: BoundingBox,
    pub center: (f64,f64),
}

impl From<&Region> for RegionView {
    fn from (r: &Region)->Self {
        RegionView { id: r.id.clone(), name: r.name.clone(), bbox: r.bbox, center: r.display_center() }
    }
}

#[derive(Debug,Serialize)]
pub struct HistoryItem {
    pub filename: String,
    pub timestamp: Option<String>,
}

#[derive(Debug,Serialize)]
pub struct RecordView<'a> {
    pub timestamp: Option<String>,
    pub results: BTreeMap<&'a str,ResultView<'a>>,
}

impl<'a> RecordView<'a> {
    fn new (record: &'a AnalysisRecord, config: &NdviConfig)->Self {
        RecordView {
            timestamp: record.timestamp.map( |ts| ts.format("%Y-%m-%d %H:%M:%S").to_string()),
            results: record.results.iter().map( |(k,r)| (k.as_str(), ResultView::new( r, config))).collect()
        }
    }
}

#[derive(Debug,Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub ndvi_mean: f64,
}

/* #endregion response types */

pub fn router (state: Arc<DashboardState>)->Router {
    Router::new()
        .route( "/", get( self::get::index))
        .route( "/api/regions", get( self::get::regions))
        .route( "/api/history", get( self::get::history))
        .route( "/api/latest", get( self::get::latest))
        .route( "/api/trend/{region}", get( self::get::trend))
        .route( "/api/analyze/{region}", post( self::post::analyze))
        .layer( TraceLayer::new_for_http())
        .with_state( state)
}

/// run the dashboard server until it is terminated
pub async fn serve (state: Arc<DashboardState>)->Result<()> {
    let sock_addr: SocketAddr = state.dashboard.sock_addr;
    let listener = tokio::net::TcpListener::bind( sock_addr).await?;
    info!("serving dashboard on {}", state.dashboard.url());

    axum::serve( listener, router( state)).await?;
    Ok(())
}

mod get {
    use super::*;

    pub async fn index (State(state): State<Arc<DashboardState>>)->Html<String> {
        Html( DASHBOARD_PAGE.replace( "{{title}}", state.dashboard.title.as_str()))
    }

    pub async fn regions (State(state): State<Arc<DashboardState>>)->Json<Vec<RegionView>> {
        Json( state.config.regions.iter().map( RegionView::from).collect())
    }

    pub async fn history (State(state): State<Arc<DashboardState>>)->ApiResult<Json<Vec<HistoryItem>>> {
        let items = state.store.list()?.into_iter().map( |e| HistoryItem {
            filename: e.filename().to_string(),
            timestamp: e.timestamp.map( |ts| ts.format("%Y-%m-%d %H:%M:%S").to_string()),
        }).collect();
        Ok( Json( items))
    }

    pub async fn latest (State(state): State<Arc<DashboardState>>)->ApiResult<Response> {
        match state.store.latest()? {
            Some(record) => Ok( Json( RecordView::new( &record, &state.config)).into_response()),
            None => Err( ApiError::NoHistory)
        }
    }

    pub async fn trend (State(state): State<Arc<DashboardState>>, Path(region): Path<String>)->ApiResult<Json<Vec<TrendPoint>>> {
        let region = state.config.region( region.as_str())?;
        let points = state.store.trend( region.id.as_str())?.into_iter()
            .map( |(date,ndvi_mean)| TrendPoint { date, ndvi_mean })
            .collect();
        Ok( Json( points))
    }
}

mod post {
    use super::*;

    pub async fn analyze (State(state): State<Arc<DashboardState>>, Path(region): Path<String>)->ApiResult<Response> {
        let analyzer = state.analyzer.as_ref().ok_or( ApiError::ServiceUnavailable)?;
        let result = analyzer.analyze( region.as_str(), Utc::now()).await?;
        Ok( Json( ResultView::new( &result, &state.config)).into_response())
    }
}
