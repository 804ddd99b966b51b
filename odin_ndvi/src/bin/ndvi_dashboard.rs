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

use std::{path::PathBuf, sync::Arc};
use anyhow::Result;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use odin_ndvi::{
    DASHBOARD_CONFIG, DashboardConfig, DistrictChangeAnalyzer, create_stats_service, load_config_or_default, load_ndvi_config,
    web::{self, DashboardState},
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "web dashboard for stored and live NDVI change analyses")]
pub struct Args {
    /// path of the region/threshold config (default is looked up)
    #[arg(long)]
    config: Option<PathBuf>,

    /// path of the dashboard config (default is looked up)
    #[arg(long)]
    dashboard_config: Option<PathBuf>,

    /// path of the statistics service config (default is looked up)
    #[arg(long)]
    stats_config: Option<PathBuf>,

    /// use the simulated statistics service for live analysis
    #[arg(long)]
    demo: bool,

    /// seed for simulated statistics
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::from_default_env())  // use RUST_LOG to set level
        .init();

    let args = Args::parse();
    let config = Arc::new( load_ndvi_config( args.config.as_deref())?);
    let dashboard: DashboardConfig = load_config_or_default( DASHBOARD_CONFIG, args.dashboard_config.as_deref())?;

    // without a statistics service we still serve the stored records
    let analyzer = match create_stats_service( args.demo, args.seed, args.stats_config.as_deref()) {
        Ok(service) => Some( DistrictChangeAnalyzer::new( config.clone(), service)),
        Err(e) => {
            warn!("live analysis disabled: {}", e);
            None
        }
    };

    println!("serving NDVI dashboard on {}", dashboard.url());
    let state = Arc::new( DashboardState::new( config, dashboard, analyzer));
    web::serve( state).await?;

    Ok(())
}
