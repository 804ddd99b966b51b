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
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use clap::{ArgGroup, Parser};
use tracing_subscriber::EnvFilter;

use odin_ndvi::{
    AnalysisResult, DistrictChangeAnalyzer, HistoryStore, NdviConfig, create_stats_service, load_ndvi_config,
    report::{self, separator},
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "week-over-week vegetation (NDVI) change monitoring of configured regions")]
#[command(group( ArgGroup::new("mode").required(true).args(["quick", "detailed", "compare", "history", "run"])))]
pub struct Args {
    /// quick check with minimal output
    #[arg(short, long)]
    quick: bool,

    /// restrict quick check to this region
    #[arg(long, requires = "quick")]
    region: Option<String>,

    /// detailed report for a single region
    #[arg(short, long, value_name = "REGION")]
    detailed: Option<String>,

    /// compare all configured regions
    #[arg(short, long)]
    compare: bool,

    /// list stored analysis records
    #[arg(long)]
    history: bool,

    /// analyze all regions, print summaries and store the results
    #[arg(long)]
    run: bool,

    /// path of the region/threshold config (default is looked up)
    #[arg(long)]
    config: Option<PathBuf>,

    /// path of the statistics service config (default is looked up)
    #[arg(long)]
    stats_config: Option<PathBuf>,

    /// use the simulated statistics service
    #[arg(long)]
    demo: bool,

    /// seed for simulated statistics
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// also store results of quick checks, detailed reports and comparisons
    #[arg(long)]
    save: bool,

    /// print map tile URLs in detailed reports
    #[arg(long)]
    tiles: bool,
}

#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::from_default_env())  // use RUST_LOG to set level
        .init();

    let args = Args::parse();
    let config = Arc::new( load_ndvi_config( args.config.as_deref())?);
    let store = HistoryStore::new( config.history_dir());

    if args.history {
        return list_history( &store)
    }

    let service = create_stats_service( args.demo, args.seed, args.stats_config.as_deref())?;
    let analyzer = DistrictChangeAnalyzer::new( config.clone(), service);
    let now = Utc::now();

    let results = if args.quick {
        quick_check( &analyzer, args.region.as_deref(), now).await?
    } else if let Some(region) = &args.detailed {
        vec![ detailed_report( &analyzer, region, args.tiles, now).await? ]
    } else if args.compare {
        compare_regions( &analyzer, now).await?
    } else {
        run_all( &analyzer, now).await
    };

    if (args.run || args.save) && !results.is_empty() {
        let path = store.save( &results, &now)?;
        println!("results saved to {}", path.display());
    }

    Ok(())
}

fn list_history (store: &HistoryStore)->Result<()> {
    let entries = store.list()?;
    if entries.is_empty() {
        println!("no analysis records in {}", store.dir().display());
    } else {
        println!("Analysis History:");
        println!("{}", separator());
        print!("{}", report::history_listing( &entries));
    }
    Ok(())
}

fn region_ids<'a> (config: &'a NdviConfig, region: Option<&str>)->Result<Vec<&'a str>> {
    match region {
        Some(id) => Ok( vec![ config.region( id)?.id.as_str() ]),
        None => Ok( config.region_ids())
    }
}

async fn quick_check (analyzer: &DistrictChangeAnalyzer, region: Option<&str>, now: DateTime<Utc>)->Result<Vec<AnalysisResult>> {
    let mut results = Vec::new();

    println!("Quick Vegetation Check");
    println!("{}", separator());
    for id in region_ids( analyzer.config(), region)? {
        match analyzer.analyze( id, now).await {
            Ok(result) => {
                println!("\n{}", report::quick_check( &result));
                results.push( result);
            }
            Err(e) => println!("\n{}:\n   Error: {}", id, e)
        }
    }
    println!("\n{}", separator());

    Ok(results)
}

async fn detailed_report (analyzer: &DistrictChangeAnalyzer, region: &str, tiles: bool, now: DateTime<Utc>)->Result<AnalysisResult> {
    let result = analyzer.analyze( region, now).await?;
    println!("{}", report::detailed_summary( &result));

    if tiles {
        match analyzer.tile_urls( &result).await? {
            Some((current,previous,change)) => {
                println!("map tiles:");
                println!("   current:  {}", current);
                println!("   previous: {}", previous);
                println!("   change:   {}", change);
            }
            None => println!("no map tiles available from {} service", analyzer.service().name())
        }
    }
    Ok(result)
}

async fn compare_regions (analyzer: &DistrictChangeAnalyzer, now: DateTime<Utc>)->Result<Vec<AnalysisResult>> {
    let mut results = Vec::new();

    println!("Region Comparison");
    println!("{}", separator());
    for (region, res) in analyzer.analyze_all( now).await {
        match res {
            Ok(result) => results.push( result),
            Err(e) => println!("error analyzing {}: {}", region.id, e)
        }
    }

    let comparison = report::comparison( &results).map_err( |e| anyhow!("could not compare regions: {e}"))?;
    println!("{}", comparison);
    println!("{}", separator());

    Ok(results)
}

async fn run_all (analyzer: &DistrictChangeAnalyzer, now: DateTime<Utc>)->Vec<AnalysisResult> {
    let mut results = Vec::new();

    println!("Green Cover Monitoring - {}", now.format("%Y-%m-%d %H:%M:%S UTC"));
    for (region, res) in analyzer.analyze_all( now).await {
        match res {
            Ok(result) => {
                println!("\n{}", report::detailed_summary( &result));
                results.push( result);
            }
            Err(e) => println!("\nerror analyzing {}: {}", region.id, e)
        }
    }
    results
}
