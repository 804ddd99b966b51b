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

use std::{path::{Path,PathBuf}, time::Duration};
use anyhow::Result;
use odin_ndvi::{
    BoundingBox, DashboardConfig, DensityThresholds, NdviConfig, OdinNdviError, Region, StatsServiceConfig,
    load_config_path, load_ndvi_config,
};

// run with "cargo test test_xx -- --nocapture"

fn crate_config (filename: &str)->PathBuf {
    Path::new( env!("CARGO_MANIFEST_DIR")).join("configs").join( filename)
}

#[test]
fn test_default_config ()->Result<()> {
    let config = NdviConfig::default();
    config.validate()?;

    assert_eq!( config.region_ids(), vec!["Jodhpur", "Bikaner"]);
    assert_eq!( config.alert_threshold, 5.0);
    assert_eq!( config.window_days, 7);

    let jodhpur = config.region( "Jodhpur")?;
    assert_eq!( jodhpur.bbox.to_wsen(), [72.8, 26.0, 73.5, 27.0]);
    assert_eq!( jodhpur.display_center(), (73.02, 26.28));

    assert_eq!( config.region( "BIKANER")?.id, "Bikaner");
    assert!( matches!( config.region( "Jaipur"), Err( OdinNdviError::RegionNotFound(_))));
    Ok(())
}

#[test]
fn test_crate_configs ()->Result<()> {
    let config: NdviConfig = load_config_path( crate_config( "ndvi.ron"))?;
    config.validate()?;

    let default = NdviConfig::default();
    assert_eq!( config.regions, default.regions);
    assert_eq!( config.alert_threshold, default.alert_threshold);
    assert_eq!( config.loss_delta, default.loss_delta);
    assert_eq!( config.max_pixels, default.max_pixels);
    assert_eq!( config.collection, default.collection);
    assert_eq!( config.density, default.density);

    let explicit = load_ndvi_config( Some( crate_config( "ndvi.ron").as_path()))?;
    assert_eq!( explicit.regions.len(), 2);

    let dashboard: DashboardConfig = load_config_path( crate_config( "dashboard.ron"))?;
    assert_eq!( dashboard.url(), "http://127.0.0.1:9010");
    Ok(())
}

#[test]
fn test_config_defaults ()->Result<()> {
    let input = r#"
        NdviConfig(
            regions: [ Region( id: "Test", name: "Test Region", bbox: BoundingBox( west: 10.0, south: 20.0, east: 11.0, north: 21.0 )) ],
            alert_threshold: 7.5,
            loss_delta: -0.2,
            resolution: 20.0,
            max_pixels: 5000000,
            cloud_cover_max: 30.0,
            collection: "TEST/COLLECTION",
            data_dir: Some("/tmp/ndvi"),
        )
    "#;
    let config: NdviConfig = ron::from_str( input)?;
    config.validate()?;

    assert_eq!( config.window_days, 7);
    assert_eq!( config.density, DensityThresholds::default());
    assert_eq!( config.history_dir(), PathBuf::from("/tmp/ndvi"));

    let region = config.region( "Test")?;
    assert!( region.center.is_none());
    assert_eq!( region.display_center(), (10.5, 20.5));
    Ok(())
}

#[test]
fn test_invalid_configs () {
    let mut config = NdviConfig::default();
    config.regions.push( config.regions[0].clone());
    assert!( matches!( config.validate(), Err( OdinNdviError::ConfigError(_))));

    let mut config = NdviConfig::default();
    config.regions.push( Region::new( "Flipped", "flipped bbox", BoundingBox::new( 73.0, 27.0, 72.0, 26.0)));
    assert!( config.validate().is_err());

    let config = NdviConfig { regions: Vec::new(), ..NdviConfig::default() };
    assert!( config.validate().is_err());

    let config = NdviConfig { loss_delta: 0.1, ..NdviConfig::default() };
    assert!( config.validate().is_err());

    let config = NdviConfig { alert_threshold: f64::NAN, ..NdviConfig::default() };
    assert!( config.validate().is_err());

    let config = NdviConfig { density: DensityThresholds { sparse: 0.5, moderate: 0.4, dense: 0.6 }, ..NdviConfig::default() };
    assert!( config.validate().is_err());
}

#[test]
fn test_stats_service_config ()->Result<()> {
    let input = r#"
        StatsServiceConfig(
            base_url: "http://localhost:8080/api",
            api_key: Some("secret"),
            timeout: "30s",
        )
    "#;
    let config: StatsServiceConfig = ron::from_str( input)?;
    assert_eq!( config.timeout, Duration::from_secs(30));
    assert_eq!( config.api_key(), Some("secret".to_string()));

    let config: StatsServiceConfig = ron::from_str( r#"StatsServiceConfig( base_url: "http://localhost:8080/api")"#)?;
    assert_eq!( config.timeout, Duration::from_secs(120));
    assert!( config.api_key().is_none());
    Ok(())
}
