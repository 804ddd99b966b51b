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

//! a simulated statistics service for demo mode. Values are pseudo random but deterministic for a given
//! seed, bounding box and window, and they are consistent between window means and difference means.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{AnalysisWindow, BoundingBox, errors::{Result, remote_error}};
use crate::stats_service::{BandExpression, Reducer, StatisticsRequest, StatisticsResult, StatisticsService};

const METERS_PER_DEG_LAT: f64 = 110_574.0;
const METERS_PER_DEG_LON: f64 = 111_320.0;

// semi-arid region NDVI range
const BASE_NDVI_MIN: f64 = 0.3;
const BASE_NDVI_RANGE: f64 = 0.2;
const WEEKLY_VARIATION: f64 = 0.05;

/// the pixel value distribution of a simulated image
struct Distribution {
    mean: f64,
    std_dev: f64,
    n_pixels: f64,
}

pub struct SimulatedStatisticsService {
    seed: u64,
    no_data_probability: f64, // chance that a window has no cloud free pixels
}

impl SimulatedStatisticsService {
    pub fn new (seed: u64)->Self {
        SimulatedStatisticsService { seed, no_data_probability: 0.0 }
    }

    pub fn with_no_data_probability (mut self, p: f64)->Self {
        self.no_data_probability = p.clamp( 0.0, 1.0);
        self
    }

    /// the RNG seed for a bounding box and (optional) date. This only depends on the values themselves,
    /// i.e. it does not change between builds or platforms
    pub fn rng_seed (&self, bbox: &BoundingBox, date: Option<&NaiveDate>)->u64 {
        let mut h = mix( 0, self.seed);
        for v in bbox.to_wsen() { h = mix( h, v.to_bits()); }
        if let Some(date) = date { h = mix( h, date.num_days_from_ce() as i64 as u64); }
        h
    }

    fn rng_for (&self, bbox: &BoundingBox, date: Option<&NaiveDate>)->StdRng {
        StdRng::seed_from_u64( self.rng_seed( bbox, date))
    }

    fn n_pixels (bbox: &BoundingBox, scale: f64)->f64 {
        let (_,lat) = bbox.center();
        let width = (bbox.east - bbox.west) * METERS_PER_DEG_LON * lat.to_radians().cos();
        let height = (bbox.north - bbox.south) * METERS_PER_DEG_LAT;
        ((width * height) / (scale * scale)).round()
    }

    /// mean NDVI of the window composite, `None` if the window is (simulated) cloud covered
    fn window_mean (&self, bbox: &BoundingBox, window: &AnalysisWindow)->Option<f64> {
        let base = BASE_NDVI_MIN + BASE_NDVI_RANGE * self.rng_for( bbox, None).random::<f64>();

        let mut rng = self.rng_for( bbox, Some(&window.start));
        let variation = rng.random_range( -WEEKLY_VARIATION..WEEKLY_VARIATION);
        if rng.random::<f64>() < self.no_data_probability {
            None
        } else {
            Some( base + variation)
        }
    }

    fn distribution (&self, request: &StatisticsRequest)->Option<Distribution> {
        let image = &request.image;
        let bbox = &image.bbox;
        let n_pixels = Self::n_pixels( bbox, request.scale);
        let mut rng = self.rng_for( bbox, Some(&image.window.end));

        match &image.expression {
            BandExpression::Ndvi => {
                let mean = self.window_mean( bbox, &image.window)?;
                Some( Distribution { mean, std_dev: rng.random_range( 0.08..0.15), n_pixels })
            }
            BandExpression::NdviDifference{baseline} => {
                let mean = self.window_mean( bbox, &image.window)? - self.window_mean( bbox, baseline)?;
                Some( Distribution { mean, std_dev: rng.random_range( 0.01..0.03), n_pixels })
            }
            BandExpression::NdviDifferenceBelow{baseline,threshold} => {
                let delta = self.window_mean( bbox, &image.window)? - self.window_mean( bbox, baseline)?;
                // the more the mean dropped the larger the fraction of pixels beyond the loss threshold
                let fraction = if delta < threshold / 2.0 {
                    rng.random_range( 0.0002..0.0008)
                } else {
                    rng.random_range( 0.00001..0.00005)
                };
                Some( Distribution { mean: fraction, std_dev: (fraction * (1.0 - fraction)).sqrt(), n_pixels })
            }
        }
    }
}

/// splitmix64 step over `h ^ v`
fn mix (h: u64, v: u64)->u64 {
    let mut z = (h ^ v).wrapping_add( 0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul( 0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul( 0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn reduce (d: &Distribution, reducer: Reducer)->f64 {
    match reducer {
        Reducer::Mean => d.mean,
        Reducer::StdDev => d.std_dev,
        Reducer::Percentile(p) => d.mean + d.std_dev * 1.28 * (p as f64 - 50.0) / 40.0, // p10/p90 ~ mean -/+ 1.28 sigma
        Reducer::Min => d.mean - 3.0 * d.std_dev,
        Reducer::Max => d.mean + 3.0 * d.std_dev,
        Reducer::Sum => (d.mean * d.n_pixels).round(),
    }
}

#[async_trait]
impl StatisticsService for SimulatedStatisticsService {
    fn name (&self)->&str { "simulated" }

    async fn request_aggregate_statistics (&self, request: &StatisticsRequest)->Result<StatisticsResult> {
        let n_pixels = Self::n_pixels( &request.image.bbox, request.scale);
        if n_pixels > request.max_pixels as f64 {
            return Err( remote_error!("too many pixels in region: {} > {}", n_pixels, request.max_pixels))
        }

        let mut result = StatisticsResult::new();
        match self.distribution( request) {
            Some(d) => {
                for r in &request.reducers { result.values.insert( r.key(), Some( reduce( &d, *r))); }
            }
            None => {
                for r in &request.reducers { result.values.insert( r.key(), None); }
            }
        }
        Ok(result)
    }
}
