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

use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
    analysis_windows, change_percentage, evaluate_alert, pixels_to_hectares,
    AnalysisResult, ChangeResult, CurrentWeek, NdviConfig, NdviImages, NdviStatistics, PreviousWeek, Region,
    errors::Result,
    stats_service::{BandExpression, ImageRef, Reducer, StatisticsRequest, StatisticsService},
};

/// computes week-over-week NDVI changes of configured regions through a [`StatisticsService`].
/// Each `analyze` call is stateless - it only depends on the (immutable) config, the region and `now`
pub struct DistrictChangeAnalyzer {
    config: Arc<NdviConfig>,
    service: Arc<dyn StatisticsService>,
}

impl DistrictChangeAnalyzer {
    pub fn new (config: Arc<NdviConfig>, service: Arc<dyn StatisticsService>)->Self {
        DistrictChangeAnalyzer { config, service }
    }

    pub fn config (&self)->&NdviConfig { &self.config }

    pub fn service (&self)->&dyn StatisticsService { self.service.as_ref() }

    /// analyze the region with the given id for the two windows preceding `now`.
    /// This fails with `RegionNotFound` before sending any request if the id is not configured, and with
    /// `RemoteService` if any of the statistics requests fails
    pub async fn analyze (&self, region_id: &str, now: DateTime<Utc>)->Result<AnalysisResult> {
        let config = self.config.as_ref();
        let region = config.region( region_id)?;

        let (current, previous) = analysis_windows( &now, config.window_days);
        info!("analyzing {}: current {}, previous {}", region.id, current, previous);

        let images = NdviImages {
            current: ImageRef::new( config, region, current, BandExpression::Ndvi),
            previous: ImageRef::new( config, region, previous, BandExpression::Ndvi),
            change: ImageRef::new( config, region, current, BandExpression::NdviDifference{ baseline: previous }),
        };
        let loss_mask = ImageRef::new( config, region, current, BandExpression::NdviDifferenceBelow{ baseline: previous, threshold: config.loss_delta });

        let stats_current = self.request( images.current.clone(),
            vec![ Reducer::Mean, Reducer::StdDev, Reducer::Percentile(10), Reducer::Percentile(50), Reducer::Percentile(90) ]).await?;
        let stats_previous = self.request( images.previous.clone(), vec![ Reducer::Mean ]).await?;
        let stats_change = self.request( images.change.clone(), vec![ Reducer::Mean, Reducer::Min, Reducer::Max ]).await?;
        let stats_loss = self.request( loss_mask, vec![ Reducer::Sum ]).await?;

        let current_week = CurrentWeek {
            window: current,
            stats: NdviStatistics {
                mean: stats_current.get( Reducer::Mean),
                std_dev: stats_current.get( Reducer::StdDev),
                p10: stats_current.get( Reducer::Percentile(10)),
                median: stats_current.get( Reducer::Percentile(50)),
                p90: stats_current.get( Reducer::Percentile(90)),
            }
        };
        let previous_week = PreviousWeek { window: previous, mean: stats_previous.get( Reducer::Mean) };

        let change = ChangeResult {
            mean: stats_change.get( Reducer::Mean),
            min: stats_change.get( Reducer::Min),
            max: stats_change.get( Reducer::Max),
            loss_area_hectares: stats_loss.get( Reducer::Sum).map( |n| pixels_to_hectares( n, config.resolution)),
        };

        let alert = match change_percentage( change.mean, previous_week.mean) {
            Some(pct) => evaluate_alert( pct, config.alert_threshold),
            None => {
                debug!("no change percentage for {} (previous mean: {:?}, change mean: {:?})", region.id, previous_week.mean, change.mean);
                None
            }
        };
        if let Some(alert) = &alert {
            info!("{} alert for {}: {:.2}%", alert.kind, region.id, alert.change_percentage);
        }

        Ok( AnalysisResult {
            region: region.id.clone(),
            analysis_date: now.date_naive(),
            current_week,
            previous_week,
            change,
            alert,
            images: Some(images),
        })
    }

    /// analyze all configured regions in sequence. Failures of individual regions do not abort the run,
    /// they are returned in place of the respective result
    pub async fn analyze_all (&self, now: DateTime<Utc>)->Vec<(Region,Result<AnalysisResult>)> {
        let mut results = Vec::with_capacity( self.config.regions.len());
        for region in &self.config.regions {
            let res = self.analyze( region.id.as_str(), now).await;
            results.push( (region.clone(), res));
        }
        results
    }

    /// the tile URL templates for (current, previous, change) images, if the service supports them
    pub async fn tile_urls (&self, result: &AnalysisResult)->Result<Option<(String,String,String)>> {
        if let Some(images) = &result.images {
            let current = self.service.map_tile_url( &images.current).await?;
            let previous = self.service.map_tile_url( &images.previous).await?;
            let change = self.service.map_tile_url( &images.change).await?;

            if let (Some(current), Some(previous), Some(change)) = (current, previous, change) {
                return Ok( Some( (current, previous, change)) )
            }
        }
        Ok(None)
    }

    async fn request (&self, image: ImageRef, reducers: Vec<Reducer>)->Result<crate::StatisticsResult> {
        let request = StatisticsRequest::new( &self.config, image, reducers);
        let result = self.service.request_aggregate_statistics( &request).await?;
        if result.is_empty() {
            debug!("no data for {} in {}", request.image.expression.formula(), request.image.window);
        }
        Ok(result)
    }
}
