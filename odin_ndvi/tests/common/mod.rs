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

use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use odin_ndvi::{
    AnalysisWindow, BandExpression, OdinNdviError, Reducer, Result, StatisticsRequest, StatisticsResult, StatisticsService,
    analysis_windows,
};

pub fn test_now ()->DateTime<Utc> {
    Utc.with_ymd_and_hms( 2025, 6, 15, 10, 30, 0).unwrap()
}

/// a statistics service that returns fixed aggregates and counts the requests it gets
pub struct StubService {
    pub current_window: AnalysisWindow,
    pub current: StatisticsResult,
    pub previous: StatisticsResult,
    pub change: StatisticsResult,
    pub loss: StatisticsResult,
    pub fail_with: Option<String>,
    pub n_requests: AtomicUsize,
}

impl StubService {
    pub fn new (now: &DateTime<Utc>, previous_mean: Option<f64>, change_mean: Option<f64>)->Self {
        let (current_window,_) = analysis_windows( now, 7);

        let current = StatisticsResult::new()
            .with( Reducer::Mean, 0.42)
            .with( Reducer::StdDev, 0.1)
            .with( Reducer::Percentile(10), 0.3)
            .with( Reducer::Percentile(50), 0.41)
            .with( Reducer::Percentile(90), 0.55);

        let mut previous = StatisticsResult::new();
        if let Some(v) = previous_mean { previous = previous.with( Reducer::Mean, v) }

        let mut change = StatisticsResult::new()
            .with( Reducer::Min, -0.3)
            .with( Reducer::Max, 0.2);
        if let Some(v) = change_mean { change = change.with( Reducer::Mean, v) }

        let loss = StatisticsResult::new().with( Reducer::Sum, 100.0);

        StubService { current_window, current, previous, change, loss, fail_with: None, n_requests: AtomicUsize::new(0) }
    }

    pub fn failing (now: &DateTime<Utc>, msg: &str)->Self {
        let mut stub = Self::new( now, Some(0.4), Some(0.0));
        stub.fail_with = Some( msg.to_string());
        stub
    }

    pub fn n_requests (&self)->usize { self.n_requests.load( Ordering::SeqCst) }
}

#[async_trait]
impl StatisticsService for StubService {
    fn name (&self)->&str { "stub" }

    async fn request_aggregate_statistics (&self, request: &StatisticsRequest)->Result<StatisticsResult> {
        self.n_requests.fetch_add( 1, Ordering::SeqCst);
        if let Some(msg) = &self.fail_with {
            return Err( OdinNdviError::RemoteService( msg.clone()))
        }

        let res = match &request.image.expression {
            BandExpression::Ndvi if request.image.window == self.current_window => &self.current,
            BandExpression::Ndvi => &self.previous,
            BandExpression::NdviDifference{..} => &self.change,
            BandExpression::NdviDifferenceBelow{..} => &self.loss,
        };
        Ok( res.clone())
    }
}
