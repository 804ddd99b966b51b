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

use thiserror::Error;

pub type Result<T> = std::result::Result<T,OdinNdviError>;

/// note there is no "no data" error - aggregates without valid pixels are `None` values
#[derive(Error,Debug)]
pub enum OdinNdviError {
    #[error("region not found: {0}")]
    RegionNotFound(String),

    #[error("remote service error: {0}")]
    RemoteService(String),

    #[error("config error {0}")]
    ConfigError(String),

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("JSON error {0}")]
    JsonError( #[from] serde_json::Error),

    #[error("config RON error {0}")]
    RonError( #[from] ron::error::SpannedError),

    #[error("operation failed {0}")]
    OpFailed(String)
}

impl OdinNdviError {
    pub fn is_remote (&self)->bool { matches!( self, OdinNdviError::RemoteService(_)) }
    pub fn is_region_not_found (&self)->bool { matches!( self, OdinNdviError::RegionNotFound(_)) }
}

/// everything that goes wrong on the wire is a remote service error. We keep the timeout distinction
/// in the message since callers might want to retry those
impl From<reqwest::Error> for OdinNdviError {
    fn from (e: reqwest::Error)->Self {
        if e.is_timeout() {
            OdinNdviError::RemoteService( format!("request timed out: {e}"))
        } else {
            OdinNdviError::RemoteService( e.to_string())
        }
    }
}

macro_rules! op_failed {
    ($fmt:literal $(, $arg:expr )* ) => {
        crate::errors::OdinNdviError::OpFailed( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use op_failed;

macro_rules! remote_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        crate::errors::OdinNdviError::RemoteService( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use remote_error;

macro_rules! config_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        crate::errors::OdinNdviError::ConfigError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use config_error;
