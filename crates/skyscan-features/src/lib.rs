// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod extract;
pub mod scale;
pub mod tle;

pub use extract::{ExtractedPopulation, FeatureConfig, FeatureExtractor};
pub use scale::StandardScaler;
pub use tle::{parse_tle_pair, TleRecord, TLE_LINE_LEN};

/// Feature-extraction namespace placeholder.
pub fn crate_name() -> &'static str {
    let _ = skyscan_core::crate_name();
    "skyscan-features"
}
