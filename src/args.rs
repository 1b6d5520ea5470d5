// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::{ArgAction, Parser, builder::RangedU64ValueParser};
use edgefirst_depthcloud::{ConvertConfig, DEFAULT_DECIMATION};
use serde_json::json;
use tracing::level_filters::LevelFilter;
use zenoh::config::{Config, WhatAmI};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// depth image topic, 16UC1 (millimeters) or 32FC1 (meters)
    #[arg(long, env, default_value = "rt/camera/depth")]
    pub depth_topic: String,

    /// depth camera info topic
    #[arg(long, env, default_value = "rt/camera/depth/info")]
    pub camera_info_topic: String,

    /// color image topic, only subscribed when --colorful is set
    #[arg(long, env, default_value = "rt/camera/image")]
    pub image_topic: String,

    /// point cloud output topic
    #[arg(long, env, default_value = "rt/camera/points")]
    pub points_topic: String,

    /// Maximum depth range in meters, 0 disables the limit.  Depths beyond
    /// the limit are clamped to it unless --use-quiet-nan is enabled.
    #[arg(long, env, default_value = "0.0")]
    pub range_max: f64,

    /// Emit NaN points for missing and out of range depths instead of
    /// substituting range_max.
    #[arg(long, env, default_value = "true", action = ArgAction::Set)]
    pub use_quiet_nan: bool,

    /// Color the point cloud from the image topic.
    #[arg(long, env, default_value = "false")]
    pub colorful: bool,

    /// Sample every Nth pixel in both directions.
    #[arg(long, env, default_value_t = DEFAULT_DECIMATION,
          value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub decimation: usize,

    /// Application log level
    #[arg(long, env, default_value = "info")]
    pub rust_log: LevelFilter,

    /// Enable Tracy profiler broadcast
    #[arg(long, env)]
    pub tracy: bool,

    /// zenoh connection mode
    #[arg(long, env, default_value = "peer")]
    mode: WhatAmI,

    /// connect to zenoh endpoints
    #[arg(long, env)]
    connect: Vec<String>,

    /// listen to zenoh endpoints
    #[arg(long, env)]
    listen: Vec<String>,

    /// disable zenoh multicast scouting
    #[arg(long, env)]
    no_multicast_scouting: bool,
}

impl Args {
    pub fn convert_config(&self) -> ConvertConfig {
        ConvertConfig {
            range_max: self.range_max,
            use_quiet_nan: self.use_quiet_nan,
            decimation: self.decimation,
        }
    }
}

impl TryFrom<Args> for Config {
    type Error = zenoh::Error;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let mut config = Config::default();

        config.insert_json5("mode", &json!(args.mode).to_string())?;

        if !args.connect.is_empty() {
            config.insert_json5("connect/endpoints", &json!(args.connect).to_string())?;
        }

        if !args.listen.is_empty() {
            config.insert_json5("listen/endpoints", &json!(args.listen).to_string())?;
        }

        if args.no_multicast_scouting {
            config.insert_json5("scouting/multicast/enabled", &json!(false).to_string())?;
        }

        config.insert_json5("scouting/multicast/interface", &json!("lo").to_string())?;

        Ok(config)
    }
}
