// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

pub mod describe;
pub mod list;
pub mod run;

use op_core::{Device, Precision};

/// Installs the global tracing subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Parses device/precision flags shared by several subcommands.
pub fn parse_tags(device: &str, precision: &str) -> anyhow::Result<(Device, Precision)> {
    let device = Device::from_str_loose(device)
        .ok_or_else(|| anyhow::anyhow!("unknown device '{device}' (gpu, cpu, edge)"))?;
    let precision = Precision::from_str_loose(precision)
        .ok_or_else(|| anyhow::anyhow!("unknown precision '{precision}' (fp32, fp16, int8)"))?;
    Ok((device, precision))
}
