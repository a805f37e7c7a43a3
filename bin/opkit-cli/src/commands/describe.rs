// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use builtin_ops::builtin_registry;
use clap::Args;

#[derive(Args)]
pub struct DescribeArgs {
    /// Operator name (canonical or alias)
    pub name: String,

    /// Device tag
    #[arg(long, default_value = "cpu")]
    pub device: String,

    /// Precision tag
    #[arg(long, default_value = "fp32")]
    pub precision: String,
}

/// Prints the declared argument schema of one operator kind.
pub fn execute(args: DescribeArgs) -> anyhow::Result<()> {
    let (device, precision) = super::parse_tags(&args.device, &args.precision)?;
    let registry = builtin_registry()?;
    let registration = registry.lookup(&args.name, device, precision)?;
    let declaration = &registration.declaration;

    println!("{} — {}", declaration.name(), declaration.doc_str());
    let arity = declaration.arity_bounds();
    println!(
        "inputs {}..={}, outputs {}..={}",
        arity.min_in, arity.max_in, arity.min_out, arity.max_out
    );

    if declaration.args().is_empty() {
        println!("(no arguments)");
        return Ok(());
    }
    println!();
    println!("{:<12} {:<8} {:<10} DESCRIPTION", "ARGUMENT", "TYPE", "REQUIRED");
    for spec in declaration.args() {
        println!(
            "{:<12} {:<8} {:<10} {}",
            spec.name,
            spec.kind.as_str(),
            if spec.required { "yes" } else { "no" },
            spec.doc
        );
    }
    Ok(())
}
