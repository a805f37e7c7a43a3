// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `opkit` — inspect the operator catalog and run operator lifecycles
//! from the command line.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "opkit", version, about = "Operator framework toolkit")]
struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered operator identities, arities, and aliases
    List,
    /// Show the argument schema of an operator kind
    Describe(commands::describe::DescribeArgs),
    /// Run a dense-layer lifecycle end to end
    Run(commands::run::RunArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::init_tracing(cli.verbose);

    match cli.command {
        Command::List => commands::list::execute(),
        Command::Describe(args) => commands::describe::execute(args),
        Command::Run(args) => commands::run::execute(args),
    }
}
