// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use builtin_ops::builtin_registry;

/// Prints every canonical identity with its arity bounds and aliases.
pub fn execute() -> anyhow::Result<()> {
    let registry = builtin_registry()?;

    println!(
        "{:<16} {:<6} {:<10} {:<10} {}",
        "OPERATOR", "DEVICE", "PRECISION", "IN/OUT", "ALIASES"
    );
    for identity in registry.identities() {
        let registration = registry.lookup(&identity.name, identity.device, identity.precision)?;
        let arity = registration.declaration.arity_bounds();
        let bounds = format!(
            "{}-{}/{}-{}",
            arity.min_in, arity.max_in, arity.min_out, arity.max_out
        );
        let aliases = registry.aliases_of(identity).join(", ");
        println!(
            "{:<16} {:<6} {:<10} {:<10} {}",
            identity.name,
            identity.device.as_str(),
            identity.precision.as_str(),
            bounds,
            aliases
        );
    }
    Ok(())
}
