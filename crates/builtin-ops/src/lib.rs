// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # builtin-ops
//!
//! The operator kinds shipped with opkit:
//!
//! - [`dense`] — fully-connected layer with optional bias; vendor and
//!   generic implementation variants.
//! - [`transpose`] — swaps the height and width axes; generic variant
//!   only.
//! - [`attention_lstm`] — attention-LSTM cell whose forward path is not
//!   implemented yet; registered so graph validation sees it, and any
//!   forward attempt fails loudly instead of producing wrong numbers.
//!
//! Call [`register_builtins`] once during startup to populate a
//! registry with every builtin identity and its aliases.

pub mod attention_lstm;
pub mod dense;
pub mod transpose;

use op_registry::{OpRegistry, RegistryError};

/// Registers every builtin operator, with aliases, into `registry`.
///
/// Intended to run exactly once during the startup phase, before any
/// graph is built. Fails fast on the first registration conflict so a
/// partially populated registry is never used.
pub fn register_builtins(registry: &mut OpRegistry) -> Result<(), RegistryError> {
    dense::register(registry)?;
    transpose::register(registry)?;
    attention_lstm::register(registry)?;
    tracing::info!(operators = registry.len(), "builtin operators registered");
    Ok(())
}

/// Convenience: a fresh registry populated with the builtins.
pub fn builtin_registry() -> Result<OpRegistry, RegistryError> {
    let mut registry = OpRegistry::new();
    register_builtins(&mut registry)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use op_core::{Device, Precision};

    #[test]
    fn test_register_builtins_is_conflict_free() {
        let registry = builtin_registry().unwrap();
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_registering_twice_conflicts() {
        let mut registry = builtin_registry().unwrap();
        let err = register_builtins(&mut registry).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateRegistration { .. }
        ));
    }

    #[test]
    fn test_builtin_identities_present() {
        let registry = builtin_registry().unwrap();
        for name in ["dense", "transpose", "attention_lstm"] {
            registry.lookup(name, Device::Cpu, Precision::Fp32).unwrap();
        }
    }
}
