// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The operator catalog: identities, factories, and alias resolution.

use crate::{Declaration, RegistryError};
use op_core::{Device, Operator, OperatorHelper, Precision};
use std::collections::HashMap;

/// Uniquely selects a registered factory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct OpIdentity {
    /// Operator name (canonical or alias).
    pub name: String,
    /// Device tag.
    pub device: Device,
    /// Numeric-precision tag.
    pub precision: Precision,
}

impl OpIdentity {
    /// Creates an identity.
    pub fn new(name: impl Into<String>, device: Device, precision: Precision) -> Self {
        Self {
            name: name.into(),
            device,
            precision,
        }
    }
}

impl std::fmt::Display for OpIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}/{}", self.name, self.device, self.precision)
    }
}

/// Produces a fresh helper for the given device/precision pair.
///
/// A plain function pointer, so registrations stay declarative data.
pub type HelperFactory = fn(Device, Precision) -> Box<dyn OperatorHelper>;

/// One registry row: a factory plus the operator kind's declaration.
#[derive(Debug)]
pub struct Registration {
    /// Declarative schema (name, doc, arity, arguments).
    pub declaration: Declaration,
    /// Helper factory.
    pub factory: HelperFactory,
}

/// The process-wide operator catalog.
///
/// Populate fully during startup, then treat as read-only; no internal
/// locking is performed and none is needed once graph construction
/// begins.
#[derive(Default)]
pub struct OpRegistry {
    entries: HashMap<OpIdentity, Registration>,
    /// alias identity → canonical identity. Injective in the forward
    /// direction; a canonical identity may have many aliases.
    aliases: HashMap<OpIdentity, OpIdentity>,
}

impl OpRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under the canonical identity formed from the
    /// declaration's name and the given device/precision tags.
    ///
    /// The argument schema is carried as data and checked at bind time,
    /// never here.
    pub fn register(
        &mut self,
        device: Device,
        precision: Precision,
        declaration: Declaration,
        factory: HelperFactory,
    ) -> Result<(), RegistryError> {
        let identity = OpIdentity::new(declaration.name(), device, precision);
        if self.entries.contains_key(&identity) || self.aliases.contains_key(&identity) {
            return Err(RegistryError::DuplicateRegistration { identity });
        }
        tracing::debug!(%identity, "operator registered");
        self.entries.insert(
            identity,
            Registration {
                declaration,
                factory,
            },
        );
        Ok(())
    }

    /// Adds an additional lookup name resolving to the same identity.
    ///
    /// The target `(name, device, precision)` must already be registered
    /// (aliasing an alias resolves to its canonical identity first).
    pub fn alias(
        &mut self,
        name: &str,
        device: Device,
        precision: Precision,
        new_name: &str,
    ) -> Result<(), RegistryError> {
        let canonical = self
            .resolve(&OpIdentity::new(name, device, precision))
            .ok_or_else(|| RegistryError::UnknownIdentity {
                identity: OpIdentity::new(name, device, precision),
            })?;

        let alias_identity = OpIdentity::new(new_name, device, precision);
        if self.entries.contains_key(&alias_identity) || self.aliases.contains_key(&alias_identity)
        {
            return Err(RegistryError::DuplicateRegistration {
                identity: alias_identity,
            });
        }
        tracing::debug!(alias = %alias_identity, target = %canonical, "operator alias added");
        self.aliases.insert(alias_identity, canonical);
        Ok(())
    }

    /// Looks up a registration by name (canonical or alias) and tags.
    pub fn lookup(
        &self,
        name: &str,
        device: Device,
        precision: Precision,
    ) -> Result<&Registration, RegistryError> {
        let identity = OpIdentity::new(name, device, precision);
        let canonical = self
            .resolve(&identity)
            .ok_or(RegistryError::NotFound { identity })?;
        Ok(&self.entries[&canonical])
    }

    /// Builds an operator instance: fresh helper paired with the
    /// declared arity under the canonical name.
    pub fn build(
        &self,
        name: &str,
        device: Device,
        precision: Precision,
    ) -> Result<Operator, RegistryError> {
        let registration = self.lookup(name, device, precision)?;
        Ok(Operator::new(
            registration.declaration.name(),
            device,
            precision,
            registration.declaration.arity_bounds(),
            (registration.factory)(device, precision),
        ))
    }

    /// Iterates canonical identities in sorted order.
    pub fn identities(&self) -> Vec<&OpIdentity> {
        let mut ids: Vec<&OpIdentity> = self.entries.keys().collect();
        ids.sort_by(|a, b| {
            (&a.name, a.device.as_str(), a.precision.as_str())
                .cmp(&(&b.name, b.device.as_str(), b.precision.as_str()))
        });
        ids
    }

    /// Returns the alias names registered for a canonical identity, sorted.
    pub fn aliases_of(&self, identity: &OpIdentity) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .aliases
            .iter()
            .filter(|(_, target)| *target == identity)
            .map(|(alias, _)| alias.name.as_str())
            .collect();
        names.sort();
        names
    }

    /// Number of canonical registrations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a possibly-aliased identity to its canonical identity.
    fn resolve(&self, identity: &OpIdentity) -> Option<OpIdentity> {
        if self.entries.contains_key(identity) {
            return Some(identity.clone());
        }
        self.aliases.get(identity).cloned()
    }
}

impl std::fmt::Debug for OpRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpRegistry")
            .field("entries", &self.entries.len())
            .field("aliases", &self.aliases.len())
            .finish()
    }
}
