// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for registry population and lookup.
//!
//! `DuplicateRegistration` and `UnknownIdentity` are programming errors
//! in the startup phase; callers should abort initialization rather
//! than proceed with a partially populated registry.

use crate::OpIdentity;

/// Errors that can occur while populating or querying the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The identity (or an alias colliding with it) already exists.
    #[error("operator {identity} is already registered")]
    DuplicateRegistration { identity: OpIdentity },

    /// The alias target was never registered.
    #[error("cannot alias {identity}: no such registration")]
    UnknownIdentity { identity: OpIdentity },

    /// No registration or alias matches the requested identity.
    #[error("no operator registered for {identity}")]
    NotFound { identity: OpIdentity },
}
