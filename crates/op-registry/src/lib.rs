// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # op-registry
//!
//! The process-wide operator catalog: maps `(name, device, precision)`
//! identities to helper factories, resolves alias names, and carries
//! each operator kind's declarative [`Declaration`] (argument schema +
//! arity).
//!
//! Registration is a one-time startup phase: populate an [`OpRegistry`]
//! fully before building any graph, then treat it as read-only. The
//! registry is a plain value (no global static), so tests construct a
//! fresh one per case instead of relying on process restart.
//!
//! ```
//! use op_core::{Arity, Device, ParamKind, Precision};
//! use op_registry::{Declaration, OpRegistry};
//!
//! let decl = Declaration::new("noop")
//!     .doc("does nothing")
//!     .arity(Arity::exact(1, 1))
//!     .arg("scale", ParamKind::Float, "output scale factor");
//! assert_eq!(decl.args().len(), 1);
//! ```

mod error;
mod registry;
mod schema;

pub use error::RegistryError;
pub use registry::{HelperFactory, OpIdentity, OpRegistry, Registration};
pub use schema::{ArgSpec, Declaration};
