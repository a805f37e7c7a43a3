// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the operator lifecycle.
//!
//! Every failure propagates to the immediate caller as an explicit
//! status value; the framework never swallows an error to produce a
//! best-effort numeric result.

use crate::{Device, ParamKind, Precision};

/// Errors that can occur while binding, initializing, or executing an
/// operator.
#[derive(Debug, thiserror::Error)]
pub enum OpError {
    /// A required parameter was absent from the store at bind time.
    /// Fatal to this operator's construction; retrying without fixing
    /// the input parameters cannot succeed.
    #[error("operator '{op}': missing parameter '{name}'")]
    MissingParameter { op: String, name: String },

    /// A parameter was present but carried the wrong type.
    #[error("operator '{op}': parameter '{name}' has type {actual}, expected {expected}")]
    TypeMismatch {
        op: String,
        name: String,
        expected: ParamKind,
        actual: ParamKind,
    },

    /// Shape inference could not determine a valid output shape.
    #[error("operator '{op}': shape error: {detail}")]
    ShapeError { op: String, detail: String },

    /// One-time setup of the chosen implementation variant failed, or no
    /// variant could be instantiated for the requested device/precision.
    #[error("operator '{op}': init failed: {detail}")]
    InitError { op: String, detail: String },

    /// The requested device/precision/variant combination does not
    /// exist. Never silently substituted.
    #[error("operator '{op}' is not implemented for {device}/{precision}")]
    UnImplemented {
        op: String,
        device: Device,
        precision: Precision,
    },

    /// The parameter loader could not read an entry from disk.
    #[error("parameter load failed for '{entry}': {detail}")]
    ParamLoad { entry: String, detail: String },

    /// A tensor-level failure surfaced through the lifecycle.
    #[error(transparent)]
    Tensor(#[from] tensor_core::TensorError),
}
