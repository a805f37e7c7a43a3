// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The implementation-variant capability contract.

use crate::{OpContext, OpError};
use tensor_core::{Tensor, TensorDesc};

/// Identifies a concrete backend realization of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImplKind {
    /// Vendor-optimized kernel (cuBLAS/oneDNN-class, or a tuned local
    /// equivalent).
    Vendor,
    /// Generic portable fallback.
    Generic,
}

impl ImplKind {
    /// Returns a human-readable label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::Generic => "generic",
        }
    }

    /// Parses a kind from a loose string.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "vendor" | "vender" => Some(Self::Vendor),
            "generic" | "fallback" => Some(Self::Generic),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImplKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete numeric kernel unit behind an operator.
///
/// `P` is the operator-kind parameter type (e.g. a fully-connected
/// parameter struct). Variants are stateless with respect to identity —
/// multiple instances may exist — but may hold initialized workspace
/// after [`init`](ImplVariant::init).
pub trait ImplVariant<P>: Send {
    /// The enumerated kind of this variant.
    fn kind(&self) -> ImplKind;

    /// One-time setup (workspace allocation, kernel plan construction)
    /// bound to the current input/output shapes.
    fn init(
        &mut self,
        ctx: &OpContext,
        inputs: &[TensorDesc],
        outputs: &[TensorDesc],
        param: &P,
    ) -> Result<(), OpError>;

    /// Executes the forward computation.
    ///
    /// Inputs are read-only; outputs are pre-allocated by the caller per
    /// the shapes inference produced. On error, outputs must be left
    /// unmodified or fully overwritten — never partially corrupted.
    fn forward(
        &mut self,
        ctx: &OpContext,
        inputs: &[Tensor],
        outputs: &mut [Tensor],
        param: &P,
    ) -> Result<(), OpError>;
}
