// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Implementation selection: which registered variant executes.
//!
//! A [`Dispatcher`] owns the set of [`ImplVariant`]s instantiated for
//! one operator instance and records the selection outcome. Selection
//! runs during init under one of three policies and is stable until the
//! next init: every forward pass routes to the same variant.

use crate::{ImplKind, ImplVariant, OpContext, OpError};
use std::time::Instant;
use tensor_core::{Tensor, TensorDesc};

/// How the dispatcher chooses among candidate variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectPolicy {
    /// Fixed precedence: the first registered variant. Deterministic and
    /// side-effect-free.
    Static,
    /// Time one forward pass of each candidate against the init-time
    /// shapes and pick the cheapest. Skipped when only one candidate
    /// exists.
    Benchmark,
    /// Caller names the desired variant kind directly.
    Specify(ImplKind),
}

impl SelectPolicy {
    /// Parses a policy from a loose string (`"static"`, `"benchmark"`,
    /// or a variant kind name for explicit selection).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "static" => Some(Self::Static),
            "benchmark" | "runtime" => Some(Self::Benchmark),
            other => ImplKind::from_str_loose(other).map(Self::Specify),
        }
    }
}

impl Default for SelectPolicy {
    fn default() -> Self {
        Self::Static
    }
}

/// Owns an operator instance's implementation variants and the
/// selection outcome.
///
/// `P` is the operator-kind parameter type. Helpers embed one
/// dispatcher per operator instance, push the variants applicable to
/// their device/precision during init, and delegate forward passes.
pub struct Dispatcher<P> {
    op: String,
    variants: Vec<Box<dyn ImplVariant<P>>>,
    best: Option<usize>,
}

impl<P> Dispatcher<P> {
    /// Creates an empty dispatcher for the named operator.
    pub fn new(op: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            variants: Vec::new(),
            best: None,
        }
    }

    /// Adds a candidate variant. Clears any previous selection outcome.
    pub fn push(&mut self, variant: Box<dyn ImplVariant<P>>) {
        self.variants.push(variant);
        self.best = None;
    }

    /// Drops all candidates and the selection outcome (used by re-init).
    pub fn clear(&mut self) {
        self.variants.clear();
        self.best = None;
    }

    /// Number of candidate variants.
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Returns `true` if no variants were instantiated.
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// The kind of the selected variant, if selection has run.
    pub fn best_kind(&self) -> Option<ImplKind> {
        self.best.map(|i| self.variants[i].kind())
    }

    /// Runs selection under `policy` and performs one-time setup of the
    /// chosen variant bound to the current input/output shapes.
    ///
    /// Fails with [`OpError::InitError`] if no variant was instantiated
    /// or the chosen variant's setup fails, and with
    /// [`OpError::UnImplemented`] if an explicitly requested kind is not
    /// among the candidates.
    pub fn init(
        &mut self,
        policy: SelectPolicy,
        ctx: &OpContext,
        inputs: &[TensorDesc],
        outputs: &[TensorDesc],
        param: &P,
    ) -> Result<(), OpError> {
        if self.variants.is_empty() {
            return Err(OpError::InitError {
                op: self.op.clone(),
                detail: format!(
                    "no implementation variant available for {}/{}",
                    ctx.device, ctx.precision
                ),
            });
        }

        let chosen = match policy {
            SelectPolicy::Static => 0,
            SelectPolicy::Specify(kind) => self
                .variants
                .iter()
                .position(|v| v.kind() == kind)
                .ok_or_else(|| OpError::UnImplemented {
                    op: format!("{} ({kind})", self.op),
                    device: ctx.device,
                    precision: ctx.precision,
                })?,
            SelectPolicy::Benchmark => self.pick_best_runtime(ctx, inputs, outputs, param)?,
        };

        self.variants[chosen].init(ctx, inputs, outputs, param)?;
        self.best = Some(chosen);
        tracing::info!(
            op = %self.op,
            variant = %self.variants[chosen].kind(),
            candidates = self.variants.len(),
            "implementation selected"
        );
        Ok(())
    }

    /// Routes a forward pass to the selected variant.
    ///
    /// Fails with [`OpError::InitError`] if selection has not run.
    pub fn forward(
        &mut self,
        ctx: &OpContext,
        inputs: &[Tensor],
        outputs: &mut [Tensor],
        param: &P,
    ) -> Result<(), OpError> {
        let best = self.best.ok_or_else(|| OpError::InitError {
            op: self.op.clone(),
            detail: "forward called before init".into(),
        })?;
        self.variants[best].forward(ctx, inputs, outputs, param)
    }

    /// Times one forward pass of each candidate on zero-filled scratch
    /// tensors built from the init-time descriptors and returns the
    /// index of the cheapest.
    ///
    /// Benchmarking a single candidate is wasted work, so it is skipped.
    /// Candidates whose setup or trial run fails are excluded; if every
    /// candidate fails, the last failure is surfaced.
    fn pick_best_runtime(
        &mut self,
        ctx: &OpContext,
        inputs: &[TensorDesc],
        outputs: &[TensorDesc],
        param: &P,
    ) -> Result<usize, OpError> {
        if self.variants.len() == 1 {
            return Ok(0);
        }

        let scratch_in: Vec<Tensor> = inputs.iter().map(Tensor::zeros_desc).collect();
        let mut scratch_out: Vec<Tensor> = outputs.iter().map(Tensor::zeros_desc).collect();

        let mut best: Option<(std::time::Duration, usize)> = None;
        let mut last_err = None;

        for (i, variant) in self.variants.iter_mut().enumerate() {
            let kind = variant.kind();
            let trial = variant
                .init(ctx, inputs, outputs, param)
                .and_then(|()| {
                    let start = Instant::now();
                    variant.forward(ctx, &scratch_in, &mut scratch_out, param)?;
                    Ok(start.elapsed())
                });
            match trial {
                Ok(cost) => {
                    tracing::debug!(op = %self.op, variant = %kind, ?cost, "benchmark trial");
                    if best.map_or(true, |(b, _)| cost < b) {
                        best = Some((cost, i));
                    }
                }
                Err(e) => {
                    tracing::warn!(op = %self.op, variant = %kind, error = %e, "benchmark candidate excluded");
                    last_err = Some(e);
                }
            }
        }

        match best {
            Some((_, i)) => Ok(i),
            None => Err(last_err.unwrap_or_else(|| OpError::InitError {
                op: self.op.clone(),
                detail: "all benchmark candidates failed".into(),
            })),
        }
    }
}

impl<P> std::fmt::Debug for Dispatcher<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("op", &self.op)
            .field("variants", &self.variants.len())
            .field("best", &self.best_kind())
            .finish()
    }
}
