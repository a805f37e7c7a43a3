// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # op-core
//!
//! The operator dispatch framework: parameter binding, implementation
//! selection, and the three-phase operator lifecycle.
//!
//! An operator goes through strictly ordered phases:
//!
//! ```text
//! Operator::init_param(&ParamStore)   — bind typed parameters (once)
//! Operator::infer_shape(&[TensorDesc]) — pure output-shape inference
//! Operator::init(ctx, policy, ins, outs) — variant selection + setup
//! Operator::forward(ctx, ins, outs)   — repeatable, routes to the
//!                                       selected implementation
//! ```
//!
//! Multiple [`ImplVariant`]s may exist per operator (vendor-optimized
//! vs generic fallback); a [`Dispatcher`] owns them and records which
//! one the [`SelectPolicy`] chose. The selection outcome is fixed after
//! a successful init and only recomputed by the next init.
//!
//! # Concurrency
//! No internal locking. `init_param` and `init` are one-time phases the
//! caller must serialize; once initialized, repeated forward passes on
//! the same operator are issued back-to-back on one context. Distinct
//! operator instances that share no tensors are independent.

mod context;
mod error;
mod loader;
mod operator;
mod param;
mod selector;
mod variant;

pub use context::{Device, OpContext, Precision};
pub use error::OpError;
pub use loader::ParamLoader;
pub use operator::{Arity, Operator, OperatorHelper};
pub use param::{ParamKind, ParamStore, ParamValue};
pub use selector::{Dispatcher, SelectPolicy};
pub use variant::{ImplKind, ImplVariant};
