// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Tensor metadata and data-carrier types for the opkit operator framework.
//!
//! This crate provides:
//! - [`Shape`] — per-axis extents of a tensor.
//! - [`AxisLayout`] — named axis indices (batch/channel/height/width),
//!   each of which may be absent for tensors that don't use that axis.
//! - [`DType`] — supported element data types (f32, f16, i8).
//! - [`TensorDesc`] — shape + layout + dtype, the unit shape inference
//!   operates on before any data exists.
//! - [`Tensor`] — an owned, contiguous data carrier for forward passes.
//!
//! # Design Goals
//! - Shape inference works on [`TensorDesc`] alone, so output shapes can
//!   be fully determined before output buffers are allocated.
//! - No heap allocation in hot paths (forward passes work on
//!   pre-allocated buffers).
//! - Clean error types via `thiserror`.

mod dtype;
mod error;
mod layout;
mod shape;
mod tensor;

pub use dtype::DType;
pub use error::TensorError;
pub use layout::AxisLayout;
pub use shape::Shape;
pub use tensor::{Tensor, TensorDesc};
