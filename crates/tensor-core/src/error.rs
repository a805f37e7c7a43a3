// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor construction and access.

/// Errors that can occur when constructing or accessing tensors.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// The provided buffer size does not match the expected size for the given shape and dtype.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// A named axis index points outside the tensor's rank.
    #[error("axis '{axis}' index {index} out of range for rank {rank}")]
    AxisOutOfRange {
        axis: &'static str,
        index: usize,
        rank: usize,
    },
}
