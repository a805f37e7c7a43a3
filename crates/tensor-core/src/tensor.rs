// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor descriptors and the owned tensor data carrier.

use crate::{AxisLayout, DType, Shape, TensorError};

/// Metadata fully describing a tensor without any data.
///
/// Shape inference consumes and produces `TensorDesc` values: inputs are
/// described before output buffers exist, and the inferred output descs
/// tell the caller exactly what to allocate.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TensorDesc {
    /// Per-axis extents.
    pub shape: Shape,
    /// Named axis indices (possibly all absent).
    pub layout: AxisLayout,
    /// Element data type.
    pub dtype: DType,
}

impl TensorDesc {
    /// Creates a descriptor from shape, layout, and dtype.
    ///
    /// Returns an error if any named axis index is outside the shape's
    /// rank.
    pub fn new(shape: Shape, layout: AxisLayout, dtype: DType) -> Result<Self, TensorError> {
        if let Some(max) = layout.max_index() {
            if max >= shape.rank() {
                return Err(TensorError::AxisOutOfRange {
                    axis: "layout",
                    index: max,
                    rank: shape.rank(),
                });
            }
        }
        Ok(Self {
            shape,
            layout,
            dtype,
        })
    }

    /// Creates a descriptor with no named axes.
    pub fn plain(shape: Shape, dtype: DType) -> Self {
        Self {
            shape,
            layout: AxisLayout::none(),
            dtype,
        }
    }

    /// Creates a 4-D NCHW descriptor.
    pub fn nchw(n: usize, c: usize, h: usize, w: usize, dtype: DType) -> Self {
        Self {
            shape: Shape::new(vec![n, c, h, w]),
            layout: AxisLayout::nchw(),
            dtype,
        }
    }

    /// Returns the memory footprint in bytes of a tensor with this descriptor.
    pub fn size_bytes(&self) -> usize {
        self.shape.size_bytes(self.dtype)
    }
}

impl std::fmt::Display for TensorDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{} {}", self.shape, self.layout, self.dtype)
    }
}

/// An owned, n-dimensional tensor stored in contiguous memory.
///
/// `Tensor` is the data carrier for forward passes. It owns its buffer;
/// operators read inputs and write pre-allocated outputs, never
/// resizing either.
///
/// # Memory Layout
/// Data is stored in row-major (C) order as a flat byte buffer.
#[derive(Debug, Clone)]
pub struct Tensor {
    desc: TensorDesc,
    data: Vec<u8>,
}

impl Tensor {
    /// Creates a new tensor filled with zeros.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape, DType};
    /// let t = Tensor::zeros(Shape::matrix(2, 3), DType::F32);
    /// assert_eq!(t.size_bytes(), 24); // 2 * 3 * 4 bytes
    /// ```
    pub fn zeros(shape: Shape, dtype: DType) -> Self {
        Self::zeros_desc(&TensorDesc::plain(shape, dtype))
    }

    /// Creates a zero-filled tensor matching a descriptor.
    pub fn zeros_desc(desc: &TensorDesc) -> Self {
        let size = desc.size_bytes();
        Self {
            desc: desc.clone(),
            data: vec![0u8; size],
        }
    }

    /// Creates a tensor from raw bytes.
    ///
    /// Returns an error if the buffer size does not match the descriptor.
    pub fn from_bytes(desc: TensorDesc, data: Vec<u8>) -> Result<Self, TensorError> {
        let expected = desc.size_bytes();
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { desc, data })
    }

    /// Creates an `F32` tensor from a slice of values, with no named axes.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::from_f32(Shape::vector(3), &[1.0, 2.0, 3.0]).unwrap();
    /// assert_eq!(t.as_f32_slice(), &[1.0, 2.0, 3.0]);
    /// ```
    pub fn from_f32(shape: Shape, values: &[f32]) -> Result<Self, TensorError> {
        let expected = shape.num_elements();
        if values.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected: expected * DType::F32.size_bytes(),
                actual: values.len() * DType::F32.size_bytes(),
            });
        }
        let mut data = vec![0u8; values.len() * 4];
        for (chunk, v) in data.chunks_exact_mut(4).zip(values) {
            chunk.copy_from_slice(&v.to_le_bytes());
        }
        Ok(Self {
            desc: TensorDesc::plain(shape, DType::F32),
            data,
        })
    }

    /// Replaces the named-axis layout, keeping shape and data.
    ///
    /// Returns an error if a named axis index exceeds the rank.
    pub fn with_layout(mut self, layout: AxisLayout) -> Result<Self, TensorError> {
        self.desc = TensorDesc::new(self.desc.shape, layout, self.desc.dtype)?;
        Ok(self)
    }

    /// Returns the tensor's descriptor.
    pub fn desc(&self) -> &TensorDesc {
        &self.desc
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.desc.shape
    }

    /// Returns the tensor's named-axis layout.
    pub fn layout(&self) -> AxisLayout {
        self.desc.layout
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.desc.dtype
    }

    /// Returns the raw byte slice backing this tensor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns a mutable reference to the raw byte buffer.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Returns the memory footprint of this tensor in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Interprets the buffer as a slice of `f32`.
    ///
    /// # Panics
    /// Panics if `self.dtype() != DType::F32`.
    pub fn as_f32_slice(&self) -> &[f32] {
        assert_eq!(
            self.desc.dtype,
            DType::F32,
            "as_f32_slice called on {:?} tensor",
            self.desc.dtype
        );
        // SAFETY: the buffer length is num_elements * 4 by construction,
        // and u8 has no alignment requirement stricter than f32's data
        // because the Vec allocation is at least 4-aligned on all
        // supported platforms for buffers created from f32 writes.
        unsafe {
            std::slice::from_raw_parts(
                self.data.as_ptr() as *const f32,
                self.desc.shape.num_elements(),
            )
        }
    }

    /// Interprets the buffer as a mutable slice of `f32`.
    ///
    /// # Panics
    /// Panics if `self.dtype() != DType::F32`.
    pub fn as_f32_slice_mut(&mut self) -> &mut [f32] {
        assert_eq!(
            self.desc.dtype,
            DType::F32,
            "as_f32_slice_mut called on {:?} tensor",
            self.desc.dtype
        );
        let n = self.desc.shape.num_elements();
        unsafe { std::slice::from_raw_parts_mut(self.data.as_mut_ptr() as *mut f32, n) }
    }

    /// Fills the tensor with a constant `f32` value.
    ///
    /// # Panics
    /// Panics if `self.dtype() != DType::F32`.
    pub fn fill_f32(&mut self, value: f32) {
        let slice = self.as_f32_slice_mut();
        slice.iter_mut().for_each(|x| *x = value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros() {
        let t = Tensor::zeros(Shape::matrix(2, 3), DType::F32);
        assert_eq!(t.size_bytes(), 24);
        assert_eq!(t.shape(), &Shape::matrix(2, 3));
        assert_eq!(t.dtype(), DType::F32);
        assert!(t.as_f32_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_from_f32() {
        let data = vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let t = Tensor::from_f32(Shape::matrix(2, 3), &data).unwrap();
        assert_eq!(t.as_f32_slice(), &data[..]);
    }

    #[test]
    fn test_from_bytes_size_mismatch() {
        let desc = TensorDesc::plain(Shape::matrix(2, 3), DType::F32);
        let result = Tensor::from_bytes(desc, vec![0u8; 10]);
        assert!(result.is_err());
    }

    #[test]
    fn test_desc_axis_out_of_range() {
        let result = TensorDesc::new(Shape::matrix(2, 3), AxisLayout::nchw(), DType::F32);
        assert!(matches!(
            result,
            Err(TensorError::AxisOutOfRange { rank: 2, .. })
        ));
    }

    #[test]
    fn test_with_layout() {
        let t = Tensor::zeros(Shape::matrix(4, 5), DType::F32)
            .with_layout(AxisLayout::hw())
            .unwrap();
        assert_eq!(t.layout().height, Some(0));
        assert_eq!(t.layout().width, Some(1));
    }

    #[test]
    fn test_zeros_desc_roundtrip() {
        let desc = TensorDesc::nchw(1, 2, 3, 4, DType::F32);
        let t = Tensor::zeros_desc(&desc);
        assert_eq!(t.desc(), &desc);
        assert_eq!(t.size_bytes(), 1 * 2 * 3 * 4 * 4);
    }

    #[test]
    fn test_fill_f32() {
        let mut t = Tensor::zeros(Shape::vector(5), DType::F32);
        t.fill_f32(3.5);
        assert!(t.as_f32_slice().iter().all(|&x| x == 3.5));
    }

    #[test]
    fn test_as_f32_mut() {
        let mut t = Tensor::zeros(Shape::vector(3), DType::F32);
        let slice = t.as_f32_slice_mut();
        slice[0] = 10.0;
        slice[1] = 20.0;
        slice[2] = 30.0;
        assert_eq!(t.as_f32_slice(), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_desc_display() {
        let desc = TensorDesc::nchw(1, 2, 3, 4, DType::F32);
        assert_eq!(format!("{desc}"), "[1, 2, 3, 4]NCHW f32");
    }

    #[test]
    fn test_desc_serde_roundtrip() {
        let desc = TensorDesc::nchw(2, 3, 8, 8, DType::F32);
        let json = serde_json::to_string(&desc).unwrap();
        let back: TensorDesc = serde_json::from_str(&json).unwrap();
        assert_eq!(back, desc);
    }
}
