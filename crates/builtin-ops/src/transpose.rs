// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Height/width transpose.
//!
//! Swaps exactly the two named spatial axes of the input; every other
//! axis, named or not, is untouched, and axes the input does not carry
//! stay absent in the output. An input whose layout names no height or
//! no width axis is rejected at shape-inference time with an error
//! naming the missing axis.

use op_core::{
    Arity, Device, Dispatcher, ImplKind, ImplVariant, OpContext, OpError, OperatorHelper,
    ParamStore, Precision, SelectPolicy,
};
use op_registry::{Declaration, OpRegistry, RegistryError};
use tensor_core::{DType, Tensor, TensorDesc};

const OP: &str = "transpose";

/// Transpose takes no configuration arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransposeParam;

/// The one implementation: a permuted element copy over row-major
/// strides. Works for any rank as long as height and width are named.
struct GenericTranspose;

impl GenericTranspose {
    fn spatial_axes(desc: &TensorDesc) -> Result<(usize, usize), OpError> {
        let h = desc.layout.height.ok_or_else(|| OpError::ShapeError {
            op: OP.into(),
            detail: "input layout names no height axis".into(),
        })?;
        let w = desc.layout.width.ok_or_else(|| OpError::ShapeError {
            op: OP.into(),
            detail: "input layout names no width axis".into(),
        })?;
        Ok((h, w))
    }
}

impl ImplVariant<TransposeParam> for GenericTranspose {
    fn kind(&self) -> ImplKind {
        ImplKind::Generic
    }

    fn init(
        &mut self,
        _ctx: &OpContext,
        inputs: &[TensorDesc],
        outputs: &[TensorDesc],
        _param: &TransposeParam,
    ) -> Result<(), OpError> {
        if inputs.iter().chain(outputs).all(|d| d.dtype == DType::F32) {
            Ok(())
        } else {
            Err(OpError::InitError {
                op: OP.into(),
                detail: "only f32 tensors are supported".into(),
            })
        }
    }

    fn forward(
        &mut self,
        _ctx: &OpContext,
        inputs: &[Tensor],
        outputs: &mut [Tensor],
        _param: &TransposeParam,
    ) -> Result<(), OpError> {
        let input = &inputs[0];
        let (h, w) = Self::spatial_axes(input.desc())?;

        let in_strides = input.shape().strides();
        let out_shape = outputs[0].shape().clone();
        let out_strides = out_shape.strides();
        let rank = out_shape.rank();

        let x = input.as_f32_slice();
        let y = outputs[0].as_f32_slice_mut();
        let mut index = vec![0usize; rank];
        for (out_flat, slot) in y.iter_mut().enumerate() {
            let mut rem = out_flat;
            for d in 0..rank {
                index[d] = rem / out_strides[d];
                rem %= out_strides[d];
            }
            index.swap(h, w);
            let in_flat: usize = index.iter().zip(&in_strides).map(|(i, s)| i * s).sum();
            *slot = x[in_flat];
        }
        Ok(())
    }
}

/// Helper for one transpose instance.
pub struct TransposeHelper {
    precision: Precision,
    param: Option<TransposeParam>,
    funcs: Dispatcher<TransposeParam>,
}

impl TransposeHelper {
    pub fn new(_device: Device, precision: Precision) -> Self {
        Self {
            precision,
            param: None,
            funcs: Dispatcher::new(OP),
        }
    }
}

impl OperatorHelper for TransposeHelper {
    fn name(&self) -> &str {
        OP
    }

    fn init_param(&mut self, _store: &ParamStore) -> Result<(), OpError> {
        self.param = Some(TransposeParam);
        Ok(())
    }

    fn init(
        &mut self,
        ctx: &OpContext,
        policy: SelectPolicy,
        inputs: &[TensorDesc],
        outputs: &[TensorDesc],
    ) -> Result<(), OpError> {
        let param = self.param.as_ref().ok_or_else(|| OpError::InitError {
            op: OP.into(),
            detail: "init called before parameters were bound".into(),
        })?;
        self.funcs.clear();
        if self.precision == Precision::Fp32 {
            self.funcs.push(Box::new(GenericTranspose));
        }
        self.funcs.init(policy, ctx, inputs, outputs, param)
    }

    fn infer_shape(&self, inputs: &[TensorDesc]) -> Result<Vec<TensorDesc>, OpError> {
        if self.param.is_none() {
            return Err(OpError::InitError {
                op: OP.into(),
                detail: "infer_shape called before parameters were bound".into(),
            });
        }
        let input = &inputs[0];
        let (h, w) = GenericTranspose::spatial_axes(input)?;

        let extent = |axis: usize| {
            input.shape.dim(axis).ok_or_else(|| OpError::ShapeError {
                op: OP.into(),
                detail: format!(
                    "named axis index {axis} out of range for input of rank {}",
                    input.shape.rank()
                ),
            })
        };
        let (hv, wv) = (extent(h)?, extent(w)?);

        let mut shape = input.shape.clone();
        shape.set_dim(h, wv);
        shape.set_dim(w, hv);
        // Axis names keep their positions; only the extents move.
        let desc = TensorDesc::new(shape, input.layout, input.dtype)?;
        Ok(vec![desc])
    }

    fn forward(
        &mut self,
        ctx: &OpContext,
        inputs: &[Tensor],
        outputs: &mut [Tensor],
    ) -> Result<(), OpError> {
        let param = self.param.as_ref().ok_or_else(|| OpError::InitError {
            op: OP.into(),
            detail: "forward called before parameters were bound".into(),
        })?;
        self.funcs.forward(ctx, inputs, outputs, param)
    }

    fn selected(&self) -> Option<ImplKind> {
        self.funcs.best_kind()
    }
}

pub(crate) fn declaration() -> Declaration {
    Declaration::new(OP)
        .doc("swaps the height and width axes of the input")
        .arity(Arity::exact(1, 1))
}

fn factory(device: Device, precision: Precision) -> Box<dyn OperatorHelper> {
    Box::new(TransposeHelper::new(device, precision))
}

pub(crate) fn register(registry: &mut OpRegistry) -> Result<(), RegistryError> {
    for (device, precision) in [
        (Device::Cpu, Precision::Fp32),
        (Device::Edge, Precision::Fp32),
    ] {
        registry.register(device, precision, declaration(), factory)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_core::{AxisLayout, Shape};

    fn bound_helper() -> TransposeHelper {
        let mut h = TransposeHelper::new(Device::Cpu, Precision::Fp32);
        h.init_param(&ParamStore::new()).unwrap();
        h
    }

    #[test]
    fn test_infer_shape_swaps_spatial_extents() {
        let h = bound_helper();
        let input = TensorDesc::nchw(2, 3, 4, 5, DType::F32);
        let out = h.infer_shape(&[input]).unwrap();
        assert_eq!(out[0].shape.dims(), &[2, 3, 5, 4]);
        assert_eq!(out[0].layout, AxisLayout::nchw());
    }

    #[test]
    fn test_infer_shape_keeps_absent_axes_absent() {
        let h = bound_helper();
        let input = TensorDesc::new(Shape::matrix(4, 5), AxisLayout::hw(), DType::F32).unwrap();
        let out = h.infer_shape(&[input]).unwrap();
        assert_eq!(out[0].shape.dims(), &[5, 4]);
        assert!(out[0].layout.batch.is_none());
        assert!(out[0].layout.channel.is_none());
    }

    #[test]
    fn test_infer_shape_missing_named_axis() {
        let h = bound_helper();
        let input = TensorDesc::plain(Shape::matrix(4, 5), DType::F32);
        let err = h.infer_shape(&[input]).unwrap_err();
        match err {
            OpError::ShapeError { detail, .. } => assert!(detail.contains("height")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_forward_transposes_matrix() {
        let mut h = bound_helper();
        let in_desc = TensorDesc::new(Shape::matrix(2, 3), AxisLayout::hw(), DType::F32).unwrap();
        let out_descs = h.infer_shape(&[in_desc.clone()]).unwrap();

        let ctx = OpContext::new(Device::Cpu, Precision::Fp32);
        h.init(&ctx, SelectPolicy::Static, &[in_desc.clone()], &out_descs)
            .unwrap();

        let input = Tensor::from_f32(Shape::matrix(2, 3), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
            .unwrap()
            .with_layout(AxisLayout::hw())
            .unwrap();
        let mut outputs = vec![Tensor::zeros_desc(&out_descs[0])];
        h.forward(&ctx, &[input], &mut outputs).unwrap();
        assert_eq!(
            outputs[0].as_f32_slice(),
            &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]
        );
    }

    #[test]
    fn test_forward_4d_batch_and_channel_untouched() {
        let mut h = bound_helper();
        let in_desc = TensorDesc::nchw(2, 2, 2, 3, DType::F32);
        let out_descs = h.infer_shape(&[in_desc.clone()]).unwrap();
        assert_eq!(out_descs[0].shape.dims(), &[2, 2, 3, 2]);

        let ctx = OpContext::new(Device::Cpu, Precision::Fp32);
        h.init(&ctx, SelectPolicy::Static, &[in_desc.clone()], &out_descs)
            .unwrap();

        let values: Vec<f32> = (0..24).map(|i| i as f32).collect();
        let input = Tensor::from_f32(Shape::new(vec![2, 2, 2, 3]), &values)
            .unwrap()
            .with_layout(AxisLayout::nchw())
            .unwrap();
        let mut outputs = vec![Tensor::zeros_desc(&out_descs[0])];
        h.forward(&ctx, &[input], &mut outputs).unwrap();

        // Block (n=0, c=0) was [[0, 1, 2], [3, 4, 5]]; transposed it is
        // [[0, 3], [1, 4], [2, 5]].
        assert_eq!(&outputs[0].as_f32_slice()[..6], &[0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
        // Block (n=1, c=1) starts at flat offset 18.
        assert_eq!(
            &outputs[0].as_f32_slice()[18..],
            &[18.0, 21.0, 19.0, 22.0, 20.0, 23.0]
        );
    }
}
