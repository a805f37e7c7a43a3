// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fully-connected (dense) layer.
//!
//! Flattens the input from `axis` onward into rows of width `K` and
//! projects each row to `out_dim` features through a `[K, out_dim]`
//! weight matrix, optionally adding a bias. Some model formats call
//! this operator "fullconnect" or "fc"; both names are registered as
//! aliases.
//!
//! Two implementation variants exist on CPU: a generic triple loop and
//! a vendor-style kernel that pre-transposes the weight during init so
//! forward passes read both operands row-contiguously. Both accumulate
//! in the same order, so their outputs are bit-identical.

use op_core::{
    Arity, Device, Dispatcher, ImplKind, ImplVariant, OpContext, OpError, OperatorHelper,
    ParamKind, ParamStore, Precision, SelectPolicy,
};
use op_registry::{Declaration, OpRegistry, RegistryError};
use std::sync::Arc;
use tensor_core::{AxisLayout, DType, Shape, Tensor, TensorDesc};

const OP: &str = "dense";

/// Bound parameters of one dense instance.
///
/// Tensor fields are references into the parameter store; binding never
/// copies weight data. A layer without a bias carries `None`, never a
/// zero-filled tensor.
#[derive(Debug, Clone)]
pub struct FcParam {
    /// Weight matrix of shape `[K, out_dim]`.
    pub weight: Arc<Tensor>,
    /// Bias vector of shape `[out_dim]`, if the layer has one.
    pub bias: Option<Arc<Tensor>>,
    /// Output feature count.
    pub out_dim: usize,
    /// First input axis folded into the projection.
    pub axis: usize,
}

/// Reference implementation: accumulate into the output row directly.
struct GenericFc;

impl ImplVariant<FcParam> for GenericFc {
    fn kind(&self) -> ImplKind {
        ImplKind::Generic
    }

    fn init(
        &mut self,
        _ctx: &OpContext,
        inputs: &[TensorDesc],
        outputs: &[TensorDesc],
        param: &FcParam,
    ) -> Result<(), OpError> {
        check_f32(inputs, outputs, param)
    }

    fn forward(
        &mut self,
        _ctx: &OpContext,
        inputs: &[Tensor],
        outputs: &mut [Tensor],
        param: &FcParam,
    ) -> Result<(), OpError> {
        let x = inputs[0].as_f32_slice();
        let w = param.weight.as_f32_slice();
        let n = param.out_dim;
        let k = weight_rows(param);
        let m = x.len() / k;

        let y = outputs[0].as_f32_slice_mut();
        y.iter_mut().for_each(|v| *v = 0.0);
        for i in 0..m {
            for p in 0..k {
                let xv = x[i * k + p];
                let wrow = &w[p * n..(p + 1) * n];
                let yrow = &mut y[i * n..(i + 1) * n];
                for j in 0..n {
                    yrow[j] += xv * wrow[j];
                }
            }
        }
        add_bias(y, m, n, param);
        Ok(())
    }
}

/// Tuned kernel: the weight is transposed once during init so each
/// output element is a dot product of two contiguous rows.
#[derive(Default)]
struct VendorFc {
    /// `[out_dim, K]` transposed copy of the weight, built in init.
    weight_t: Vec<f32>,
}

impl ImplVariant<FcParam> for VendorFc {
    fn kind(&self) -> ImplKind {
        ImplKind::Vendor
    }

    fn init(
        &mut self,
        _ctx: &OpContext,
        inputs: &[TensorDesc],
        outputs: &[TensorDesc],
        param: &FcParam,
    ) -> Result<(), OpError> {
        check_f32(inputs, outputs, param)?;
        let w = param.weight.as_f32_slice();
        let k = weight_rows(param);
        let n = param.out_dim;
        self.weight_t = vec![0.0; w.len()];
        for p in 0..k {
            for j in 0..n {
                self.weight_t[j * k + p] = w[p * n + j];
            }
        }
        Ok(())
    }

    fn forward(
        &mut self,
        _ctx: &OpContext,
        inputs: &[Tensor],
        outputs: &mut [Tensor],
        param: &FcParam,
    ) -> Result<(), OpError> {
        let x = inputs[0].as_f32_slice();
        let k = weight_rows(param);
        let n = param.out_dim;
        let m = x.len() / k;

        let y = outputs[0].as_f32_slice_mut();
        for i in 0..m {
            let xrow = &x[i * k..(i + 1) * k];
            for j in 0..n {
                let wrow = &self.weight_t[j * k..(j + 1) * k];
                let mut acc = 0.0f32;
                for p in 0..k {
                    acc += xrow[p] * wrow[p];
                }
                y[i * n + j] = acc;
            }
        }
        add_bias(y, m, n, param);
        Ok(())
    }
}

fn weight_rows(param: &FcParam) -> usize {
    param.weight.shape().dims()[0]
}

fn add_bias(y: &mut [f32], m: usize, n: usize, param: &FcParam) {
    if let Some(bias) = &param.bias {
        let b = bias.as_f32_slice();
        for i in 0..m {
            for j in 0..n {
                y[i * n + j] += b[j];
            }
        }
    }
}

fn check_f32(
    inputs: &[TensorDesc],
    outputs: &[TensorDesc],
    param: &FcParam,
) -> Result<(), OpError> {
    let all_f32 = inputs
        .iter()
        .chain(outputs)
        .all(|d| d.dtype == DType::F32)
        && param.weight.dtype() == DType::F32
        && param.bias.as_ref().map_or(true, |b| b.dtype() == DType::F32);
    if all_f32 {
        Ok(())
    } else {
        Err(OpError::InitError {
            op: OP.into(),
            detail: "only f32 tensors are supported".into(),
        })
    }
}

/// Helper carrying the bound parameter and the variant dispatcher for
/// one dense instance.
pub struct DenseHelper {
    device: Device,
    precision: Precision,
    param: Option<FcParam>,
    funcs: Dispatcher<FcParam>,
}

impl DenseHelper {
    pub fn new(device: Device, precision: Precision) -> Self {
        Self {
            device,
            precision,
            param: None,
            funcs: Dispatcher::new(OP),
        }
    }

    /// Variants applicable to a device/precision pair. The vendor kernel
    /// is CPU-only; edge targets get the generic loop.
    fn instantiate(device: Device, precision: Precision) -> Vec<Box<dyn ImplVariant<FcParam>>> {
        match (device, precision) {
            (Device::Cpu, Precision::Fp32) => {
                vec![Box::new(VendorFc::default()), Box::new(GenericFc)]
            }
            (Device::Edge, Precision::Fp32) => vec![Box::new(GenericFc)],
            _ => Vec::new(),
        }
    }
}

impl OperatorHelper for DenseHelper {
    fn name(&self) -> &str {
        OP
    }

    fn init_param(&mut self, store: &ParamStore) -> Result<(), OpError> {
        let axis = store.get_int(OP, "axis")?;
        let axis = usize::try_from(axis).map_err(|_| OpError::ShapeError {
            op: OP.into(),
            detail: format!("axis must be non-negative, got {axis}"),
        })?;
        let out_dim = store.get_int(OP, "out_dim")?;
        let out_dim = usize::try_from(out_dim)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| OpError::ShapeError {
                op: OP.into(),
                detail: format!("out_dim must be positive, got {out_dim}"),
            })?;
        let weight = store.get_tensor(OP, "weight_1")?;
        // weight_2 is conditionally required: bias_term decides.
        let bias = if store.get_bool(OP, "bias_term")? {
            Some(store.get_tensor(OP, "weight_2")?)
        } else {
            None
        };
        self.param = Some(FcParam {
            weight,
            bias,
            out_dim,
            axis,
        });
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
        for variant in Self::instantiate(self.device, self.precision) {
            self.funcs.push(variant);
        }
        self.funcs.init(policy, ctx, inputs, outputs, param)
    }

    fn infer_shape(&self, inputs: &[TensorDesc]) -> Result<Vec<TensorDesc>, OpError> {
        let param = self.param.as_ref().ok_or_else(|| OpError::InitError {
            op: OP.into(),
            detail: "infer_shape called before parameters were bound".into(),
        })?;
        let input = &inputs[0];
        let rank = input.shape.rank();
        if param.axis >= rank {
            return Err(OpError::ShapeError {
                op: OP.into(),
                detail: format!(
                    "axis {} out of range for input of rank {rank}",
                    param.axis
                ),
            });
        }

        let k: usize = input.shape.dims()[param.axis..].iter().product();
        let wdims = param.weight.shape().dims();
        if wdims.len() != 2 || wdims[0] != k || wdims[1] != param.out_dim {
            return Err(OpError::ShapeError {
                op: OP.into(),
                detail: format!(
                    "weight shape {} does not match flattened input width {k} and out_dim {}",
                    param.weight.shape(),
                    param.out_dim
                ),
            });
        }
        if let Some(bias) = &param.bias {
            if bias.shape().num_elements() != param.out_dim {
                return Err(OpError::ShapeError {
                    op: OP.into(),
                    detail: format!(
                        "bias shape {} does not match out_dim {}",
                        bias.shape(),
                        param.out_dim
                    ),
                });
            }
        }

        let mut dims = input.shape.dims()[..param.axis].to_vec();
        dims.push(param.out_dim);
        // The flattened axes lose their names; batch survives when it
        // sits in front of the fold point.
        let mut layout = AxisLayout::none();
        if let Some(b) = input.layout.batch {
            if b < param.axis {
                layout.batch = Some(b);
            }
        }
        let desc = TensorDesc::new(Shape::new(dims), layout, input.dtype)?;
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
        .doc("fully-connected layer: flattens the input from `axis` and projects to `out_dim` features")
        .arity(Arity::exact(1, 1))
        .arg("axis", ParamKind::Int, "first input axis folded into the projection")
        .arg("out_dim", ParamKind::Int, "output feature count")
        .arg("bias_term", ParamKind::Bool, "whether the layer adds a bias")
        .arg(
            "weight_1",
            ParamKind::Tensor,
            "weight matrix of shape [flattened_in, out_dim]",
        )
        .opt_arg(
            "weight_2",
            ParamKind::Tensor,
            "bias vector of shape [out_dim]; required when bias_term is true",
        )
}

fn factory(device: Device, precision: Precision) -> Box<dyn OperatorHelper> {
    Box::new(DenseHelper::new(device, precision))
}

pub(crate) fn register(registry: &mut OpRegistry) -> Result<(), RegistryError> {
    for (device, precision) in [
        (Device::Cpu, Precision::Fp32),
        (Device::Edge, Precision::Fp32),
    ] {
        registry.register(device, precision, declaration(), factory)?;
        registry.alias(OP, device, precision, "fullconnect")?;
        registry.alias(OP, device, precision, "fc")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use op_core::ParamValue;

    fn weight(k: usize, n: usize) -> Arc<Tensor> {
        let values: Vec<f32> = (0..k * n).map(|i| (i % 7) as f32 * 0.25 - 0.5).collect();
        Arc::new(Tensor::from_f32(Shape::matrix(k, n), &values).unwrap())
    }

    fn store(axis: i64, out_dim: i64, k: usize, bias: bool) -> ParamStore {
        let mut s = ParamStore::new();
        s.insert("axis", ParamValue::Int(axis));
        s.insert("out_dim", ParamValue::Int(out_dim));
        s.insert("bias_term", ParamValue::Bool(bias));
        s.insert("weight_1", ParamValue::Tensor(weight(k, out_dim as usize)));
        if bias {
            let b: Vec<f32> = (0..out_dim).map(|j| j as f32 + 1.0).collect();
            s.insert(
                "weight_2",
                ParamValue::Tensor(Arc::new(
                    Tensor::from_f32(Shape::vector(out_dim as usize), &b).unwrap(),
                )),
            );
        }
        s
    }

    fn bound_helper(axis: i64, out_dim: i64, k: usize, bias: bool) -> DenseHelper {
        let mut h = DenseHelper::new(Device::Cpu, Precision::Fp32);
        h.init_param(&store(axis, out_dim, k, bias)).unwrap();
        h
    }

    #[test]
    fn test_infer_shape_folds_from_axis() {
        let h = bound_helper(1, 4, 8, false);
        let out = h
            .infer_shape(&[TensorDesc::plain(Shape::matrix(2, 8), DType::F32)])
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].shape.dims(), &[2, 4]);
        assert_eq!(out[0].dtype, DType::F32);
    }

    #[test]
    fn test_infer_shape_folds_trailing_axes() {
        // [2, 2, 2, 2] folded from axis 1 gives K = 8.
        let h = bound_helper(1, 4, 8, false);
        let input = TensorDesc::nchw(2, 2, 2, 2, DType::F32);
        let out = h.infer_shape(&[input]).unwrap();
        assert_eq!(out[0].shape.dims(), &[2, 4]);
        // Batch sits in front of the fold point, so it survives.
        assert_eq!(out[0].layout.batch, Some(0));
        assert!(out[0].layout.height.is_none());
    }

    #[test]
    fn test_infer_shape_axis_out_of_range() {
        let h = bound_helper(3, 4, 8, false);
        let err = h
            .infer_shape(&[TensorDesc::plain(Shape::matrix(2, 8), DType::F32)])
            .unwrap_err();
        assert!(matches!(err, OpError::ShapeError { .. }));
    }

    #[test]
    fn test_infer_shape_weight_mismatch() {
        // Weight declares K = 8 but the input flattens to K = 6.
        let h = bound_helper(1, 4, 8, false);
        let err = h
            .infer_shape(&[TensorDesc::plain(Shape::matrix(2, 6), DType::F32)])
            .unwrap_err();
        assert!(matches!(err, OpError::ShapeError { .. }));
    }

    #[test]
    fn test_bias_requires_weight_2() {
        let mut s = store(1, 4, 8, false);
        s.insert("bias_term", ParamValue::Bool(true));
        let mut h = DenseHelper::new(Device::Cpu, Precision::Fp32);
        let err = h.init_param(&s).unwrap_err();
        match err {
            OpError::MissingParameter { name, .. } => assert_eq!(name, "weight_2"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_negative_axis_rejected() {
        let s = store(-1, 4, 8, false);
        let mut h = DenseHelper::new(Device::Cpu, Precision::Fp32);
        assert!(matches!(
            h.init_param(&s).unwrap_err(),
            OpError::ShapeError { .. }
        ));
    }

    #[test]
    fn test_generic_forward_known_values() {
        // x = [[1, 2]], w = [[1, 0], [0, 1]] (identity), bias = [1, 2].
        let mut s = ParamStore::new();
        s.insert("axis", ParamValue::Int(1));
        s.insert("out_dim", ParamValue::Int(2));
        s.insert("bias_term", ParamValue::Bool(true));
        s.insert(
            "weight_1",
            ParamValue::Tensor(Arc::new(
                Tensor::from_f32(Shape::matrix(2, 2), &[1.0, 0.0, 0.0, 1.0]).unwrap(),
            )),
        );
        s.insert(
            "weight_2",
            ParamValue::Tensor(Arc::new(
                Tensor::from_f32(Shape::vector(2), &[1.0, 2.0]).unwrap(),
            )),
        );

        let mut h = DenseHelper::new(Device::Edge, Precision::Fp32);
        h.init_param(&s).unwrap();
        let in_desc = TensorDesc::plain(Shape::matrix(1, 2), DType::F32);
        let out_descs = h.infer_shape(&[in_desc.clone()]).unwrap();

        let ctx = OpContext::new(Device::Edge, Precision::Fp32);
        h.init(&ctx, SelectPolicy::Static, &[in_desc], &out_descs)
            .unwrap();
        assert_eq!(h.selected(), Some(ImplKind::Generic));

        let inputs = vec![Tensor::from_f32(Shape::matrix(1, 2), &[1.0, 2.0]).unwrap()];
        let mut outputs = vec![Tensor::zeros_desc(&out_descs[0])];
        h.forward(&ctx, &inputs, &mut outputs).unwrap();
        assert_eq!(outputs[0].as_f32_slice(), &[2.0, 4.0]);
    }

    #[test]
    fn test_no_variant_for_unsupported_tags() {
        let mut h = DenseHelper::new(Device::Gpu, Precision::Int8);
        h.init_param(&store(1, 4, 8, false)).unwrap();
        let desc = TensorDesc::plain(Shape::matrix(2, 8), DType::F32);
        let out = TensorDesc::plain(Shape::matrix(2, 4), DType::F32);
        let ctx = OpContext::new(Device::Gpu, Precision::Int8);
        let err = h
            .init(&ctx, SelectPolicy::Static, &[desc], &[out])
            .unwrap_err();
        assert!(matches!(err, OpError::InitError { .. }));
    }
}
