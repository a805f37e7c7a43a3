// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Attention-LSTM cell.
//!
//! The forward path has no implementation yet. The operator is still
//! registered with its full argument schema so models containing it
//! validate and allocate correctly; any forward attempt fails with
//! [`OpError::UnImplemented`] and leaves the output buffers untouched,
//! rather than producing silently wrong numbers.

use op_core::{
    Arity, Device, Dispatcher, ImplKind, ImplVariant, OpContext, OpError, OperatorHelper,
    ParamKind, ParamStore, Precision, SelectPolicy,
};
use op_registry::{Declaration, OpRegistry, RegistryError};
use std::sync::Arc;
use tensor_core::{AxisLayout, Shape, Tensor, TensorDesc};

const OP: &str = "attention_lstm";

/// Bound parameters of one attention-LSTM instance.
#[derive(Debug, Clone)]
pub struct AttentionLstmParam {
    /// Attention projection weights.
    pub weight: Arc<Tensor>,
    /// Width of the hidden state (and of the output features).
    pub hidden_dim: usize,
}

/// Placeholder variant: setup succeeds, execution refuses.
struct StubAttentionLstm;

impl ImplVariant<AttentionLstmParam> for StubAttentionLstm {
    fn kind(&self) -> ImplKind {
        ImplKind::Generic
    }

    fn init(
        &mut self,
        _ctx: &OpContext,
        _inputs: &[TensorDesc],
        _outputs: &[TensorDesc],
        _param: &AttentionLstmParam,
    ) -> Result<(), OpError> {
        Ok(())
    }

    fn forward(
        &mut self,
        ctx: &OpContext,
        _inputs: &[Tensor],
        _outputs: &mut [Tensor],
        _param: &AttentionLstmParam,
    ) -> Result<(), OpError> {
        Err(OpError::UnImplemented {
            op: OP.into(),
            device: ctx.device,
            precision: ctx.precision,
        })
    }
}

/// Helper for one attention-LSTM instance.
pub struct AttentionLstmHelper {
    param: Option<AttentionLstmParam>,
    funcs: Dispatcher<AttentionLstmParam>,
}

impl AttentionLstmHelper {
    pub fn new(_device: Device, _precision: Precision) -> Self {
        Self {
            param: None,
            funcs: Dispatcher::new(OP),
        }
    }
}

impl OperatorHelper for AttentionLstmHelper {
    fn name(&self) -> &str {
        OP
    }

    fn init_param(&mut self, store: &ParamStore) -> Result<(), OpError> {
        let weight = store.get_tensor(OP, "weight_1")?;
        let hidden_dim = store.get_int(OP, "hidden_dim")?;
        let hidden_dim = usize::try_from(hidden_dim)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| OpError::ShapeError {
                op: OP.into(),
                detail: format!("hidden_dim must be positive, got {hidden_dim}"),
            })?;
        self.param = Some(AttentionLstmParam { weight, hidden_dim });
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
        self.funcs.push(Box::new(StubAttentionLstm));
        self.funcs.init(policy, ctx, inputs, outputs, param)
    }

    fn infer_shape(&self, inputs: &[TensorDesc]) -> Result<Vec<TensorDesc>, OpError> {
        let param = self.param.as_ref().ok_or_else(|| OpError::InitError {
            op: OP.into(),
            detail: "infer_shape called before parameters were bound".into(),
        })?;
        let input = &inputs[0];
        if input.shape.rank() < 2 {
            return Err(OpError::ShapeError {
                op: OP.into(),
                detail: format!("input must have rank >= 2, got {}", input.shape),
            });
        }

        // One hidden-state row per sequence.
        let dims = vec![input.shape.dims()[0], param.hidden_dim];
        let mut layout = AxisLayout::none();
        if input.layout.batch == Some(0) {
            layout.batch = Some(0);
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
        .doc("attention-LSTM cell (forward path not implemented yet)")
        .arity(Arity::exact(1, 1))
        .arg(
            "weight_1",
            ParamKind::Tensor,
            "attention projection weights",
        )
        .arg("hidden_dim", ParamKind::Int, "hidden state width")
}

fn factory(device: Device, precision: Precision) -> Box<dyn OperatorHelper> {
    Box::new(AttentionLstmHelper::new(device, precision))
}

pub(crate) fn register(registry: &mut OpRegistry) -> Result<(), RegistryError> {
    registry.register(Device::Cpu, Precision::Fp32, declaration(), factory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use op_core::ParamValue;
    use tensor_core::DType;

    fn store(hidden_dim: i64) -> ParamStore {
        let mut s = ParamStore::new();
        s.insert(
            "weight_1",
            ParamValue::Tensor(Arc::new(Tensor::zeros(Shape::matrix(8, 8), DType::F32))),
        );
        s.insert("hidden_dim", ParamValue::Int(hidden_dim));
        s
    }

    #[test]
    fn test_infer_shape_is_batch_by_hidden() {
        let mut h = AttentionLstmHelper::new(Device::Cpu, Precision::Fp32);
        h.init_param(&store(16)).unwrap();
        let input = TensorDesc::plain(Shape::new(vec![3, 10, 8]), DType::F32);
        let out = h.infer_shape(&[input]).unwrap();
        assert_eq!(out[0].shape.dims(), &[3, 16]);
    }

    #[test]
    fn test_forward_is_unimplemented() {
        let mut h = AttentionLstmHelper::new(Device::Cpu, Precision::Fp32);
        h.init_param(&store(4)).unwrap();
        let in_desc = TensorDesc::plain(Shape::new(vec![2, 5, 8]), DType::F32);
        let out_descs = h.infer_shape(&[in_desc.clone()]).unwrap();

        let ctx = OpContext::new(Device::Cpu, Precision::Fp32);
        h.init(&ctx, SelectPolicy::Static, &[in_desc.clone()], &out_descs)
            .unwrap();

        let inputs = vec![Tensor::zeros_desc(&in_desc)];
        let mut outputs = vec![Tensor::zeros_desc(&out_descs[0])];
        outputs[0].fill_f32(7.0);
        let err = h.forward(&ctx, &inputs, &mut outputs).unwrap_err();
        assert!(matches!(err, OpError::UnImplemented { .. }));
        // Output buffer must be untouched by the failed pass.
        assert!(outputs[0].as_f32_slice().iter().all(|&v| v == 7.0));
    }

    #[test]
    fn test_invalid_hidden_dim() {
        let mut h = AttentionLstmHelper::new(Device::Cpu, Precision::Fp32);
        assert!(matches!(
            h.init_param(&store(0)).unwrap_err(),
            OpError::ShapeError { .. }
        ));
    }
}
