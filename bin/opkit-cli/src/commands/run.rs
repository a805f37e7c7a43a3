// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use builtin_ops::builtin_registry;
use clap::Args;
use op_core::{OpContext, ParamLoader, ParamValue, SelectPolicy};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tensor_core::{DType, Shape, Tensor, TensorDesc};

/// Feature width of the demo input when no model files are given.
const DEMO_IN: usize = 8;
const DEMO_OUT: usize = 4;

#[derive(Args)]
pub struct RunArgs {
    /// Model directory with params.safetensors and args.toml
    /// (omit to run on synthetic parameters)
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// Selection policy: static, benchmark, or a variant kind
    /// (vendor, generic)
    #[arg(long, default_value = "static")]
    pub policy: String,

    /// Device tag
    #[arg(long, default_value = "cpu")]
    pub device: String,

    /// Precision tag
    #[arg(long, default_value = "fp32")]
    pub precision: String,

    /// Number of rows in the demo input batch
    #[arg(long, default_value_t = 2)]
    pub batch: usize,
}

/// Drives a dense layer through its whole lifecycle: load, validate,
/// bind, infer shapes, select an implementation, and run one forward
/// pass.
pub fn execute(args: RunArgs) -> anyhow::Result<()> {
    let policy = SelectPolicy::from_str_loose(&args.policy)
        .ok_or_else(|| anyhow::anyhow!("unknown policy '{}'", args.policy))?;
    let (device, precision) = super::parse_tags(&args.device, &args.precision)?;

    let loader = match args.model_dir {
        Some(dir) => ParamLoader::new(dir)?,
        None => ParamLoader::synthetic(),
    };
    let mut store =
        loader.load_with_synthetic(&[("weight_1", Shape::matrix(DEMO_IN, DEMO_OUT))])?;
    tracing::debug!(
        file_backed = loader.is_file_backed(),
        entries = store.len(),
        "parameter store loaded"
    );
    if !loader.is_file_backed() {
        // Synthetic zeros make every output zero; a small ramp shows the
        // projection actually happened.
        let ramp: Vec<f32> = (0..DEMO_IN * DEMO_OUT)
            .map(|i| (i % 9) as f32 * 0.125 - 0.5)
            .collect();
        store.insert(
            "weight_1",
            ParamValue::Tensor(Arc::new(Tensor::from_f32(
                Shape::matrix(DEMO_IN, DEMO_OUT),
                &ramp,
            )?)),
        );
    }
    for (name, default) in [
        ("axis", ParamValue::Int(1)),
        ("out_dim", ParamValue::Int(DEMO_OUT as i64)),
        ("bias_term", ParamValue::Bool(false)),
    ] {
        if !store.contains(name) {
            store.insert(name, default);
        }
    }

    let registry = builtin_registry()?;
    let registration = registry.lookup("dense", device, precision)?;
    registration.declaration.validate(&store)?;

    let mut op = registry.build("dense", device, precision)?;
    op.init_param(&store)?;

    let in_width = store
        .get_tensor("dense", "weight_1")?
        .shape()
        .dims()[0];
    let in_desc = TensorDesc::plain(Shape::matrix(args.batch, in_width), DType::F32);
    let out_descs = op.infer_shape(std::slice::from_ref(&in_desc))?;
    println!("input  {in_desc}");
    println!("output {}", out_descs[0]);

    let ctx = OpContext::new(device, precision);
    op.init(&ctx, policy, std::slice::from_ref(&in_desc), &out_descs)?;
    if let Some(kind) = op.selected() {
        println!("selected implementation: {kind}");
    }

    let values: Vec<f32> = (0..args.batch * in_width)
        .map(|i| (i % 17) as f32 * 0.0625)
        .collect();
    let inputs = vec![Tensor::from_f32(Shape::matrix(args.batch, in_width), &values)?];
    let mut outputs = vec![Tensor::zeros_desc(&out_descs[0])];

    let start = Instant::now();
    op.forward(&ctx, &inputs, &mut outputs)?;
    let elapsed = start.elapsed();

    let row_width = out_descs[0].shape.dims()[1];
    println!("forward pass took {elapsed:?}");
    println!("first output row: {:?}", &outputs[0].as_f32_slice()[..row_width]);
    Ok(())
}
