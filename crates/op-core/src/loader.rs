// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Parameter-store population from model files.
//!
//! [`ParamLoader`] provides two modes:
//!
//! 1. **File-backed** — opens `params.safetensors` via mmap and turns
//!    every tensor in it into a [`ParamValue::Tensor`] entry; scalar
//!    configuration arguments come from an `args.toml` sidecar.
//! 2. **Synthetic** — zero-filled tensors for testing and benchmarking
//!    without requiring actual model files.

use crate::{OpError, ParamStore, ParamValue};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tensor_core::{DType, Shape, Tensor, TensorDesc};

/// Default SafeTensors filename.
const PARAMS_FILE: &str = "params.safetensors";
/// Default scalar-argument manifest filename.
const ARGS_FILE: &str = "args.toml";

/// Populates a [`ParamStore`] from a model directory.
///
/// Uses `memmap2` for zero-copy access to the SafeTensors file. The
/// loader is the collaborator that fills the store *before* operator
/// construction; operators themselves only ever read it.
pub struct ParamLoader {
    /// Model directory containing the parameter files.
    model_dir: PathBuf,
    /// Memory-mapped SafeTensors file (opened once, reused).
    mmap: Option<memmap2::Mmap>,
}

impl ParamLoader {
    /// Creates a loader for the given model directory.
    ///
    /// If the SafeTensors file exists it is memory-mapped immediately;
    /// otherwise the loader operates in synthetic mode.
    pub fn new(model_dir: PathBuf) -> Result<Self, OpError> {
        let params_path = model_dir.join(PARAMS_FILE);

        let mmap = if params_path.exists() {
            let file = std::fs::File::open(&params_path).map_err(|e| OpError::ParamLoad {
                entry: params_path.display().to_string(),
                detail: format!("cannot open: {e}"),
            })?;
            let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| OpError::ParamLoad {
                entry: params_path.display().to_string(),
                detail: format!("mmap failed: {e}"),
            })?;
            tracing::info!(
                "param loader: mmap'd {} ({:.2} MB)",
                params_path.display(),
                mmap.len() as f64 / (1024.0 * 1024.0),
            );
            Some(mmap)
        } else {
            tracing::warn!(
                "param loader: '{}' not found, using synthetic mode",
                params_path.display(),
            );
            None
        };

        Ok(Self { model_dir, mmap })
    }

    /// Creates a loader in synthetic mode (no files needed).
    pub fn synthetic() -> Self {
        Self {
            model_dir: PathBuf::from("<synthetic>"),
            mmap: None,
        }
    }

    /// Returns `true` if operating in file-backed mode.
    pub fn is_file_backed(&self) -> bool {
        self.mmap.is_some()
    }

    /// Returns the model directory path.
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Loads every available entry into a fresh store.
    ///
    /// Scalar arguments are read from `args.toml` when present; tensors
    /// from the SafeTensors file when file-backed. In synthetic mode the
    /// result carries scalars only.
    pub fn load(&self) -> Result<ParamStore, OpError> {
        let mut store = ParamStore::new();
        self.load_args(&mut store)?;
        if let Some(mmap) = &self.mmap {
            self.load_tensors(&mut store, mmap)?;
        }
        Ok(store)
    }

    /// Like [`load`](Self::load), but in synthetic mode also inserts a
    /// zero-filled tensor for each `(name, shape)` spec, so lifecycles
    /// can be exercised without model files.
    pub fn load_with_synthetic(&self, specs: &[(&str, Shape)]) -> Result<ParamStore, OpError> {
        let mut store = self.load()?;
        if self.mmap.is_none() {
            for (name, shape) in specs {
                store.insert(
                    *name,
                    ParamValue::Tensor(Arc::new(Tensor::zeros(shape.clone(), DType::F32))),
                );
            }
        }
        Ok(store)
    }

    // ── Private helpers ────────────────────────────────────────

    /// Reads scalar arguments from the TOML manifest, if present.
    fn load_args(&self, store: &mut ParamStore) -> Result<(), OpError> {
        let args_path = self.model_dir.join(ARGS_FILE);
        if !args_path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(&args_path).map_err(|e| OpError::ParamLoad {
            entry: args_path.display().to_string(),
            detail: format!("cannot read: {e}"),
        })?;
        let table: toml::Table = content.parse().map_err(|e| OpError::ParamLoad {
            entry: args_path.display().to_string(),
            detail: format!("TOML parse error: {e}"),
        })?;

        for (name, value) in table {
            let param = match value {
                toml::Value::Integer(v) => ParamValue::Int(v),
                toml::Value::Float(v) => ParamValue::Float(v),
                toml::Value::Boolean(v) => ParamValue::Bool(v),
                toml::Value::String(v) => ParamValue::Str(v),
                other => {
                    return Err(OpError::ParamLoad {
                        entry: name,
                        detail: format!("unsupported TOML value type: {}", other.type_str()),
                    })
                }
            };
            store.insert(name, param);
        }
        Ok(())
    }

    /// Reads every tensor from the mmap'd SafeTensors file.
    fn load_tensors(&self, store: &mut ParamStore, mmap: &memmap2::Mmap) -> Result<(), OpError> {
        let st = safetensors::SafeTensors::deserialize(mmap).map_err(|e| OpError::ParamLoad {
            entry: PARAMS_FILE.into(),
            detail: format!("SafeTensors parse error: {e}"),
        })?;

        for (name, view) in st.tensors() {
            if view.dtype() != safetensors::Dtype::F32 {
                return Err(OpError::ParamLoad {
                    entry: name,
                    detail: format!("unsupported dtype {:?} (only F32)", view.dtype()),
                });
            }
            let shape = Shape::new(view.shape().to_vec());
            let desc = TensorDesc::plain(shape, DType::F32);
            let tensor =
                Tensor::from_bytes(desc, view.data().to_vec()).map_err(|e| OpError::ParamLoad {
                    entry: name.clone(),
                    detail: format!("buffer mismatch: {e}"),
                })?;
            store.insert(name, ParamValue::Tensor(Arc::new(tensor)));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ParamLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamLoader")
            .field("model_dir", &self.model_dir)
            .field("file_backed", &self.is_file_backed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_mode() {
        let loader = ParamLoader::synthetic();
        assert!(!loader.is_file_backed());

        let store = loader
            .load_with_synthetic(&[("weight_1", Shape::matrix(8, 4))])
            .unwrap();
        let w = store.get_tensor("test", "weight_1").unwrap();
        assert_eq!(w.shape(), &Shape::matrix(8, 4));
        assert!(w.as_f32_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_new_missing_dir_falls_back() {
        let dir = std::env::temp_dir().join("opkit_test_no_model");
        std::fs::create_dir_all(&dir).ok();
        let loader = ParamLoader::new(dir).unwrap();
        assert!(!loader.is_file_backed());
        assert!(loader.load().unwrap().is_empty());
    }

    #[test]
    fn test_args_toml_scalars() {
        let dir = std::env::temp_dir().join("opkit_test_args");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(ARGS_FILE),
            "axis = 1\nout_dim = 4\nbias_term = false\nmode = \"same\"\n",
        )
        .unwrap();

        let loader = ParamLoader::new(dir).unwrap();
        let store = loader.load().unwrap();
        assert_eq!(store.get_int("t", "axis").unwrap(), 1);
        assert_eq!(store.get_int("t", "out_dim").unwrap(), 4);
        assert!(!store.get_bool("t", "bias_term").unwrap());
        assert_eq!(store.get_str("t", "mode").unwrap(), "same");
    }
}
