// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Device and precision tags, and the per-invocation compute context.

/// The device class an operator implementation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    /// Discrete or integrated GPU.
    Gpu,
    /// Host CPU.
    Cpu,
    /// Embedded / edge accelerator class.
    Edge,
}

impl Device {
    /// Parses a device tag from a loose string.
    ///
    /// Accepts common aliases (`"cuda"`, `"x86"`, `"arm"`).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gpu" | "cuda" | "nv" => Some(Self::Gpu),
            "cpu" | "x86" | "host" => Some(Self::Cpu),
            "edge" | "arm" | "embedded" => Some(Self::Edge),
            _ => None,
        }
    }

    /// Returns a human-readable label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gpu => "gpu",
            Self::Cpu => "cpu",
            Self::Edge => "edge",
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The numeric precision contract an operator is registered under.
///
/// Distinct from [`tensor_core::DType`]: precision describes the
/// arithmetic the kernel performs, dtype describes element storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    /// Full 32-bit floating point.
    Fp32,
    /// Half-precision floating point.
    Fp16,
    /// 8-bit integer (quantised).
    Int8,
}

impl Precision {
    /// Parses a precision tag from a loose string.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fp32" | "f32" | "float" => Some(Self::Fp32),
            "fp16" | "f16" | "half" => Some(Self::Fp16),
            "int8" | "i8" => Some(Self::Int8),
            _ => None,
        }
    }

    /// Returns a human-readable label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fp32 => "fp32",
            Self::Fp16 => "fp16",
            Self::Int8 => "int8",
        }
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The compute context a forward pass executes against.
///
/// Carries device/stream identity only; the framework never inspects
/// the stream beyond passing it through to the selected implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpContext {
    /// Target device.
    pub device: Device,
    /// Numeric precision contract.
    pub precision: Precision,
    /// Execution stream identifier on the target device.
    pub stream_id: usize,
}

impl OpContext {
    /// Creates a context on stream 0.
    pub fn new(device: Device, precision: Precision) -> Self {
        Self {
            device,
            precision,
            stream_id: 0,
        }
    }

    /// Returns the same context bound to a different stream.
    pub fn with_stream(self, stream_id: usize) -> Self {
        Self { stream_id, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_from_str() {
        assert_eq!(Device::from_str_loose("cuda"), Some(Device::Gpu));
        assert_eq!(Device::from_str_loose("X86"), Some(Device::Cpu));
        assert_eq!(Device::from_str_loose("arm"), Some(Device::Edge));
        assert_eq!(Device::from_str_loose("tpu"), None);
    }

    #[test]
    fn test_precision_from_str() {
        assert_eq!(Precision::from_str_loose("FP32"), Some(Precision::Fp32));
        assert_eq!(Precision::from_str_loose("half"), Some(Precision::Fp16));
        assert_eq!(Precision::from_str_loose("i8"), Some(Precision::Int8));
        assert_eq!(Precision::from_str_loose("fp64"), None);
    }

    #[test]
    fn test_context_stream() {
        let ctx = OpContext::new(Device::Cpu, Precision::Fp32).with_stream(3);
        assert_eq!(ctx.stream_id, 3);
        assert_eq!(ctx.device, Device::Cpu);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Device::Gpu), "gpu");
        assert_eq!(format!("{}", Precision::Int8), "int8");
    }
}
