//! Session creation config, model-variant classification, and the coarse
//! performance-mode presets.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SessionError};
use lantern_abi::RuntimeConfig;

/// Trim cap for the token cache on a fresh session.
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Context-window ceilings per model classification. Compact (quantized)
/// variants leave enough headroom for a larger window.
const COMPACT_CONTEXT_CEILING: usize = 8192;
const STANDARD_CONTEXT_CEILING: usize = 4096;

/// Above this window, compact variants switch sparse attention on by default.
const SPARSE_CONTEXT_THRESHOLD: usize = 4096;

const COMPACT_GPU_LAYERS: u32 = 99;
const STANDARD_GPU_LAYERS: u32 = 35;

/// Zero-vector widths for `embed` on empty input.
pub(crate) const COMPACT_EMBEDDING_WIDTH: usize = 384;
pub(crate) const STANDARD_EMBEDDING_WIDTH: usize = 512;

/// Filename markers of quantized model exports.
const QUANT_PATTERNS: [&str; 12] = [
    "Q4_0", "Q5_0", "Q2_K", "Q3_K_S", "Q3_K_M", "Q3_K_L", "Q4_K_S", "Q4_K_M", "Q5_K_S", "Q5_K_M",
    "Q6_K", "MobileQuant",
];

static HARDWARE_THREADS: Lazy<usize> = Lazy::new(|| num_cpus::get().max(1));

/// Whether `model_path` looks like a quantized (compact) export.
pub fn is_quantized_model_path<P: AsRef<Path>>(model_path: P) -> bool {
    let text = model_path.as_ref().to_string_lossy();
    QUANT_PATTERNS.iter().any(|p| text.contains(p))
}

/// Caller-supplied knobs for session creation. Everything is validated
/// before any runtime resource is touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Context window requested from the runtime (n_ctx).
    pub context_capacity: usize,

    /// Evaluation threads; bounded by available hardware parallelism.
    pub thread_count: usize,

    /// Force the compact/quantized classification instead of inferring it
    /// from the model path.
    pub is_quantized: Option<bool>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            context_capacity: 2048,
            // Clamped so the default stays valid on narrow hardware.
            thread_count: (*HARDWARE_THREADS).min(4),
            is_quantized: None,
        }
    }
}

impl SessionConfig {
    /// Resolve the compact classification for `model_path`.
    pub fn classify<P: AsRef<Path>>(&self, model_path: P) -> bool {
        self.is_quantized
            .unwrap_or_else(|| is_quantized_model_path(model_path))
    }

    /// Reject out-of-range knobs. Runs before any resource allocation.
    pub fn validate(&self, quantized: bool) -> Result<()> {
        let ceiling = if quantized {
            COMPACT_CONTEXT_CEILING
        } else {
            STANDARD_CONTEXT_CEILING
        };
        if self.context_capacity == 0 || self.context_capacity > ceiling {
            return Err(SessionError::Configuration(format!(
                "context capacity {} out of range (1..={ceiling})",
                self.context_capacity
            )));
        }

        let hw = *HARDWARE_THREADS;
        if self.thread_count == 0 || self.thread_count > hw {
            return Err(SessionError::Configuration(format!(
                "thread count {} out of range (1..={hw})",
                self.thread_count
            )));
        }
        Ok(())
    }

    /// Runtime-facing knobs derived from this config.
    pub fn runtime_config(&self, quantized: bool) -> RuntimeConfig {
        RuntimeConfig {
            context_capacity: self.context_capacity,
            thread_count: self.thread_count,
            gpu_layer_count: if quantized {
                COMPACT_GPU_LAYERS
            } else {
                STANDARD_GPU_LAYERS
            },
            sparse_attention: quantized && self.context_capacity > SPARSE_CONTEXT_THRESHOLD,
        }
    }
}

/// Coarse presets: sugar over `adjust_capacity` + `set_sparse_attention`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceMode {
    LowMemory,
    PowerSaving,
    Performance,
}

impl PerformanceMode {
    /// Unrecognized names are reported as `None`; callers treat that as a
    /// silent no-op.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "low-memory" => Some(Self::LowMemory),
            "power-saving" => Some(Self::PowerSaving),
            "performance" => Some(Self::Performance),
            _ => None,
        }
    }

    pub fn cache_capacity(self) -> usize {
        match self {
            Self::LowMemory => 256,
            Self::PowerSaving => 512,
            Self::Performance => 1024,
        }
    }

    pub fn sparse_attention(self) -> bool {
        matches!(self, Self::LowMemory)
    }
}
