use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::token::Token;

/// Which attention path the sampler should take for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplingMode {
    /// Full attention over the cached context.
    Dense,
    /// Cheaper sparse-attention path (selectable per call or by session default).
    Sparse,
}

/// Knobs handed to the runtime when the model/context pair is created.
/// The session core fills these from its own configuration; runtimes may
/// ignore fields they cannot honor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Context window the runtime should allocate (n_ctx).
    pub context_capacity: usize,

    /// Threads for evaluation batches.
    pub thread_count: usize,

    /// Layers to offload to the accelerator.
    pub gpu_layer_count: u32,

    /// Start with the sparse-attention evaluation path enabled.
    pub sparse_attention: bool,
}

/// Runtime-agnostic interface for model evaluation engines.
///
/// Errors cross this seam as plain strings; the session core converts them
/// into its own taxonomy at the call site. Resource release is `Drop`.
pub trait ModelRuntime {
    fn load<P: AsRef<Path>>(model_path: P, config: &RuntimeConfig) -> Result<Self, String>
    where
        Self: Sized;

    /// Evaluate `tokens` starting at `position` in the runtime's own cache.
    /// Caller is responsible for correct position bookkeeping.
    fn evaluate(
        &mut self,
        tokens: &[Token],
        position: usize,
        threads: usize,
    ) -> Result<(), String>;

    /// Sample one token from the logits of the last evaluation.
    fn sample(&mut self, temperature: f32, mode: SamplingMode) -> Result<Token, String>;

    fn tokenize(&self, text: &str) -> Result<Vec<Token>, String>;

    /// Decode a single token ID into a UTF-8 fragment.
    fn detokenize(&self, token: Token) -> Result<String, String>;

    /// Embedding vector for the most recently evaluated context.
    fn embedding(&self) -> Result<Vec<f32>, String>;

    /// Model's end-of-sequence sentinel.
    fn eos_token(&self) -> Token;

    /// Hidden size of the embedding output.
    fn embedding_width(&self) -> usize;
}
