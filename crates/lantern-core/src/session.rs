//! One logical inference session: the runtime handle, the token cache, and
//! the telemetry counters behind a single coarse lock.
//!
//! Every public operation acquires the lock exactly once and works on the
//! held state directly; internal helpers never call back into the public
//! wrappers, so nested acquisition cannot happen. `tokenize`/`detokenize`
//! don't touch the cache but still serialize with everything else because
//! all operations share the one model handle.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use lantern_abi::{ModelRuntime, Token};

use crate::buffer::TokenBuffer;
use crate::config::{
    COMPACT_EMBEDDING_WIDTH, DEFAULT_CACHE_CAPACITY, PerformanceMode, STANDARD_EMBEDDING_WIDTH,
    SessionConfig,
};
use crate::engine::{self, GenerateRequest};
use crate::error::{Result, SessionError};
use crate::eviction::evict;
use crate::stats::{SessionStats, StatsSnapshot};

struct SessionInner<R> {
    runtime: R,
    buffer: TokenBuffer,
    stats: SessionStats,
    /// Trim cap for the token cache (not the runtime's context window).
    capacity: usize,
    /// Session-level default for calls that don't pass the flag explicitly.
    sparse_attention: bool,
    threads: usize,
    quantized: bool,
}

pub struct Session<R: ModelRuntime> {
    inner: Mutex<SessionInner<R>>,
}

impl<R: ModelRuntime> Session<R> {
    /// Validate the config, then create the runtime's model/context pair.
    /// A failure here leaves no live session; anything the runtime already
    /// acquired is released by ownership on the error path.
    pub fn load<P: AsRef<Path>>(model_path: P, config: &SessionConfig) -> Result<Self> {
        let path = model_path.as_ref();
        let quantized = config.classify(path);
        config.validate(quantized)?;

        let runtime =
            R::load(path, &config.runtime_config(quantized)).map_err(SessionError::Resource)?;
        log::debug!(
            "session loaded from {} (quantized={quantized})",
            path.display()
        );
        Ok(Self::assemble(runtime, config, quantized))
    }

    /// Wrap an already-constructed runtime (e.g. one served from a preload
    /// cache). The config is still validated; the compact classification
    /// comes from `config.is_quantized` since there is no path to inspect.
    pub fn with_runtime(runtime: R, config: &SessionConfig) -> Result<Self> {
        let quantized = config.is_quantized.unwrap_or(false);
        config.validate(quantized)?;
        Ok(Self::assemble(runtime, config, quantized))
    }

    fn assemble(runtime: R, config: &SessionConfig, quantized: bool) -> Self {
        let sparse_attention = config.runtime_config(quantized).sparse_attention;
        Self {
            inner: Mutex::new(SessionInner {
                runtime,
                buffer: TokenBuffer::new(),
                stats: SessionStats::new(),
                capacity: DEFAULT_CACHE_CAPACITY,
                sparse_attention,
                threads: config.thread_count,
                quantized,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner<R>> {
        self.inner.lock().unwrap()
    }

    pub fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        let inner = self.lock();
        inner.runtime.tokenize(text).map_err(SessionError::Runtime)
    }

    /// Concatenate the per-token fragments for `tokens`.
    pub fn detokenize(&self, tokens: &[Token]) -> Result<String> {
        let inner = self.lock();
        let mut text = String::new();
        for &token in tokens {
            text.push_str(
                &inner
                    .runtime
                    .detokenize(token)
                    .map_err(SessionError::Runtime)?,
            );
        }
        Ok(text)
    }

    /// Run the generation loop over `input`. `sparse_attention: None` takes
    /// the session default; an explicit value is pinned for the whole call
    /// even if the default is toggled concurrently.
    ///
    /// Telemetry is recorded only when the full call succeeds; on failure the
    /// partially-mutated cache stands as-is (no rollback).
    pub fn generate(
        &self,
        input: &[Token],
        max_steps: usize,
        temperature: f32,
        sparse_attention: Option<bool>,
    ) -> Result<Vec<Token>> {
        let mut inner = self.lock();
        let started = Instant::now();

        let request = GenerateRequest {
            max_steps,
            temperature,
            sparse_attention: sparse_attention.unwrap_or(inner.sparse_attention),
        };

        // Split the borrow so the loop can mutate runtime and buffer together.
        let state = &mut *inner;
        let generated = engine::run(
            &mut state.runtime,
            &mut state.buffer,
            state.capacity,
            state.threads,
            input,
            request,
        )?;

        inner.stats.record(started.elapsed());
        Ok(generated)
    }

    /// Embed `text`. Empty tokenization yields a deterministic zero vector
    /// whose width depends only on the model classification, not on any
    /// capacity setting.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let inner = self.lock();
        let tokens = inner.runtime.tokenize(text).map_err(SessionError::Runtime)?;
        if tokens.is_empty() {
            let width = if inner.quantized {
                COMPACT_EMBEDDING_WIDTH
            } else {
                STANDARD_EMBEDDING_WIDTH
            };
            return Ok(vec![0.0; width]);
        }

        let width = inner.runtime.embedding_width();
        let mut embedding = inner.runtime.embedding().map_err(SessionError::Runtime)?;
        embedding.resize(width, 0.0);
        Ok(embedding)
    }

    /// Empty the token cache and its boundaries. Telemetry is kept.
    pub fn clear_cache(&self) {
        self.lock().buffer.clear();
    }

    pub fn mark_boundary(&self) {
        self.lock().buffer.mark_boundary();
    }

    pub fn cache_size(&self) -> usize {
        self.lock().buffer.len()
    }

    pub fn cache_capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn boundary_count(&self) -> usize {
        self.lock().buffer.boundary_count()
    }

    /// Set the trim cap and enforce it immediately. Raising the cap never
    /// backfills evicted tokens.
    pub fn adjust_capacity(&self, new_size: usize) {
        let mut inner = self.lock();
        inner.capacity = new_size;
        let state = &mut *inner;
        evict(&mut state.buffer, state.capacity);
    }

    /// Toggle the session default; in-flight calls keep the value they
    /// resolved at entry.
    pub fn set_sparse_attention(&self, enabled: bool) {
        self.lock().sparse_attention = enabled;
    }

    /// Apply a coarse preset; unrecognized names are a silent no-op.
    pub fn set_performance_mode(&self, mode: &str) {
        let Some(mode) = PerformanceMode::parse(mode) else {
            log::debug!("ignoring unknown performance mode {mode:?}");
            return;
        };
        let mut inner = self.lock();
        inner.capacity = mode.cache_capacity();
        inner.sparse_attention = mode.sparse_attention();
        let state = &mut *inner;
        evict(&mut state.buffer, state.capacity);
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.lock().stats.snapshot()
    }
}
