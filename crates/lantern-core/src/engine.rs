//! Incremental generation loop: one prefill pass over the whole cached
//! context, then single-token evaluate/sample steps with eviction run
//! between every mutation of the cache.

use lantern_abi::{ModelRuntime, SamplingMode, Token};

use crate::buffer::TokenBuffer;
use crate::error::{Result, SessionError};
use crate::eviction::evict;

/// Per-call knobs for one generation run.
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest {
    /// Upper bound on sampled tokens; 0 still performs the prefill pass.
    pub max_steps: usize,
    pub temperature: f32,
    pub sparse_attention: bool,
}

/// Drive the loop against an already-locked session's state.
///
/// Steps: mark the turn boundary, append the input, evict, prefill over the
/// entire surviving buffer (eviction may have shifted the effective context
/// since the last call), then sample/append/evict/evaluate one token at a
/// time until EOS or `max_steps`.
///
/// There is no rollback: a runtime failure propagates immediately and leaves
/// whatever was already appended in place. Best-effort, not atomic.
pub(crate) fn run<R: ModelRuntime>(
    runtime: &mut R,
    buffer: &mut TokenBuffer,
    capacity: usize,
    threads: usize,
    input: &[Token],
    request: GenerateRequest,
) -> Result<Vec<Token>> {
    buffer.mark_boundary();
    buffer.append(input);
    evict(buffer, capacity);

    if !buffer.is_empty() {
        log::debug!("[generate] prefill over {} cached tokens", buffer.len());
        runtime
            .evaluate(buffer.tokens(), 0, threads)
            .map_err(SessionError::Runtime)?;
    }

    let eos = runtime.eos_token();
    let mode = if request.sparse_attention {
        SamplingMode::Sparse
    } else {
        SamplingMode::Dense
    };

    let mut generated = Vec::with_capacity(request.max_steps.min(4096));
    for step in 0..request.max_steps {
        let token = runtime
            .sample(request.temperature, mode)
            .map_err(SessionError::Runtime)?;

        if token == eos {
            log::debug!("[generate] eos after {step} steps");
            break;
        }

        generated.push(token);
        buffer.push(token);
        evict(buffer, capacity);

        // Incremental evaluation at the buffer's new tail position.
        runtime
            .evaluate(&[token], buffer.len().saturating_sub(1), threads)
            .map_err(SessionError::Runtime)?;
    }

    log::debug!(
        "[generate] done: {} tokens, cache at {}/{capacity}",
        generated.len(),
        buffer.len()
    );
    Ok(generated)
}
