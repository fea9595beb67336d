//! Handle registry for the platform-binding layer.
//!
//! The original bridge stored a raw pointer inside an opaque integer handle;
//! here a handle is an id into a map of live sessions, with ids handed out
//! monotonically and never reused, so a freed or unknown handle is detected
//! by lookup instead of pointer-validity guessing.
//!
//! Every wrapper is total: an absent id yields a defined default, and
//! internal failures are logged and mapped to the same defaults. Nothing
//! escapes this surface as a panic or error value.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

use lantern_abi::{ModelRuntime, Token};

use crate::config::{DEFAULT_CACHE_CAPACITY, SessionConfig};
use crate::error::{Result, SessionError};
use crate::session::Session;
use crate::stats::StatsSnapshot;

/// Opaque session handle. Ids start at 1; 0 never resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

pub struct SessionRegistry<R: ModelRuntime> {
    sessions: Mutex<HashMap<u64, Arc<Session<R>>>>,
    next_id: AtomicU64,
}

impl<R: ModelRuntime> Default for SessionRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ModelRuntime> SessionRegistry<R> {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Validate `config`, create the runtime, and register the session.
    pub fn create<P: AsRef<Path>>(&self, model_path: P, config: &SessionConfig) -> Result<SessionId> {
        let session = Session::load(model_path, config)?;
        Ok(self.adopt(session))
    }

    /// JSON entry point for binding layers that pass config as a string.
    pub fn create_from_json<P: AsRef<Path>>(&self, model_path: P, config_json: &str) -> Result<SessionId> {
        let config: SessionConfig = serde_json::from_str(config_json)
            .map_err(|e| SessionError::Configuration(format!("bad session config JSON: {e}")))?;
        self.create(model_path, &config)
    }

    /// Register an externally-constructed session and hand back its id.
    pub fn adopt(&self, session: Session<R>) -> SessionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.sessions.lock().unwrap().insert(id, Arc::new(session));
        log::debug!("session {id} registered");
        SessionId(id)
    }

    /// Drop the session for `id`. Safe to call twice; returns whether a live
    /// session was actually removed. A call still running on another thread
    /// keeps the session alive through its own `Arc` until it returns.
    pub fn free(&self, id: SessionId) -> bool {
        let removed = self.sessions.lock().unwrap().remove(&id.0).is_some();
        if removed {
            log::debug!("session {} freed", id.0);
        }
        removed
    }

    pub fn live_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    fn get(&self, id: SessionId) -> Option<Arc<Session<R>>> {
        self.sessions.lock().unwrap().get(&id.0).cloned()
    }

    // ---- total wrappers, one per public session operation ----

    /// Full text turn: mark a boundary, tokenize the prompt, run the loop,
    /// detokenize prompt + completion. The explicit boundary plus the one
    /// the loop records mean the boundary is marked twice per turn; callers
    /// rely on duplicates being preserved.
    ///
    /// Not atomic: each stage takes the session lock on its own, so calls
    /// from other threads can interleave between stages. Only the individual
    /// session operations are serialized, not the composite turn.
    pub fn generate(
        &self,
        id: SessionId,
        prompt: &str,
        max_steps: usize,
        temperature: f32,
        sparse_attention: Option<bool>,
    ) -> String {
        let Some(session) = self.get(id) else {
            return String::new();
        };
        session.mark_boundary();

        let turn = session.tokenize(prompt).and_then(|mut tokens| {
            let generated =
                session.generate(&tokens, max_steps, temperature, sparse_attention)?;
            tokens.extend_from_slice(&generated);
            session.detokenize(&tokens)
        });
        match turn {
            Ok(text) => text,
            Err(e) => {
                log::warn!("generate on session {} failed: {e}", id.0);
                String::new()
            }
        }
    }

    pub fn tokenize(&self, id: SessionId, text: &str) -> Vec<Token> {
        self.get(id)
            .and_then(|s| match s.tokenize(text) {
                Ok(tokens) => Some(tokens),
                Err(e) => {
                    log::warn!("tokenize on session {} failed: {e}", id.0);
                    None
                }
            })
            .unwrap_or_default()
    }

    pub fn detokenize(&self, id: SessionId, tokens: &[Token]) -> String {
        self.get(id)
            .and_then(|s| match s.detokenize(tokens) {
                Ok(text) => Some(text),
                Err(e) => {
                    log::warn!("detokenize on session {} failed: {e}", id.0);
                    None
                }
            })
            .unwrap_or_default()
    }

    pub fn embed(&self, id: SessionId, text: &str) -> Vec<f32> {
        self.get(id)
            .and_then(|s| match s.embed(text) {
                Ok(embedding) => Some(embedding),
                Err(e) => {
                    log::warn!("embed on session {} failed: {e}", id.0);
                    None
                }
            })
            .unwrap_or_default()
    }

    pub fn clear_cache(&self, id: SessionId) {
        if let Some(session) = self.get(id) {
            session.clear_cache();
        }
    }

    pub fn mark_boundary(&self, id: SessionId) {
        if let Some(session) = self.get(id) {
            session.mark_boundary();
        }
    }

    pub fn cache_size(&self, id: SessionId) -> usize {
        self.get(id).map(|s| s.cache_size()).unwrap_or(0)
    }

    pub fn cache_capacity(&self, id: SessionId) -> usize {
        self.get(id)
            .map(|s| s.cache_capacity())
            .unwrap_or(DEFAULT_CACHE_CAPACITY)
    }

    pub fn adjust_capacity(&self, id: SessionId, new_size: usize) {
        if let Some(session) = self.get(id) {
            session.adjust_capacity(new_size);
        }
    }

    pub fn set_sparse_attention(&self, id: SessionId, enabled: bool) {
        if let Some(session) = self.get(id) {
            session.set_sparse_attention(enabled);
        }
    }

    pub fn set_performance_mode(&self, id: SessionId, mode: &str) {
        if let Some(session) = self.get(id) {
            session.set_performance_mode(mode);
        }
    }

    pub fn performance_stats(&self, id: SessionId) -> StatsSnapshot {
        self.get(id).map(|s| s.stats()).unwrap_or_default()
    }

    /// Stats serialized for bridges that want a string payload.
    pub fn performance_stats_json(&self, id: SessionId) -> String {
        serde_json::to_string(&self.performance_stats(id)).unwrap_or_else(|_| "{}".to_string())
    }
}
