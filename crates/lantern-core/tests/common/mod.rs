//! Scripted model runtime for exercising the session core without a model.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex};

use lantern_abi::{ModelRuntime, RuntimeConfig, SamplingMode, Token};
use lantern_core::SessionConfig;

/// Sentinel the mock treats as end-of-sequence.
pub const EOS: Token = Token(-1);

pub const MOCK_EMBEDDING_WIDTH: usize = 8;

/// Everything the mock observed, shared with the test body.
#[derive(Default, Debug)]
pub struct Trace {
    /// One entry per evaluate call: (token count, position).
    pub evaluates: Vec<(usize, usize)>,
    pub sample_calls: usize,
    pub sparse_samples: usize,
}

pub struct MockRuntime {
    script: VecDeque<Token>,
    trace: Arc<Mutex<Trace>>,
    gate: Option<Arc<EvalGate>>,
    fail_evaluate_after: Option<usize>,
}

impl MockRuntime {
    /// Emits `script` from successive sample calls, then EOS forever.
    pub fn scripted(script: &[i32]) -> Self {
        Self {
            script: script.iter().copied().map(Token).collect(),
            trace: Arc::new(Mutex::new(Trace::default())),
            gate: None,
            fail_evaluate_after: None,
        }
    }

    /// Clone the trace handle before the runtime moves into a session.
    pub fn trace(&self) -> Arc<Mutex<Trace>> {
        self.trace.clone()
    }

    /// Stall every evaluate call on `gate` until the test opens it.
    pub fn with_gate(mut self, gate: Arc<EvalGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Fail the first evaluate call after `count` successful ones.
    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_evaluate_after = Some(count);
        self
    }
}

impl ModelRuntime for MockRuntime {
    fn load<P: AsRef<Path>>(model_path: P, _config: &RuntimeConfig) -> Result<Self, String> {
        let path = model_path.as_ref().to_string_lossy().into_owned();
        if path.contains("missing") {
            return Err(format!("no such model: {path}"));
        }
        Ok(Self::scripted(&[]))
    }

    fn evaluate(
        &mut self,
        tokens: &[Token],
        position: usize,
        _threads: usize,
    ) -> Result<(), String> {
        if let Some(gate) = &self.gate {
            gate.pass();
        }
        let mut trace = self.trace.lock().unwrap();
        if let Some(limit) = self.fail_evaluate_after {
            if trace.evaluates.len() >= limit {
                return Err("scripted evaluate failure".to_string());
            }
        }
        trace.evaluates.push((tokens.len(), position));
        Ok(())
    }

    fn sample(&mut self, _temperature: f32, mode: SamplingMode) -> Result<Token, String> {
        let mut trace = self.trace.lock().unwrap();
        trace.sample_calls += 1;
        if mode == SamplingMode::Sparse {
            trace.sparse_samples += 1;
        }
        drop(trace);
        Ok(self.script.pop_front().unwrap_or(EOS))
    }

    fn tokenize(&self, text: &str) -> Result<Vec<Token>, String> {
        Ok(text.bytes().map(|b| Token(b as i32)).collect())
    }

    fn detokenize(&self, token: Token) -> Result<String, String> {
        match u8::try_from(token.0) {
            Ok(byte) => Ok((byte as char).to_string()),
            Err(_) => Ok(format!("[{}]", token.0)),
        }
    }

    fn embedding(&self) -> Result<Vec<f32>, String> {
        Ok(vec![1.0; MOCK_EMBEDDING_WIDTH])
    }

    fn eos_token(&self) -> Token {
        EOS
    }

    fn embedding_width(&self) -> usize {
        MOCK_EMBEDDING_WIDTH
    }
}

/// Config accepted on any test machine (single thread, standard model).
pub fn test_config() -> SessionConfig {
    SessionConfig {
        context_capacity: 1024,
        thread_count: 1,
        is_quantized: Some(false),
    }
}

/// Two-phase latch: evaluate announces it entered, then blocks until the
/// test opens the gate. Lets tests hold a generation mid-flight.
#[derive(Default)]
pub struct EvalGate {
    entered: Mutex<bool>,
    entered_cv: Condvar,
    release: Mutex<bool>,
    release_cv: Condvar,
}

impl EvalGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Called by the mock from inside evaluate.
    pub fn pass(&self) {
        {
            let mut entered = self.entered.lock().unwrap();
            *entered = true;
            self.entered_cv.notify_all();
        }
        let mut released = self.release.lock().unwrap();
        while !*released {
            released = self.release_cv.wait(released).unwrap();
        }
    }

    /// Block until evaluate is holding the session lock.
    pub fn wait_entered(&self) {
        let mut entered = self.entered.lock().unwrap();
        while !*entered {
            entered = self.entered_cv.wait(entered).unwrap();
        }
    }

    /// Let all present and future evaluate calls through.
    pub fn open(&self) {
        let mut released = self.release.lock().unwrap();
        *released = true;
        self.release_cv.notify_all();
    }
}
