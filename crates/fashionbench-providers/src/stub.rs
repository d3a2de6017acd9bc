//! Deterministic responder for tests and dry runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use fashionbench_core::error::ResponderError;
use fashionbench_core::model::{Answer, TaskKind};
use fashionbench_core::traits::{ModelInfo, RespondRequest, Responder};

type ErrorFactory = Box<dyn Fn() -> ResponderError + Send + Sync>;

enum Fallback {
    /// Reply with the example's own expected answer.
    Echo,
    Fixed(Answer),
    Fail(ErrorFactory),
}

/// A responder that answers from a script without any network access.
///
/// Scripted answers are looked up by `(task, example_id)`; anything
/// unscripted falls back to echoing the expected answer, a fixed answer,
/// or an error.
pub struct StubResponder {
    scripted: HashMap<(TaskKind, u64), Answer>,
    fallback: Fallback,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<RespondRequest>>,
}

impl StubResponder {
    fn with_fallback(fallback: Fallback) -> Self {
        Self {
            scripted: HashMap::new(),
            fallback,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// A responder that always answers with the ground truth.
    pub fn echo() -> Self {
        Self::with_fallback(Fallback::Echo)
    }

    /// A responder that always returns the same answer.
    pub fn with_fixed_answer(answer: Answer) -> Self {
        Self::with_fallback(Fallback::Fixed(answer))
    }

    /// A responder whose every unscripted call fails with `make_error()`.
    pub fn failing<F>(make_error: F) -> Self
    where
        F: Fn() -> ResponderError + Send + Sync + 'static,
    {
        Self::with_fallback(Fallback::Fail(Box::new(make_error)))
    }

    /// Script the answer for one example.
    pub fn with_answer(mut self, task: TaskKind, example_id: u64, answer: Answer) -> Self {
        self.scripted.insert((task, example_id), answer);
        self
    }

    /// Get the number of calls made to this responder.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this responder.
    pub fn last_request(&self) -> Option<RespondRequest> {
        self.last_request.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Responder for StubResponder {
    fn name(&self) -> &str {
        "stub"
    }

    async fn respond(&self, request: &RespondRequest) -> anyhow::Result<Answer> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap_or_else(|e| e.into_inner()) = Some(request.clone());

        if let Some(answer) = self.scripted.get(&(request.task, request.example.id)) {
            return Ok(answer.clone());
        }

        match &self.fallback {
            Fallback::Echo => request
                .example
                .expected
                .clone()
                .ok_or_else(|| {
                    ResponderError::MissingResponse {
                        task: request.task.to_string(),
                        example_id: request.example.id,
                    }
                    .into()
                }),
            Fallback::Fixed(answer) => Ok(answer.clone()),
            Fallback::Fail(make_error) => Err(make_error().into()),
        }
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: "stub".into(),
            name: "Stub Responder".into(),
            provider: "stub".into(),
            max_context: 0,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fashionbench_core::model::Example;

    fn request(id: u64) -> RespondRequest {
        let example = Example::new(
            id,
            "Floral maxi dress with a woven basket bag",
            Answer::from("Bohemian/Boho"),
            TaskKind::StyleClassification,
        );
        RespondRequest::new("stub", TaskKind::StyleClassification, example)
    }

    #[tokio::test]
    async fn echo_returns_expected() {
        let stub = StubResponder::echo();
        let answer = stub.respond(&request(1)).await.unwrap();
        assert_eq!(answer, Answer::from("Bohemian/Boho"));
        assert_eq!(stub.call_count(), 1);
        assert_eq!(stub.last_request().unwrap().example.id, 1);
    }

    #[tokio::test]
    async fn scripted_answers_take_priority() {
        let stub = StubResponder::with_fixed_answer(Answer::from("Grunge/Rock"))
            .with_answer(TaskKind::StyleClassification, 2, Answer::from("Coastal/Resort"));

        assert_eq!(
            stub.respond(&request(2)).await.unwrap(),
            Answer::from("Coastal/Resort")
        );
        assert_eq!(
            stub.respond(&request(3)).await.unwrap(),
            Answer::from("Grunge/Rock")
        );
        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn failing_stub_returns_typed_error() {
        let stub = StubResponder::failing(|| ResponderError::Timeout(30));
        let err = stub.respond(&request(1)).await.unwrap_err();
        let typed = err.downcast_ref::<ResponderError>().unwrap();
        assert!(matches!(typed, ResponderError::Timeout(30)));
    }
}
