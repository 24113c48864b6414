//! Scripted agent doubles and polling helpers shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};
use uuid::Uuid;

use chatakon_agentic::models::answer::VerifierReply;
use chatakon_agentic::models::job::{JobSnapshot, JobStatus};
use chatakon_agentic::services::agents::{
    AgentError, Agents, Orchestrator, Reformulator, Verifier,
};
use chatakon_agentic::services::messages::MessageService;
use chatakon_agentic::services::pipeline::GenerationPipeline;

pub const FALLBACK: &str = "Merci de contacter la scolarité à scolarite@esilv.com.";

/// Messages containing this marker make the orchestrator fail.
pub const FAIL_MARKER: &str = "[fail]";

/// Messages containing this marker make the orchestrator panic.
pub const PANIC_MARKER: &str = "[panic]";

/// Returns "cleaned: <message> #<n>", counting calls.
#[derive(Default)]
pub struct CleaningReformulator {
    pub calls: AtomicU32,
}

#[async_trait]
impl Reformulator for CleaningReformulator {
    async fn reformulate(&self, original_message: &str) -> Result<String, AgentError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("cleaned: {original_message} #{n}"))
    }
}

/// Drafts an answer, optionally waiting for a permit first so tests can hold
/// a job in `processing`.
pub struct DraftOrchestrator {
    gate: Option<Arc<Semaphore>>,
}

impl DraftOrchestrator {
    pub fn open() -> Self {
        Self { gate: None }
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self { gate: Some(gate) }
    }
}

#[async_trait]
impl Orchestrator for DraftOrchestrator {
    async fn answer(
        &self,
        original_message: &str,
        reformulated_query: &str,
    ) -> Result<String, AgentError> {
        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| AgentError::Other(e.to_string()))?;
            permit.forget();
        }
        if original_message.contains(PANIC_MARKER) {
            panic!("documentalist crashed");
        }
        if original_message.contains(FAIL_MARKER) {
            return Err(AgentError::Other("documentalist unreachable".to_string()));
        }
        Ok(format!("draft for {reformulated_query}"))
    }
}

/// Pops scripted replies in order, approving once the script runs out.
#[derive(Default)]
pub struct ScriptedVerifier {
    replies: Mutex<VecDeque<Result<VerifierReply, AgentError>>>,
    pub calls: AtomicU32,
}

impl ScriptedVerifier {
    pub fn new(replies: Vec<Result<VerifierReply, AgentError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Verifier for ScriptedVerifier {
    async fn verify(
        &self,
        _original_message: &str,
        _reformulated_query: &str,
        _candidate_answer: &str,
    ) -> Result<VerifierReply, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(VerifierReply::approved(None, None)))
    }
}

pub fn agents(orchestrator: DraftOrchestrator, verifier: Arc<ScriptedVerifier>) -> Agents {
    Agents::new(
        Arc::new(CleaningReformulator::default()),
        Arc::new(orchestrator),
        verifier,
    )
}

pub fn service(orchestrator: DraftOrchestrator, verifier: Arc<ScriptedVerifier>) -> MessageService {
    MessageService::new(GenerationPipeline::new(
        agents(orchestrator, verifier),
        3,
        FALLBACK,
    ))
}

/// Poll until the job is terminal, returning every distinct status seen on the way.
pub async fn wait_for_terminal(
    service: &MessageService,
    job_id: Uuid,
) -> (JobSnapshot, Vec<JobStatus>) {
    let mut seen: Vec<JobStatus> = Vec::new();
    let result = timeout(Duration::from_secs(5), async {
        loop {
            let snapshot = service.status(job_id).await.expect("job should exist");
            if seen.last() != Some(&snapshot.status) {
                seen.push(snapshot.status);
            }
            if matches!(snapshot.status, JobStatus::Completed | JobStatus::Error) {
                return snapshot;
            }
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("job did not finish in time");
    (result, seen)
}

/// Poll until the job reaches the given status.
pub async fn wait_for_status(service: &MessageService, job_id: Uuid, status: JobStatus) {
    timeout(Duration::from_secs(5), async {
        while service.status(job_id).await.map(|s| s.status) != Some(status) {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("job did not reach the expected status in time");
}

/// Whether polled statuses only ever moved forward.
pub fn is_forward_prefix(seen: &[JobStatus]) -> bool {
    let order = |status: &JobStatus| match status {
        JobStatus::Queued => 0,
        JobStatus::Processing => 1,
        JobStatus::Completed | JobStatus::Error => 2,
    };
    seen.windows(2).all(|w| order(&w[1]) > order(&w[0]))
}
