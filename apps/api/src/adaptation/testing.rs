//! Test fixtures and scripted generators shared by the adaptation tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm_client::{LlmError, TextGenerator};
use crate::models::profile::{Experience, Project};

pub fn experience(company: &str, description: &str, projects: Vec<Project>) -> Experience {
    Experience {
        title: "Senior Engineer".to_string(),
        company: company.to_string(),
        start_date: Some("2019-04".to_string()),
        end_date: Some("Present".to_string()),
        location: Some("Berlin, DE".to_string()),
        description: description.to_string(),
        projects,
    }
}

pub fn project(name: &str, description: &str, highlights: &[&str]) -> Project {
    Project {
        name: name.to_string(),
        description: description.to_string(),
        highlights: highlights.iter().map(|h| h.to_string()).collect(),
        technologies: vec!["Rust".to_string(), "Kubernetes".to_string()],
        url: Some(format!("https://example.com/{}", name.to_lowercase())),
    }
}

type Reply = dyn Fn(&str) -> Result<String, LlmError> + Send + Sync;

/// Generator whose replies come from a closure over the user message.
pub struct ScriptedGenerator {
    reply: Box<Reply>,
    available: bool,
    misconfigured: bool,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    last_system: Mutex<Option<String>>,
    last_user: Mutex<Option<String>>,
}

impl ScriptedGenerator {
    pub fn new<F>(reply: F) -> Self
    where
        F: Fn(&str) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            reply: Box::new(reply),
            available: true,
            misconfigured: false,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            last_system: Mutex::new(None),
            last_user: Mutex::new(None),
        }
    }

    /// Appends a job-flavoured suffix to the original, which always validates.
    pub fn echo() -> Self {
        Self::new(|user| Ok(format!("{user} Focused on platform reliability.")))
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::echo()
        }
    }

    pub fn misconfigured() -> Self {
        Self {
            misconfigured: true,
            ..Self::echo()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn last_system(&self) -> Option<String> {
        self.last_system.lock().unwrap().clone()
    }

    pub fn last_user(&self) -> Option<String> {
        self.last_user.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn is_available(&self) -> bool {
        self.available
    }

    fn check_configuration(&self) -> Result<(), LlmError> {
        if self.misconfigured {
            return Err(LlmError::NotConfigured {
                missing: vec!["LLM_API_BASE", "LLM_MODEL"],
            });
        }
        Ok(())
    }

    async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_system.lock().unwrap() = Some(system.to_string());
        *self.last_user.lock().unwrap() = Some(user.to_string());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        (self.reply)(user)
    }
}
