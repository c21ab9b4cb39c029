//! Content Adaptation: orchestrates one adaptation request end to end.
//!
//! Flow: availability check → configuration check → build_job_context →
//!       collect_tasks → run_tasks (bounded fan-out) → reconstruct.
//!
//! An unavailable generator is a passthrough, not an error: the caller gets its
//! experiences back unchanged with no notes and no warnings.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::adaptation::adapter::Adapter;
use crate::adaptation::context::build_job_context;
use crate::adaptation::fanout::{run_tasks, FailureKind};
use crate::adaptation::reconstruct::reconstruct;
use crate::adaptation::tasks::collect_tasks;
use crate::errors::AppError;
use crate::llm_client::TextGenerator;
use crate::models::job::JobAnalysis;
use crate::models::profile::Experience;

/// Output of one adaptation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptedContent {
    pub experiences: Vec<Experience>,
    pub notes: BTreeMap<String, String>,
    pub warnings: Vec<String>,
}

impl AdaptedContent {
    fn passthrough(experiences: &[Experience]) -> Self {
        Self {
            experiences: experiences.to_vec(),
            notes: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }
}

/// Per-request tuning, taken from `Config`.
#[derive(Debug, Clone, Copy)]
pub struct AdaptationSettings {
    pub max_concurrency: usize,
}

/// Adapts `experiences` toward the job described by `analysis`.
///
/// Hard failures are limited to configuration problems and non-retryable
/// generation errors; everything else degrades to the original text plus a
/// warning.
pub async fn adapt_content(
    generator: Arc<dyn TextGenerator>,
    experiences: &[Experience],
    analysis: &JobAnalysis,
    directive: Option<&str>,
    settings: AdaptationSettings,
) -> Result<AdaptedContent, AppError> {
    if !generator.is_available() {
        info!("LLM generation unavailable; returning experiences unchanged");
        return Ok(AdaptedContent::passthrough(experiences));
    }

    generator
        .check_configuration()
        .map_err(|e| AppError::FeatureUnavailable(e.to_string()))?;

    let run_id = Uuid::new_v4();
    let context = Arc::new(build_job_context(analysis, directive));
    let tasks = collect_tasks(experiences);
    let task_count = tasks.len();

    info!(
        "Adaptation run {run_id}: {task_count} fields across {} experiences (max {} in flight)",
        experiences.len(),
        settings.max_concurrency
    );

    let adapter = Adapter::new(generator);
    let fan_in = run_tasks(tasks, &adapter, context, settings.max_concurrency).await;

    if let Some((coordinate, failure)) = &fan_in.fatal {
        warn!("Adaptation run {run_id} aborted by {coordinate}: {}", failure.message);
        return Err(match failure.kind {
            FailureKind::Configuration => AppError::FeatureUnavailable(failure.message.clone()),
            _ => AppError::Llm(format!("Adaptation failed at {coordinate}: {}", failure.message)),
        });
    }

    let fallbacks = fan_in.fallback_count();
    let rebuilt = reconstruct(experiences, &fan_in.results);

    info!(
        "Adaptation run {run_id} finished: {} adapted, {fallbacks} kept original wording",
        task_count - fallbacks
    );

    Ok(AdaptedContent {
        experiences: rebuilt.experiences,
        notes: rebuilt.notes,
        warnings: fan_in.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptation::testing::{experience, project, ScriptedGenerator};
    use crate::llm_client::LlmError;

    const SETTINGS: AdaptationSettings = AdaptationSettings { max_concurrency: 4 };

    fn analysis() -> JobAnalysis {
        JobAnalysis {
            required_skills: vec!["platform reliability".to_string(), "Kubernetes".to_string()],
            responsibilities: vec!["Keep production healthy".to_string()],
            ..Default::default()
        }
    }

    fn profile() -> Vec<Experience> {
        vec![
            experience(
                "Acme",
                "Ran the platform team.",
                vec![project(
                    "Infra",
                    "Built the CI system.",
                    &["Reduced onboarding time by standardizing templates and tooling.", "  "],
                )],
            ),
            experience("Globex", "", vec![project("Billing", "Maintained invoicing.", &[])]),
        ]
    }

    fn count_fields(experiences: &[Experience]) -> (usize, usize, usize) {
        let projects = experiences.iter().map(|e| e.projects.len()).sum();
        let highlights = experiences
            .iter()
            .flat_map(|e| &e.projects)
            .map(|p| p.highlights.len())
            .sum();
        (experiences.len(), projects, highlights)
    }

    #[tokio::test]
    async fn test_unavailable_generator_is_a_passthrough() {
        let generator = Arc::new(ScriptedGenerator::unavailable());
        let input = profile();

        let out = adapt_content(generator.clone(), &input, &analysis(), None, SETTINGS)
            .await
            .unwrap();

        assert_eq!(out.experiences, input);
        assert!(out.notes.is_empty());
        assert!(out.warnings.is_empty());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_misconfigured_generator_is_feature_unavailable() {
        let generator = Arc::new(ScriptedGenerator::misconfigured());

        let err = adapt_content(generator.clone(), &profile(), &analysis(), None, SETTINGS)
            .await
            .unwrap_err();

        match err {
            AppError::FeatureUnavailable(msg) => {
                assert!(msg.contains("LLM_API_BASE"));
                assert!(msg.contains("LLM_MODEL"));
            }
            other => panic!("expected FeatureUnavailable, got {other:?}"),
        }
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_full_run_adapts_every_non_blank_field() {
        let generator = Arc::new(ScriptedGenerator::echo());
        let input = profile();

        let out = adapt_content(generator.clone(), &input, &analysis(), None, SETTINGS)
            .await
            .unwrap();

        // 2 descriptions + 2 project descriptions + 1 highlight; blanks skipped
        assert_eq!(generator.calls(), 4);
        assert_eq!(count_fields(&out.experiences), count_fields(&input));
        assert!(out.warnings.is_empty());
        assert!(out.experiences[0].description.ends_with("Focused on platform reliability."));
        assert_eq!(out.experiences[1].description, "");
        assert_eq!(out.experiences[0].projects[0].highlights[1], "  ");
        assert_eq!(out.notes.len(), 1);
        assert!(out.notes.contains_key("Acme"));
        assert_eq!(input, profile(), "input must not be mutated");
    }

    #[tokio::test]
    async fn test_over_limit_result_falls_back_with_warning() {
        let generator = Arc::new(ScriptedGenerator::new(|user| {
            if user.starts_with("Reduced onboarding") {
                Ok(format!("{user} {}", "Platform reliability. ".repeat(20)))
            } else {
                Ok(user.to_string())
            }
        }));
        let input = profile();

        let out = adapt_content(generator, &input, &analysis(), None, SETTINGS)
            .await
            .unwrap();

        assert_eq!(
            out.experiences[0].projects[0].highlights[0],
            input[0].projects[0].highlights[0]
        );
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].starts_with("experiences[0].projects[0].highlights[0]"));
        assert!(out.warnings[0].contains("character limit"));
    }

    #[tokio::test]
    async fn test_content_loss_falls_back_with_warning() {
        let generator = Arc::new(ScriptedGenerator::new(|user| {
            if user.starts_with("Reduced onboarding") {
                Ok("Reduced time.".to_string())
            } else {
                Ok(user.to_string())
            }
        }));

        let out = adapt_content(generator, &profile(), &analysis(), None, SETTINGS)
            .await
            .unwrap();

        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("retention"));
        assert_eq!(
            out.experiences[0].projects[0].highlights[0],
            "Reduced onboarding time by standardizing templates and tooling."
        );
    }

    #[tokio::test]
    async fn test_permanent_error_aborts_request() {
        let generator = Arc::new(ScriptedGenerator::new(|_| {
            Err(LlmError::Api {
                status: 401,
                message: "invalid key".to_string(),
            })
        }));

        let err = adapt_content(generator, &profile(), &analysis(), None, SETTINGS)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Llm(_)));
    }

    #[tokio::test]
    async fn test_directive_reaches_the_prompt() {
        let generator = Arc::new(ScriptedGenerator::echo());
        let input = vec![experience("Acme", "Ran deploys.", vec![])];

        adapt_content(
            generator.clone(),
            &input,
            &analysis(),
            Some("Mention on-call ownership"),
            SETTINGS,
        )
        .await
        .unwrap();

        let system = generator.last_system().unwrap();
        assert!(system.contains("Mention on-call ownership"));
        assert!(system.contains("Required skills: platform reliability, Kubernetes"));
    }

    #[tokio::test]
    async fn test_same_company_experiences_adapt_independently() {
        let generator = Arc::new(ScriptedGenerator::new(|user| Ok(format!("{user} (SRE)"))));
        let input = vec![
            experience("Acme", "Ran deploys.", vec![]),
            experience("Acme", "Wrote runbooks.", vec![]),
        ];

        let out = adapt_content(generator, &input, &analysis(), None, SETTINGS)
            .await
            .unwrap();

        assert_eq!(out.experiences[0].description, "Ran deploys. (SRE)");
        assert_eq!(out.experiences[1].description, "Wrote runbooks. (SRE)");
        assert_eq!(out.notes.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_profile_makes_no_calls() {
        let generator = Arc::new(ScriptedGenerator::echo());
        let out = adapt_content(generator.clone(), &[], &analysis(), None, SETTINGS)
            .await
            .unwrap();
        assert!(out.experiences.is_empty());
        assert_eq!(generator.calls(), 0);
    }
}
