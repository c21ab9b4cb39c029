//! Context Builder: condenses a `JobAnalysis` into a bounded, prompt-ready summary.
//!
//! The summary size does not grow with the job description: only the first
//! `MAX_REQUIRED_SKILLS`, `MAX_PREFERRED_SKILLS` and `MAX_RESPONSIBILITIES`
//! entries are rendered.

use crate::adaptation::prompts::DIRECTIVE_BLOCK_TEMPLATE;
use crate::models::job::JobAnalysis;

pub const MAX_REQUIRED_SKILLS: usize = 20;
pub const MAX_PREFERRED_SKILLS: usize = 20;
pub const MAX_RESPONSIBILITIES: usize = 5;

const SKILL_SEPARATOR: &str = ", ";
const RESPONSIBILITY_PREFIX: &str = "\n- ";

/// Job context shared by every rewrite in one adaptation request.
#[derive(Debug, Clone, PartialEq)]
pub struct JobContext {
    pub summary: String,
    /// Rendered directive block. `None` when no usable directive was given.
    pub directive: Option<String>,
}

/// Builds the job context for one adaptation request.
pub fn build_job_context(analysis: &JobAnalysis, directive: Option<&str>) -> JobContext {
    JobContext {
        summary: render_summary(analysis),
        directive: render_directive(directive),
    }
}

fn render_summary(analysis: &JobAnalysis) -> String {
    let mut sections = Vec::new();

    if !analysis.required_skills.is_empty() {
        sections.push(format!(
            "Required skills: {}",
            first_n(&analysis.required_skills, MAX_REQUIRED_SKILLS).join(SKILL_SEPARATOR)
        ));
    }

    if !analysis.preferred_skills.is_empty() {
        sections.push(format!(
            "Preferred skills: {}",
            first_n(&analysis.preferred_skills, MAX_PREFERRED_SKILLS).join(SKILL_SEPARATOR)
        ));
    }

    if !analysis.responsibilities.is_empty() {
        let items: String = first_n(&analysis.responsibilities, MAX_RESPONSIBILITIES)
            .iter()
            .map(|r| format!("{RESPONSIBILITY_PREFIX}{r}"))
            .collect();
        sections.push(format!("Key responsibilities:{items}"));
    }

    if sections.is_empty() {
        return "No specific requirements were extracted for this role.".to_string();
    }

    sections.join("\n")
}

fn first_n(items: &[String], n: usize) -> Vec<&str> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(n)
        .collect()
}

fn render_directive(directive: Option<&str>) -> Option<String> {
    let directive = directive.map(str::trim).filter(|d| !d.is_empty())?;
    Some(DIRECTIVE_BLOCK_TEMPLATE.replace("{directive}", directive))
}
