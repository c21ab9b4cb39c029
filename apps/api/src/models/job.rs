#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// Structured requirements extracted upstream from a target job description.
///
/// Read-only input to adaptation. Every list is an ordered sequence so the
/// prompt built from it is reproducible for the same analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobAnalysis {
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub domain_keywords: Vec<String>,
    #[serde(default)]
    pub seniority_signals: Vec<String>,
}
