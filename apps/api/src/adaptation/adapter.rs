//! Adapter: rewrites one text field toward the target job and validates the result.
//!
//! Generated text is never trusted. Every result is checked against a hard
//! character ceiling, a minimum retention ratio, and the numeric claims of the
//! original. The adapter performs no fallback; callers decide what to do with
//! an `AdaptError`.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::adaptation::context::JobContext;
use crate::adaptation::prompts::ADAPTATION_SYSTEM_TEMPLATE;
use crate::llm_client::prompts::{FACT_PRESERVATION_RULES, PLAIN_TEXT_OUTPUT};
use crate::llm_client::{LlmError, TextGenerator};

/// Results shorter than this share of the original are treated as content loss.
const MIN_RETENTION_PERCENT: usize = 30;

/// What kind of text a field holds. Drives length targets and ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentCategory {
    ExperienceDescription,
    ProjectDescription,
    BulletPoint,
}

impl ContentCategory {
    pub fn label(self) -> &'static str {
        match self {
            ContentCategory::ExperienceDescription => "experience description",
            ContentCategory::ProjectDescription => "project description",
            ContentCategory::BulletPoint => "bullet point",
        }
    }

    /// Soft length the model is asked to aim for.
    pub fn target_length(self) -> usize {
        match self {
            ContentCategory::ExperienceDescription | ContentCategory::ProjectDescription => 250,
            ContentCategory::BulletPoint => 200,
        }
    }

    /// Hard ceiling; anything longer is rejected.
    pub fn hard_limit(self) -> usize {
        match self {
            ContentCategory::ExperienceDescription | ContentCategory::ProjectDescription => 300,
            ContentCategory::BulletPoint => 250,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("adapted {category} is {length} characters, over the {limit} character limit")]
    TooLong {
        category: &'static str,
        length: usize,
        limit: usize,
    },

    #[error("adapted text kept {length} of {original} characters, below the 30% retention minimum")]
    TooShort { length: usize, original: usize },

    #[error("adapted text introduces numeric claims absent from the original: {}", .tokens.join(", "))]
    NewNumericClaims { tokens: Vec<String> },
}

#[derive(Debug, Error)]
pub enum AdaptError {
    #[error("generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Rewrites single fields through an injected `TextGenerator`.
#[derive(Clone)]
pub struct Adapter {
    generator: Arc<dyn TextGenerator>,
}

impl Adapter {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Rewrites `original` for the job in `context`.
    ///
    /// Blank input comes back unchanged without a network call.
    pub async fn adapt(
        &self,
        original: &str,
        context: &JobContext,
        category: ContentCategory,
    ) -> Result<String, AdaptError> {
        if original.trim().is_empty() {
            return Ok(original.to_string());
        }

        let instruction = build_instruction(context, category);
        let adapted = self.generator.generate(&instruction, original).await?;

        validate_adapted(original, &adapted, category)?;

        debug!(
            "Adapted {} ({} -> {} chars)",
            category.label(),
            original.chars().count(),
            adapted.chars().count()
        );
        Ok(adapted)
    }
}

/// Fills the system instruction for one field.
pub fn build_instruction(context: &JobContext, category: ContentCategory) -> String {
    let target_length = category.target_length().to_string();
    let hard_limit = category.hard_limit().to_string();

    fill_template(
        ADAPTATION_SYSTEM_TEMPLATE,
        &[
            ("{category}", category.label()),
            ("{job_context}", &context.summary),
            ("{directive_block}", context.directive.as_deref().unwrap_or("")),
            ("{target_length}", &target_length),
            ("{hard_limit}", &hard_limit),
            ("{fact_rules}", FACT_PRESERVATION_RULES),
            ("{output_rules}", PLAIN_TEXT_OUTPUT),
        ],
    )
}

/// Single left-to-right pass over `template`. Substituted values are never
/// rescanned, so braces in job text or directives reach the model verbatim.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Checks a generated rewrite. Lengths are counted in characters.
pub fn validate_adapted(
    original: &str,
    adapted: &str,
    category: ContentCategory,
) -> Result<(), ValidationError> {
    let length = adapted.chars().count();
    let original_length = original.chars().count();

    if length > category.hard_limit() {
        return Err(ValidationError::TooLong {
            category: category.label(),
            length,
            limit: category.hard_limit(),
        });
    }

    if length * 100 < original_length * MIN_RETENTION_PERCENT {
        return Err(ValidationError::TooShort {
            length,
            original: original_length,
        });
    }

    let known = numeric_tokens(original);
    let introduced: Vec<String> = numeric_tokens(adapted)
        .into_iter()
        .filter(|token| !known.contains(token))
        .collect();
    if !introduced.is_empty() {
        return Err(ValidationError::NewNumericClaims { tokens: introduced });
    }

    Ok(())
}

/// Extracts numbers such as `40`, `3.5` or `1,200` from `text`.
///
/// Separators only count between digits, so sentence punctuation after a
/// number is not part of the token.
fn numeric_tokens(text: &str) -> BTreeSet<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = BTreeSet::new();
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let mut token = String::new();
        while i < chars.len() {
            let c = chars[i];
            let joins_digits = matches!(c, '.' | ',')
                && chars.get(i + 1).is_some_and(|next| next.is_ascii_digit());
            if c.is_ascii_digit() {
                token.push(c);
            } else if joins_digits {
                // thousands separators are dropped so 1,200 and 1200 compare equal
                if c == '.' {
                    token.push(c);
                }
            } else {
                break;
            }
            i += 1;
        }
        tokens.insert(token);
    }

    tokens
}
