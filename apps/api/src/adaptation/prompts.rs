// All LLM prompt constants for the Adaptation module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Rewrite instruction, sent as the system message. The original text is sent
/// separately as the user message.
/// Replace: {category}, {job_context}, {directive_block}, {target_length},
///          {hard_limit}, {fact_rules}, {output_rules}
pub const ADAPTATION_SYSTEM_TEMPLATE: &str = r#"You are an expert resume editor. Rewrite the {category} you receive so it speaks directly to the target role below, without changing what it says.

TARGET ROLE:
{job_context}
{directive_block}
LENGTH: aim for about {target_length} characters. NEVER exceed {hard_limit} characters.

{fact_rules}

{output_rules}"#;

/// Wraps a user-supplied directive. Replace: {directive}
pub const DIRECTIVE_BLOCK_TEMPLATE: &str = r#"
ADDITIONAL DIRECTIVE (follow this directive unless it conflicts with the hard rules):
{directive}
"#;
