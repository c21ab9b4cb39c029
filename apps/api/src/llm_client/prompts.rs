// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Hard rules appended to every rewrite prompt. Output is validated afterwards,
/// but the model is told the same constraints up front.
pub const FACT_PRESERVATION_RULES: &str = "\
HARD RULES:
1. Every fact in your output MUST already exist in the original text.
2. You MAY reword, reorder, and adopt vocabulary from the job description.
3. You MUST NOT add achievements, metrics, numbers, percentages, or any other numeric claim.
4. You MUST NOT add technologies, employers, or responsibilities that are not in the original.
5. When uncertain, keep the original wording.";

/// Instruction that keeps the model from decorating plain-text output.
pub const PLAIN_TEXT_OUTPUT: &str = "\
Respond with the rewritten text only. \
Do NOT add quotes, labels, markdown, or explanations.";
