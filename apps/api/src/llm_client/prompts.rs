// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction that keeps the model from filling gaps with invented facts.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Only report skills, experience and education that are explicitly stated in the CV. \
    If something is not present, leave the field empty rather than guessing.";
