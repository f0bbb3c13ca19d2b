// Shared prompt fragments. Feature-specific prompts live next to the feature
// (see importer/prompts.rs).

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured data extractor. \
    You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Use null for anything you cannot determine.";
