//! Category/format label handling: human labels from bot commands and idea
//! payloads are folded onto the canonical tokens templates are filed under.

/// The three funnel-stage category tokens.
pub const CATEGORIES: [&str; 3] = ["attract", "nurture", "convert"];

/// Map a free-text label onto its canonical token. Known human labels go
/// through a fixed table; anything else falls back to lowercase with spaces
/// replaced by underscores. Best effort, not a validated taxonomy.
pub fn normalize_label(label: &str) -> String {
    let t = label.trim().to_lowercase();
    let canonical = match t.as_str() {
        "attract" => "attract",
        "nurture" => "nurture",
        "convert" => "convert",
        // Attract
        "transformation" => "transformation",
        "misconception" => "misconception",
        "belief shift" | "belief_shift" => "belief_shift",
        "hidden truth" | "hidden_truth" => "hidden_truth",
        // Nurture
        "step by step" | "step-by-step" | "step_by_step" => "step_by_step",
        "faq answer" | "faq_answer" => "faq_answer",
        "process breakdown" | "process_breakdown" => "process_breakdown",
        "quick win" | "quick_win" => "quick_win",
        // Convert
        "client fix" | "client_fix" => "client_fix",
        "case study" | "case_study" => "case_study",
        "objection reframe" | "objection_reframe" => "objection_reframe",
        "client quote" | "client_quote" => "client_quote",
        _ => return t.replace(' ', "_"),
    };
    canonical.to_string()
}

/// Infer the funnel-stage token from a pillar-category label such as
/// "Attract/Growth (Build awareness & trust)".
pub fn derive_category(pillar_category: &str) -> Option<&'static str> {
    let lower = pillar_category.to_lowercase();
    CATEGORIES.iter().find(|c| lower.contains(*c)).copied()
}

/// Derive the format token from a pillar-type label: the leading ordinal
/// ("3. Belief Shift" or "3) Belief Shift") is stripped, then the remainder
/// is normalized.
pub fn derive_format(pillar_type: &str) -> String {
    let stripped = strip_ordinal(pillar_type);
    normalize_label(stripped)
}

fn strip_ordinal(label: &str) -> &str {
    let trimmed = label.trim_start();
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return trimmed;
    }
    let rest = &trimmed[digits..];
    if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
        rest.trim_start()
    } else {
        trimmed
    }
}
