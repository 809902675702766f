use crate::core::coordinator::{derive_category, derive_format, normalize_label};

#[test]
fn normalization_is_idempotent_on_canonical_tokens() {
    assert_eq!(normalize_label("belief_shift"), "belief_shift");
    assert_eq!(normalize_label("step_by_step"), "step_by_step");
    assert_eq!(normalize_label("nurture"), "nurture");
}

#[test]
fn human_labels_map_onto_canonical_tokens() {
    assert_eq!(normalize_label("Belief Shift"), "belief_shift");
    assert_eq!(normalize_label("  hidden truth "), "hidden_truth");
    assert_eq!(normalize_label("FAQ Answer"), "faq_answer");
    assert_eq!(normalize_label("Client Quote"), "client_quote");
}

#[test]
fn unknown_labels_fall_back_to_generic_tokenization() {
    assert_eq!(normalize_label("Industry Myths"), "industry_myths");
    assert_eq!(normalize_label("how to"), "how_to");
}

#[test]
fn category_derives_from_pillar_label_substring() {
    assert_eq!(
        derive_category("Attract/Growth (Build awareness & trust)"),
        Some("attract")
    );
    assert_eq!(
        derive_category("Nurture/Authority (Show authority & create demand)"),
        Some("nurture")
    );
    assert_eq!(
        derive_category("Convert/Lead Gen (Qualify buyers & drive action)"),
        Some("convert")
    );
    assert_eq!(derive_category("Something Else"), None);
}

#[test]
fn format_derives_from_pillar_type_minus_ordinal() {
    assert_eq!(derive_format("3. Belief Shift"), "belief_shift");
    assert_eq!(derive_format("10. Case Study"), "case_study");
    assert_eq!(derive_format("5. Step-by-Step"), "step_by_step");
    assert_eq!(derive_format("7) Process Breakdown"), "process_breakdown");
    // No ordinal prefix is fine too.
    assert_eq!(derive_format("Quick Win"), "quick_win");
}
