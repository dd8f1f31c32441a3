/// Shared prompt text for the causality judge, regardless of which provider
/// ends up answering it.
pub fn build_judge_prompt(cause_text: &str, effect_text: &str) -> String {
    format!(
        "Given preceding event: \"{cause_text}\"\n\
         And subsequent event: \"{effect_text}\"\n\n\
         Are these part of the same workflow or causal sequence? If yes, \
         respond with one short phrase describing the relationship. If no, \
         respond with the single word \"No\"."
    )
}
