//! System instructions and prompt builders for the completion gateway.

pub const CHAT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant for HR and education tasks. Be concise and professional.";

pub const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that writes polished professional workshop summaries.";

/// Sent when the chat input is empty.
pub const DEFAULT_CHAT_PROMPT: &str =
    "Draft a kind, professional rejection email to a candidate who was not selected.";

pub const NO_ANSWER: &str = "(No answer)";
pub const NO_SUMMARY: &str = "No summary generated.";
pub const SUMMARY_FAILED: &str = "Failed to generate summary";

const NO_NOTES: &str = "No notes recorded.";
const NO_USE_CASES: &str = "No specific use cases chosen.";

/// `prompt` if it has content, otherwise the canned HR prompt.
pub fn chat_prompt_or_default(prompt: Option<&str>) -> &str {
    match prompt {
        Some(p) if !p.trim().is_empty() => p,
        _ => DEFAULT_CHAT_PROMPT,
    }
}

/// Markdown bullet list of the chosen use cases, or the placeholder sentence.
pub fn use_case_list(selected: &[String]) -> String {
    if selected.is_empty() {
        return NO_USE_CASES.to_string();
    }
    selected
        .iter()
        .map(|u| format!("- {}", u))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn summary_prompt(icebreaker_notes: &str, selected_use_cases: &[String]) -> String {
    let notes = if icebreaker_notes.trim().is_empty() {
        NO_NOTES
    } else {
        icebreaker_notes
    };
    format!(
        "You are an assistant creating a professional summary for an AI Discovery Deck workshop.\n\
         \n\
         Include only these sections:\n\
         1. **Icebreaker Insights** – Summarize the participant's responses:\n\
         {}\n\
         \n\
         2. **Practical Applications Chosen**\n\
         {}\n\
         \n\
         Deliver the output in Markdown format with clear headers, short paragraphs, and bullet points where appropriate.",
        notes,
        use_case_list(selected_use_cases)
    )
}
