//! Fixed texts: the system instruction, the user-message template, the
//! greetings seeded into a transcript and the "no report" sentinel.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the assistant's policy requires
//!    editing exactly one place.
//!
//! 2. **Testability** — unit tests can import and inspect prompts directly
//!    without calling a real model.
//!
//! Callers can override the system instruction via
//! [`crate::config::AssistantConfig::system_prompt`]; the constant here is
//! used only when no override is provided.

/// Context sent to the model when no report has been uploaded, or when the
/// uploaded report yielded no readable text.
pub const NO_REPORT_CONTEXT: &str = "No report was uploaded.";

/// First assistant turn of a fresh session.
pub const WELCOME_GREETING: &str = "Hello! I'm CareBuddy. Feel free to upload a medical report, \
or ask me a general health question. I'm here to help you understand.";

/// Assistant turn seeded after the chat is cleared.
pub const CLEARED_GREETING: &str = "Hello again! How can I help you today?";

/// The disclaimer every answer must end with.
pub const MEDICAL_DISCLAIMER: &str = "***Disclaimer:** This information is for educational purposes only. \
It is not a substitute for professional medical advice. Always consult with a qualified healthcare \
provider for any health concerns or before making any decisions related to your health.*";

/// Refusal the model is told to use for off-topic questions.
pub const OFF_TOPIC_REFUSAL: &str = "My purpose is to assist with health and medical questions. \
I cannot answer queries outside of this topic. How can I help you with your health today?";

/// Default system instruction.
///
/// Restricts the model to human health and medicine, forbids diagnosis and
/// prescription, and requires [`MEDICAL_DISCLAIMER`] at the end of every
/// response. The client does not check that the model complied.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are 'CareBuddy', a specialized AI assistant. Your ONLY function is to provide helpful, safe, and informative answers STRICTLY related to human health and medicine.
Your Core Directives:
1.  **Scope Limitation:** You MUST ONLY answer questions about medical conditions, symptoms, treatments, anatomy, physiology, nutrition, mental health, and general wellness. If the user's question is based on a provided medical report, use the report's text as the primary source of context.
2.  **Strictly Reject Off-Topic Questions:** If a user asks a question that is NOT about health or medicine (e.g., "What is the capital of India?", "Who is the president?", "Write a story"), you MUST politely refuse.
3.  **Refusal Protocol:** When you reject a question, use a clear and helpful response. For example: "My purpose is to assist with health and medical questions. I cannot answer queries outside of this topic. How can I help you with your health today?"
4.  **CRITICAL SAFETY DISCLAIMER:** You are NOT a doctor. You MUST NEVER provide a medical diagnosis or a direct prescription. **Every single one of your responses must end with the following disclaimer, without exception:**
---
***Disclaimer:** This information is for educational purposes only. It is not a substitute for professional medical advice. Always consult with a qualified healthcare provider for any health concerns or before making any decisions related to your health.*"#;

/// Build the user message carrying the report context and the question.
pub fn user_message(context: &str, question: &str) -> String {
    format!("Medical Report Context:\n{context}\n\nUser's Question:\n{question}")
}
