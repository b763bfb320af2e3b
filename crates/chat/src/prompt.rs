//! Prompt assembly.
//!
//! A prompt is one "user turn" — a fixed instruction block, the retrieved
//! knowledge context, and the raw user message — wrapped between the system
//! persona and the `Assistant:` turn marker the model completes from.

use supportdesk_core::faq::ScoredEntry;

/// Behavioral instructions prepended to every user turn. Fixed, not
/// user-controlled.
const INSTRUCTION_BLOCK: &str = "Use the reference questions and answers below \
when they are relevant to the customer's message, and answer from your own \
knowledge when they are not.";

/// Build the full prompt: `"<persona>\nUser: <turn>\nAssistant:"`.
///
/// The knowledge context is one `"Q: <question>\nA: <answer>"` block per
/// retrieved entry, in rank order, joined by newlines; it is omitted
/// entirely when nothing was retrieved, making the result a pure function
/// of persona and message.
pub fn assemble_prompt(persona: &str, retrieved: &[ScoredEntry], message: &str) -> String {
    let context = retrieved
        .iter()
        .map(|s| format!("Q: {}\nA: {}", s.entry.question, s.entry.answer))
        .collect::<Vec<_>>()
        .join("\n");

    let mut turn = String::from(INSTRUCTION_BLOCK);
    if !context.is_empty() {
        turn.push_str("\n\n");
        turn.push_str(&context);
    }
    turn.push_str("\n\n");
    turn.push_str(message);

    format!("{persona}\nUser: {turn}\nAssistant:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use supportdesk_core::faq::FaqEntry;

    fn scored(question: &str, answer: &str, score: f32) -> ScoredEntry {
        ScoredEntry {
            score,
            entry: FaqEntry::new(question, answer),
        }
    }

    #[test]
    fn empty_retrieval_has_no_qa_block() {
        let prompt = assemble_prompt("Persona.", &[], "Hi");
        assert!(!prompt.contains("Q:"));
        assert!(!prompt.contains("A:"));
        assert!(prompt.starts_with("Persona.\nUser: "));
        assert!(prompt.ends_with("\nAssistant:"));
        assert!(prompt.contains("Hi"));
    }

    #[test]
    fn empty_retrieval_is_pure_in_persona_and_message() {
        let a = assemble_prompt("P.", &[], "Hello");
        let b = assemble_prompt("P.", &[], "Hello");
        assert_eq!(a, b);
    }

    #[test]
    fn context_entries_appear_in_rank_order() {
        let retrieved = vec![
            scored("First question?", "First answer.", 0.9),
            scored("Second question?", "Second answer.", 0.5),
        ];
        let prompt = assemble_prompt("P.", &retrieved, "Hi");
        let first = prompt.find("Q: First question?").unwrap();
        let second = prompt.find("Q: Second question?").unwrap();
        assert!(first < second);
        assert!(prompt.contains("A: First answer."));
    }

    #[test]
    fn message_comes_after_context() {
        let retrieved = vec![scored("Q?", "A.", 0.9)];
        let prompt = assemble_prompt("P.", &retrieved, "my message");
        let context = prompt.find("Q: Q?").unwrap();
        let message = prompt.find("my message").unwrap();
        assert!(context < message);
    }
}
