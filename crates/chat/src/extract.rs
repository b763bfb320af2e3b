//! Reply extraction and output formatting.
//!
//! The backend returns raw text that still contains the prompt and may
//! hallucinate extra conversational turns. Extraction isolates the
//! assistant's actual reply using the turn markers.

const ASSISTANT_MARKER: &str = "Assistant:";
const USER_MARKER: &str = "User:";

/// Isolate the assistant's reply from raw model output.
///
/// Takes everything after the LAST `"Assistant:"` marker, then truncates at
/// the first subsequent `"User:"` or `"Assistant:"` — the model continuing
/// the conversation on its own is discarded. With no marker at all, the
/// whole output is the reply. The result is whitespace-trimmed.
pub fn extract_reply(raw: &str) -> String {
    let tail = match raw.rfind(ASSISTANT_MARKER) {
        Some(idx) => &raw[idx + ASSISTANT_MARKER.len()..],
        None => raw,
    };

    let cut = [USER_MARKER, ASSISTANT_MARKER]
        .iter()
        .filter_map(|marker| tail.find(marker))
        .min();

    match cut {
        Some(idx) => tail[..idx].trim().to_string(),
        None => tail.trim().to_string(),
    }
}

/// Wrap a reply in a code fence when it contains one but does not start
/// with one, so downstream rendering treats the whole reply as code.
pub fn wrap_code_fence(reply: String) -> String {
    if reply.contains("```") && !reply.starts_with("```") {
        format!("```\n{reply}\n```")
    } else {
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_text_after_last_assistant_marker() {
        let raw = "persona\nUser: hi\nAssistant: early\nUser: more\nAssistant: Hello!";
        assert_eq!(extract_reply(raw), "Hello!");
    }

    #[test]
    fn no_marker_uses_whole_output_trimmed() {
        assert_eq!(extract_reply("  just text  \n"), "just text");
    }

    #[test]
    fn truncates_hallucinated_user_turn() {
        let raw = "prompt Assistant: Real answer.\nUser: fake follow-up";
        assert_eq!(extract_reply(raw), "Real answer.");
    }

    #[test]
    fn marker_without_trailing_space_still_extracts() {
        assert_eq!(extract_reply("prompt Assistant:Answer"), "Answer");
    }

    #[test]
    fn empty_output_gives_empty_reply() {
        assert_eq!(extract_reply(""), "");
        assert_eq!(extract_reply("Assistant:"), "");
    }

    #[test]
    fn fence_wrapping_applies_when_fence_is_mid_reply() {
        let wrapped = wrap_code_fence("run this:\n```yaml\non: push\n```".into());
        assert!(wrapped.starts_with("```\n"));
        assert!(wrapped.ends_with("\n```"));
    }

    #[test]
    fn fence_wrapping_skipped_when_reply_starts_fenced() {
        let reply = "```yaml\non: push\n```".to_string();
        assert_eq!(wrap_code_fence(reply.clone()), reply);
    }

    #[test]
    fn fence_wrapping_skipped_without_fence() {
        assert_eq!(wrap_code_fence("plain text".into()), "plain text");
    }
}
