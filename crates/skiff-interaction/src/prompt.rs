//! Prompt builders for the two assistant entry points.
//!
//! Both modes share the gateway's per-provider transport path; only the
//! instruction text differs.

/// The reply contract appended to every prompt. Schema-constrained backends
/// enforce this shape on their own; free-form local models need the text.
const RESPONSE_CONTRACT: &str = "\nRespond with a single JSON object with exactly two keys:\n\
    - \"markdown\": your answer formatted as markdown\n\
    - \"suggestedCommand\": one shell command the user could run next, or null\n\
    Do not wrap the JSON in code fences or add any text around it.\n";

/// Builds the free-form query prompt, with the visible terminal buffer as
/// context.
pub fn build_ask_prompt(query: &str, context_snippet: &str) -> String {
    let mut prompt = String::from(
        "You are a terminal assistant embedded in an SSH and shell client.\n\
        Answer questions about the user's current terminal session.\n",
    );

    if !context_snippet.trim().is_empty() {
        prompt.push_str("\nRecent terminal output:\n-----\n");
        prompt.push_str(context_snippet.trim_end());
        prompt.push_str("\n-----\n");
    }

    prompt.push_str("\nQuestion: ");
    prompt.push_str(query);
    prompt.push('\n');
    prompt.push_str(
        "\nGuidelines:\n\
        - Be concise; the user is reading this inside a terminal panel\n\
        - Prefer concrete commands over abstract advice\n\
        - Never invent output that is not in the context\n",
    );
    prompt.push_str(RESPONSE_CONTRACT);
    prompt
}

/// Builds the auto-correct prompt for a single candidate command line.
pub fn build_correction_prompt(command_line: &str) -> String {
    let mut prompt = String::from(
        "You are a shell command validator.\n\
        Check the command line below. If it contains a typo or mistake,\n\
        produce the corrected command; if it is already valid, return it\n\
        unchanged.\n",
    );
    prompt.push_str("\nCommand: ");
    prompt.push_str(command_line);
    prompt.push('\n');
    prompt.push_str(
        "\nGuidelines:\n\
        - Put a one-line explanation of what you changed (or \"looks correct\") in \"markdown\"\n\
        - Put the runnable command in \"suggestedCommand\"\n\
        - Do not add flags the user did not ask for\n",
    );
    prompt.push_str(RESPONSE_CONTRACT);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_prompt_includes_context_and_question() {
        let prompt = build_ask_prompt("why did this fail?", "make: *** [all] Error 2");
        assert!(prompt.contains("Recent terminal output:"));
        assert!(prompt.contains("make: *** [all] Error 2"));
        assert!(prompt.contains("Question: why did this fail?"));
        assert!(prompt.contains("suggestedCommand"));
    }

    #[test]
    fn test_ask_prompt_omits_empty_context_block() {
        let prompt = build_ask_prompt("what is sed?", "   ");
        assert!(!prompt.contains("Recent terminal output:"));
    }

    #[test]
    fn test_correction_prompt_carries_the_command() {
        let prompt = build_correction_prompt("grpe -r TODO src/");
        assert!(prompt.contains("Command: grpe -r TODO src/"));
        assert!(prompt.contains("corrected command"));
        assert!(prompt.contains("suggestedCommand"));
    }
}
