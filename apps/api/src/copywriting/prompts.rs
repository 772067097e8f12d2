// Prompt text for marketing copy.

/// System prompt: who the model is writing for.
pub const COPY_SYSTEM: &str = "You are an advertising copy generator for a cleaning company.";

/// User prompt template. Replace `{requirement}` before sending.
pub const COPY_PROMPT_TEMPLATE: &str = "\
Write a piece of promotional copy based on the following requirement. \
It must be at least 90 words long.
{requirement}
Do not repeat the requirement itself in the result, and do not leave any \
placeholders that would need to be filled in. Keep the tone natural rather \
than mechanical or stiff.";

pub fn build_copy_prompt(requirement: &str) -> String {
    COPY_PROMPT_TEMPLATE.replace("{requirement}", requirement.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_copy_prompt_inserts_requirement() {
        let prompt = build_copy_prompt("  Today's end-of-lease clean is finished. ");
        assert!(prompt.contains("\nToday's end-of-lease clean is finished.\n"));
        assert!(prompt.contains("at least 90 words"));
        assert!(!prompt.contains("{requirement}"));
    }
}
