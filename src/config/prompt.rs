//! Compiled-in persona: the system instruction sent with every request and
//! the fixed replies the rest of the crate matches against.

pub const SUBJECTS: [&str; 5] = ["Mathematics", "Statistics", "PMS", "IT Skills", "FEEE"];

pub const REFUSAL_REPLY: &str = "**Sorry, I can answer only DCET related questions.**";

pub const NOT_FOUND_REPLY: &str = "**I couldn't find the answer in the uploaded material.**";

pub const BUSY_REPLY: &str =
    "**The server is busy right now. Please try again in a few moments.**";

pub const ATTRIBUTION_MARKER: &str = "Credits: Created by";

pub const ATTRIBUTION_LINE: &str = "Credits: Created by TTT JNAN Team";

pub const RETRY_STATUS: &str = "Server is busy, please wait... retrying";

/// Prompt sent when the user attaches an image without any text.
pub const IMAGE_ONLY_PROMPT: &str = "Analyze this image for DCET content.";

/// Stored content of an image-only user message.
pub const IMAGE_ONLY_CONTENT: &str = "[Attached Image Analysis]";

/// Models tried in order of preference.
pub const MODEL_CHAIN: [&str; 3] = ["gemini-2.5-flash", "gemini-2.0-flash", "gemini-2.0-flash-lite"];

const RESOURCE_LINKS: &str = "\
Official Subject Resources:
- FEEE: https://jumpshare.com/s/qGOpx46uQdG5pswO0DY5
- IT SKILLS: https://jumpshare.com/share/6J1rRbyUfGN3ZXfis0nQ
- MATHS: https://jumpshare.com/share/DZApe66DKJzOWtjwclhN
- STATISTICS: https://jumpshare.com/share/Qp7UWMZwfjpjXAvikK02
- PMS: https://jumpshare.com/share/GW05ZQGSeo5FxbT6CyCa";

/// Fixed text replies and the attribution rule, passed around as a value so
/// post-processing does not depend on the wording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRules {
    pub refusal: String,
    pub not_found: String,
    pub busy: String,
    pub attribution_marker: String,
    pub attribution_line: String,
    pub retry_status: String,
}

impl Default for ReplyRules {
    fn default() -> Self {
        Self {
            refusal: REFUSAL_REPLY.to_string(),
            not_found: NOT_FOUND_REPLY.to_string(),
            busy: BUSY_REPLY.to_string(),
            attribution_marker: ATTRIBUTION_MARKER.to_string(),
            attribution_line: ATTRIBUTION_LINE.to_string(),
            retry_status: RETRY_STATUS.to_string(),
        }
    }
}

pub fn system_instruction(rules: &ReplyRules) -> String {
    format!(
        "You are \"TTT JNAN ChatBot\".

MAIN PURPOSE:
Answer ONLY using the text that exists inside the JNAN DCET Repository (your internal knowledge source) and the provided Official Subject Resources. Do NOT mention other sources, links, or backend details. Do NOT ask users to upload files.

SUBJECTS: {subjects}.

RESOURCE KNOWLEDGE:
{links}
If a user asks for study material or resources for these subjects, provide the corresponding link from the list above.

CONTENT RULES:
1. Only DCET / Diploma related answers.
2. If the question is unrelated, reply exactly: \"{refusal}\"
3. If the answer does not exist in the Repository or resources, reply exactly: \"{not_found}\"
4. NO guessing. NO outside knowledge. NO internet search.
5. Copy text as close to the original as possible.

FORMATTING RULES:
1. Use bold (double asterisks) only for key terms, headings and final answers. Never bold the whole reply.
2. Never write math with dollar signs or LaTeX delimiters.
3. Write math the way a textbook prints it, using Unicode symbols such as ×, ÷, √, π, ², ³, ≤, ≥, ≠, ∞ and °.
4. No emojis. No small talk. Stay formal and focused on DCET only.

ATTRIBUTION:
End every reply with this exact line on its own, after a blank line:
{attribution}",
        subjects = SUBJECTS.join(", "),
        links = RESOURCE_LINKS,
        refusal = rules.refusal,
        not_found = rules.not_found,
        attribution = rules.attribution_line
    )
}

/// Prefixes `input` with `In <subject>: `, replacing any subject prefix
/// already present.
pub fn with_subject_prefix(subject: &str, input: &str) -> String {
    let mut rest = input;
    for known in SUBJECTS {
        let old_prefix = format!("In {}: ", known);
        if let Some(stripped) = rest.strip_prefix(old_prefix.as_str()) {
            rest = stripped;
        }
    }
    format!("In {}: {}", subject, rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_carries_fixed_replies_verbatim() {
        let rules = ReplyRules::default();
        let instruction = system_instruction(&rules);
        assert!(instruction.contains(REFUSAL_REPLY));
        assert!(instruction.contains(NOT_FOUND_REPLY));
        assert!(instruction.contains(ATTRIBUTION_LINE));
        assert!(instruction.contains("FEEE"));
    }

    #[test]
    fn attribution_line_contains_marker() {
        assert!(ATTRIBUTION_LINE.contains(ATTRIBUTION_MARKER));
    }

    #[test]
    fn subject_prefix_replaces_previous_one() {
        assert_eq!(with_subject_prefix("PMS", "What is a gear?"), "In PMS: What is a gear?");
        assert_eq!(
            with_subject_prefix("Statistics", "In Mathematics: define mean"),
            "In Statistics: define mean"
        );
    }
}
