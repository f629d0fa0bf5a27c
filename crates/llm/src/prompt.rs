//! Tier-3/Tier-4 prompt templates and the category validator prompt
//! (spec §4.6, §6). The LLM is never given category/location lists; its
//! output is only a hint re-resolved against the catalog by `DbMatcher`.

/// ≤ ~40-token system message (spec §6 "Tier-3 prompt").
pub const TIER3_SYSTEM_PROMPT: &str = "Extract {category, location, transaction} as JSON from a classifieds \
search phrase (Arabic or English). بدي/أريد/ابغى mean \"want\"; وين/فين mean \"where\"; \
مطلوب means a service-wanted request. Unknown fields are null. Output JSON only.";

/// ~60-token system message (spec §6 "Tier-4 prompt"), extended with
/// `attributes`.
pub const TIER4_SYSTEM_PROMPT: &str = "Extract {category, location, transaction, attributes} as JSON from a \
classifieds search phrase (Arabic or English). attributes may include year, rooms, condition, price, area. \
بدي/أريد/ابغى mean \"want\"; وين/فين mean \"where\"; مطلوب means a service-wanted request. \
Unknown fields are null. Output JSON only, no prose.";

pub const VALIDATOR_SYSTEM_PROMPT: &str =
    "Answer yes or no only: is the given category an appropriate match for the search phrase?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Role::System => "system",
            Role::User => "user",
        })
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

pub fn hint_messages(system_prompt: &str, utterance: &str) -> Vec<Message> {
    vec![
        Message { role: Role::System, content: system_prompt.to_string() },
        Message { role: Role::User, content: utterance.to_string() },
    ]
}

pub fn validator_messages(utterance: &str, category_name: &str) -> Vec<Message> {
    vec![
        Message { role: Role::System, content: VALIDATOR_SYSTEM_PROMPT.to_string() },
        Message {
            role: Role::User,
            content: format!("Phrase: \"{utterance}\"\nCategory: \"{category_name}\""),
        },
    ]
}
