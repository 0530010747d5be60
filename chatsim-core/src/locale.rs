//! User-facing failure messages.

use crate::config::Language;

/// Message shown when a generation fails for any reason other than an
/// unresolved character.
pub fn generation_failed(language: Language) -> String {
    match language {
        Language::Zh => "生成对话失败".to_string(),
        Language::En => "Failed to generate conversation".to_string(),
    }
}

/// Message naming a character the resolver has no information about.
pub fn character_not_found(language: Language, name: &str) -> String {
    match language {
        Language::Zh => format!("没有找到{}这个人的信息，请换一个人试试", name),
        Language::En => format!("No information found about {}, please try someone else", name),
    }
}
