//! Prompt construction for the two generation stages.
//!
//! Both builders are pure: they render the user-turn instruction from typed
//! inputs and never fail. The instruction follows the configured
//! [`Language`]; the system turn is fixed, see [`SYSTEM_PERSONA`].

use chatsim_core::{Character, CharacterInfo, Language, UNKNOWN_SENTINEL};
use serde_json::{Value, json};

/// Neutral persona sent as the system turn of every exchange.
pub const SYSTEM_PERSONA: &str = "You are a helpful assistant.";

/// Instruction asking for one info object per character, in input order.
pub fn character_info_prompt(characters: &[Character], language: Language) -> String {
    let names = Value::from(
        characters
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>(),
    );
    let count = characters.len();

    match language {
        Language::Zh => format!(
            "关于这些人名{names}，你需要返回他们的简介和身上的一些著名桥段和著名的梗。\n\
返回严格用json数组格式，不要输出其他内容。数组必须正好有{count}个元素，顺序与上面的人名一致，\
每个元素的格式为{{\"name\":\"xxx\",\"description\":\"xxxxx\",\"story\":[\"xxx\",\"xxx\",\"xxx\"]}}。\n\
如果你的知识库里没有这个人的信息，不要捏造，也不要虚构，该位置直接固定返回字符串\"{UNKNOWN_SENTINEL}\"。"
        ),
        Language::En => format!(
            "For each of these people {names}, give a short introduction plus the famous \
episodes, stories and running jokes associated with them.\n\
Respond with a strict JSON array and nothing else. The array must have exactly \
{count} elements, in the same order as the names above. Each element is an object \
of the form {{\"name\":\"xxx\",\"description\":\"xxxxx\",\"story\":[\"xxx\",\"xxx\",\"xxx\"]}}.\n\
If your knowledge base has no information about a person, do not make anything up \
and do not invent facts: return the string \"{UNKNOWN_SENTINEL}\" as that person's element instead."
        ),
    }
}

/// Instruction asking for a chat among the resolved characters.
pub fn conversation_prompt(infos: &[CharacterInfo], rounds: u32, language: Language) -> String {
    let profiles = infos
        .iter()
        .enumerate()
        .map(|(index, info)| {
            let position = index + 1;
            let profile = profile(info);
            match language {
                Language::Zh => format!("第{position}个人的信息是：{profile:#}"),
                Language::En => format!("Person {position} is: {profile:#}"),
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let example = "[\n\
{\"name\":\"xxx\",\"content\":\"xxxxxxxxxxxx\"},\n\
{\"name\":\"xxx\",\"content\":\"xxxxxxxxxxxx\"},\n\
...\n\
]";

    match language {
        Language::Zh => format!(
            "接下来我会给你一些人的信息，你需要根据他们的信息，想象他们使用微信聊天时的对话内容。\
整体对话的氛围是幽默和调侃，用词通俗直白，但表达的内容又不失犀利。要求对话的轮数不少于{rounds}轮。\n\
返回严格用json数组格式，不要输出其他内容，返回示例:\n\
{example}\n\
{profiles}\n"
        ),
        Language::En => format!(
            "Below is information about some people. Based on it, imagine the conversation \
they would have in a group chat on a messaging app. The overall mood is humorous and \
teasing, the wording casual and plain, but what they say stays sharp and pointed. \
The conversation must have at least {rounds} turns.\n\
Respond with a strict JSON array and nothing else, for example:\n\
{example}\n\
{profiles}\n"
        ),
    }
}

fn profile(info: &CharacterInfo) -> Value {
    json!({
        "name": info.name,
        "description": info.description,
        "story": info.story,
    })
}
