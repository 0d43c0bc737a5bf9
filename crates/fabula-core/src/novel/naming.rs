//! Character name generation.

use serde::Deserialize;
use tracing::warn;

use crate::llm::backend::ChatBackend;
use crate::llm::json::extract_json;

/// Strict shape for the naming model's reply.
#[derive(Debug, Deserialize)]
struct NameReply {
    name: String,
}

/// Ask the chat backend for one character name.
///
/// `None` means no usable name came back; callers pick the failure surface.
/// Empty gender/style fall back to the product defaults (男 / 仙侠).
pub async fn generate_name<C: ChatBackend>(
    backend: &C,
    gender: &str,
    style: &str,
    description: &str,
) -> Option<String> {
    let gender = non_empty_or(gender, "男");
    let style = non_empty_or(style, "仙侠");
    let description = description.trim();

    let prompt = format!(
        "你是中文小说取名助手。\n\
         小说风格：{style}\n\
         性别：{gender}\n\
         名字说明：{}\n\
         \n\
         请生成1个名字，要求：\n\
         1) 更像人名，可带少量姓氏，不要生僻到难读\n\
         2) 贴合风格与说明（如果有说明）\n\
         3) 只输出JSON，不要输出任何多余文本\n\
         JSON格式：{{\"name\":\"...\"}}\n",
        if description.is_empty() {
            "无"
        } else {
            description
        },
    );

    let text = match backend.chat_once(&prompt).await {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err, "naming call failed");
            return None;
        }
    };

    let Some(value) = extract_json(&text) else {
        warn!("naming reply is not JSON");
        return None;
    };
    match serde_json::from_value::<NameReply>(value) {
        Ok(reply) if !reply.name.trim().is_empty() => Some(reply.name.trim().to_string()),
        _ => {
            warn!("naming reply has no usable name field");
            None
        }
    }
}

fn non_empty_or<'a>(value: &'a str, default: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { default } else { trimmed }
}
