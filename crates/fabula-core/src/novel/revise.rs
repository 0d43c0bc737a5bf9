//! Model-assisted rewrite of novel field text.

use tracing::warn;

use crate::llm::backend::ChatBackend;

/// Rewrite `original` for the named field, honoring an optional user
/// instruction. Any failure or empty model output returns the original
/// text unchanged -- the caller never sees an error.
pub async fn optimize_text<C: ChatBackend>(
    backend: &C,
    original: &str,
    instruction: &str,
    field: &str,
) -> String {
    let resolved_original = original.trim();
    let resolved_instruction = instruction.trim();
    let resolved_field = field.trim();

    let prompt = format!(
        "你是网文小说编辑助手。\n\
         目标字段：{}\n\
         原文：\n{}\n\
         用户要求：\n{}\n\
         请优化原文，保持关键信息与风格一致，表达更清晰有张力。\n\
         只输出优化后的文本，不要输出解释或多余内容。\n",
        if resolved_field.is_empty() {
            "未指定"
        } else {
            resolved_field
        },
        if resolved_original.is_empty() {
            "无"
        } else {
            resolved_original
        },
        if resolved_instruction.is_empty() {
            "无"
        } else {
            resolved_instruction
        },
    );

    match backend.chat_once(&prompt).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            warn!(field = resolved_field, "optimizer returned empty text, keeping original");
            resolved_original.to_string()
        }
        Err(err) => {
            warn!(field = resolved_field, error = %err, "optimize call failed, keeping original");
            resolved_original.to_string()
        }
    }
}
