//! Fixed prompt and notice text for the writing assistant.

/// System instruction sent with every chat and search request.
pub const SYSTEM_PROMPT: &str = "你是中文小说创作助手。\n\
    你与用户进行多轮对话，帮助完善故事设定、剧情结构与写作表达。\n\
    回答要具体可执行，优先给可直接复制到编辑框的文字。\n";

/// Reply recorded and shown whenever no usable backend reply was produced.
pub const FALLBACK_REPLY: &str = "我没能生成有效回复，你可以换个问法再试一次。";

/// First fragment emitted on the search route, before the blocking call.
pub const SEARCH_NOTICE: &str = "正在搜索…\n";
