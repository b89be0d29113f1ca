//! 类型定义
//! 相关节点定义: ComfyUI/comfy/comfy_types/node_typing.py

pub const NODE_INT: &str = "INT";
pub const NODE_FLOAT: &str = "FLOAT";
pub const NODE_STRING: &str = "STRING";
pub const NODE_BOOLEAN: &str = "BOOLEAN";
pub const NODE_MODEL: &str = "MODEL";
pub const NODE_CLIP: &str = "CLIP";

/// LLM 采样参数, 由 LLM Options 节点输出
pub const NODE_DRAEKZ_LLM_CONFIG: &str = "DRAEKZLLMCONFIG";

pub const NODE_INT_MAX: u64 = 0xffffffffffffffffu64;

/// 最大分辨率
pub const MAX_RESOLUTION: i64 = 8192;
