//! 节点分类

/// 实用工具
pub const CATEGORY_UTILS: &str = "Draekz/Utils";
/// 加载器
pub const CATEGORY_LOADERS: &str = "Draekz/Loaders";
/// 大语言模型
pub const CATEGORY_LLM: &str = "Draekz/LLM";
