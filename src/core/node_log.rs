//! 节点日志
//!
//! 日志统一带上节点名称前缀, 便于在 ComfyUI 控制台中定位

use log::{info, warn};

use crate::lora::MatchLog;

/// 日志前缀
const LOG_PREFIX: &str = "[Draekz]";

/// 带节点名称的日志记录器
#[derive(Debug, Clone, Copy)]
pub struct NodeLog<'a> {
    node: &'a str,
}

impl<'a> NodeLog<'a> {
    pub fn new(node: &'a str) -> Self {
        Self { node }
    }

    /// 格式化日志内容
    pub fn format(&self, message: &str) -> String {
        format!("{LOG_PREFIX} {}: {message}", self.node)
    }

    pub fn info(&self, message: &str) {
        info!("{}", self.format(message));
    }

    pub fn warn(&self, message: &str) {
        warn!("{}", self.format(message));
    }
}

impl MatchLog for NodeLog<'_> {
    fn info(&self, message: &str) {
        NodeLog::info(self, message);
    }

    fn warn(&self, message: &str) {
        NodeLog::warn(self, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        let log = NodeLog::new("Lora Loader (Draekz)");
        assert_eq!(
            log.format("Lora \"x\" not found, skipping."),
            "[Draekz] Lora Loader (Draekz): Lora \"x\" not found, skipping."
        );
    }
}
