//! ComfyUI 包装

pub mod types;
