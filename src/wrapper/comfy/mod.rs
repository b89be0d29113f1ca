//! comfy 包装

pub mod folder_paths;
pub mod nodes;
