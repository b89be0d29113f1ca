//! 文件夹路径
//!
//! 对宿主 `folder_paths` 模块的封装, 文件索引由 ComfyUI 维护

use std::path::{Path, PathBuf};

use log::warn;
use pyo3::{types::PyAnyMethods, Python};
use walkdir::WalkDir;

use crate::error::Error;

/// 获取文件名列表
///
/// 如: folder_paths.get_filename_list("loras")
pub fn get_filename_list(py: Python<'_>, folder_name: &str) -> Result<Vec<String>, Error> {
    let files = py
        .import("folder_paths")?
        .call_method1("get_filename_list", (folder_name,))?
        .extract::<Vec<String>>()?;
    Ok(files)
}

/// 模型目录
pub fn models_dir(py: Python<'_>) -> Result<PathBuf, Error> {
    let dir = py
        .import("folder_paths")?
        .getattr("models_dir")?
        .extract::<String>()?;
    Ok(PathBuf::from(dir))
}

/// 用户目录
pub fn get_user_directory(py: Python<'_>) -> Result<PathBuf, Error> {
    let dir = py
        .import("folder_paths")?
        .call_method0("get_user_directory")?
        .extract::<String>()?;
    Ok(PathBuf::from(dir))
}

/// 列出目录下 (不递归) 指定扩展名的文件, 按名称排序
///
/// 目录不存在时返回空列表
pub fn list_files_with_extension(dir: &Path, extension: &str) -> Vec<String> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(v) => v,
            Err(e) => {
                warn!("read dir entry failed, {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(extension) {
            files.push(name);
        }
    }
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_list_files_with_extension() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("qwen.gguf"), b"")?;
        fs::write(dir.path().join("llama.gguf"), b"")?;
        fs::write(dir.path().join("readme.md"), b"")?;
        fs::create_dir(dir.path().join("nested.gguf"))?;
        fs::write(dir.path().join("nested.gguf").join("inner.gguf"), b"")?;

        let files = list_files_with_extension(dir.path(), ".gguf");
        assert_eq!(files, vec!["llama.gguf", "qwen.gguf"]);
        Ok(())
    }

    #[test]
    fn test_missing_dir() {
        let files = list_files_with_extension(Path::new("/definitely/not/here"), ".gguf");
        assert!(files.is_empty());
    }
}
