//! 错误处理

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // 标准库错误处理
    #[error("io error, {0}")]
    Io(std::io::Error),
    #[error("ffi error, {0}")]
    FfiNulError(#[from] std::ffi::NulError),
    #[error("num error, {0}")]
    TryFromIntError(#[from] std::num::TryFromIntError),
    // std::sync::poison::rwlock
    #[error("lock error, {0}")]
    LockError(String),
    #[error("strum error, {0}")]
    ParseEnumString(String),

    #[error("serde json error, {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("llama_cpp_2 error, {0}")]
    LlamaCppError(#[from] llama_cpp_2::LlamaCppError),
    #[error("llama_cpp_2 error, {0}")]
    LlamaCppModelLoadError(#[from] llama_cpp_2::LlamaModelLoadError),
    #[error("llama_cpp_2 error, {0}")]
    LlamaCppContextLoadError(#[from] llama_cpp_2::LlamaContextLoadError),
    #[error("llama_cpp_2 error, {0}")]
    LlamaCppStringToTokenError(#[from] llama_cpp_2::StringToTokenError),
    #[error("llama_cpp_2 error, {0}")]
    LlamaCppBatchAddError(#[from] llama_cpp_2::llama_batch::BatchAddError),
    #[error("llama_cpp_2 error, {0}")]
    LlamaCppDecodeError(#[from] llama_cpp_2::DecodeError),
    #[error("llama_cpp_2 error, {0}")]
    LlamaCppTokenToStringError(#[from] llama_cpp_2::TokenToStringError),
    #[error("llama_cpp_2 error, {0}")]
    LlamaCppNewLlamaChatMessageError(#[from] llama_cpp_2::NewLlamaChatMessageError),
    #[error("llama_cpp_2 error, {0}")]
    LlamaCppApplyChatTemplateError(#[from] llama_cpp_2::ApplyChatTemplateError),

    #[error("py error, {0}")]
    PyErr(#[from] pyo3::PyErr),
    #[error("pythonize error, {0}")]
    PythonizeError(#[from] pythonize::PythonizeError),

    #[error("invalid config key, {0}")]
    InvalidConfigKey(String),
    #[error("invalid config value, {0}")]
    InvalidConfigValue(String),
    #[error("file not found, {0}")]
    FileNotFound(String),
    #[error("invalid input, {0}")]
    InvalidInput(String),
    #[error("cache capacity must be greater than zero")]
    ZeroCacheCapacity,
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
