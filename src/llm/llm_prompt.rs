//! LLM Prompt
//!
//! 使用本地 GGUF 模型扩写/改写提示词
//!
//! 模型目录: `<models>/llm_gguf`, 可通过配置 `llm.models_dir_name` 修改

use std::{
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock},
};

use log::{error, warn};
use pyo3::{
    exceptions::PyRuntimeError,
    pyclass, pymethods,
    types::{PyAnyMethods, PyDict, PyType},
    Bound, Py, PyAny, PyErr, PyResult, Python,
};

use crate::{
    core::{
        category::CATEGORY_LLM,
        node_base::{InputSpec, InputType},
        PromptServer,
    },
    error::Error,
    llm::{
        gguf::{seed_to_u32, GenerateParams, GgufModel},
        model_cache::ModelCache,
        prompt_template::{build_messages, DEFAULT_INSTRUCTIONS},
        LlmOptions,
    },
    server::{config, LlmConfig},
    wrapper::{
        comfy::folder_paths,
        comfyui::types::{NODE_DRAEKZ_LLM_CONFIG, NODE_INT_MAX, NODE_STRING},
    },
};

/// 模型扩展名
pub const GGUF_EXTENSION: &str = ".gguf";

/// 非 gguf 模型时的输出
pub const NOT_A_GGUF_MODEL: &str = "NOT A GGUF MODEL";

const DEFAULT_SEED: u64 = 1234567890;

/// 进程内共享的模型缓存, 容量在首次使用时由配置决定
static MODEL_CACHE: OnceLock<Mutex<ModelCache<GgufModel>>> = OnceLock::new();

fn model_cache(capacity: usize) -> Result<&'static Mutex<ModelCache<GgufModel>>, Error> {
    if let Some(cache) = MODEL_CACHE.get() {
        return Ok(cache);
    }
    let cache = ModelCache::new(capacity)?;
    Ok(MODEL_CACHE.get_or_init(|| Mutex::new(cache)))
}

/// 生成请求
#[derive(Debug, Clone)]
pub struct PromptRequest<'a> {
    pub text: &'a str,
    pub seed: u64,
    pub model: &'a str,
    pub max_tokens: u32,
    pub apply_instructions: bool,
    pub instructions: &'a str,
    pub options: LlmOptions,
}

/// 生成提示词
///
/// 返回 (生成内容, 原始文本)
pub fn generate(
    cache: &Mutex<ModelCache<GgufModel>>,
    models_dir: &Path,
    llm_config: &LlmConfig,
    request: &PromptRequest,
) -> Result<(String, String), Error> {
    if !request.model.ends_with(GGUF_EXTENSION) {
        warn!("{} is not a gguf model", request.model);
        return Ok((NOT_A_GGUF_MODEL.to_string(), request.text.to_string()));
    }

    let model_path = models_dir.join(request.model);
    let model = cache
        .lock()
        .map_err(|e| Error::LockError(e.to_string()))?
        .get_or_load(request.model, || {
            GgufModel::load(&model_path, llm_config.n_ctx, llm_config.n_gpu_layers)
        })?;

    let messages = build_messages(
        request.text,
        request.apply_instructions,
        request.instructions,
    );
    let params = GenerateParams {
        max_tokens: request.max_tokens,
        seed: seed_to_u32(request.seed),
        options: request.options,
    };
    let generated = model.chat(&messages, &params)?;

    Ok((generated.trim().to_string(), request.text.to_string()))
}

/// gguf 模型目录
fn gguf_models_dir(py: Python<'_>, llm_config: &LlmConfig) -> Result<PathBuf, Error> {
    Ok(folder_paths::models_dir(py)?.join(&llm_config.models_dir_name))
}

/// 当前配置中的 LLM 部分, 读取失败时使用默认值
fn llm_config(py: Python<'_>) -> LlmConfig {
    match config::get_config(py) {
        Ok(config) => config.llm,
        Err(e) => {
            warn!("read draekz config failed, use defaults, {e}");
            LlmConfig::default()
        }
    }
}

/// LLM Prompt
#[pyclass(subclass)]
pub struct LlmPrompt {}

impl PromptServer for LlmPrompt {}

#[pymethods]
impl LlmPrompt {
    #[new]
    fn new() -> Self {
        Self {}
    }

    #[classattr]
    #[pyo3(name = "INPUT_IS_LIST")]
    fn input_is_list() -> bool {
        false
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types() -> (&'static str, &'static str) {
        (NODE_STRING, NODE_STRING)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str, &'static str) {
        ("generated", "original")
    }

    #[classattr]
    #[pyo3(name = "OUTPUT_IS_LIST")]
    fn output_is_list() -> (bool, bool) {
        (false, false)
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_LLM;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Rewrite a prompt with a local GGUF language model."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        let model_list = Python::with_gil(|py| {
            let llm_config = llm_config(py);
            match gguf_models_dir(py, &llm_config) {
                Ok(dir) => folder_paths::list_files_with_extension(&dir, GGUF_EXTENSION),
                Err(e) => {
                    warn!("get gguf models dir failed, {e}");
                    Vec::new()
                }
            }
        });

        InputSpec::new()
            .with_required(
                "text",
                InputType::string()
                    .multiline(true)
                    .dynamic_prompts(true)
                    .default(""),
            )
            .with_required(
                "random_seed",
                InputType::int().default(DEFAULT_SEED).min(0).max(NODE_INT_MAX),
            )
            .with_required("model", InputType::list(model_list))
            .with_required(
                "max_tokens",
                InputType::int().default(4096).min(1).max(8192),
            )
            .with_required(
                "apply_instructions",
                InputType::bool().default(true),
            )
            .with_required(
                "instructions",
                InputType::string()
                    .multiline(false)
                    .default(DEFAULT_INSTRUCTIONS),
            )
            .with_optional("options_config", InputType::custom(NODE_DRAEKZ_LLM_CONFIG))
            .build()
    }

    #[pyo3(
        name = "execute",
        signature = (text, random_seed, model, max_tokens, apply_instructions, instructions, options_config=None)
    )]
    #[allow(clippy::too_many_arguments)]
    fn execute<'py>(
        &mut self,
        py: Python<'py>,
        text: String,
        random_seed: u64,
        model: String,
        max_tokens: u32,
        apply_instructions: bool,
        instructions: String,
        options_config: Option<Bound<'py, PyAny>>,
    ) -> PyResult<(String, String)> {
        let results = self.prompt(
            py,
            &text,
            random_seed,
            &model,
            max_tokens,
            apply_instructions,
            &instructions,
            options_config,
        );

        match results {
            Ok(v) => Ok(v),
            Err(e) => {
                error!("LlmPrompt error, {e}");
                if let Err(e) = self.send_error(py, "LlmPrompt".to_string(), e.to_string()) {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

impl LlmPrompt {
    #[allow(clippy::too_many_arguments)]
    fn prompt<'py>(
        &self,
        py: Python<'py>,
        text: &str,
        random_seed: u64,
        model: &str,
        max_tokens: u32,
        apply_instructions: bool,
        instructions: &str,
        options_config: Option<Bound<'py, PyAny>>,
    ) -> Result<(String, String), Error> {
        let options = match options_config {
            Some(options) if !options.is_none() => pythonize::depythonize::<LlmOptions>(&options)?,
            _ => LlmOptions::default(),
        };

        let llm_config = llm_config(py);
        let models_dir = gguf_models_dir(py, &llm_config)?;
        let cache = model_cache(llm_config.cache_capacity)?;

        let request = PromptRequest {
            text,
            seed: random_seed,
            model,
            max_tokens,
            apply_instructions,
            instructions,
            options,
        };

        // 推理耗时较长, 期间释放 GIL
        py.allow_threads(|| generate(cache, &models_dir, &llm_config, &request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(model: &str) -> PromptRequest<'_> {
        PromptRequest {
            text: "a knight fighting a dragon",
            seed: DEFAULT_SEED,
            model,
            max_tokens: 64,
            apply_instructions: true,
            instructions: DEFAULT_INSTRUCTIONS,
            options: LlmOptions::default(),
        }
    }

    #[test]
    fn test_not_a_gguf_model() -> anyhow::Result<()> {
        let cache = Mutex::new(ModelCache::new(1)?);
        let dir = tempfile::tempdir()?;

        let results = generate(&cache, dir.path(), &LlmConfig::default(), &request("model.bin"))?;
        assert_eq!(
            results,
            (
                NOT_A_GGUF_MODEL.to_string(),
                "a knight fighting a dragon".to_string()
            )
        );

        // 不会尝试加载
        assert!(cache.lock().map(|c| c.is_empty()).unwrap_or(false));
        Ok(())
    }

    #[test]
    fn test_missing_model_is_error() -> anyhow::Result<()> {
        let cache = Mutex::new(ModelCache::new(1)?);
        let dir = tempfile::tempdir()?;

        let results = generate(&cache, dir.path(), &LlmConfig::default(), &request("missing.gguf"));
        assert!(matches!(results, Err(Error::FileNotFound(_))));
        assert!(cache.lock().map(|c| c.is_empty()).unwrap_or(false));
        Ok(())
    }
}
