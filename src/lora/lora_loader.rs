//! Lora Loader
//!
//! 以文本方式输入 LoRA 名称, 通过文件名解析匹配到宿主中的 LoRA 文件后加载。
//! 未匹配到时跳过, 原样输出 model 与 clip。

use log::error;
use pyo3::{
    exceptions::PyRuntimeError,
    pyclass, pymethods,
    types::{PyDict, PyType},
    Bound, Py, PyAny, PyErr, PyResult, Python,
};

use crate::{
    core::{
        category::CATEGORY_LOADERS,
        node_base::{InputSpec, InputType},
        node_log::NodeLog,
        PromptServer,
    },
    error::Error,
    lora::{resolve, MatchLog},
    wrapper::{
        comfy::{folder_paths, nodes},
        comfyui::types::{NODE_CLIP, NODE_MODEL, NODE_STRING},
    },
};

/// 节点名称
pub const NODE_NAME: &str = "Lora Loader (Draekz)";

/// Lora Loader
#[pyclass(subclass)]
pub struct LoraLoader {}

impl PromptServer for LoraLoader {}

#[pymethods]
impl LoraLoader {
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
    fn return_types() -> (&'static str, &'static str, &'static str) {
        (NODE_MODEL, NODE_CLIP, NODE_STRING)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str, &'static str, &'static str) {
        ("MODEL", "CLIP", "lora_name")
    }

    #[classattr]
    #[pyo3(name = "OUTPUT_IS_LIST")]
    fn output_is_list() -> (bool, bool, bool) {
        (false, false, false)
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_LOADERS;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Load a LoRA by name. Accepts a full path, a path without extension, a bare file name or a partial name; skips when nothing matches."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        InputSpec::new()
            .with_required(
                "model",
                InputType::model().tooltip("The diffusion model the LoRA will be applied to."),
            )
            .with_required(
                "clip",
                InputType::clip().tooltip("The CLIP model the LoRA will be applied to."),
            )
            .with_required(
                "lora",
                InputType::string()
                    .default("")
                    .multiline(false)
                    .tooltip("LoRA name, path or part of the file name."),
            )
            .with_required(
                "strength_model",
                InputType::float()
                    .default(1.0)
                    .min(-100.0)
                    .max(100.0)
                    .step(0.01),
            )
            .with_required(
                "strength_clip",
                InputType::float()
                    .default(1.0)
                    .min(-100.0)
                    .max(100.0)
                    .step(0.01),
            )
            .build()
    }

    #[pyo3(name = "execute")]
    fn execute<'py>(
        &mut self,
        py: Python<'py>,
        model: Bound<'py, PyAny>,
        clip: Bound<'py, PyAny>,
        lora: &str,
        strength_model: f64,
        strength_clip: f64,
    ) -> PyResult<(Bound<'py, PyAny>, Bound<'py, PyAny>, String)> {
        let results = self.load_lora(py, model, clip, lora, strength_model, strength_clip);

        match results {
            Ok(v) => Ok(v),
            Err(e) => {
                error!("LoraLoader error, {e}");
                if let Err(e) = self.send_error(py, "LoraLoader".to_string(), e.to_string()) {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

impl LoraLoader {
    /// 加载LoRA
    fn load_lora<'py>(
        &self,
        py: Python<'py>,
        model: Bound<'py, PyAny>,
        clip: Bound<'py, PyAny>,
        lora: &str,
        strength_model: f64,
        strength_clip: f64,
    ) -> Result<(Bound<'py, PyAny>, Bound<'py, PyAny>, String), Error> {
        let lora_list = folder_paths::get_filename_list(py, "loras")?;
        let log = NodeLog::new(NODE_NAME);

        let Some(lora_name) =
            select_lora(lora, &lora_list, strength_model, strength_clip, Some(&log))
        else {
            return Ok((model, clip, String::new()));
        };

        let (model, clip) =
            nodes::load_lora(py, &model, &clip, &lora_name, strength_model, strength_clip)?;
        Ok((model, clip, lora_name))
    }
}

/// 选择需要加载的 LoRA
///
/// 强度都为 0 或未匹配到时返回 None
fn select_lora<S: AsRef<str>>(
    lora: &str,
    lora_list: &[S],
    strength_model: f64,
    strength_clip: f64,
    log: Option<&dyn MatchLog>,
) -> Option<String> {
    if strength_model == 0.0 && strength_clip == 0.0 {
        return None;
    }

    let lora = lora.trim();
    resolve(lora, lora_list, log).map(|resolved| resolved.path.to_string())
}
