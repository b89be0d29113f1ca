//! LLM 采样参数

use log::error;
use pyo3::{
    exceptions::PyRuntimeError,
    pyclass, pymethods,
    types::{PyDict, PyType},
    Bound, Py, PyAny, PyErr, PyResult, Python,
};
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        category::CATEGORY_LLM,
        node_base::{InputSpec, InputType},
        PromptServer,
    },
    error::Error,
    wrapper::comfyui::types::NODE_DRAEKZ_LLM_CONFIG,
};

/// 采样参数
///
/// 反序列化时缺失的字段使用默认值, 多余的字段忽略
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmOptions {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: i32,
    pub repeat_penalty: f64,
}

impl Default for LlmOptions {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.9,
            top_k: 50,
            repeat_penalty: 1.2,
        }
    }
}

/// LLM Options
#[pyclass(subclass)]
pub struct LlmOptionsNode {}

impl PromptServer for LlmOptionsNode {}

#[pymethods]
impl LlmOptionsNode {
    #[new]
    fn new() -> Self {
        Self {}
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types() -> (&'static str,) {
        (NODE_DRAEKZ_LLM_CONFIG,)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str,) {
        ("options_config",)
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_LLM;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Sampling options for the LLM Prompt node."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        let defaults = LlmOptions::default();
        InputSpec::new()
            .with_required(
                "temperature",
                InputType::float()
                    .default(defaults.temperature)
                    .min(0.1)
                    .step(0.05),
            )
            .with_required(
                "top_p",
                InputType::float().default(defaults.top_p).min(0.1).step(0.05),
            )
            .with_required("top_k", InputType::int().default(defaults.top_k).min(0))
            .with_required(
                "repetition_penalty",
                InputType::float()
                    .default(defaults.repeat_penalty)
                    .min(0.1)
                    .step(0.05),
            )
            .build()
    }

    #[pyo3(name = "execute")]
    fn execute<'py>(
        &self,
        py: Python<'py>,
        temperature: f64,
        top_p: f64,
        top_k: i32,
        repetition_penalty: f64,
    ) -> PyResult<(Bound<'py, PyAny>,)> {
        let options = LlmOptions {
            temperature,
            top_p,
            top_k,
            repeat_penalty: repetition_penalty,
        };

        let results = pythonize::pythonize(py, &options).map_err(Error::from);
        match results {
            Ok(v) => Ok((v,)),
            Err(e) => {
                error!("LlmOptions error, {e}");
                if let Err(e) = self.send_error(py, "LlmOptions".to_string(), e.to_string()) {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_options_keep_defaults() -> anyhow::Result<()> {
        let options: LlmOptions =
            serde_json::from_str(r#"{"temperature": 0.7, "unknown": "ignored"}"#)?;
        assert_eq!(
            options,
            LlmOptions {
                temperature: 0.7,
                ..LlmOptions::default()
            }
        );
        Ok(())
    }

    #[test]
    fn test_serialized_keys() -> anyhow::Result<()> {
        let value = serde_json::to_value(LlmOptions::default())?;
        let keys: Vec<&str> = value
            .as_object()
            .map(|o| o.keys().map(String::as_str).collect())
            .unwrap_or_default();
        assert_eq!(keys, vec!["temperature", "top_p", "top_k", "repeat_penalty"]);
        Ok(())
    }
}
