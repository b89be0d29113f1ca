//! 本地 LLM 提示词

use pyo3::{
    types::{PyModule, PyModuleMethods},
    Bound, PyResult, Python,
};

use crate::core::node::NodeRegister;

mod gguf;
pub use gguf::{GenerateParams, GgufModel, DEFAULT_N_CTX, DEFAULT_N_GPU_LAYERS};

mod model_cache;
pub use model_cache::ModelCache;

mod prompt_template;
pub use prompt_template::{build_messages, render_request, Message, Role, DEFAULT_INSTRUCTIONS};

mod llm_options;
pub use llm_options::{LlmOptions, LlmOptionsNode};

mod llm_prompt;
pub use llm_prompt::LlmPrompt;

/// LLM 模块
pub fn submodule(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let submodule = PyModule::new(py, "llm")?;
    submodule.add_class::<LlmOptionsNode>()?;
    submodule.add_class::<LlmPrompt>()?;
    Ok(submodule)
}

/// LLM node register
pub fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let nodes: Vec<NodeRegister> = vec![
        NodeRegister(
            "LLM Prompt (Draekz)",
            py.get_type::<LlmPrompt>(),
            "LLM Prompt (Draekz)",
        ),
        NodeRegister(
            "LLM Options (Draekz)",
            py.get_type::<LlmOptionsNode>(),
            "LLM Options (Draekz)",
        ),
    ];
    Ok(nodes)
}
