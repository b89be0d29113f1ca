//! LoRA

use pyo3::{
    types::{PyModule, PyModuleMethods},
    Bound, PyResult, Python,
};

use crate::core::node::NodeRegister;

mod resolver;
pub use resolver::{basename, resolve, stem, strip_extension, MatchLog, MatchStrategy, Resolved};

mod lora_loader;
pub use lora_loader::LoraLoader;

/// LoRA 模块
pub fn submodule(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let submodule = PyModule::new(py, "lora")?;
    submodule.add_class::<LoraLoader>()?;
    Ok(submodule)
}

/// LoRA node register
pub fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let nodes: Vec<NodeRegister> = vec![NodeRegister(
        "Lora Loader (Draekz)",
        py.get_type::<LoraLoader>(),
        "Lora Loader (Draekz)",
    )];
    Ok(nodes)
}
