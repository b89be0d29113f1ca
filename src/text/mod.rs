//! 文本相关的节点

use pyo3::{
    types::{PyModule, PyModuleMethods},
    Bound, PyResult, Python,
};

use crate::core::node::NodeRegister;

mod json_get_value;
pub use json_get_value::{get_value, JsonGetValue};

/// 文本模块
pub fn submodule(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let submodule = PyModule::new(py, "text")?;
    submodule.add_class::<JsonGetValue>()?;
    Ok(submodule)
}

/// Text node register
pub fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let nodes: Vec<NodeRegister> = vec![NodeRegister(
        "JSON Get Value (Draekz)",
        py.get_type::<JsonGetValue>(),
        "JSON Get Value (Draekz)",
    )];
    Ok(nodes)
}
