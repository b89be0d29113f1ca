pub mod core;
pub mod error;
pub mod server;
pub mod wrapper;

pub mod image;
pub mod llm;
pub mod lora;
pub mod text;

use pyo3::{
    pymodule,
    types::{PyDict, PyDictMethods, PyModule, PyModuleMethods},
    Bound, PyResult, Python,
};

use crate::core::node::NodeRegister;

/// A Python module implemented in Rust.
#[pymodule]
#[pyo3(name = "comfyui_draekz_nodez")] // 需要与包名保持一致
fn py_init(py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    // 初始化日志
    // 每个扩展模块都有自己的全局变量，因此所使用的记录器也与其他 Rust 原生扩展无关。
    let _ = tracing_subscriber::fmt()
        .with_ansi(true)
        .with_max_level(tracing::Level::DEBUG)
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .try_init();

    // 路由函数
    server::add_functions(m)?;

    // 添加子模块
    m.add_submodule(&lora::submodule(py)?)?;
    m.add_submodule(&image::submodule(py)?)?;
    m.add_submodule(&text::submodule(py)?)?;
    m.add_submodule(&llm::submodule(py)?)?;

    // 注册 ComfyUI NODE_CLASS_MAPPINGS/NODE_DISPLAY_NAME_MAPPINGS
    let node_mapping = PyDict::new(py);
    let name_mapping = PyDict::new(py);

    let nodes = node_register(py)?;
    for node in nodes {
        node_mapping.set_item(node.0, node.1)?;
        name_mapping.set_item(node.0, node.2)?;
    }

    m.add("NODE_CLASS_MAPPINGS", node_mapping)?;
    m.add("NODE_DISPLAY_NAME_MAPPINGS", name_mapping)?;
    Ok(())
}

/// 节点注册
fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let mut nodes: Vec<NodeRegister> = Vec::new();
    nodes.extend(lora::node_register(py)?);
    nodes.extend(text::node_register(py)?);
    nodes.extend(image::node_register(py)?);
    nodes.extend(llm::node_register(py)?);
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use pyo3::types::PyAnyMethods;

    use super::*;

    #[test]
    fn test_module_exports() -> anyhow::Result<()> {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let m = PyModule::new(py, "comfyui_draekz_nodez")?;
            py_init(py, &m)?;

            let nodes = m.getattr("NODE_CLASS_MAPPINGS")?;
            let names = m.getattr("NODE_DISPLAY_NAME_MAPPINGS")?;
            assert_eq!(nodes.len()?, 7);
            assert_eq!(names.len()?, 7);
            assert!(nodes.contains("Lora Loader (Draekz)")?);
            assert!(nodes.contains("LLM Prompt (Draekz)")?);

            // 不附带前端资源
            assert!(!m.hasattr("WEB_DIRECTORY")?);
            assert!(m.hasattr("register_routes")?);
            Ok(())
        })
    }
}
