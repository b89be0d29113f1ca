//! 分辨率

use pyo3::{
    types::{PyModule, PyModuleMethods},
    Bound, PyResult, Python,
};

use crate::core::node::NodeRegister;

mod resolutions;
pub use resolutions::{parse_resolution, preset_labels, Resolutions};

mod resolution_by_ratio;
pub use resolution_by_ratio::{resolution_by_ratio, AspectRatio, Direction, ResolutionByRatio};

mod resolution_multiply;
pub use resolution_multiply::ResolutionMultiply;

/// 分辨率模块
pub fn submodule(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let submodule = PyModule::new(py, "image")?;
    submodule.add_class::<Resolutions>()?;
    submodule.add_class::<ResolutionByRatio>()?;
    submodule.add_class::<ResolutionMultiply>()?;
    Ok(submodule)
}

/// Image node register
pub fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let nodes: Vec<NodeRegister> = vec![
        NodeRegister(
            "Resolutions (Draekz)",
            py.get_type::<Resolutions>(),
            "Resolutions (Draekz)",
        ),
        NodeRegister(
            "Resolution By Ratio (Draekz)",
            py.get_type::<ResolutionByRatio>(),
            "Resolution By Ratio (Draekz)",
        ),
        NodeRegister(
            "Resolution Multiply (Draekz)",
            py.get_type::<ResolutionMultiply>(),
            "Resolution Multiply (Draekz)",
        ),
    ];
    Ok(nodes)
}
