//! 分辨率缩放

use pyo3::{
    pyclass, pymethods,
    types::{PyDict, PyType},
    Bound, Py, PyResult,
};

use crate::{
    core::{
        category::CATEGORY_UTILS,
        node_base::{InputSpec, InputType},
    },
    wrapper::comfyui::types::{MAX_RESOLUTION, NODE_INT},
};

/// 宽高乘以倍数, 截断小数
pub fn multiply(width: i64, height: i64, multiplier: f64) -> (i64, i64) {
    (
        (width as f64 * multiplier) as i64,
        (height as f64 * multiplier) as i64,
    )
}

/// 分辨率缩放
#[pyclass(subclass)]
pub struct ResolutionMultiply {}

#[pymethods]
impl ResolutionMultiply {
    #[new]
    fn new() -> Self {
        Self {}
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types() -> (&'static str, &'static str) {
        (NODE_INT, NODE_INT)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str, &'static str) {
        ("width", "height")
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_UTILS;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Multiply width and height by a factor."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        InputSpec::new()
            .with_required(
                "width",
                InputType::int()
                    .default(1024)
                    .min(16)
                    .max(MAX_RESOLUTION)
                    .force_input(true),
            )
            .with_required(
                "height",
                InputType::int()
                    .default(1024)
                    .min(16)
                    .max(MAX_RESOLUTION)
                    .force_input(true),
            )
            .with_required(
                "multiplier",
                InputType::float().default(1.5).min(0.1).max(16.0).step(0.1),
            )
            .build()
    }

    #[pyo3(name = "execute")]
    fn execute(&self, width: i64, height: i64, multiplier: f64) -> (i64, i64) {
        multiply(width, height, multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiply() {
        assert_eq!(multiply(1024, 768, 1.5), (1536, 1152));
        assert_eq!(multiply(1000, 333, 0.5), (500, 166));
        assert_eq!(multiply(832, 1216, 1.0), (832, 1216));
    }
}
