//! comfy 内置节点 (nodes.py)

use pyo3::{types::PyAnyMethods, Bound, PyAny, Python};

use crate::error::Error;

/// nodes.LoraLoader().load_lora
///
/// 返回 (model, clip)
pub fn load_lora<'py>(
    py: Python<'py>,
    model: &Bound<'py, PyAny>,
    clip: &Bound<'py, PyAny>,
    lora_name: &str,
    strength_model: f64,
    strength_clip: f64,
) -> Result<(Bound<'py, PyAny>, Bound<'py, PyAny>), Error> {
    let loader = py.import("nodes")?.getattr("LoraLoader")?.call0()?;

    let args = (model, clip, lora_name, strength_model, strength_clip);
    let (model, clip) = loader
        .call_method1("load_lora", args)?
        .extract::<(Bound<'py, PyAny>, Bound<'py, PyAny>)>()?;
    Ok((model, clip))
}
