//! 按宽高比计算分辨率
//!
//! 以短边为基准, 长边按比例计算后向上取整到 8 的倍数

use std::str::FromStr;

use log::error;
use pyo3::{
    exceptions::PyRuntimeError,
    pyclass, pymethods,
    types::{PyDict, PyType},
    Bound, Py, PyErr, PyResult, Python,
};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    core::{
        category::CATEGORY_UTILS,
        node_base::{InputSpec, InputType},
        PromptServer,
    },
    error::Error,
    wrapper::comfyui::types::{MAX_RESOLUTION, NODE_INT},
};

/// 宽高比
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, Display)]
pub enum AspectRatio {
    #[strum(to_string = "1:1")]
    Ratio1_1,
    #[strum(to_string = "5:4")]
    Ratio5_4,
    #[strum(to_string = "4:3")]
    Ratio4_3,
    #[strum(to_string = "3:2")]
    Ratio3_2,
    #[strum(to_string = "16:10")]
    Ratio16_10,
    #[strum(to_string = "16:9")]
    Ratio16_9,
    #[strum(to_string = "21:9")]
    Ratio21_9,
    #[strum(to_string = "2:1")]
    Ratio2_1,
    #[strum(to_string = "3:1")]
    Ratio3_1,
}

impl AspectRatio {
    /// (x, y), x >= y
    pub fn parts(&self) -> (u32, u32) {
        match self {
            AspectRatio::Ratio1_1 => (1, 1),
            AspectRatio::Ratio5_4 => (5, 4),
            AspectRatio::Ratio4_3 => (4, 3),
            AspectRatio::Ratio3_2 => (3, 2),
            AspectRatio::Ratio16_10 => (16, 10),
            AspectRatio::Ratio16_9 => (16, 9),
            AspectRatio::Ratio21_9 => (21, 9),
            AspectRatio::Ratio2_1 => (2, 1),
            AspectRatio::Ratio3_1 => (3, 1),
        }
    }
}

/// 方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Landscape,
    Portrait,
}

/// 计算宽高
pub fn resolution_by_ratio(aspect_ratio: AspectRatio, direction: Direction, short_side: u32) -> (u32, u32) {
    let (x, y) = aspect_ratio.parts();
    let long_side = (f64::from(short_side) * f64::from(x) / f64::from(y)) as u64;
    // 向上取 8 的倍数, 超出 u32 时取不超过 u32::MAX 的最大倍数
    let long_side = ((long_side + 7) & !7).min(u64::from(u32::MAX & !7)) as u32;

    match direction {
        Direction::Landscape => (long_side, short_side),
        Direction::Portrait => (short_side, long_side),
    }
}

/// 按宽高比计算分辨率
#[pyclass(subclass)]
pub struct ResolutionByRatio {}

impl PromptServer for ResolutionByRatio {}

#[pymethods]
impl ResolutionByRatio {
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
        "Compute width and height from an aspect ratio and the short side; the long side is rounded up to a multiple of 8."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        InputSpec::new()
            .with_required(
                "aspect_ratio",
                InputType::list(AspectRatio::iter().map(|v| v.to_string()).collect()),
            )
            .with_required(
                "direction",
                InputType::list(Direction::iter().map(|v| v.to_string()).collect()),
            )
            .with_required(
                "short_side",
                InputType::int()
                    .default(1024)
                    .min(64)
                    .max(MAX_RESOLUTION)
                    .step(8),
            )
            .build()
    }

    #[pyo3(name = "execute")]
    fn execute(
        &self,
        py: Python<'_>,
        aspect_ratio: &str,
        direction: &str,
        short_side: u32,
    ) -> PyResult<(u32, u32)> {
        let results = parse_inputs(aspect_ratio, direction)
            .map(|(ratio, direction)| resolution_by_ratio(ratio, direction, short_side));

        match results {
            Ok(v) => Ok(v),
            Err(e) => {
                error!("ResolutionByRatio error, {e}");
                if let Err(e) = self.send_error(py, "ResolutionByRatio".to_string(), e.to_string())
                {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

fn parse_inputs(aspect_ratio: &str, direction: &str) -> Result<(AspectRatio, Direction), Error> {
    let ratio = AspectRatio::from_str(aspect_ratio)
        .map_err(|e| Error::ParseEnumString(format!("aspect_ratio {aspect_ratio}, {e}")))?;
    let direction = Direction::from_str(direction)
        .map_err(|e| Error::ParseEnumString(format!("direction {direction}, {e}")))?;
    Ok((ratio, direction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_by_ratio() {
        assert_eq!(
            resolution_by_ratio(AspectRatio::Ratio16_9, Direction::Landscape, 1024),
            (1824, 1024)
        );
        assert_eq!(
            resolution_by_ratio(AspectRatio::Ratio4_3, Direction::Portrait, 768),
            (768, 1024)
        );
        assert_eq!(
            resolution_by_ratio(AspectRatio::Ratio1_1, Direction::Landscape, 512),
            (512, 512)
        );
        assert_eq!(
            resolution_by_ratio(AspectRatio::Ratio21_9, Direction::Landscape, 1080),
            (2520, 1080)
        );
    }

    #[test]
    fn test_long_side_is_multiple_of_eight() {
        for ratio in AspectRatio::iter() {
            for short_side in (64..=2048).step_by(8) {
                let (width, height) = resolution_by_ratio(ratio, Direction::Landscape, short_side);
                assert_eq!(width % 8, 0, "{ratio} {short_side}");
                assert!(width >= height);
            }
        }
    }

    #[test]
    fn test_huge_short_side_does_not_overflow() {
        assert_eq!(
            resolution_by_ratio(AspectRatio::Ratio3_1, Direction::Landscape, u32::MAX),
            (u32::MAX & !7, u32::MAX)
        );
        assert_eq!(
            resolution_by_ratio(AspectRatio::Ratio1_1, Direction::Portrait, u32::MAX - 3),
            (u32::MAX - 3, u32::MAX & !7)
        );
    }

    #[test]
    fn test_parse_inputs() -> anyhow::Result<()> {
        assert_eq!(
            parse_inputs("16:10", "portrait")?,
            (AspectRatio::Ratio16_10, Direction::Portrait)
        );
        assert!(parse_inputs("7:3", "landscape").is_err());
        assert!(parse_inputs("1:1", "diagonal").is_err());
        Ok(())
    }
}
