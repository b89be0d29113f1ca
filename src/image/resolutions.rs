//! 预置分辨率
//!
//! 按显存档位提供常用宽高比的预置尺寸, 下拉框按档位、像素数排序

use lazy_static::lazy_static;
use pyo3::{
    pyclass, pymethods,
    types::{PyDict, PyType},
    Bound, Py, PyResult,
};
use regex::Regex;

use crate::{
    core::{
        category::CATEGORY_UTILS,
        node_base::{InputSpec, InputType},
    },
    wrapper::comfyui::types::NODE_INT,
};

/// 解析失败时的默认尺寸
const FALLBACK_SIZE: (u32, u32) = (1024, 1024);

/// 显存档位
///
/// (档位, [(宽高比, [(宽, 高)])])
type Tier = (&'static str, &'static [(&'static str, &'static [(u32, u32)])]);

/// 预置分辨率表, 档位按显存从小到大
const RESOLUTION_DATA: &[Tier] = &[
    (
        "8GB VRAM",
        &[
            ("1:1", &[(1024, 1024)]),
            ("4:3", &[(1152, 896)]),
            ("3:4", &[(896, 1152)]),
            ("3:2", &[(1152, 768)]),
            ("2:3", &[(768, 1152)]),
            ("16:10", &[(1216, 768)]),
            ("10:16", &[(768, 1216)]),
            ("16:9", &[(1280, 720)]),
            ("9:16", &[(720, 1280)]),
            ("2:1", &[(1344, 672)]),
            ("1:2", &[(672, 1344)]),
        ],
    ),
    (
        "12GB VRAM",
        &[
            ("1:1", &[(1024, 1024)]),
            ("4:3", &[(1152, 896)]),
            ("3:4", &[(896, 1152)]),
            ("3:2", &[(1280, 864)]),
            ("2:3", &[(864, 1280)]),
            ("16:10", &[(1280, 800)]),
            ("10:16", &[(800, 1280)]),
            ("16:9", &[(1344, 768)]),
            ("9:16", &[(768, 1344)]),
            ("2:1", &[(1472, 736)]),
            ("1:2", &[(736, 1472)]),
        ],
    ),
    (
        "16GB VRAM",
        &[
            ("1:1", &[(1152, 1152)]),
            ("4:3", &[(1344, 1024)]),
            ("3:4", &[(1024, 1344)]),
            ("3:2", &[(1408, 928)]),
            ("2:3", &[(928, 1408)]),
            ("16:10", &[(1472, 928)]),
            ("10:16", &[(928, 1472)]),
            ("16:9", &[(1536, 864)]),
            ("9:16", &[(864, 1536)]),
            ("2:1", &[(1600, 800)]),
            ("1:2", &[(800, 1600)]),
        ],
    ),
    (
        "24GB VRAM",
        &[
            ("1:1", &[(1280, 1280)]),
            ("4:3", &[(1472, 1152)]),
            ("3:4", &[(1152, 1472)]),
            ("3:2", &[(1536, 1024)]),
            ("2:3", &[(1024, 1536)]),
            ("16:10", &[(1600, 1024)]),
            ("10:16", &[(1024, 1600)]),
            ("16:9", &[(1664, 928)]),
            ("9:16", &[(928, 1664)]),
            ("2:1", &[(1792, 896)]),
            ("1:2", &[(896, 1792)]),
        ],
    ),
    (
        "32GB VRAM",
        &[
            ("1:1", &[(1408, 1408)]),
            ("4:3", &[(1536, 1216)]),
            ("3:4", &[(1216, 1536)]),
            ("3:2", &[(1664, 1120)]),
            ("2:3", &[(1120, 1664), (1536, 2304)]),
            ("16:10", &[(1664, 1024)]),
            ("10:16", &[(1024, 1664)]),
            ("16:9", &[(1792, 1024)]),
            ("9:16", &[(1024, 1792)]),
            ("2:1", &[(1920, 960)]),
            ("1:2", &[(960, 1920)]),
        ],
    ),
    (
        "96GB VRAM (Pro)",
        &[
            ("1:1", &[(2048, 2048)]),
            ("4:3", &[(2304, 1792)]),
            ("3:4", &[(1792, 2304)]),
            ("3:2", &[(2496, 1664)]),
            ("2:3", &[(1664, 2496), (1536, 2304)]),
            ("16:10", &[(2560, 1600)]),
            ("10:16", &[(1600, 2560)]),
            ("16:9", &[(2560, 1440)]),
            ("9:16", &[(1440, 2560)]),
            ("2:1", &[(2816, 1408)]),
            ("1:2", &[(1408, 2816)]),
        ],
    ),
];

lazy_static! {
    static ref SIZE_RE: Result<Regex, regex::Error> = Regex::new(r"(\d+)x(\d+)");
}

/// 下拉框选项
///
/// 先按档位顺序, 再按总像素数升序; 像素数相同时保持表中顺序
pub fn preset_labels() -> Vec<String> {
    let mut presets = Vec::new();
    for (tier_index, (tier, ratios)) in RESOLUTION_DATA.iter().enumerate() {
        for (ratio, sizes) in ratios.iter() {
            for (width, height) in sizes.iter() {
                let label = format!("{tier}: {width}x{height} ({ratio})");
                presets.push((tier_index, u64::from(*width) * u64::from(*height), label));
            }
        }
    }

    // sort_by_key 是稳定排序
    presets.sort_by_key(|(tier_index, pixels, _)| (*tier_index, *pixels));
    presets.into_iter().map(|(_, _, label)| label).collect()
}

/// 从选项文本中解析宽高
pub fn parse_resolution(preset: &str) -> (u32, u32) {
    let Ok(re) = (*SIZE_RE).as_ref() else {
        return FALLBACK_SIZE;
    };

    re.captures(preset)
        .and_then(|caps| {
            let width = caps.get(1)?.as_str().parse().ok()?;
            let height = caps.get(2)?.as_str().parse().ok()?;
            Some((width, height))
        })
        .unwrap_or(FALLBACK_SIZE)
}

/// 预置分辨率
#[pyclass(subclass)]
pub struct Resolutions {}

#[pymethods]
impl Resolutions {
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
        "Preset resolutions grouped by VRAM tier."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        InputSpec::new()
            .with_required("resolution_preset", InputType::list(preset_labels()))
            .build()
    }

    #[pyo3(name = "execute")]
    fn execute(&self, resolution_preset: &str) -> (u32, u32) {
        parse_resolution(resolution_preset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_labels_order() {
        let labels = preset_labels();
        assert_eq!(labels.len(), 68);
        assert_eq!(labels[0], "8GB VRAM: 1152x768 (3:2)");
        assert_eq!(labels[1], "8GB VRAM: 768x1152 (2:3)");
        assert_eq!(
            labels.last().map(String::as_str),
            Some("96GB VRAM (Pro): 2048x2048 (1:1)")
        );

        // 档位不交错
        let first_12gb = labels.iter().position(|l| l.starts_with("12GB")).unwrap();
        assert!(labels[..first_12gb].iter().all(|l| l.starts_with("8GB")));
    }

    #[test]
    fn test_equal_pixels_keep_table_order() {
        let labels = preset_labels();
        let square = labels.iter().position(|l| l == "8GB VRAM: 1024x1024 (1:1)").unwrap();
        let landscape = labels.iter().position(|l| l == "8GB VRAM: 1152x896 (4:3)").unwrap();
        let portrait = labels.iter().position(|l| l == "8GB VRAM: 896x1152 (3:4)").unwrap();
        assert_eq!(portrait, landscape + 1);
        assert!(portrait < square);
    }

    #[test]
    fn test_parse_resolution() {
        assert_eq!(parse_resolution("24GB VRAM: 1664x928 (16:9)"), (1664, 928));
        assert_eq!(parse_resolution("96GB VRAM (Pro): 1536x2304 (2:3)"), (1536, 2304));
        assert_eq!(parse_resolution("garbage"), (1024, 1024));
        assert_eq!(parse_resolution(""), (1024, 1024));
    }
}
