//! 插件服务: 配置与 Web 路由

use pyo3::{
    types::{PyModule, PyModuleMethods},
    wrap_pyfunction, Bound, PyResult,
};

pub mod config;
pub mod logo;
pub mod routes;

pub use config::{ConfigStore, DraekzConfig, LlmConfig};

/// 注册路由相关的函数
pub fn add_functions(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(routes::draekz_config_js, m)?)?;
    m.add_function(wrap_pyfunction!(routes::draekz_get_config, m)?)?;
    m.add_function(wrap_pyfunction!(routes::draekz_set_config, m)?)?;
    m.add_function(wrap_pyfunction!(routes::draekz_logo_svg, m)?)?;
    m.add_function(wrap_pyfunction!(routes::register_routes, m)?)?;
    Ok(())
}
