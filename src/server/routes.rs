//! Web 路由
//!
//! 响应内容由 Rust 生成, 通过内嵌的 Python 脚本注册到 ComfyUI 的 aiohttp 路由上

use log::{error, info};
use pyo3::{
    exceptions::PyRuntimeError,
    ffi::c_str,
    pyfunction,
    types::{PyAnyMethods, PyModule},
    Bound, PyErr, PyResult, Python,
};
use serde_json::{json, Value};

use crate::{
    error::Error,
    server::{
        config::{self, sort_keys, DraekzConfig},
        logo,
    },
};

/// `GET /draekz/config.js` 响应内容
pub fn config_js(config: &DraekzConfig) -> Result<String, Error> {
    let value = sort_keys(&serde_json::to_value(config)?);
    let data = serde_json::to_string_pretty(&value)?;
    Ok(format!("export const draekzConfig = {data}"))
}

/// 查询参数是否为真
///
/// 1 / true / yes / on, 忽略大小写
pub fn is_truthy(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

/// `POST /draekz/api/config` 的表单字段 `json`
pub fn parse_config_changes(json: &str) -> Result<Value, Error> {
    let changes: Value = serde_json::from_str(json)?;
    if !changes.is_object() {
        return Err(Error::InvalidConfigValue(
            "changes must be a JSON object".to_string(),
        ));
    }
    Ok(changes)
}

fn into_py_err(e: Error) -> PyErr {
    error!("draekz route error, {e}");
    PyErr::new::<PyRuntimeError, _>(e.to_string())
}

#[pyfunction]
pub fn draekz_config_js(py: Python<'_>) -> PyResult<String> {
    config::get_config(py)
        .and_then(|config| config_js(&config))
        .map_err(into_py_err)
}

#[pyfunction]
#[pyo3(signature = (refresh=None))]
pub fn draekz_get_config(py: Python<'_>, refresh: Option<&str>) -> PyResult<String> {
    let results = (|| {
        if is_truthy(refresh) {
            config::refresh_config(py)?;
        }
        let config = config::get_config(py)?;
        Ok::<_, Error>(serde_json::to_string(&config)?)
    })();
    results.map_err(into_py_err)
}

#[pyfunction]
pub fn draekz_set_config(py: Python<'_>, json: &str) -> PyResult<String> {
    let results = (|| {
        let changes = parse_config_changes(json)?;
        config::set_user_config(py, &changes)?;
        Ok::<_, Error>(json!({"status": "ok"}).to_string())
    })();
    results.map_err(into_py_err)
}

#[pyfunction]
#[pyo3(signature = (bg=None, fg=None))]
pub fn draekz_logo_svg(bg: Option<&str>, fg: Option<&str>) -> String {
    logo::logo_svg(bg, fg)
}

/// 注册路由
///
/// 需要在 ComfyUI 的 PromptServer 启动后调用
#[pyfunction]
#[pyo3(pass_module)]
pub fn register_routes(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = m.py();
    let code = c_str!(include_str!("py/draekz_routes.py"));
    let module = PyModule::from_code(py, code, c"draekz_routes.py", c"draekz_routes")?;
    module.getattr("register")?.call1((m,))?;
    info!("draekz routes registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_truthy() {
        for v in ["1", "true", "TRUE", "Yes", "on", " on "] {
            assert!(is_truthy(Some(v)), "{v}");
        }
        for v in ["0", "false", "no", "off", "", "maybe"] {
            assert!(!is_truthy(Some(v)), "{v}");
        }
        assert!(!is_truthy(None));
    }

    #[test]
    fn test_config_js() -> anyhow::Result<()> {
        let js = config_js(&DraekzConfig::default())?;
        assert!(js.starts_with("export const draekzConfig = {\n  \"features\": {"));

        // 键按字母排序
        let features = js.find("\"features\"").unwrap_or(usize::MAX);
        let llm = js.find("\"llm\"").unwrap_or(usize::MAX);
        let log_level = js.find("\"log_level\"").unwrap_or(usize::MAX);
        assert!(features < llm && llm < log_level);

        let data: Value = serde_json::from_str(js.trim_start_matches("export const draekzConfig = "))?;
        assert_eq!(data["features"]["menu_auto_nest"]["threshold"], 20);
        Ok(())
    }

    #[test]
    fn test_parse_config_changes() -> anyhow::Result<()> {
        let changes = parse_config_changes(r#"{"log_level": "INFO"}"#)?;
        assert_eq!(changes["log_level"], "INFO");
        assert!(parse_config_changes("[1]").is_err());
        assert!(parse_config_changes("nope").is_err());
        Ok(())
    }
}
