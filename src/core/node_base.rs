//! ComfyUI 节点输入构建器
//!
//! 提供类型安全、易用的构建器 API，用于生成 ComfyUI 节点的 INPUT_TYPES
//!
//! # 使用示例
//!
//! ```ignore
//! InputSpec::new()
//!     .with_required("text", InputType::string().default("hello").multiline(true))
//!     .with_required("count", InputType::int().default(10).min(0).max(100).step(1))
//!     .with_optional("mode", InputType::list(vec!["A".to_string(), "B".to_string()]).default("A"))
//!     .build()
//! ```

use indexmap::IndexMap;
use pyo3::{
    types::{PyDict, PyDictMethods},
    Bound, IntoPyObject, Py, PyAny, PyResult, Python,
};

use crate::wrapper::comfyui::types::{
    NODE_BOOLEAN, NODE_CLIP, NODE_FLOAT, NODE_INT, NODE_MODEL, NODE_STRING,
};

/// 输入规范构建器
///
/// 用于构建 ComfyUI 节点的 INPUT_TYPES 字典结构
pub struct InputSpec {
    required: Vec<(String, InputType)>,
    optional: Vec<(String, InputType)>,
}

impl InputSpec {
    /// 创建一个新的输入规范构建器
    pub fn new() -> Self {
        Self {
            required: Vec::new(),
            optional: Vec::new(),
        }
    }

    /// 添加必需输入
    pub fn with_required(mut self, name: impl Into<String>, input: InputType) -> Self {
        self.required.push((name.into(), input));
        self
    }

    /// 添加可选输入
    pub fn with_optional(mut self, name: impl Into<String>, input: InputType) -> Self {
        self.optional.push((name.into(), input));
        self
    }

    /// 构建 PyDict
    ///
    /// 生成符合 ComfyUI INPUT_TYPES 格式的字典结构
    pub fn build(self) -> PyResult<Py<PyDict>> {
        Python::with_gil(|py| {
            let dict = PyDict::new(py);

            let required = PyDict::new(py);
            for (name, input_type) in self.required {
                required.set_item(name, input_type.to_py_tuple(py)?)?;
            }
            dict.set_item("required", required)?;

            if !self.optional.is_empty() {
                let optional = PyDict::new(py);
                for (name, input_type) in self.optional {
                    optional.set_item(name, input_type.to_py_tuple(py)?)?;
                }
                dict.set_item("optional", optional)?;
            }

            Ok(dict.into())
        })
    }
}

impl Default for InputSpec {
    fn default() -> Self {
        Self::new()
    }
}

/// 输入类型（包含类型和参数）
pub struct InputType {
    kind: InputKind,
    params: IndexMap<String, ParamValue>,
    list_options: Vec<String>,
}

/// 输入类型枚举（仅表示类型，不包含参数）
#[derive(Debug, Clone, PartialEq)]
enum InputKind {
    String,
    Int,
    Float,
    Bool,
    List,
    Model,
    Clip,
    /// 自定义类型, 如 DRAEKZLLMCONFIG
    Custom(&'static str),
}

/// 参数值
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl InputType {
    fn new(kind: InputKind) -> Self {
        Self {
            kind,
            params: IndexMap::new(),
            list_options: Vec::new(),
        }
    }

    /// String 类型
    pub fn string() -> Self {
        Self::new(InputKind::String)
    }

    /// Int 类型
    pub fn int() -> Self {
        Self::new(InputKind::Int)
    }

    /// Float 类型
    pub fn float() -> Self {
        Self::new(InputKind::Float)
    }

    /// Bool 类型
    pub fn bool() -> Self {
        Self::new(InputKind::Bool)
    }

    /// 动态选项列表
    pub fn list(options: Vec<String>) -> Self {
        Self {
            kind: InputKind::List,
            params: IndexMap::new(),
            list_options: options,
        }
    }

    /// Model 类型
    pub fn model() -> Self {
        Self::new(InputKind::Model)
    }

    /// Clip 类型
    pub fn clip() -> Self {
        Self::new(InputKind::Clip)
    }

    /// 自定义类型
    pub fn custom(type_name: &'static str) -> Self {
        Self::new(InputKind::Custom(type_name))
    }
}

impl InputType {
    // ============ 通用参数 ============

    /// 设置默认值
    pub fn default<V: Into<ParamValue>>(mut self, value: V) -> Self {
        self.params.insert("default".to_string(), value.into());
        self
    }

    /// 设置提示文本
    pub fn tooltip<V: Into<ParamValue>>(mut self, value: V) -> Self {
        self.params.insert("tooltip".to_string(), value.into());
        self
    }

    /// 强制输入
    pub fn force_input(mut self, force: bool) -> Self {
        self.params
            .insert("forceInput".to_string(), ParamValue::Bool(force));
        self
    }

    // ============ 数值类型参数 ============

    /// 设置最小值
    pub fn min<V: Into<ParamValue>>(mut self, value: V) -> Self {
        self.params.insert("min".to_string(), value.into());
        self
    }

    /// 设置最大值
    pub fn max<V: Into<ParamValue>>(mut self, value: V) -> Self {
        self.params.insert("max".to_string(), value.into());
        self
    }

    /// 设置步长
    pub fn step<V: Into<ParamValue>>(mut self, value: V) -> Self {
        self.params.insert("step".to_string(), value.into());
        self
    }

    // ============ 字符串类型参数 ============

    /// 设置多行文本
    pub fn multiline(mut self, multiline: bool) -> Self {
        self.params
            .insert("multiline".to_string(), ParamValue::Bool(multiline));
        self
    }

    /// 动态提示词 (ComfyUI 的 `{a|b}` 语法)
    pub fn dynamic_prompts(mut self, dynamic: bool) -> Self {
        self.params
            .insert("dynamicPrompts".to_string(), ParamValue::Bool(dynamic));
        self
    }

    /// 类型名称
    fn type_name(&self) -> &'static str {
        match &self.kind {
            InputKind::String => NODE_STRING,
            InputKind::Int => NODE_INT,
            InputKind::Float => NODE_FLOAT,
            InputKind::Bool => NODE_BOOLEAN,
            InputKind::Model => NODE_MODEL,
            InputKind::Clip => NODE_CLIP,
            InputKind::Custom(name) => *name,
            InputKind::List => "",
        }
    }

    /// 转换为 Python 元组
    ///
    /// 列表类型：(options_list, params_dict)
    /// 其他类型：(type_name, params_dict)
    fn to_py_tuple<'py>(self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        let params_dict = self.params.to_py_dict(py)?;
        if self.kind == InputKind::List {
            return Ok((self.list_options, params_dict)
                .into_pyobject(py)?
                .into_any());
        }

        Ok((self.type_name(), params_dict)
            .into_pyobject(py)?
            .into_any())
    }
}

/// 将 IndexMap<String, ParamValue> 转换为 PyDict
trait ToPyDict {
    fn to_py_dict(&self, py: Python<'_>) -> PyResult<Py<PyDict>>;
}

impl ToPyDict for IndexMap<String, ParamValue> {
    fn to_py_dict(&self, py: Python<'_>) -> PyResult<Py<PyDict>> {
        let dict = PyDict::new(py);
        for (key, value) in self {
            match value {
                ParamValue::String(s) => dict.set_item(key, s.as_str())?,
                ParamValue::Int(i) => dict.set_item(key, *i)?,
                ParamValue::UInt(u) => dict.set_item(key, *u)?,
                ParamValue::Float(f) => dict.set_item(key, *f)?,
                ParamValue::Bool(b) => dict.set_item(key, *b)?,
            }
        }
        Ok(dict.into())
    }
}

// ============ ParamValue 的 From 实现 ============

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::String(s)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::String(s.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        ParamValue::Int(i as i64)
    }
}

impl From<u32> for ParamValue {
    fn from(i: u32) -> Self {
        ParamValue::Int(i as i64)
    }
}

impl From<u64> for ParamValue {
    fn from(i: u64) -> Self {
        ParamValue::UInt(i)
    }
}

impl From<f64> for ParamValue {
    fn from(f: f64) -> Self {
        ParamValue::Float(f)
    }
}

impl From<f32> for ParamValue {
    fn from(f: f32) -> Self {
        ParamValue::Float(f as f64)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_spec_builder() {
        let spec = InputSpec::new()
            .with_required("text", InputType::string().default("hello"))
            .with_required("count", InputType::int().default(10).min(0).max(100))
            .with_optional("enabled", InputType::bool().default(false));

        assert_eq!(spec.required.len(), 2);
        assert_eq!(spec.optional.len(), 1);
        assert_eq!(spec.required[0].0, "text");
    }

    #[test]
    fn test_list_keeps_options() {
        let options = vec!["landscape".to_string(), "portrait".to_string()];
        let input = InputType::list(options.clone());

        assert_eq!(input.list_options, options);
        assert_eq!(input.type_name(), "");
    }

    #[test]
    fn test_params_keep_insertion_order() {
        let input = InputType::float()
            .default(1.5)
            .min(0.1)
            .max(16.0)
            .step(0.1);

        let keys: Vec<&str> = input.params.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["default", "min", "max", "step"]);
        assert_eq!(input.params["default"], ParamValue::Float(1.5));
    }

    #[test]
    fn test_seed_max_is_unsigned() {
        let input = InputType::int().max(u64::MAX);
        assert_eq!(input.params["max"], ParamValue::UInt(u64::MAX));
    }

    #[test]
    fn test_custom_type_name() {
        let input = InputType::custom("DRAEKZLLMCONFIG");
        assert_eq!(input.type_name(), "DRAEKZLLMCONFIG");
    }
}
