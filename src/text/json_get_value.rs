//! JSON 取值
//!
//! 从 JSON 对象中按键取值并转为字符串; 任何错误都以文本形式输出, 不中断工作流

use std::io::{self, Write};

use pyo3::{
    pyclass, pymethods,
    types::{PyDict, PyType},
    Bound, Py, PyResult,
};
use serde::Serialize;
use serde_json::{
    ser::{Formatter, PrettyFormatter, Serializer},
    Value,
};

use crate::{
    core::{
        category::CATEGORY_UTILS,
        node_base::{InputSpec, InputType},
        node_log::NodeLog,
    },
    wrapper::comfyui::types::NODE_STRING,
};

/// 节点名称
pub const NODE_NAME: &str = "JSON Get Value (Draekz)";

/// 取值
pub fn get_value(json_string: &str, property_name: &str) -> String {
    let data: Value = match serde_json::from_str(json_string) {
        Ok(v) => v,
        Err(_) => return "Error: Invalid JSON format provided.".to_string(),
    };
    let Value::Object(data) = data else {
        return "Error: JSON string does not represent an object.".to_string();
    };

    match data.get(property_name) {
        Some(value) => value_to_string(value),
        None => format!("Error: Property '{property_name}' not found."),
    }
}

/// 值转为字符串
///
/// 对象与数组输出缩进为 2 的 JSON, 其余按 Python 的字面形式输出
fn value_to_string(value: &Value) -> String {
    match value {
        Value::Object(_) | Value::Array(_) => {
            to_pretty_json(value).unwrap_or_else(|_| value.to_string())
        }
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        Value::Number(n) => python_number(&n.to_string(), false),
    }
}

/// 缩进为 2, 非 ASCII 字符转义为 `\uXXXX`
fn to_pretty_json(value: &Value) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, AsciiFormatter::default());
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// 数字原文转为 Python 的字面形式
///
/// 整数保持原样 (任意精度), 其余按 float 处理;
/// `json` 为真时无穷大输出为 `Infinity`
fn python_number(text: &str, json: bool) -> String {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        if digits.bytes().all(|b| b == b'0') {
            return "0".to_string();
        }
        return text.to_string();
    }

    match text.parse::<f64>() {
        Ok(f) if f.is_infinite() && json => {
            let text = if f > 0.0 { "Infinity" } else { "-Infinity" };
            text.to_string()
        }
        Ok(f) => python_float(f),
        Err(_) => text.to_string(),
    }
}

/// Python `repr(float)`
///
/// 十进制指数小于 -4 或不小于 16 时使用科学计数法, 指数至少两位
fn python_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let sign = if f.is_sign_negative() { "-" } else { "" };
    // 最短可往返表示, 如 1.2345e22
    let sci = format!("{:e}", f.abs());
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if !(-4..16).contains(&exponent) {
        let mantissa = match digits.split_at(1) {
            (head, "") => head.to_string(),
            (head, tail) => format!("{head}.{tail}"),
        };
        let exponent_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{sign}{mantissa}e{exponent_sign}{:02}", exponent.abs());
    }

    if exponent < 0 {
        let zeros = "0".repeat(exponent.unsigned_abs() as usize - 1);
        return format!("{sign}0.{zeros}{digits}");
    }

    let point = exponent as usize + 1;
    if digits.len() <= point {
        let zeros = "0".repeat(point - digits.len());
        format!("{sign}{digits}{zeros}.0")
    } else {
        format!("{sign}{}.{}", &digits[..point], &digits[point..])
    }
}

/// 与 `json.dumps(value, indent=2)` 一致的输出格式
struct AsciiFormatter {
    pretty: PrettyFormatter<'static>,
}

impl Default for AsciiFormatter {
    fn default() -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(b"  "),
        }
    }
}

impl Formatter for AsciiFormatter {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_number_str<W: ?Sized + Write>(&mut self, writer: &mut W, value: &str) -> io::Result<()> {
        writer.write_all(python_number(value, true).as_bytes())
    }

    fn write_string_fragment<W: ?Sized + Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        for c in fragment.chars() {
            if c.is_ascii() && c != '\x7f' {
                writer.write_all(&[c as u8])?;
                continue;
            }
            // BMP 以外的字符输出为代理对
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
        }
        Ok(())
    }
}

/// JSON 取值
#[pyclass(subclass)]
pub struct JsonGetValue {}

#[pymethods]
impl JsonGetValue {
    #[new]
    fn new() -> Self {
        Self {}
    }

    #[classattr]
    #[pyo3(name = "INPUT_IS_LIST")]
    fn input_is_list() -> bool {
        false
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types() -> (&'static str,) {
        (NODE_STRING,)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str,) {
        ("value",)
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_UTILS;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Read a top-level property from a JSON object and return it as a string."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        InputSpec::new()
            .with_required("json_string", InputType::string().force_input(true))
            .with_required(
                "property_name",
                InputType::string().multiline(false).default("example_key"),
            )
            .build()
    }

    #[pyo3(name = "execute")]
    fn execute(&self, json_string: &str, property_name: &str) -> (String,) {
        let value = get_value(json_string, property_name);
        if value.starts_with("Error: ") {
            NodeLog::new(NODE_NAME).warn(&value);
        }
        (value,)
    }
}
