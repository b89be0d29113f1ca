//! 插件配置
//!
//! 默认配置编译在代码中, 用户目录下的 `draekz_config.json` 覆盖默认值。
//! 前端通过点号分隔的键 (如 `features.menu_auto_nest.threshold`) 修改配置。

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{OnceLock, RwLock},
};

use log::{info, warn};
use pyo3::Python;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    error::Error,
    llm::{DEFAULT_N_CTX, DEFAULT_N_GPU_LAYERS},
    wrapper::comfy::folder_paths,
};

/// 用户配置文件名
pub const USER_CONFIG_FILE: &str = "draekz_config.json";

/// 插件配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraekzConfig {
    /// 前端控制台日志级别
    pub log_level: String,
    pub features: Features,
    pub llm: LlmConfig,
}

impl Default for DraekzConfig {
    fn default() -> Self {
        Self {
            log_level: "WARN".to_string(),
            features: Features::default(),
            llm: LlmConfig::default(),
        }
    }
}

/// 前端功能开关
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    pub import_individual_nodes: Toggle,
    pub menu_queue_selected_nodes: bool,
    pub menu_auto_nest: MenuAutoNest,
    pub menu_bookmarks: Toggle,
    pub group_header_fast_toggle: GroupHeaderFastToggle,
    pub show_alerts_for_corrupt_workflows: bool,
    pub invoke_extensions_async: InvokeExtensionsAsync,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            import_individual_nodes: Toggle { enabled: true },
            menu_queue_selected_nodes: true,
            menu_auto_nest: MenuAutoNest::default(),
            menu_bookmarks: Toggle { enabled: true },
            group_header_fast_toggle: GroupHeaderFastToggle::default(),
            show_alerts_for_corrupt_workflows: false,
            invoke_extensions_async: InvokeExtensionsAsync { node_created: true },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Toggle {
    pub enabled: bool,
}

/// 菜单自动按子目录折叠
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuAutoNest {
    pub subdirs: bool,
    /// 触发折叠的条目数
    pub threshold: u32,
}

impl Default for MenuAutoNest {
    fn default() -> Self {
        Self {
            subdirs: true,
            threshold: 20,
        }
    }
}

/// 分组标题栏快捷开关
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupHeaderFastToggle {
    pub enabled: bool,
    /// queue / bypass / mute
    pub toggles: Vec<String>,
    /// hover / always
    pub show: String,
}

impl Default for GroupHeaderFastToggle {
    fn default() -> Self {
        Self {
            enabled: true,
            toggles: vec!["mute".to_string(), "bypass".to_string()],
            show: "hover".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvokeExtensionsAsync {
    pub node_created: bool,
}

/// LLM 配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// models 目录下存放 gguf 模型的子目录
    pub models_dir_name: String,
    pub n_ctx: u32,
    pub n_gpu_layers: u32,
    /// 同时缓存的模型数量
    pub cache_capacity: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            models_dir_name: "llm_gguf".to_string(),
            n_ctx: DEFAULT_N_CTX,
            n_gpu_layers: DEFAULT_N_GPU_LAYERS,
            cache_capacity: 1,
        }
    }
}

impl LlmConfig {
    /// 取值为 0 时模型缓存无法创建, 上下文长度会退化为模型训练长度
    fn validate(&self) -> Result<(), Error> {
        if self.cache_capacity == 0 {
            return Err(Error::InvalidConfigValue(
                "llm.cache_capacity must be greater than zero".to_string(),
            ));
        }
        if self.n_ctx == 0 {
            return Err(Error::InvalidConfigValue(
                "llm.n_ctx must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// 配置存储
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    /// 用户配置原文, 仅包含用户修改过的键
    user: Value,
    config: DraekzConfig,
}

impl ConfigStore {
    /// 从用户配置文件加载
    ///
    /// 文件不存在时使用默认配置; 文件损坏时告警并使用默认配置
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let user = read_user_config(&path);
        let config = match merge_config(&user) {
            Ok(v) => v,
            Err(e) => {
                warn!("invalid user config {}, use defaults, {e}", path.display());
                DraekzConfig::default()
            }
        };

        Self { path, user, config }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &DraekzConfig {
        &self.config
    }

    /// 重新读取用户配置文件
    pub fn refresh(&mut self) {
        *self = Self::load(self.path.clone());
    }

    /// 修改用户配置并保存
    ///
    /// `changes` 为扁平对象, 键为点号分隔的路径
    pub fn set_user_config(&mut self, changes: &Value) -> Result<(), Error> {
        let Value::Object(changes) = changes else {
            return Err(Error::InvalidConfigValue(
                "changes must be a JSON object".to_string(),
            ));
        };

        let mut user = self.user.clone();
        for (key, value) in changes {
            set_dotted(&mut user, key, value.clone())?;
        }

        let config = merge_config(&user).map_err(|e| match e {
            Error::InvalidConfigValue(_) => e,
            e => Error::InvalidConfigValue(e.to_string()),
        })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&user)?)?;
        info!("saved user config {}", self.path.display());

        self.user = user;
        self.config = config;
        Ok(())
    }
}

/// 读取用户配置, 失败时返回空对象
fn read_user_config(path: &Path) -> Value {
    let empty = Value::Object(Map::new());
    let content = match fs::read_to_string(path) {
        Ok(v) => v,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return empty,
        Err(e) => {
            warn!("read user config {} failed, {e}", path.display());
            return empty;
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(v @ Value::Object(_)) => v,
        Ok(_) => {
            warn!("user config {} is not a JSON object, ignored", path.display());
            empty
        }
        Err(e) => {
            warn!("user config {} is malformed, ignored, {e}", path.display());
            empty
        }
    }
}

/// 默认配置与用户配置合并
fn merge_config(user: &Value) -> Result<DraekzConfig, Error> {
    let mut merged = serde_json::to_value(DraekzConfig::default())?;
    merge_value(&mut merged, user);
    let config: DraekzConfig = serde_json::from_value(merged)?;
    config.llm.validate()?;
    Ok(config)
}

/// 深度合并, 对象逐键合并, 其余类型直接覆盖
fn merge_value(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

/// 按点号分隔的路径写入值, 中间缺失的对象会自动创建
fn set_dotted(target: &mut Value, key: &str, value: Value) -> Result<(), Error> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|part| part.is_empty()) {
        return Err(Error::InvalidConfigKey(key.to_string()));
    }

    let Some((last, parents)) = parts.split_last() else {
        return Err(Error::InvalidConfigKey(key.to_string()));
    };

    let mut current = target;
    for part in parents {
        let Value::Object(map) = current else {
            return Err(Error::InvalidConfigKey(key.to_string()));
        };
        current = map
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let Value::Object(map) = current else {
        return Err(Error::InvalidConfigKey(key.to_string()));
    };
    map.insert(last.to_string(), value);
    Ok(())
}

/// 按键名排序 (递归)
pub fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                if let Some(v) = map.get(key) {
                    sorted.insert(key.clone(), sort_keys(v));
                }
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

static CONFIG_STORE: OnceLock<RwLock<ConfigStore>> = OnceLock::new();

/// 全局配置存储
///
/// 首次访问时从宿主用户目录加载
pub fn config_store(py: Python<'_>) -> Result<&'static RwLock<ConfigStore>, Error> {
    if let Some(store) = CONFIG_STORE.get() {
        return Ok(store);
    }

    let path = folder_paths::get_user_directory(py)?.join(USER_CONFIG_FILE);
    Ok(CONFIG_STORE.get_or_init(|| RwLock::new(ConfigStore::load(path))))
}

/// 当前配置
pub fn get_config(py: Python<'_>) -> Result<DraekzConfig, Error> {
    let store = config_store(py)?
        .read()
        .map_err(|e| Error::LockError(e.to_string()))?;
    Ok(store.config().clone())
}

/// 重新加载用户配置
pub fn refresh_config(py: Python<'_>) -> Result<(), Error> {
    config_store(py)?
        .write()
        .map_err(|e| Error::LockError(e.to_string()))?
        .refresh();
    Ok(())
}

/// 修改用户配置
pub fn set_user_config(py: Python<'_>, changes: &Value) -> Result<(), Error> {
    config_store(py)?
        .write()
        .map_err(|e| Error::LockError(e.to_string()))?
        .set_user_config(changes)
}
