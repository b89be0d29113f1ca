//! GGUF 本地推理
//!
//! 基于 llama.cpp, 使用模型自带的对话模板 (缺失时回退到 chatml)

use std::{
    num::NonZeroU32,
    path::Path,
    sync::{Mutex, OnceLock},
};

use llama_cpp_2::{
    context::params::LlamaContextParams,
    llama_backend::LlamaBackend,
    llama_batch::LlamaBatch,
    model::{params::LlamaModelParams, AddBos, LlamaChatMessage, LlamaChatTemplate, LlamaModel},
    sampling::LlamaSampler,
    LlamaCppError,
};
use log::{error, info, warn};

use crate::{error::Error, llm::{prompt_template::Message, LlmOptions}};

/// 默认上下文长度
pub const DEFAULT_N_CTX: u32 = 2048;

/// 默认卸载到 GPU 的层数, 超过模型层数时即全部卸载
pub const DEFAULT_N_GPU_LAYERS: u32 = 999;

/// 惩罚窗口
const PENALTY_LAST_N: i32 = 64;

static BACKEND: OnceLock<LlamaBackend> = OnceLock::new();
static BACKEND_INIT: Mutex<()> = Mutex::new(());

/// 初始化后端
///
/// 进程内只初始化一次, 已初始化时直接复用
pub fn backend() -> Result<&'static LlamaBackend, Error> {
    if let Some(backend) = BACKEND.get() {
        return Ok(backend);
    }

    let _guard = BACKEND_INIT
        .lock()
        .map_err(|e| Error::LockError(e.to_string()))?;
    if let Some(backend) = BACKEND.get() {
        return Ok(backend);
    }

    let backend = match LlamaBackend::init() {
        Ok(backend) => backend,
        Err(LlamaCppError::BackendAlreadyInitialized) => LlamaBackend {},
        Err(e) => {
            error!("Failed to initialize backend: {e}");
            return Err(Error::LlamaCppError(e));
        }
    };
    Ok(BACKEND.get_or_init(|| backend))
}

/// 生成参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerateParams {
    pub max_tokens: u32,
    pub seed: u32,
    pub options: LlmOptions,
}

/// GGUF 模型
pub struct GgufModel {
    model: LlamaModel,
    n_ctx: u32,
}

impl GgufModel {
    /// 加载模型
    pub fn load(path: &Path, n_ctx: u32, n_gpu_layers: u32) -> Result<Self, Error> {
        if !path.is_file() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }

        let backend = backend()?;
        let params = LlamaModelParams::default().with_n_gpu_layers(n_gpu_layers);
        let model = LlamaModel::load_from_file(backend, path, &params)?;
        info!("loaded gguf model {}", path.display());

        Ok(Self { model, n_ctx })
    }

    /// 对话补全
    ///
    /// 遇到结束符或达到 `max_tokens` 时停止
    pub fn chat(&self, messages: &[Message], params: &GenerateParams) -> Result<String, Error> {
        let backend = backend()?;
        let ctx_params = LlamaContextParams::default().with_n_ctx(NonZeroU32::new(self.n_ctx));
        let mut ctx = self.model.new_context(backend, ctx_params)?;

        let prompt = self.apply_chat_template(messages)?;
        let tokens = self.model.str_to_token(&prompt, AddBos::Always)?;

        let n_ctx = i32::try_from(ctx.n_ctx())?;
        let n_prompt = i32::try_from(tokens.len())?;
        if n_prompt >= n_ctx {
            return Err(Error::InvalidInput(format!(
                "prompt is {n_prompt} tokens, context size is {n_ctx}"
            )));
        }

        let mut batch = LlamaBatch::new(self.n_ctx as usize, 1);
        let last_index = n_prompt - 1;
        for (i, token) in (0_i32..).zip(tokens) {
            // 只需要最后一个 token 的 logits
            batch.add(token, i, &[0], i == last_index)?;
        }
        ctx.decode(&mut batch)?;

        let mut sampler = sampler(params);
        let mut decoder = encoding_rs::UTF_8.new_decoder();
        let mut results = String::new();

        let max_tokens = i32::try_from(params.max_tokens).unwrap_or(i32::MAX);
        let n_end = n_ctx.min(n_prompt.saturating_add(max_tokens));
        let mut n_cur = batch.n_tokens();
        while n_cur < n_end {
            // sample 内部已经 accept
            let token = sampler.sample(&ctx, batch.n_tokens() - 1);
            if self.model.is_eog_token(token) {
                break;
            }

            let piece = self.model.token_to_piece(token, &mut decoder, true, None)?;
            results.push_str(&piece);

            batch.clear();
            batch.add(token, n_cur, &[0], true)?;
            n_cur += 1;

            ctx.decode(&mut batch).map_err(|e| {
                error!("failed to eval, {e}");
                e
            })?;
        }

        if n_cur >= n_ctx {
            warn!("generation stopped at context size {n_ctx}");
        }
        info!("generated {} tokens", n_cur - n_prompt);
        Ok(results)
    }

    fn apply_chat_template(&self, messages: &[Message]) -> Result<String, Error> {
        let template = match self.model.chat_template(None) {
            Ok(template) => template,
            Err(e) => {
                warn!("model has no chat template, fallback to chatml, {e}");
                LlamaChatTemplate::new("chatml")?
            }
        };

        let chat = messages
            .iter()
            .map(|m| LlamaChatMessage::new(m.role.to_string(), m.content.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let prompt = self.model.apply_chat_template(&template, &chat, true)?;
        Ok(prompt)
    }
}

/// 采样器
fn sampler(params: &GenerateParams) -> LlamaSampler {
    let options = &params.options;
    LlamaSampler::chain_simple([
        LlamaSampler::penalties(PENALTY_LAST_N, options.repeat_penalty as f32, 0.0, 0.0),
        LlamaSampler::top_k(options.top_k),
        LlamaSampler::top_p(options.top_p as f32, 1),
        LlamaSampler::temp(options.temperature as f32),
        LlamaSampler::dist(params.seed),
    ])
}

/// 种子转为 u32, 取低 32 位
pub fn seed_to_u32(seed: u64) -> u32 {
    (seed & u64::from(u32::MAX)) as u32
}
