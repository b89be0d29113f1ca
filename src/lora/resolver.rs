//! LoRA 文件名解析
//!
//! 将用户输入的 LoRA 名称 (可能是完整路径、无扩展名路径、纯文件名或任意片段)
//! 解析为宿主文件索引中的某一个候选路径。
//!
//! 匹配策略按顺序执行, 首个命中即返回:
//! 1. 完全一致
//! 2. 输入 与 候选(去扩展名) 一致
//! 3. 输入(去扩展名) 与 候选(去扩展名) 一致
//! 4. 输入 与 候选文件名 一致
//! 5. 输入文件名 与 候选文件名 一致
//! 6. 输入 与 候选文件名(去扩展名) 一致
//! 7. 输入文件名(去扩展名) 与 候选文件名(去扩展名) 一致
//! 8. 模糊匹配: 首个包含输入子串的候选
//!
//! 同一策略内按候选顺序取第一个。

use strum_macros::Display;

/// 匹配日志
///
/// 仅用于观测, 不影响匹配结果
pub trait MatchLog {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// 匹配策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    WithoutExtension,
    ForcedWithoutExtension,
    Basename,
    ForcedBasename,
    BasenameWithoutExtension,
    ForcedBasenameWithoutExtension,
    Fuzzy,
}

impl MatchStrategy {
    /// 是否为模糊匹配 (子串包含), 可信度最低
    pub fn is_fuzzy(&self) -> bool {
        matches!(self, MatchStrategy::Fuzzy)
    }
}

/// 解析结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub path: &'a str,
    pub strategy: MatchStrategy,
}

/// 解析 LoRA 文件名
///
/// 未找到时返回 `None`, 不视为错误
pub fn resolve<'a, S: AsRef<str>>(
    query: &str,
    candidates: &'a [S],
    log: Option<&dyn MatchLog>,
) -> Option<Resolved<'a>> {
    let not_found = || {
        if let Some(log) = log {
            log.warn(&format!("Lora \"{query}\" not found, skipping."));
        }
        None
    };

    // 空字符串不做任何匹配 (否则会被模糊匹配到第一个候选)
    if query.is_empty() {
        return not_found();
    }

    let found = move |index: usize, strategy: MatchStrategy| {
        let path = candidates[index].as_ref();
        if let Some(log) = log {
            match strategy {
                MatchStrategy::Exact
                | MatchStrategy::WithoutExtension
                | MatchStrategy::ForcedWithoutExtension => {}
                MatchStrategy::Fuzzy => {
                    log.warn(&format!("Fuzzy-matched Lora input \"{query}\" to \"{path}\"."))
                }
                _ => log.info(&format!("Matched Lora input \"{query}\" to \"{path}\".")),
            }
        }
        Some(Resolved { path, strategy })
    };

    let position = move |needle: &str, transform: fn(&str) -> &str| {
        candidates
            .iter()
            .position(|candidate| transform(candidate.as_ref()) == needle)
    };

    if let Some(i) = position(query, |c| c) {
        return found(i, MatchStrategy::Exact);
    }

    // 输入的是完整路径, 但没有扩展名
    if let Some(i) = position(query, strip_extension) {
        return found(i, MatchStrategy::WithoutExtension);
    }
    if let Some(i) = position(strip_extension(query), strip_extension) {
        return found(i, MatchStrategy::ForcedWithoutExtension);
    }

    // 只输入了文件名
    if let Some(i) = position(query, basename) {
        return found(i, MatchStrategy::Basename);
    }
    if let Some(i) = position(basename(query), basename) {
        return found(i, MatchStrategy::ForcedBasename);
    }

    if let Some(i) = position(query, stem) {
        return found(i, MatchStrategy::BasenameWithoutExtension);
    }
    if let Some(i) = position(stem(query), stem) {
        return found(i, MatchStrategy::ForcedBasenameWithoutExtension);
    }

    // 最后, 只要路径中包含输入即可
    if let Some(i) = candidates
        .iter()
        .position(|candidate| candidate.as_ref().contains(query))
    {
        return found(i, MatchStrategy::Fuzzy);
    }

    not_found()
}

/// 目录分隔符, 兼容 Windows 路径
fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// 去掉目录部分, 保留扩展名
pub fn basename(path: &str) -> &str {
    match path.rfind(is_separator) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// 去掉扩展名, 保留目录部分
///
/// 扩展名从文件名最后一个 `.` 开始; 文件名开头的连续 `.` 不算 (如 `.hidden`)
pub fn strip_extension(path: &str) -> &str {
    let name_start = path.rfind(is_separator).map_or(0, |i| i + 1);
    let name = &path[name_start..];
    match name.rfind('.') {
        Some(dot) if name[..dot].chars().any(|c| c != '.') => &path[..name_start + dot],
        _ => path,
    }
}

/// 文件名 (去掉目录和扩展名)
pub fn stem(path: &str) -> &str {
    strip_extension(basename(path))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    /// 记录日志, 用于断言
    #[derive(Default)]
    struct RecordLog {
        infos: RefCell<Vec<String>>,
        warns: RefCell<Vec<String>>,
    }

    impl MatchLog for RecordLog {
        fn info(&self, message: &str) {
            self.infos.borrow_mut().push(message.to_string());
        }

        fn warn(&self, message: &str) {
            self.warns.borrow_mut().push(message.to_string());
        }
    }

    fn loras() -> Vec<String> {
        vec![
            "flux/detail_tweaker.safetensors".to_string(),
            "sdxl/styles/pixel-art.safetensors".to_string(),
            "add_detail.pt".to_string(),
            "flux/v1.0/anime.lora.safetensors".to_string(),
        ]
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(basename("a/b/c.bin"), "c.bin");
        assert_eq!(basename("a\\b\\c.bin"), "c.bin");
        assert_eq!(basename("c.bin"), "c.bin");
        assert_eq!(basename("a/b/"), "");

        assert_eq!(strip_extension("a/b/c.bin"), "a/b/c");
        assert_eq!(strip_extension("a/b.d/c"), "a/b.d/c");
        assert_eq!(strip_extension("anime.lora.safetensors"), "anime.lora");
        assert_eq!(strip_extension(".hidden"), ".hidden");
        assert_eq!(strip_extension("dir/..bin"), "dir/..bin");
        assert_eq!(strip_extension("dir/.a.bin"), "dir/.a");
        assert_eq!(strip_extension(""), "");

        assert_eq!(stem("flux/v1.0/anime.lora.safetensors"), "anime.lora");
    }

    #[test]
    fn test_exact_match() {
        let candidates = loras();
        for candidate in &candidates {
            let resolved = resolve(candidate, &candidates, None).unwrap();
            assert_eq!(resolved.path, candidate.as_str());
            assert_eq!(resolved.strategy, MatchStrategy::Exact);
        }
    }

    #[test]
    fn test_without_extension_returns_original() {
        let candidates = loras();
        for candidate in &candidates {
            let resolved = resolve(strip_extension(candidate), &candidates, None).unwrap();
            assert_eq!(resolved.path, candidate.as_str());
            assert_eq!(resolved.strategy, MatchStrategy::WithoutExtension);
        }
    }

    #[test]
    fn test_forced_without_extension() {
        let candidates = loras();
        // 输入带了不同的扩展名
        let resolved = resolve("sdxl/styles/pixel-art.ckpt", &candidates, None).unwrap();
        assert_eq!(resolved.path, "sdxl/styles/pixel-art.safetensors");
        assert_eq!(resolved.strategy, MatchStrategy::ForcedWithoutExtension);
    }

    #[test]
    fn test_basename_ambiguity_follows_candidate_order() {
        let candidates = ["models/a.bin", "other/a.bin"];
        let resolved = resolve("a.bin", &candidates, None).unwrap();
        assert_eq!(resolved.path, "models/a.bin");
        assert_eq!(resolved.strategy, MatchStrategy::Basename);
    }

    #[test]
    fn test_forced_basename() {
        let candidates = loras();
        let resolved = resolve("old/place/add_detail.pt", &candidates, None).unwrap();
        assert_eq!(resolved.path, "add_detail.pt");
        assert_eq!(resolved.strategy, MatchStrategy::ForcedBasename);
    }

    #[test]
    fn test_basename_without_extension() {
        let candidates = ["models/foo.safetensors"];
        let resolved = resolve("foo", &candidates, None).unwrap();
        assert_eq!(resolved.path, "models/foo.safetensors");
        assert_eq!(resolved.strategy, MatchStrategy::BasenameWithoutExtension);
    }

    #[test]
    fn test_forced_basename_without_extension() {
        let candidates = loras();
        let resolved = resolve("elsewhere/pixel-art.pt", &candidates, None).unwrap();
        assert_eq!(resolved.path, "sdxl/styles/pixel-art.safetensors");
        assert_eq!(
            resolved.strategy,
            MatchStrategy::ForcedBasenameWithoutExtension
        );
    }

    #[test]
    fn test_fuzzy_match_is_flagged() {
        let candidates = ["abcdef.bin"];
        let log = RecordLog::default();
        let resolved = resolve("cde", &candidates, Some(&log)).unwrap();

        assert_eq!(resolved.path, "abcdef.bin");
        assert!(resolved.strategy.is_fuzzy());
        assert!(log.infos.borrow().is_empty());
        assert_eq!(
            log.warns.borrow().as_slice(),
            ["Fuzzy-matched Lora input \"cde\" to \"abcdef.bin\"."]
        );
    }

    #[test]
    fn test_basename_preferred_over_substring() {
        // "foo" 是第一个候选的子串, 同时是第二个候选的文件名(去扩展名)
        let candidates = ["models/foobar.safetensors", "other/foo.safetensors"];
        let resolved = resolve("foo", &candidates, None).unwrap();
        assert_eq!(resolved.path, "other/foo.safetensors");
        assert!(!resolved.strategy.is_fuzzy());
    }

    #[test]
    fn test_not_found() {
        let candidates = ["x/y/z.bin"];
        let log = RecordLog::default();
        assert_eq!(resolve("nomatchstring", &candidates, Some(&log)), None);
        assert_eq!(
            log.warns.borrow().as_slice(),
            ["Lora \"nomatchstring\" not found, skipping."]
        );
    }

    #[test]
    fn test_empty_inputs() {
        let empty: [&str; 0] = [];
        assert_eq!(resolve("anything", &empty, None), None);
        assert_eq!(resolve("", &empty, None), None);
        assert_eq!(resolve("", &loras(), None), None);
    }

    #[test]
    fn test_confident_matches_log_info() {
        let candidates = loras();
        let log = RecordLog::default();

        resolve("flux/detail_tweaker.safetensors", &candidates, Some(&log));
        resolve("flux/detail_tweaker", &candidates, Some(&log));
        assert!(log.infos.borrow().is_empty());

        resolve("detail_tweaker", &candidates, Some(&log));
        assert_eq!(
            log.infos.borrow().as_slice(),
            ["Matched Lora input \"detail_tweaker\" to \"flux/detail_tweaker.safetensors\"."]
        );
        assert!(log.warns.borrow().is_empty());
    }

    #[test]
    fn test_basename_strategies_log_info() {
        let candidates = loras();
        let cases = [
            ("detail_tweaker.safetensors", MatchStrategy::Basename, "flux/detail_tweaker.safetensors"),
            ("old/place/add_detail.pt", MatchStrategy::ForcedBasename, "add_detail.pt"),
            (
                "elsewhere/pixel-art.pt",
                MatchStrategy::ForcedBasenameWithoutExtension,
                "sdxl/styles/pixel-art.safetensors",
            ),
        ];

        for (query, strategy, path) in cases {
            let log = RecordLog::default();
            let resolved = resolve(query, &candidates, Some(&log)).unwrap();
            assert_eq!(resolved.strategy, strategy);
            assert_eq!(resolved.path, path);
            assert_eq!(
                log.infos.borrow().as_slice(),
                [format!("Matched Lora input \"{query}\" to \"{path}\".")]
            );
            assert!(log.warns.borrow().is_empty());
        }
    }

    #[test]
    fn test_backslash_separated_candidates() {
        let candidates = ["models\\foo.safetensors", "models\\sub\\bar.pt"];

        let resolved = resolve("foo", &candidates, None).unwrap();
        assert_eq!(resolved.path, "models\\foo.safetensors");
        assert_eq!(resolved.strategy, MatchStrategy::BasenameWithoutExtension);

        let resolved = resolve("bar.pt", &candidates, None).unwrap();
        assert_eq!(resolved.path, "models\\sub\\bar.pt");
        assert_eq!(resolved.strategy, MatchStrategy::Basename);

        let resolved = resolve("models\\sub\\bar", &candidates, None).unwrap();
        assert_eq!(resolved.path, "models\\sub\\bar.pt");
        assert_eq!(resolved.strategy, MatchStrategy::WithoutExtension);
    }

    #[test]
    fn test_log_does_not_change_result() {
        let candidates = loras();
        let log = RecordLog::default();
        for query in ["anime.lora", "pixel", "add_detail", "missing", ""] {
            assert_eq!(
                resolve(query, &candidates, None),
                resolve(query, &candidates, Some(&log))
            );
        }
    }

    #[test]
    fn test_idempotent() {
        let candidates = loras();
        let first = resolve("tweaker", &candidates, None);
        let second = resolve("tweaker", &candidates, None);
        assert_eq!(first, second);
        assert_eq!(first.map(|r| r.path), Some("flux/detail_tweaker.safetensors"));
    }
}
