//! Logo

/// 默认背景色
pub const DEFAULT_BG: &str = "transparent";
/// 默认前景色
pub const DEFAULT_FG: &str = "#111111";

const LOGO_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 256 256">
  <rect width="256" height="256" rx="48" fill="{bg}"/>
  <path fill="{fg}" d="M64 48h64c44.2 0 80 35.8 80 80s-35.8 80-80 80H64V48zm40 40v80h24c22.1 0 40-17.9 40-40s-17.9-40-40-40h-24z"/>
</svg>"##;

/// 颜色值只允许 CSS 颜色中会出现的字符, 避免注入 SVG 标签
fn sanitize_color<'a>(color: Option<&'a str>, default: &'a str) -> &'a str {
    match color {
        Some(c)
            if !c.is_empty()
                && c.len() <= 64
                && c.chars().all(|ch| {
                    ch.is_ascii_alphanumeric() || matches!(ch, '#' | '(' | ')' | ',' | '.' | '%' | ' ')
                }) =>
        {
            c
        }
        _ => default,
    }
}

/// 生成指定颜色的 Logo
pub fn logo_svg(bg: Option<&str>, fg: Option<&str>) -> String {
    LOGO_SVG
        .replace("{bg}", sanitize_color(bg, DEFAULT_BG))
        .replace("{fg}", sanitize_color(fg, DEFAULT_FG))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logo_defaults() {
        let svg = logo_svg(None, None);
        assert!(svg.contains(r#"fill="transparent""#));
        assert!(svg.contains(r##"fill="#111111""##));
        assert!(!svg.contains("{bg}"));
    }

    #[test]
    fn test_logo_colors() {
        let svg = logo_svg(Some("#ffffff"), Some("rgb(10, 20, 30)"));
        assert!(svg.contains(r##"fill="#ffffff""##));
        assert!(svg.contains(r#"fill="rgb(10, 20, 30)""#));
    }

    #[test]
    fn test_logo_rejects_markup() {
        let svg = logo_svg(Some(r#""/><script>"#), Some(""));
        assert!(!svg.contains("<script>"));
        assert!(svg.contains(r#"fill="transparent""#));
        assert!(svg.contains(r##"fill="#111111""##));
    }
}
