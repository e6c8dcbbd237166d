//! Static option lists rendered by the admin views.

use serde::Serialize;

/// A selectable highlight.js theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HighlightJsStyle {
    pub key: &'static str,
    pub name: &'static str,
    /// Whether code blocks need a border to stand out on this theme.
    pub border: bool,
}

pub const HIGHLIGHT_JS_STYLES: [HighlightJsStyle; 10] = [
    HighlightJsStyle { key: "github", name: "[Light] GitHub", border: false },
    HighlightJsStyle { key: "github-gist", name: "[Light] GitHub Gist", border: true },
    HighlightJsStyle { key: "atom-one-light", name: "[Light] Atom One Light", border: true },
    HighlightJsStyle { key: "xcode", name: "[Light] Xcode", border: true },
    HighlightJsStyle { key: "vs", name: "[Light] Vs", border: true },
    HighlightJsStyle { key: "atom-one-dark", name: "[Dark] Atom One Dark", border: false },
    HighlightJsStyle { key: "hybrid", name: "[Dark] Hybrid", border: false },
    HighlightJsStyle { key: "monokai", name: "[Dark] Monokai", border: false },
    HighlightJsStyle { key: "tomorrow-night", name: "[Dark] Tomorrow Night", border: false },
    HighlightJsStyle { key: "vs2015", name: "[Dark] Vs 2015", border: false },
];

/// Looks up a highlight.js theme by key.
pub fn highlight_js_style(key: &str) -> Option<&'static HighlightJsStyle> {
    HIGHLIGHT_JS_STYLES.iter().find(|style| style.key == key)
}

/// Tag and attribute whitelist suggested for the custom XSS option.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XssWhiteList {
    pub tags: &'static [&'static str],
    pub attrs: &'static [&'static str],
}

pub const RECOMMENDED_XSS_WHITELIST: XssWhiteList = XssWhiteList {
    tags: &[
        "a", "abbr", "b", "blockquote", "br", "code", "dd", "del", "details", "div", "dl", "dt",
        "em", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "iframe", "img", "ins", "kbd", "li",
        "ol", "p", "pre", "s", "span", "strong", "sub", "summary", "sup", "table", "tbody", "td",
        "th", "thead", "tr", "ul", "video",
    ],
    attrs: &[
        "src", "href", "class", "id", "width", "height", "alt", "title", "style", "target", "rel",
        "allowfullscreen", "frameborder",
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_js_style_lookup() {
        let style = highlight_js_style("monokai").unwrap();
        assert_eq!(style.name, "[Dark] Monokai");
        assert!(!style.border);
        assert!(highlight_js_style("solarized").is_none());
    }

    #[test]
    fn test_highlight_js_style_keys_are_unique() {
        let mut keys: Vec<_> = HIGHLIGHT_JS_STYLES.iter().map(|s| s.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), HIGHLIGHT_JS_STYLES.len());
    }

    #[test]
    fn test_recommended_whitelist_serializes() {
        let json = serde_json::to_value(&RECOMMENDED_XSS_WHITELIST).unwrap();
        assert!(json["tags"].as_array().unwrap().iter().any(|t| t == "iframe"));
        assert!(json["attrs"].as_array().unwrap().iter().any(|a| a == "src"));
    }
}
