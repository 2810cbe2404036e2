//! Best-effort symbol extraction for source-file gists.
//!
//! One pattern table per language, matched line by line. The contract is
//! strictly best-effort: unknown extension, unparseable source, or a pattern
//! that fails to compile all yield an empty list, never an error. Symbol
//! names good enough for a one-line gist are the goal, not a parse.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Extraction patterns for one language. The first capture group of each
/// pattern is the symbol name.
struct LanguageSpec {
    extensions: &'static [&'static str],
    display_name: &'static str,
    patterns: &'static [&'static str],
}

const LANGUAGES: &[LanguageSpec] = &[
    LanguageSpec {
        extensions: &["rs"],
        display_name: "Rust",
        patterns: &[
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:unsafe\s+)?fn\s+([A-Za-z_][A-Za-z0-9_]*)",
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait)\s+([A-Za-z_][A-Za-z0-9_]*)",
        ],
    },
    LanguageSpec {
        extensions: &["py"],
        display_name: "Python",
        patterns: &[
            r"^\s*(?:async\s+)?def\s+([A-Za-z_][A-Za-z0-9_]*)",
            r"^\s*class\s+([A-Za-z_][A-Za-z0-9_]*)",
        ],
    },
    LanguageSpec {
        extensions: &["js", "jsx", "ts", "tsx"],
        display_name: "JavaScript/TypeScript",
        patterns: &[
            r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][A-Za-z0-9_$]*)",
            r"^\s*(?:export\s+)?(?:abstract\s+)?class\s+([A-Za-z_$][A-Za-z0-9_$]*)",
            r"^\s*(?:export\s+)?const\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*(?:async\s+)?\(",
        ],
    },
    LanguageSpec {
        extensions: &["go"],
        display_name: "Go",
        patterns: &[
            r"^func\s+(?:\([^)]*\)\s+)?([A-Za-z_][A-Za-z0-9_]*)",
            r"^type\s+([A-Za-z_][A-Za-z0-9_]*)",
        ],
    },
    LanguageSpec {
        extensions: &["java"],
        display_name: "Java",
        patterns: &[
            r"^\s*(?:public\s+|protected\s+|private\s+)?(?:static\s+)?(?:abstract\s+|final\s+)?(?:class|interface|enum)\s+([A-Za-z_][A-Za-z0-9_]*)",
        ],
    },
];

/// Compiled pattern tables. Patterns are literals, but a failed compile
/// just drops that pattern (best-effort all the way down).
static COMPILED: LazyLock<Vec<(&'static LanguageSpec, Vec<Regex>)>> = LazyLock::new(|| {
    LANGUAGES
        .iter()
        .map(|spec| {
            let patterns = spec
                .patterns
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect();
            (spec, patterns)
        })
        .collect()
});

fn spec_for(extension: &str) -> Option<&'static (&'static LanguageSpec, Vec<Regex>)> {
    COMPILED
        .iter()
        .find(|(spec, _)| spec.extensions.contains(&extension))
}

/// Whether this extension has a symbol-extraction table.
pub fn is_source_extension(extension: &str) -> bool {
    spec_for(extension).is_some()
}

/// Display name for a source extension (`"rs"` to `"Rust"`).
pub fn language_name(extension: &str) -> Option<&'static str> {
    spec_for(extension).map(|(spec, _)| spec.display_name)
}

/// Extract declared function/class names from source text, in order of first
/// appearance, deduplicated. Empty on unknown extension or no matches.
pub fn extract_symbols(extension: &str, source: &str) -> Vec<String> {
    let Some((_, patterns)) = spec_for(extension) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for line in source.lines() {
        for pattern in patterns {
            if let Some(captures) = pattern.captures(line)
                && let Some(name) = captures.get(1)
            {
                if seen.insert(name.as_str().to_string()) {
                    out.push(name.as_str().to_string());
                }
                break;
            }
        }
    }
    out
}
