//! Per-line text rewrites.
//!
//! Each pass is a function `&str -> String` applied in sequence:
//! literal patches, then the `%URL%` placeholder, then GitHub link
//! canonicalization. Canonicalization must see the placeholder's output so
//! that a substituted GitHub URL is rewritten too.

use std::sync::LazyLock;

use regex::Regex;

use nbimport_shared::{LiteralPatch, URL_PLACEHOLDER};

/// Raw-content host that GitHub "blob" links are rewritten to.
const RAW_CONTENT_PREFIX: &str = "https://raw.githubusercontent.com/";

/// Rewrite one source line.
pub(crate) fn rewrite_line(line: &str, source_url: &str, patches: &[LiteralPatch]) -> String {
    let mut result = apply_patches(line, patches);

    result = substitute_placeholder(&result, source_url);
    result = canonicalize_links(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Literal patches
// ---------------------------------------------------------------------------

/// Apply each patch in order, replacing every verbatim occurrence.
pub fn apply_patches(line: &str, patches: &[LiteralPatch]) -> String {
    patches
        .iter()
        .filter(|p| !p.find.is_empty())
        .fold(line.to_string(), |acc, p| acc.replace(&p.find, &p.replace))
}

// ---------------------------------------------------------------------------
// Pass 2: Placeholder substitution
// ---------------------------------------------------------------------------

/// Replace every `%URL%` with `source_url`, verbatim.
pub fn substitute_placeholder(line: &str, source_url: &str) -> String {
    line.replace(URL_PLACEHOLDER, source_url)
}

// ---------------------------------------------------------------------------
// Pass 3: Link canonicalization
// ---------------------------------------------------------------------------

/// Rewrite `https://github.com/<owner>/<repo>/blob/<rest>` to
/// `https://raw.githubusercontent.com/<owner>/<repo>/<rest>`.
///
/// `<rest>` stops at the first character outside `[a-zA-Z0-9.&/?:@\-_=#]`.
/// Already-canonical links do not match, so the pass is idempotent.
pub fn canonicalize_links(text: &str) -> String {
    static GITHUB_BLOB_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"https://github\.com/([^/]+/[^/]+)/blob/([a-zA-Z0-9.&/?:@\-_=#]+)")
            .expect("valid regex")
    });

    GITHUB_BLOB_RE
        .replace_all(text, format!("{RAW_CONTENT_PREFIX}${{1}}/${{2}}").as_str())
        .into_owned()
}
