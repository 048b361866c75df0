//! Destination-path templates.
//!
//! A template is a plain string with two substitution tokens: `%p` expands
//! to the source file's parent directory and `%n` to its base name without
//! extension. Everything else passes through literally. The source
//! extension is appended to the expanded result unless it already ends
//! with it. Pure string manipulation, no filesystem checks.

use std::path::Path;

/// Token that expands to the source file's parent directory.
pub const TOKEN_PARENT: &str = "%p";
/// Token that expands to the source file's base name without extension.
pub const TOKEN_NAME: &str = "%n";

/// Suffix used when deriving a default template from the first added file.
const DEFAULT_SUFFIX: &str = "-resized";

/// Expand a template against a source path.
pub fn expand(template: &str, source: &str) -> String {
    let (parent, name, ext) = split_source(source);

    let mut out = template
        .replace(TOKEN_PARENT, &parent)
        .replace(TOKEN_NAME, &name);

    if !ext.is_empty() && !out.ends_with(&ext) {
        out.push_str(&ext);
    }
    out
}

/// Derive the default template from the first queued file: its parent
/// directory plus `%n-resized`. The extension is handled per-item by
/// [`expand`], so files added later keep their own extension.
pub fn default_template(source: &str) -> String {
    let (parent, _, _) = split_source(source);
    if parent.is_empty() {
        format!("{TOKEN_NAME}{DEFAULT_SUFFIX}")
    } else {
        format!("{parent}/{TOKEN_NAME}{DEFAULT_SUFFIX}")
    }
}

/// Split a source path into (parent dir, base name without extension,
/// extension including the leading dot). Missing pieces come back empty.
fn split_source(source: &str) -> (String, String, String) {
    let path = Path::new(source);

    let parent = path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (parent, name, ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_substitutes_both_tokens() {
        assert_eq!(
            expand("%p/%n-resized", "/a/b/c.png"),
            "/a/b/c-resized.png"
        );
    }

    #[test]
    fn expand_preserves_explicit_extension() {
        assert_eq!(
            expand("%p/%n-resized.png", "/a/b/c.png"),
            "/a/b/c-resized.png"
        );
    }

    #[test]
    fn expand_source_without_extension() {
        assert_eq!(expand("%p/%n-small", "/pics/photo"), "/pics/photo-small");
    }

    #[test]
    fn expand_literal_characters_pass_through() {
        assert_eq!(
            expand("/out/thumb-%n", "/a/b/c.jpg"),
            "/out/thumb-c.jpg"
        );
    }

    #[test]
    fn expand_bare_filename() {
        assert_eq!(expand("%n-resized", "c.png"), "c-resized.png");
    }

    #[test]
    fn default_template_uses_parent_dir() {
        assert_eq!(default_template("/a/b/c.png"), "/a/b/%n-resized");
    }

    #[test]
    fn default_template_without_parent() {
        assert_eq!(default_template("c.png"), "%n-resized");
    }

    #[test]
    fn default_template_round_trips_through_expand() {
        let tmpl = default_template("/pics/cat.jpg");
        assert_eq!(expand(&tmpl, "/pics/cat.jpg"), "/pics/cat-resized.jpg");
        // later files keep their own name and extension
        assert_eq!(expand(&tmpl, "/other/dog.png"), "/pics/dog-resized.png");
    }
}
