// src/utils/html.rs

use ammonia;

/// Clean admin-authored content using the ammonia library.
///
/// Whitelist-based sanitization: safe tags (like <b>, <p>) survive, dangerous
/// tags (like <script>, <iframe>) and attributes (like onclick) are stripped.
/// Serves as a fail-safe against Stored XSS in quiz titles, descriptions and
/// question prompts, which are rendered verbatim by quiz-taking clients.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
