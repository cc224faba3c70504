// src/utils/html.rs

/// Sanitises admin-authored HTML before it goes out by email.
///
/// Whitelist based: formatting tags such as <b> and <p> survive, while
/// <script>, <iframe> and event-handler attributes are dropped along with
/// their content.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
