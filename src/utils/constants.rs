//! Shared constants: default user agent and the closed set of UA presets.

/// Chrome user agent string.
///
/// Updated: 2025-01-29 to Chrome 132 (current stable).
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Resolve a user-agent preset token to a literal UA string.
///
/// Unrecognized tokens are returned verbatim, per spec: `userAgent` may be a
/// preset token from the closed set or a literal string.
#[must_use]
pub fn resolve_user_agent(preset_or_literal: &str) -> &str {
    match preset_or_literal {
        "chrome" => CHROME_USER_AGENT,
        "firefox" => "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:132.0) Gecko/20100101 Firefox/132.0",
        "safari" => "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
        "mobile" => "Mozilla/5.0 (iPhone; CPU iPhone OS 17_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Mobile/15E148 Safari/604.1",
        "bot" => "Mozilla/5.0 (compatible; jsbug-render/1.0; +https://example.invalid/bot)",
        "googlebot" => "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
        "googlebot-mobile" => "Mozilla/5.0 (Linux; Android 6.0.1; Nexus 5X Build/MMB29P) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Mobile Safari/537.36 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
        "bingbot" => "Mozilla/5.0 (compatible; bingbot/2.0; +http://www.bing.com/bingbot.htm)",
        "claudebot" => "Mozilla/5.0 (compatible; ClaudeBot/1.0; +claudebot@anthropic.com)",
        "claude-user" => "Mozilla/5.0 (compatible; Claude-User/1.0; +https://www.anthropic.com)",
        "chatgpt-user" => "Mozilla/5.0 (compatible; ChatGPT-User/1.0; +https://openai.com/bot)",
        "gptbot" => "Mozilla/5.0 (compatible; GPTBot/1.1; +https://openai.com/gptbot)",
        other => other,
    }
}

/// Case-insensitive substring match for mobile UA detection.
#[must_use]
pub fn is_mobile_user_agent(ua: &str) -> bool {
    let lower = ua.to_ascii_lowercase();
    ["mobile", "android", "iphone", "ipad", "ipod"]
        .iter()
        .any(|needle| lower.contains(needle))
}
