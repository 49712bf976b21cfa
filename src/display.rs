//! Short labels for encoded content.
//!
//! These helpers pull the first interesting field out of an encoded string
//! with a handful of regular expressions. They are summarizers, not parsers:
//! content that does not match the expected shape (hand-edited strings, codes
//! produced by other tools) falls back to the raw text instead of failing.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::content::ContentType;

// Wi-Fi fields only start right after `WIFI:` or a `;`, so a password such
// as `H:true` is never read as a field of its own.
static WIFI_SSID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^WIFI:|;)S:([^;]*)").unwrap());
static WIFI_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^WIFI:|;)T:([^;]*)").unwrap());
static WIFI_HIDDEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^WIFI:|;)H:(?i:true)(?:;|$)").unwrap());
static VCARD_FN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^FN:(.*?)\r?$").unwrap());
static VCARD_ORG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^ORG:(.*?)\r?$").unwrap());
static VEVENT_SUMMARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^SUMMARY:(.*?)\r?$").unwrap());
static EMAIL_ADDRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^mailto:([^?]*)").unwrap());
// `sms:<number>?body=..` and `SMSTO:<number>:<message>`
static SMS_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^sms(?:to)?:([^?:]*)").unwrap());
static GEO_COORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^geo:([^,]+),([^,?;]+)").unwrap());
static WHATSAPP_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)wa\.me/([^?]*)").unwrap());
static PHONE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^tel:(.*)$").unwrap());

fn capture<'a>(re: &Regex, content: &'a str) -> Option<&'a str> {
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Like [`capture`], but an empty field counts as no match.
fn capture_non_empty<'a>(re: &Regex, content: &'a str) -> Option<&'a str> {
    capture(re, content).filter(|value| !value.is_empty())
}

/// Returns a one-line label for `content`, which was encoded as `content_type`.
///
/// # Example
///
/// ```rust
/// use qrcraft::content::ContentType;
/// use qrcraft::display::format_display_content;
///
/// let label = format_display_content("WIFI:T:WPA;S:Cafe;P:latte;H:true;;", ContentType::Wifi);
/// assert_eq!(label, "Wi-Fi: Cafe (WPA, Hidden)");
/// ```
pub fn format_display_content(content: &str, content_type: ContentType) -> String {
    match content_type {
        ContentType::Wifi => format_wifi(content),
        ContentType::Vcard => {
            let name = capture_non_empty(&VCARD_FN, content)
                .or_else(|| capture_non_empty(&VCARD_ORG, content))
                .unwrap_or("Unknown");
            format!("Contact: {}", name)
        }
        ContentType::Vevent => {
            let summary = capture_non_empty(&VEVENT_SUMMARY, content).unwrap_or("Untitled Event");
            format!("Event: {}", summary)
        }
        ContentType::Email => format!(
            "Email: {}",
            capture_non_empty(&EMAIL_ADDRESS, content).unwrap_or(content)
        ),
        ContentType::Sms => format!(
            "SMS: {}",
            capture_non_empty(&SMS_NUMBER, content).unwrap_or(content)
        ),
        ContentType::Geo => match GEO_COORDS.captures(content) {
            Some(caps) => format!("Location: {}, {}", &caps[1], &caps[2]),
            None => content.to_string(),
        },
        ContentType::Whatsapp => format!(
            "WhatsApp: {}",
            capture_non_empty(&WHATSAPP_NUMBER, content).unwrap_or(content)
        ),
        ContentType::Phone => {
            format!("Phone: {}", capture(&PHONE_NUMBER, content).unwrap_or(content))
        }
        ContentType::Url | ContentType::Text => content.to_string(),
    }
}

/// Like [`format_display_content`] but takes the type as a free-form tag.
///
/// Unknown tags return the content unchanged.
pub fn format_display_for_tag(content: &str, tag: &str) -> String {
    match tag.parse::<ContentType>() {
        Ok(content_type) => format_display_content(content, content_type),
        Err(_) => content.to_string(),
    }
}

fn format_wifi(content: &str) -> String {
    let Some(ssid) = capture(&WIFI_SSID, content) else {
        return content.to_string();
    };
    let encryption = capture(&WIFI_TYPE, content).unwrap_or("");
    let hidden = if WIFI_HIDDEN.is_match(content) { ", Hidden" } else { "" };
    format!("Wi-Fi: {} ({}{})", ssid, encryption, hidden)
}
