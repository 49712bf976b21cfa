//! Content encoding.
//!
//! Maps a typed payload to the exact string a QR code should carry. Every
//! format follows a published convention (the Wi-Fi QR convention, vCard 3.0,
//! iCalendar, and the `mailto:`, `sms:`, `geo:`, `tel:` and `wa.me` URI
//! schemes) so generated codes work with any scanner.
//!
//! Encoding never fails. Empty optional fields are omitted and everything
//! else is passed through as given, including values that are not valid for
//! the target format.
//!
//! Field values are **not** escaped. A `;` inside a Wi-Fi SSID, or a `,` inside
//! a geo coordinate, produces ambiguous output.

use std::fmt;
use std::str::FromStr;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Characters left alone by `encodeURIComponent`; everything else is escaped.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// The closed set of content conventions a QR code can carry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Url,
    Text,
    Wifi,
    Vcard,
    Vevent,
    Email,
    Sms,
    Geo,
    Whatsapp,
    Phone,
}

impl ContentType {
    pub const ALL: [ContentType; 10] = [
        ContentType::Url,
        ContentType::Text,
        ContentType::Wifi,
        ContentType::Vcard,
        ContentType::Vevent,
        ContentType::Email,
        ContentType::Sms,
        ContentType::Geo,
        ContentType::Whatsapp,
        ContentType::Phone,
    ];

    /// The lowercase tag used in history files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Url => "url",
            ContentType::Text => "text",
            ContentType::Wifi => "wifi",
            ContentType::Vcard => "vcard",
            ContentType::Vevent => "vevent",
            ContentType::Email => "email",
            ContentType::Sms => "sms",
            ContentType::Geo => "geo",
            ContentType::Whatsapp => "whatsapp",
            ContentType::Phone => "phone",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        ContentType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == tag)
            .ok_or_else(|| Error::UnknownContentType(s.to_string()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WifiData {
    pub ssid: String,
    pub password: String,
    /// `WPA`, `WEP`, `nopass`, ...; emitted as given.
    pub encryption: String,
    pub hidden: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VCardData {
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub title: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl VCardData {
    fn has_address(&self) -> bool {
        [&self.street, &self.city, &self.state, &self.zip, &self.country]
            .iter()
            .any(|part| !part.is_empty())
    }
}

/// A calendar event. Dates are `YYYY-MM-DD`, times `HH:MM`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VEventData {
    pub summary: String,
    pub location: String,
    pub description: String,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    pub all_day: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmailData {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SmsData {
    pub to: String,
    pub body: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeoData {
    pub latitude: String,
    pub longitude: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WhatsAppData {
    pub to: String,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhoneData {
    pub to: String,
}

/// A payload tagged with the convention it should be encoded with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ContentPayload {
    Url(String),
    Text(String),
    Wifi(WifiData),
    Vcard(VCardData),
    Vevent(VEventData),
    Email(EmailData),
    Sms(SmsData),
    Geo(GeoData),
    Whatsapp(WhatsAppData),
    Phone(PhoneData),
}

impl ContentPayload {
    pub fn content_type(&self) -> ContentType {
        match self {
            ContentPayload::Url(_) => ContentType::Url,
            ContentPayload::Text(_) => ContentType::Text,
            ContentPayload::Wifi(_) => ContentType::Wifi,
            ContentPayload::Vcard(_) => ContentType::Vcard,
            ContentPayload::Vevent(_) => ContentType::Vevent,
            ContentPayload::Email(_) => ContentType::Email,
            ContentPayload::Sms(_) => ContentType::Sms,
            ContentPayload::Geo(_) => ContentType::Geo,
            ContentPayload::Whatsapp(_) => ContentType::Whatsapp,
            ContentPayload::Phone(_) => ContentType::Phone,
        }
    }

    /// Returns the string to embed in the QR code.
    pub fn encode(&self) -> String {
        match self {
            ContentPayload::Url(text) | ContentPayload::Text(text) => text.clone(),
            ContentPayload::Wifi(data) => encode_wifi(data),
            ContentPayload::Vcard(data) => encode_vcard(data),
            ContentPayload::Vevent(data) => encode_vevent(data),
            ContentPayload::Email(data) => encode_email(data),
            ContentPayload::Sms(data) => encode_sms(data),
            ContentPayload::Geo(data) => encode_geo(data),
            ContentPayload::Whatsapp(data) => encode_whatsapp(data),
            ContentPayload::Phone(data) => encode_phone(data),
        }
    }
}

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Appends `?k=v&k=v` for every pair with a non-empty value.
fn with_query(base: String, params: &[(&str, &str)]) -> String {
    let query: Vec<String> = params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}={}", key, encode_component(value)))
        .collect();
    if query.is_empty() {
        base
    } else {
        format!("{}?{}", base, query.join("&"))
    }
}

/// `WIFI:T:<encryption>;S:<ssid>;P:<password>;H:<hidden>;;`
pub fn encode_wifi(data: &WifiData) -> String {
    format!(
        "WIFI:T:{};S:{};P:{};H:{};;",
        data.encryption, data.ssid, data.password, data.hidden
    )
}

pub fn encode_vcard(data: &VCardData) -> String {
    let mut lines = vec!["BEGIN:VCARD".to_string(), "VERSION:3.0".to_string()];

    if !data.first_name.is_empty() || !data.last_name.is_empty() {
        let full_name = format!("{} {}", data.first_name, data.last_name);
        lines.push(format!("FN:{}", full_name.trim()));
        lines.push(format!("N:{};{};;;", data.last_name, data.first_name));
    }

    let optional = [
        ("ORG", &data.organization),
        ("TITLE", &data.title),
        ("TEL", &data.phone),
        ("EMAIL", &data.email),
        ("URL", &data.website),
    ];
    for (key, value) in optional {
        if !value.is_empty() {
            lines.push(format!("{}:{}", key, value));
        }
    }

    if data.has_address() {
        lines.push(format!(
            "ADR:;;{};{};{};{};{}",
            data.street, data.city, data.state, data.zip, data.country
        ));
    }

    lines.push("END:VCARD".to_string());
    lines.join("\n")
}

/// Formats an iCalendar date or date-time by concatenating digits.
///
/// No validation happens here: `2024-1-5` becomes `202415`.
fn format_ical_datetime(date: &str, time: &str, all_day: bool) -> String {
    let date_digits = date.replace('-', "");
    if all_day {
        date_digits
    } else {
        format!("{}T{}00", date_digits, time.replace(':', ""))
    }
}

pub fn encode_vevent(data: &VEventData) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "BEGIN:VEVENT".to_string(),
    ];

    let optional = [
        ("SUMMARY", &data.summary),
        ("LOCATION", &data.location),
        ("DESCRIPTION", &data.description),
    ];
    for (key, value) in optional {
        if !value.is_empty() {
            lines.push(format!("{}:{}", key, value));
        }
    }

    if !data.start_date.is_empty() {
        lines.push(format!(
            "DTSTART:{}",
            format_ical_datetime(&data.start_date, &data.start_time, data.all_day)
        ));
    }
    if !data.end_date.is_empty() {
        lines.push(format!(
            "DTEND:{}",
            format_ical_datetime(&data.end_date, &data.end_time, data.all_day)
        ));
    }

    lines.push("END:VEVENT".to_string());
    lines.push("END:VCALENDAR".to_string());
    lines.join("\n")
}

pub fn encode_email(data: &EmailData) -> String {
    with_query(
        format!("mailto:{}", data.to),
        &[("subject", data.subject.as_str()), ("body", data.body.as_str())],
    )
}

pub fn encode_sms(data: &SmsData) -> String {
    with_query(format!("sms:{}", data.to), &[("body", data.body.as_str())])
}

pub fn encode_geo(data: &GeoData) -> String {
    format!("geo:{},{}", data.latitude, data.longitude)
}

pub fn encode_whatsapp(data: &WhatsAppData) -> String {
    with_query(format!("https://wa.me/{}", data.to), &[("text", data.message.as_str())])
}

pub fn encode_phone(data: &PhoneData) -> String {
    format!("tel:{}", data.to)
}
