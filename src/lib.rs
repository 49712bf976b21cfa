//! # qrcraft
//!
//! A Rust library for building, styling, scanning and remembering QR codes.
//!
//! `qrcraft` turns structured content (a Wi-Fi network, a contact card, a calendar
//! event, an email, ...) into the exact string a QR code should carry, renders it with
//! custom colors, logos and frames, reads codes back out of images, and keeps a short
//! history of what was generated.
//!
//! ## Features
//!
//! - Encode URLs, text, Wi-Fi credentials, vCards, iCalendar events, `mailto:`, `sms:`,
//!   `geo:`, `tel:` and WhatsApp links.
//! - Summarize encoded content into short labels for lists.
//! - Render as PNG, SVG or terminal text with four error correction levels, custom
//!   colors, quiet zone, logo overlay, background image and square/rounded frames.
//! - Decode QR codes from images.
//! - Keep the ten most recent codes in a JSON history file.
//!
//! ## Example
//!
//! Encode a Wi-Fi network and get its list label:
//!
//! ```rust
//! use qrcraft::content::{ContentPayload, WifiData};
//! use qrcraft::history::QrCodeData;
//! use qrcraft::settings::QrCodeSettings;
//!
//! let payload = ContentPayload::Wifi(WifiData {
//!     ssid: "Cafe".into(),
//!     password: "latte".into(),
//!     encryption: "WPA".into(),
//!     hidden: false,
//! });
//! let data = QrCodeData::new(&payload, &QrCodeSettings::default());
//! assert_eq!(data.content, "WIFI:T:WPA;S:Cafe;P:latte;H:false;;");
//! assert_eq!(data.display_content, "Wi-Fi: Cafe (WPA)");
//! ```
//!
//! Render it to an in-memory image:
//!
//! ```rust
//! use qrcraft::render::generate_image_buffer;
//! use qrcraft::settings::{QrCodeSettings, Rgba};
//!
//! let settings = QrCodeSettings {
//!     foreground: Rgba::from_hex("#ff8800")?,
//!     ..Default::default()
//! };
//! let img = generate_image_buffer("Hello, World!", &settings)?;
//! assert_eq!(img.width(), img.height());
//! # Ok::<(), qrcraft::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`content`]: Payload records and the content encoder.
//! - [`display`]: Short labels for encoded content.
//! - [`settings`]: Colors, size, error correction, logo and frame options.
//! - [`render`]: SVG, terminal and raster rendering.
//! - [`scan`]: Decoding QR codes from images.
//! - [`history`]: Generated code records and the bounded history.
//! - [`config`]: The `config.toml` file.

#![forbid(unsafe_code)]

pub mod config;
pub mod content;
pub mod display;
pub mod error;
pub mod history;
pub mod render;
pub mod scan;
pub mod settings;

pub use error::{Error, Result};
