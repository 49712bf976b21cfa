//! Reading QR codes back out of images.

use std::path::Path;

use image::DynamicImage;
use serde::Serialize;
use tracing::{debug, warn};

use crate::content::ContentType;
use crate::display::format_display_content;
use crate::error::{Error, Result};

/// One decoded symbol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub content: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub display_content: String,
}

impl ScanResult {
    fn new(content: String) -> Self {
        let content_type = detect_content_type(&content);
        let display_content = format_display_content(&content, content_type);
        Self {
            content,
            content_type,
            display_content,
        }
    }
}

/// Guesses the convention a decoded string follows from its prefix.
pub fn detect_content_type(content: &str) -> ContentType {
    let upper = content.trim_start().to_ascii_uppercase();
    if upper.starts_with("WIFI:") {
        ContentType::Wifi
    } else if upper.starts_with("BEGIN:VCARD") {
        ContentType::Vcard
    } else if upper.starts_with("BEGIN:VCALENDAR") || upper.starts_with("BEGIN:VEVENT") {
        ContentType::Vevent
    } else if upper.starts_with("MAILTO:") {
        ContentType::Email
    } else if upper.starts_with("SMS:") || upper.starts_with("SMSTO:") {
        ContentType::Sms
    } else if upper.starts_with("GEO:") {
        ContentType::Geo
    } else if upper.starts_with("HTTPS://WA.ME/") || upper.starts_with("HTTP://WA.ME/") {
        ContentType::Whatsapp
    } else if upper.starts_with("TEL:") {
        ContentType::Phone
    } else if upper.starts_with("HTTP://") || upper.starts_with("HTTPS://") {
        ContentType::Url
    } else {
        ContentType::Text
    }
}

/// Decodes every QR code found in `img`.
///
/// Symbols that are located but fail to decode are skipped; if nothing at all
/// decodes, the first failure is returned.
pub fn decode_image(img: &DynamicImage) -> Result<Vec<ScanResult>> {
    let luma = img.to_luma8();
    let (width, height) = luma.dimensions();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        width as usize,
        height as usize,
        |x, y| luma.get_pixel(x as u32, y as u32)[0],
    );

    let grids = prepared.detect_grids();
    debug!(width, height, grids = grids.len(), "scanned image");
    if grids.is_empty() {
        return Err(Error::NoCodeFound);
    }

    let mut results = Vec::new();
    let mut first_error = None;
    for grid in grids {
        match grid.decode() {
            Ok((_meta, content)) => results.push(ScanResult::new(content)),
            Err(err) => {
                warn!(error = %err, "located a QR code but could not decode it");
                first_error.get_or_insert_with(|| err.to_string());
            }
        }
    }

    match (results.is_empty(), first_error) {
        (true, Some(message)) => Err(Error::Decode(message)),
        (true, None) => Err(Error::NoCodeFound),
        (false, _) => Ok(results),
    }
}

/// Opens `path` and decodes the QR codes in it.
pub fn decode_file(path: impl AsRef<Path>) -> Result<Vec<ScanResult>> {
    let img = image::open(path.as_ref())?;
    decode_image(&img)
}
