//! Visual and encoding parameters for a rendered QR code.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Error correction level for a QR code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    /// Tolerates ~7% erroneous codewords.
    L,
    /// Tolerates ~15% erroneous codewords.
    #[default]
    M,
    /// Tolerates ~25% erroneous codewords.
    Q,
    /// Tolerates ~30% erroneous codewords.
    H,
}

impl From<ErrorCorrection> for qrcode::EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => qrcode::EcLevel::L,
            ErrorCorrection::M => qrcode::EcLevel::M,
            ErrorCorrection::Q => qrcode::EcLevel::Q,
            ErrorCorrection::H => qrcode::EcLevel::H,
        }
    }
}

impl FromStr for ErrorCorrection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "low" => Ok(ErrorCorrection::L),
            "m" | "medium" => Ok(ErrorCorrection::M),
            "q" | "quartile" => Ok(ErrorCorrection::Q),
            "h" | "high" => Ok(ErrorCorrection::H),
            _ => Err(Error::InvalidErrorCorrection(s.to_string())),
        }
    }
}

impl fmt::Display for ErrorCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCorrection::L => "L",
            ErrorCorrection::M => "M",
            ErrorCorrection::Q => "Q",
            ErrorCorrection::H => "H",
        };
        f.write_str(name)
    }
}

/// An RGBA color, written as a CSS-style hex string.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const BLACK: Rgba = Rgba([0, 0, 0, 255]);
    pub const WHITE: Rgba = Rgba([255, 255, 255, 255]);

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    pub fn from_hex(value: &str) -> Result<Self> {
        let invalid = || Error::InvalidColor(value.to_string());
        let hex = value.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(invalid());
        }
        let byte = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

        match hex.len() {
            3 => {
                let mut rgba = [255u8; 4];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16).ok_or_else(invalid)? as u8;
                    rgba[i] = v * 17;
                }
                Ok(Rgba(rgba))
            }
            6 | 8 => {
                let alpha = if hex.len() == 8 { byte(&hex[6..8])? } else { 255 };
                Ok(Rgba([byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?, alpha]))
            }
            _ => Err(invalid()),
        }
    }

    /// `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.0;
        if a == 255 {
            format!("#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
        }
    }
}

impl FromStr for Rgba {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Rgba::from_hex(s)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Rgba::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// A logo drawn over the center of the code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoSettings {
    pub image: PathBuf,
    /// Logo edge length as a fraction of the rendered size.
    #[serde(default = "default_logo_ratio")]
    pub size_ratio: f32,
    /// Clear the modules underneath the logo instead of drawing over them.
    #[serde(default)]
    pub cutout: bool,
}

fn default_logo_ratio() -> f32 {
    0.2
}

impl LogoSettings {
    pub fn new(image: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            size_ratio: default_logo_ratio(),
            cutout: false,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameType {
    #[default]
    None,
    Square,
    Rounded,
}

impl FromStr for FrameType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(FrameType::None),
            "square" => Ok(FrameType::Square),
            "rounded" => Ok(FrameType::Rounded),
            other => Err(Error::InvalidSettings(format!("unknown frame type '{}'", other))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrameSettings {
    #[serde(rename = "type")]
    pub kind: FrameType,
    pub text: String,
}

impl FrameSettings {
    /// The caption to draw, if any. A `none` frame never shows text.
    pub fn caption(&self) -> Option<&str> {
        match self.kind {
            FrameType::None => None,
            _ if self.text.trim().is_empty() => None,
            _ => Some(self.text.as_str()),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.kind != FrameType::None
    }
}

/// Everything that controls how a QR code looks.
///
/// A [`QrCodeData`](crate::history::QrCodeData) stores its own copy of these,
/// so editing the settings afterwards never changes history entries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QrCodeSettings {
    pub foreground: Rgba,
    pub background: Rgba,
    /// Requested edge length in pixels, quiet zone and frame included.
    ///
    /// Modules are drawn at a whole number of pixels, so the rendered edge is
    /// the largest multiple of the module count that fits (never less than
    /// one pixel per module). A caption band adds rows below it.
    pub size: u32,
    pub error_correction: ErrorCorrection,
    /// Quiet zone width in modules.
    pub margin: u32,
    pub logo: Option<LogoSettings>,
    pub background_image: Option<PathBuf>,
    pub frame: FrameSettings,
}

impl Default for QrCodeSettings {
    fn default() -> Self {
        Self {
            foreground: Rgba::BLACK,
            background: Rgba::WHITE,
            size: 256,
            error_correction: ErrorCorrection::M,
            margin: 4,
            logo: None,
            background_image: None,
            frame: FrameSettings::default(),
        }
    }
}

pub const MIN_SIZE: u32 = 21;
pub const MAX_SIZE: u32 = 4096;
pub const MAX_LOGO_RATIO: f32 = 0.5;

impl QrCodeSettings {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&self.size) {
            return Err(Error::InvalidSettings(format!(
                "size must be between {} and {} pixels, got {}",
                MIN_SIZE, MAX_SIZE, self.size
            )));
        }
        if let Some(logo) = &self.logo {
            if !(logo.size_ratio > 0.0 && logo.size_ratio <= MAX_LOGO_RATIO) {
                return Err(Error::InvalidSettings(format!(
                    "logo size ratio must be in (0, {}], got {}",
                    MAX_LOGO_RATIO, logo.size_ratio
                )));
            }
        }
        if self.foreground == self.background {
            return Err(Error::InvalidSettings(
                "foreground and background colors are identical".to_string(),
            ));
        }
        Ok(())
    }

    /// Logo edge length in pixels.
    pub fn logo_pixels(&self) -> Option<u32> {
        self.logo
            .as_ref()
            .map(|logo| ((self.size as f32) * logo.size_ratio).round().max(1.0) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_colors() {
        assert_eq!(Rgba::from_hex("#000000").unwrap(), Rgba::BLACK);
        assert_eq!(Rgba::from_hex("fff").unwrap(), Rgba::WHITE);
        assert_eq!(Rgba::from_hex("#1e90ff80").unwrap(), Rgba([0x1e, 0x90, 0xff, 0x80]));
        assert_eq!(Rgba::from_hex("#f80").unwrap().to_hex(), "#ff8800");
        assert_eq!(Rgba([1, 2, 3, 4]).to_hex(), "#01020304");
    }

    #[test]
    fn test_bad_hex_colors() {
        for bad in ["", "#12", "#ggg", "#12345", "blue", "#ffé"] {
            assert!(matches!(Rgba::from_hex(bad), Err(Error::InvalidColor(_))), "{bad}");
        }
    }

    #[test]
    fn test_error_correction_parse() {
        assert_eq!("h".parse::<ErrorCorrection>().unwrap(), ErrorCorrection::H);
        assert_eq!("Quartile".parse::<ErrorCorrection>().unwrap(), ErrorCorrection::Q);
        assert!("x".parse::<ErrorCorrection>().is_err());
        assert!(ErrorCorrection::L < ErrorCorrection::H);
    }

    #[test]
    fn test_frame_caption() {
        let mut frame = FrameSettings {
            kind: FrameType::None,
            text: "Scan me".into(),
        };
        assert_eq!(frame.caption(), None);
        frame.kind = FrameType::Rounded;
        assert_eq!(frame.caption(), Some("Scan me"));
        frame.text = "  ".into();
        assert_eq!(frame.caption(), None);
    }

    #[test]
    fn test_validate() {
        assert!(QrCodeSettings::default().validate().is_ok());

        let mut settings = QrCodeSettings::default();
        settings.size = 5;
        assert!(settings.validate().is_err());

        let mut settings = QrCodeSettings::default();
        settings.logo = Some(LogoSettings {
            size_ratio: 0.8,
            ..LogoSettings::new("logo.png")
        });
        assert!(settings.validate().is_err());

        let mut settings = QrCodeSettings::default();
        settings.background = Rgba::BLACK;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_logo_pixels() {
        let mut settings = QrCodeSettings::default();
        assert_eq!(settings.logo_pixels(), None);
        settings.logo = Some(LogoSettings::new("logo.png"));
        assert_eq!(settings.logo_pixels(), Some(51));
    }

    #[test]
    fn test_settings_json_shape() {
        let json = serde_json::to_value(QrCodeSettings::default()).unwrap();
        assert_eq!(json["foreground"], "#000000");
        assert_eq!(json["errorCorrection"], "M");
        assert_eq!(json["frame"]["type"], "none");

        let parsed: QrCodeSettings =
            serde_json::from_str(r##"{"background":"#eee","size":512}"##).unwrap();
        assert_eq!(parsed.background, Rgba([0xee, 0xee, 0xee, 255]));
        assert_eq!(parsed.size, 512);
        assert_eq!(parsed.margin, 4);
    }
}
