use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use image::imageops::{self, FilterType};
use image::{Rgba as Pixel, RgbaImage};
use qrcode::{Color, QrCode};
use tracing::{debug, warn};

use crate::error::Result;
use crate::settings::{ErrorCorrection, FrameType, QrCodeSettings, Rgba};

/// Caption band height, in modules, below a framed code.
const CAPTION_MODULES: u32 = 4;
/// Frame stroke width in modules.
const FRAME_MODULES: u32 = 1;

/// The dark/light module grid of an encoded QR symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrMatrix {
    width: u32,
    modules: Vec<bool>,
}

impl QrMatrix {
    /// Encodes `content` at the given error correction level, choosing the
    /// smallest version that fits.
    pub fn encode(content: &str, level: ErrorCorrection) -> Result<Self> {
        let code = QrCode::with_error_correction_level(content.as_bytes(), level.into())?;
        let width = code.width() as u32;
        let modules = code
            .to_colors()
            .into_iter()
            .map(|color| color == Color::Dark)
            .collect();
        debug!(width, bytes = content.len(), %level, "encoded QR matrix");
        Ok(Self { width, modules })
    }

    /// Width and height in modules, between 21 and 177.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns whether the module at (x, y) is dark. Coordinates outside the
    /// symbol, such as the quiet zone, are light.
    pub fn is_dark(&self, x: i64, y: i64) -> bool {
        let w = i64::from(self.width);
        if x < 0 || y < 0 || x >= w || y >= w {
            return false;
        }
        self.modules[(y * w + x) as usize]
    }
}

/// Pixel geometry shared by the SVG and raster renderers.
struct Layout {
    /// Pixels per module.
    scale: u32,
    /// Offset of the symbol's top-left module from the image origin.
    origin: u32,
    /// Edge of the square part of the image.
    side: u32,
    /// Extra rows below the square for a caption.
    caption_height: u32,
}

impl Layout {
    fn new(matrix: &QrMatrix, settings: &QrCodeSettings) -> Self {
        let frame = if settings.frame.is_visible() { FRAME_MODULES } else { 0 };
        let span = matrix.width() + 2 * (settings.margin + frame);
        let scale = (settings.size / span).max(1);
        let caption_height = if settings.frame.caption().is_some() {
            CAPTION_MODULES * scale
        } else {
            0
        };
        Self {
            scale,
            origin: (settings.margin + frame) * scale,
            side: span * scale,
            caption_height,
        }
    }

    fn height(&self) -> u32 {
        self.side + self.caption_height
    }
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Returns a string of SVG code for an image depicting the given matrix.
///
/// The quiet zone, colors, pixel size and frame from `settings` are applied.
/// Logos and background images are raster-only and are ignored here.
/// The string always uses Unix newlines (\n), regardless of the platform.
pub fn to_svg_string(matrix: &QrMatrix, settings: &QrCodeSettings) -> String {
    let layout = Layout::new(matrix, settings);
    let (width, height) = (layout.side, layout.height());
    let fg = settings.foreground.to_hex();
    let bg = settings.background.to_hex();

    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
    result += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{0}\" height=\"{1}\" viewBox=\"0 0 {0} {1}\" stroke=\"none\">\n",
        width, height
    );

    let radius = if settings.frame.kind == FrameType::Rounded { layout.scale * 2 } else { 0 };
    result += &format!(
        "\t<rect width=\"100%\" height=\"100%\" rx=\"{}\" fill=\"{}\"/>\n",
        radius, bg
    );

    if settings.frame.is_visible() {
        let stroke = FRAME_MODULES * layout.scale;
        let half = stroke as f32 / 2.0;
        result += &format!(
            "\t<rect x=\"{0}\" y=\"{0}\" width=\"{1}\" height=\"{2}\" rx=\"{3}\" fill=\"none\" stroke=\"{4}\" stroke-width=\"{5}\"/>\n",
            half,
            width as f32 - stroke as f32,
            height as f32 - stroke as f32,
            radius,
            fg,
            stroke
        );
    }

    result += "\t<path d=\"";
    let mut first = true;
    let w = i64::from(matrix.width());
    for y in 0..w {
        for x in 0..w {
            if matrix.is_dark(x, y) {
                if !first {
                    result += " ";
                }
                first = false;
                result += &format!(
                    "M{},{}h{s}v{s}h-{s}z",
                    layout.origin as i64 + x * i64::from(layout.scale),
                    layout.origin as i64 + y * i64::from(layout.scale),
                    s = layout.scale
                );
            }
        }
    }
    result += &format!("\" fill=\"{}\"/>\n", fg);

    if let Some(caption) = settings.frame.caption() {
        let font_size = layout.caption_height / 2;
        result += &format!(
            "\t<text x=\"{}\" y=\"{}\" font-family=\"sans-serif\" font-size=\"{}\" text-anchor=\"middle\" dominant-baseline=\"middle\" fill=\"{}\">{}</text>\n",
            width / 2,
            layout.side + layout.caption_height / 2 - layout.scale / 2,
            font_size,
            fg,
            xml_escape(caption)
        );
    }

    result += "</svg>\n";
    result
}

/// Renders the matrix with Unicode half blocks, two modules per character
/// row, so it can be scanned straight off a terminal.
pub fn to_terminal_string(matrix: &QrMatrix, border: u32) -> String {
    let border = i64::from(border);
    let w = i64::from(matrix.width());
    let mut out = String::new();
    let mut y = -border;
    while y < w + border {
        for x in -border..w + border {
            let top = matrix.is_dark(x, y);
            let bottom = matrix.is_dark(x, y + 1);
            out.push(match (top, bottom) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        out.push('\n');
        y += 2;
    }
    out
}

fn pixel(color: Rgba) -> Pixel<u8> {
    Pixel(color.0)
}

/// Whether (x, y) lies outside a rounded corner of radius `r` on a w*h box.
fn outside_rounded_corner(x: u32, y: u32, w: u32, h: u32, r: u32) -> bool {
    if r == 0 {
        return false;
    }
    let cx = if x < r {
        r
    } else if x >= w - r {
        w - r - 1
    } else {
        return false;
    };
    let cy = if y < r {
        r
    } else if y >= h - r {
        h - r - 1
    } else {
        return false;
    };
    let dx = i64::from(x) - i64::from(cx);
    let dy = i64::from(y) - i64::from(cy);
    dx * dx + dy * dy > i64::from(r) * i64::from(r)
}

fn load_scaled(path: &Path, width: u32, height: u32) -> Result<RgbaImage> {
    let img = image::open(path)?.to_rgba8();
    Ok(imageops::resize(&img, width, height, FilterType::Lanczos3))
}

/// Renders the matrix to an RGBA image using every option in `settings`.
///
/// # Errors
///
/// Returns an error if the logo or background image cannot be read.
pub fn render_image(matrix: &QrMatrix, settings: &QrCodeSettings) -> Result<RgbaImage> {
    let layout = Layout::new(matrix, settings);
    let (width, height) = (layout.side, layout.height());
    let fg = pixel(settings.foreground);
    let bg = pixel(settings.background);

    let mut img = match &settings.background_image {
        Some(path) => load_scaled(path, width, height)?,
        None => RgbaImage::from_pixel(width, height, bg),
    };

    let logo = match (&settings.logo, settings.logo_pixels()) {
        (Some(logo), Some(edge)) => {
            let edge = edge.min(layout.side);
            Some((load_scaled(&logo.image, edge, edge)?, logo.cutout))
        }
        _ => None,
    };
    // Square of the image hidden by the logo, as [start, end) in pixels.
    let logo_box = logo.as_ref().map(|(logo_img, _)| {
        let start = (layout.side - logo_img.width()) / 2;
        (start, start + logo_img.width())
    });

    let scale = i64::from(layout.scale);
    let origin = i64::from(layout.origin);
    for (x, y, px) in img.enumerate_pixels_mut() {
        if y >= layout.side {
            continue;
        }
        let mx = (i64::from(x) - origin).div_euclid(scale);
        let my = (i64::from(y) - origin).div_euclid(scale);
        if !matrix.is_dark(mx, my) {
            continue;
        }
        let cut = match (&logo, logo_box) {
            (Some((_, true)), Some((start, end))) => {
                (start..end).contains(&x) && (start..end).contains(&y)
            }
            _ => false,
        };
        *px = if cut { bg } else { fg };
    }

    if let (Some((logo_img, _)), Some((start, _))) = (&logo, logo_box) {
        imageops::overlay(&mut img, logo_img, i64::from(start), i64::from(start));
    }

    if settings.frame.is_visible() {
        draw_frame(&mut img, &layout, settings, fg);
    }

    Ok(img)
}

fn draw_frame(img: &mut RgbaImage, layout: &Layout, settings: &QrCodeSettings, fg: Pixel<u8>) {
    let (w, h) = img.dimensions();
    let stroke = FRAME_MODULES * layout.scale;
    let radius = if settings.frame.kind == FrameType::Rounded { layout.scale * 2 } else { 0 };
    let transparent = Pixel([0, 0, 0, 0]);

    for (x, y, px) in img.enumerate_pixels_mut() {
        if outside_rounded_corner(x, y, w, h, radius) {
            *px = transparent;
            continue;
        }
        let on_edge = x < stroke || y < stroke || x >= w - stroke || y >= h - stroke;
        let inner_corner = outside_rounded_corner(
            x.saturating_sub(stroke),
            y.saturating_sub(stroke),
            w - 2 * stroke,
            h - 2 * stroke,
            radius.saturating_sub(stroke),
        );
        // The caption band is a solid strip; its text only exists in SVG output.
        let in_caption = layout.caption_height > 0 && y >= layout.side;
        if on_edge || inner_corner || in_caption {
            *px = fg;
        }
    }
}

/// Encodes `content` with `settings` and renders it to an image.
pub fn generate_image_buffer(content: &str, settings: &QrCodeSettings) -> Result<RgbaImage> {
    settings.validate()?;
    let matrix = QrMatrix::encode(content, settings.error_correction)?;
    render_image(&matrix, settings)
}

/// Encodes `content` with `settings` and returns SVG text.
pub fn generate_svg_string(content: &str, settings: &QrCodeSettings) -> Result<String> {
    settings.validate()?;
    let matrix = QrMatrix::encode(content, settings.error_correction)?;
    if settings.logo.is_some() || settings.background_image.is_some() {
        warn!("logo and background image are not rendered in SVG output");
    }
    Ok(to_svg_string(&matrix, settings))
}

/// Saves an already rendered image as PNG.
///
/// `directory_path` defaults to `generated` and is created if missing;
/// `filename` (without extension) defaults to a timestamp.
pub fn save_image(
    img: &RgbaImage,
    directory_path: Option<&Path>,
    filename: Option<&str>,
) -> Result<PathBuf> {
    let directory_path = directory_path.unwrap_or_else(|| Path::new("generated"));
    let filename = match filename {
        Some(name) => name.trim_end_matches(".png").to_string(),
        None => format!("qr-{}", Utc::now().format("%Y%m%d-%H%M%S%3f")),
    };
    fs::create_dir_all(directory_path)?;

    let file_path = directory_path.join(format!("{}.png", filename));
    img.save(&file_path)?;
    debug!(path = %file_path.display(), "saved QR image");
    Ok(file_path)
}

/// Generates a QR code image from `content` and saves it as PNG.
///
/// # Example
///
/// ```rust,no_run
/// use qrcraft::render::generate_image;
/// use qrcraft::settings::QrCodeSettings;
///
/// let path = generate_image("Hello, World!", &QrCodeSettings::default(), None, Some("hello"))?;
/// assert!(path.ends_with("hello.png"));
/// # Ok::<(), qrcraft::Error>(())
/// ```
pub fn generate_image(
    content: &str,
    settings: &QrCodeSettings,
    directory: Option<&Path>,
    filename: Option<&str>,
) -> Result<PathBuf> {
    let img = generate_image_buffer(content, settings)?;
    save_image(&img, directory, filename)
}
