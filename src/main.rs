//! CLI entry point for qrcraft
//!
//! Generates styled QR codes for the supported content types, scans codes
//! out of images and manages the generation history.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use tracing_subscriber::EnvFilter;

use qrcraft::config::Config;
use qrcraft::content::{
    ContentPayload, EmailData, GeoData, PhoneData, SmsData, VCardData, VEventData, WhatsAppData,
    WifiData,
};
use qrcraft::history::{History, HistoryStore, QrCodeData};
use qrcraft::render::{render_image, save_image, to_svg_string, to_terminal_string, QrMatrix};
use qrcraft::scan::decode_file;
use qrcraft::settings::{LogoSettings, QrCodeSettings, Rgba};

#[derive(Parser)]
#[command(name = "qrcraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a QR code
    Generate {
        #[command(subcommand)]
        content: ContentArgs,

        #[command(flatten)]
        style: StyleArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Decode the QR codes in an image
    Scan {
        /// Image file to read
        image: PathBuf,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or edit the generation history
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Subcommand)]
enum ContentArgs {
    /// A web address
    Url { url: String },

    /// Free text
    Text { text: String },

    /// Wi-Fi network credentials
    Wifi {
        #[arg(long)]
        ssid: String,
        #[arg(long, default_value = "")]
        password: String,
        /// WPA, WEP or nopass
        #[arg(long, default_value = "WPA")]
        encryption: String,
        #[arg(long)]
        hidden: bool,
    },

    /// A contact card (vCard 3.0)
    Vcard {
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long = "org", default_value = "")]
        organization: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        website: String,
        #[arg(long, default_value = "")]
        street: String,
        #[arg(long, default_value = "")]
        city: String,
        #[arg(long, default_value = "")]
        state: String,
        #[arg(long, default_value = "")]
        zip: String,
        #[arg(long, default_value = "")]
        country: String,
    },

    /// A calendar event (iCalendar)
    #[command(alias = "event")]
    Vevent {
        #[arg(long, default_value = "")]
        summary: String,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        description: String,
        /// YYYY-MM-DD
        #[arg(long, default_value = "")]
        start_date: String,
        /// HH:MM
        #[arg(long, default_value = "")]
        start_time: String,
        #[arg(long, default_value = "")]
        end_date: String,
        #[arg(long, default_value = "")]
        end_time: String,
        #[arg(long)]
        all_day: bool,
    },

    /// An email draft
    Email {
        to: String,
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "")]
        body: String,
    },

    /// A text message
    Sms {
        to: String,
        #[arg(long, default_value = "")]
        body: String,
    },

    /// A map location
    Geo {
        #[arg(allow_negative_numbers = true)]
        latitude: String,
        #[arg(allow_negative_numbers = true)]
        longitude: String,
    },

    /// A WhatsApp chat link
    Whatsapp {
        to: String,
        #[arg(long, default_value = "")]
        message: String,
    },

    /// A phone number
    Phone { to: String },
}

impl From<ContentArgs> for ContentPayload {
    fn from(args: ContentArgs) -> Self {
        match args {
            ContentArgs::Url { url } => ContentPayload::Url(url),
            ContentArgs::Text { text } => ContentPayload::Text(text),
            ContentArgs::Wifi {
                ssid,
                password,
                encryption,
                hidden,
            } => ContentPayload::Wifi(WifiData {
                ssid,
                password,
                encryption,
                hidden,
            }),
            ContentArgs::Vcard {
                first_name,
                last_name,
                organization,
                title,
                phone,
                email,
                website,
                street,
                city,
                state,
                zip,
                country,
            } => ContentPayload::Vcard(VCardData {
                first_name,
                last_name,
                organization,
                title,
                phone,
                email,
                website,
                street,
                city,
                state,
                zip,
                country,
            }),
            ContentArgs::Vevent {
                summary,
                location,
                description,
                start_date,
                start_time,
                end_date,
                end_time,
                all_day,
            } => ContentPayload::Vevent(VEventData {
                summary,
                location,
                description,
                start_date,
                start_time,
                end_date,
                end_time,
                all_day,
            }),
            ContentArgs::Email { to, subject, body } => {
                ContentPayload::Email(EmailData { to, subject, body })
            }
            ContentArgs::Sms { to, body } => ContentPayload::Sms(SmsData { to, body }),
            ContentArgs::Geo {
                latitude,
                longitude,
            } => ContentPayload::Geo(GeoData {
                latitude,
                longitude,
            }),
            ContentArgs::Whatsapp { to, message } => {
                ContentPayload::Whatsapp(WhatsAppData { to, message })
            }
            ContentArgs::Phone { to } => ContentPayload::Phone(PhoneData { to }),
        }
    }
}

/// Flags overriding the configured default settings.
#[derive(Args)]
struct StyleArgs {
    /// Foreground color (#rgb, #rrggbb or #rrggbbaa)
    #[arg(long, global = true)]
    fg: Option<String>,
    /// Background color
    #[arg(long, global = true)]
    bg: Option<String>,
    /// Rendered size in pixels
    #[arg(long, global = true)]
    size: Option<u32>,
    /// Error correction level: L, M, Q or H
    #[arg(long, global = true)]
    ecc: Option<String>,
    /// Quiet zone width in modules
    #[arg(long, global = true)]
    margin: Option<u32>,
    /// Logo image drawn in the center
    #[arg(long, global = true)]
    logo: Option<PathBuf>,
    /// Logo size as a fraction of the code size
    #[arg(long, global = true)]
    logo_ratio: Option<f32>,
    /// Clear the modules behind the logo
    #[arg(long, global = true)]
    logo_cutout: bool,
    /// Image drawn behind the code
    #[arg(long, global = true)]
    background_image: Option<PathBuf>,
    /// Frame style: none, square or rounded
    #[arg(long, global = true)]
    frame: Option<String>,
    /// Caption shown under a framed code
    #[arg(long, global = true)]
    frame_text: Option<String>,
}

impl StyleArgs {
    fn apply(&self, mut settings: QrCodeSettings) -> qrcraft::Result<QrCodeSettings> {
        if let Some(fg) = &self.fg {
            settings.foreground = Rgba::from_hex(fg)?;
        }
        if let Some(bg) = &self.bg {
            settings.background = Rgba::from_hex(bg)?;
        }
        if let Some(size) = self.size {
            settings.size = size;
        }
        if let Some(ecc) = &self.ecc {
            settings.error_correction = ecc.parse()?;
        }
        if let Some(margin) = self.margin {
            settings.margin = margin;
        }
        if let Some(path) = &self.logo {
            settings.logo = Some(LogoSettings::new(path));
        }
        if let Some(logo) = settings.logo.as_mut() {
            if let Some(ratio) = self.logo_ratio {
                logo.size_ratio = ratio;
            }
            logo.cutout |= self.logo_cutout;
        }
        if let Some(path) = &self.background_image {
            settings.background_image = Some(path.clone());
        }
        if let Some(frame) = &self.frame {
            settings.frame.kind = frame.parse()?;
        }
        if let Some(text) = &self.frame_text {
            settings.frame.text = text.clone();
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Png,
    Svg,
    Terminal,
}

#[derive(Args)]
struct OutputArgs {
    #[arg(long, global = true, value_enum, default_value = "png")]
    format: OutputFormat,
    /// Output file (defaults to a timestamped file in the output directory)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
    /// Do not record this code in the history
    #[arg(long, global = true)]
    no_history: bool,
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List recent codes, newest first
    List,
    /// Show one entry and print its code
    Show { id: String },
    /// Render an entry again with its stored settings
    Render {
        id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Delete one entry
    Remove { id: String },
    /// Delete every entry
    Clear,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            let code = err
                .downcast_ref::<qrcraft::Error>()
                .map(qrcraft::Error::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let store = HistoryStore::new(config.history_path());

    match cli.command {
        Commands::Generate {
            content,
            style,
            output,
        } => {
            let settings = style.apply(config.defaults.clone())?;
            let data = QrCodeData::new(&ContentPayload::from(content), &settings);
            emit(&data, &output, &config)?;
            if config.record_history && !output.no_history {
                store.update(|history| history.add(data.clone()))?;
                println!("{} Saved to history as {}", "✓".green(), data.id.bold());
            }
        }
        Commands::Scan { image, json } => scan(&image, json)?,
        Commands::History { command } => history(command, &store, &config)?,
    }

    Ok(())
}

/// Renders `data` in the requested format.
fn emit(data: &QrCodeData, output: &OutputArgs, config: &Config) -> anyhow::Result<()> {
    let matrix = QrMatrix::encode(&data.content, data.settings.error_correction)
        .context("content is too long for a QR code")?;

    println!("{} {}", "→".cyan(), data.display_content);
    match output.format {
        OutputFormat::Terminal => {
            print!("{}", to_terminal_string(&matrix, data.settings.margin));
        }
        OutputFormat::Svg => {
            let svg = to_svg_string(&matrix, &data.settings);
            let path = output
                .output
                .clone()
                .unwrap_or_else(|| config.output_dir.join(format!("qr-{}.svg", data.id)));
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, svg)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("{} Wrote {}", "✓".green(), path.display());
        }
        OutputFormat::Png => {
            let img = render_image(&matrix, &data.settings)?;
            let path = match &output.output {
                Some(path) => {
                    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
                    let stem = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .context("output path has no file name")?;
                    save_image(&img, Some(dir.unwrap_or_else(|| Path::new("."))), Some(stem))?
                }
                None => save_image(
                    &img,
                    Some(config.output_dir.as_path()),
                    Some(format!("qr-{}", data.id).as_str()),
                )?,
            };
            println!("{} Wrote {}", "✓".green(), path.display());
        }
    }
    Ok(())
}

fn scan(image: &Path, json: bool) -> anyhow::Result<()> {
    let results = decode_file(image)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!(
        "{} Found {} code{}\n",
        "✓".green(),
        results.len(),
        if results.len() == 1 { "" } else { "s" }
    );
    for (i, result) in results.iter().enumerate() {
        println!(
            "{} {} {}",
            format!("{}.", i + 1).dimmed(),
            format!("[{}]", result.content_type).magenta(),
            result.display_content.bold()
        );
        println!("   {}", result.content);
    }
    Ok(())
}

fn history(command: HistoryCommand, store: &HistoryStore, config: &Config) -> anyhow::Result<()> {
    match command {
        HistoryCommand::List => {
            let history = store.load()?;
            if history.is_empty() {
                println!("{}", "History is empty".dimmed());
            }
            print_history(&history);
        }
        HistoryCommand::Show { id } => {
            let history = store.load()?;
            let Some(item) = history.get(&id) else {
                return Err(qrcraft::Error::NotFound(id).into());
            };
            println!("{} {}", "id:".dimmed(), item.id);
            println!("{} {}", "type:".dimmed(), item.content_type);
            println!("{} {}", "created:".dimmed(), item.created_at.to_rfc3339());
            println!("{} {}", "label:".dimmed(), item.display_content);
            println!("{}\n{}\n", "content:".dimmed(), item.content);
            let matrix = QrMatrix::encode(&item.content, item.settings.error_correction)?;
            print!("{}", to_terminal_string(&matrix, item.settings.margin));
        }
        HistoryCommand::Render { id, output } => {
            let history = store.load()?;
            let Some(item) = history.get(&id) else {
                return Err(qrcraft::Error::NotFound(id).into());
            };
            emit(item, &output, config)?;
        }
        HistoryCommand::Remove { id } => {
            let removed = store.update(|history| history.remove(&id))?;
            match removed {
                Some(item) => println!("{} Removed {}", "✓".green(), item.display_content),
                None => bail!(qrcraft::Error::NotFound(id)),
            }
        }
        HistoryCommand::Clear => {
            store.update(History::clear)?;
            println!("{} History cleared", "✓".green());
        }
    }
    Ok(())
}

fn print_history(history: &History) {
    for item in history.items() {
        println!(
            "{}  {}  {}  {}",
            item.id.yellow(),
            item.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            format!("{:<8}", item.content_type.as_str()).magenta(),
            item.display_content
        );
    }
}
