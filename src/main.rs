// src/main.rs — 主入口 & 子命令分发
mod config;
mod payload;
mod qr;
mod scan;
mod types;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use config::Config;
use qr::QrStyle;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use types::{Encryption, WifiCredential};

// ════════════════════════════════════════════════════════════════
// CLI 参数
// ════════════════════════════════════════════════════════════════

#[derive(Parser)]
#[command(name = "wifi-qr", about = "Generate and scan Wi-Fi QR codes", version)]
struct Cli {
    /// Config file (defaults: config.toml beside the binary, then ~/.config/wifi-qr/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Generate a QR code for a network
    Generate(GenerateArgs),
    /// Scan a Wi-Fi QR code from an image file
    Scan {
        image: PathBuf,
        #[command(flatten)]
        output: ReportArgs,
    },
    /// Decode WIFI: payload text directly
    Parse {
        payload: String,
        #[command(flatten)]
        output: ReportArgs,
    },
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Network name
    ssid: String,
    /// Password (ignored for nopass)
    #[arg(short, long, default_value = "")]
    password: String,
    /// Encryption type [default: from config]
    #[arg(short, long, value_enum, ignore_case = true)]
    encryption: Option<Encryption>,
    /// Hidden network
    #[arg(long)]
    hidden: bool,
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,
    /// Output file for png / svg [default: named after the SSID]
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Module colour, #RRGGBB
    #[arg(long)]
    dark: Option<String>,
    /// Background colour, #RRGGBB
    #[arg(long)]
    light: Option<String>,
    /// Export side length in pixels
    #[arg(long)]
    size: Option<u32>,
    /// Logo image placed in the centre (png / svg)
    #[arg(long)]
    logo: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ReportArgs {
    /// Print as JSON
    #[arg(long, conflicts_with = "credentials")]
    json: bool,
    /// Print only the SSID / password text
    #[arg(long)]
    credentials: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
enum Format {
    /// Terminal block characters
    Text,
    /// Raw payload string
    Data,
    Png,
    Svg,
}

// ════════════════════════════════════════════════════════════════
// 入口
// ════════════════════════════════════════════════════════════════

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("{default},wifi_qr={default}")),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let cfg = Config::load(cli.config.as_deref())?;

    match cli.cmd {
        Cmd::Generate(args) => generate(args, &cfg),
        Cmd::Scan { image, output } => {
            let cred = scan::scan_file(&image)?;
            print_report(&cred, &output)
        }
        Cmd::Parse { payload: text, output } => {
            let cred = payload::decode(text.trim_end_matches(['\r', '\n']))?;
            print_report(&cred, &output)
        }
    }
}

// ════════════════════════════════════════════════════════════════
// 生成
// ════════════════════════════════════════════════════════════════

fn generate(args: GenerateArgs, cfg: &Config) -> Result<()> {
    let encryption = args.encryption.unwrap_or(cfg.default_encryption);

    // SSID 为空时不生成任何载荷
    let data = match payload::build(&args.ssid, &args.password, encryption, args.hidden) {
        Some(d) => d,
        None => bail!("SSID must not be empty"),
    };
    if encryption.needs_password() && args.password.is_empty() {
        tracing::warn!(%encryption, "empty password for an encrypted network");
    }
    tracing::info!(ssid = %args.ssid, %encryption, hidden = args.hidden, "payload built");

    let mut style = QrStyle::from_config(cfg)?;
    if let Some(dark) = &args.dark {
        style.dark = qr::normalize_hex(dark)?;
    }
    if let Some(light) = &args.light {
        style.light = qr::normalize_hex(light)?;
    }
    // 过小的尺寸由渲染器拒绝
    if let Some(size) = args.size {
        style.size = size;
    }
    style.logo = args.logo;

    match args.format {
        Format::Data => println!("{data}"),
        Format::Text => println!("{}", qr::render_terminal(&data)?),
        Format::Png => {
            let bytes = qr::render_png(&data, &style)?;
            let path = output_path(args.output, &args.ssid, "png", cfg);
            write_export(&path, &bytes)?;
        }
        Format::Svg => {
            let svg = qr::render_svg(&data, &style)?;
            let path = output_path(args.output, &args.ssid, "svg", cfg);
            write_export(&path, svg.as_bytes())?;
        }
    }
    Ok(())
}

fn output_path(explicit: Option<PathBuf>, ssid: &str, ext: &str, cfg: &Config) -> PathBuf {
    explicit.unwrap_or_else(|| cfg.output_path(&qr::export_file_name(ssid, ext)))
}

fn write_export(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)?;
    println!("Exported {}", path.display());
    Ok(())
}

// ════════════════════════════════════════════════════════════════
// 扫描结果输出
// ════════════════════════════════════════════════════════════════

fn print_report(cred: &WifiCredential, args: &ReportArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(cred)?);
    } else if args.credentials {
        println!("{}", cred.credentials_text());
    } else {
        for line in cred.report_lines() {
            println!("{line}");
        }
    }
    Ok(())
}
