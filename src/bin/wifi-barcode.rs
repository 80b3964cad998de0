//! Wi-Fi barcode command-line tool.
//!
//! Recovers saved Wi-Fi keys from copied configuration files and renders
//! networks as QR barcodes through the chart service.
//!
//! # Usage
//!
//! ```bash
//! wifi-barcode password ./wpa_supplicant.conf Home
//! wifi-barcode list ./WifiConfigStore.xml
//! wifi-barcode discover
//! wifi-barcode export ./wpa_supplicant.conf wifi.json
//! wifi-barcode payload Home secret123 --type wpa
//! wifi-barcode url Home secret123
//! wifi-barcode fetch Home secret123
//! wifi-barcode decode 'WIFI:T:WPA;S:Home;P:secret123;;'
//! wifi-barcode flush
//! ```
//!
//! Logging is controlled with `RUST_LOG` (default `info`).

use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use wifi_barcode::credentials::{
    discover_sources, flush_cached_copy, source_for_path, DEFAULT_PATTERNS,
};
use wifi_barcode::{
    chart_url, export, BarcodeCache, BarcodeCacheConfig, BarcodeStorage, FileStorage,
    HttpFetcher, NetworkType, Settings, WifiConfig,
};

const USAGE: &str = "\
Usage:
  wifi-barcode password <file> <ssid>
  wifi-barcode list <file>
  wifi-barcode discover [pattern...]
  wifi-barcode export <file> [out.json]
  wifi-barcode payload <ssid> [password] [--type nopass|wep|wpa]
  wifi-barcode url <ssid> [password] [--type nopass|wep|wpa]
  wifi-barcode fetch <ssid> [password] [--type nopass|wep|wpa]
  wifi-barcode decode <payload>
  wifi-barcode flush

Files ending in .xml are read as settings backups, anything else as
wpa_supplicant.conf.";

type CliResult = Result<ExitCode, Box<dyn std::error::Error>>;

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    };

    let settings = Settings::from_env();

    let result = match command.as_str() {
        "password" => cmd_password(rest),
        "list" => cmd_list(rest),
        "export" => cmd_export(rest),
        "discover" => cmd_discover(rest),
        "payload" => network_from_args(rest).map(|config| {
            println!("{}", config.to_payload());
            ExitCode::SUCCESS
        }),
        "url" => network_from_args(rest).map(|config| {
            println!("{}", chart_url(&config, &settings.chart));
            ExitCode::SUCCESS
        }),
        "fetch" => cmd_fetch(rest, &settings),
        "decode" => cmd_decode(rest),
        "flush" => cmd_flush(&settings),
        "help" | "-h" | "--help" => {
            println!("{}", USAGE);
            Ok(ExitCode::SUCCESS)
        }
        other => {
            eprintln!("Unknown command: {}\n\n{}", other, USAGE);
            Ok(ExitCode::FAILURE)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// `password <file> <ssid>`: print the key, exit 1 when absent.
fn cmd_password(args: &[String]) -> CliResult {
    let [file, ssid] = args else {
        return Err(usage_error("password <file> <ssid>"));
    };

    let source = source_for_path(file);
    info!("Reading {} source {}", source.name(), file);
    match source.find_password(ssid)? {
        Some(password) => {
            println!("{}", password);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("No key found for {:?}", ssid);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// `list <file>`: print every network found.
fn cmd_list(args: &[String]) -> CliResult {
    let [file] = args else {
        return Err(usage_error("list <file>"));
    };

    let creds = source_for_path(file).list()?;
    for cred in &creds {
        println!(
            "{}\t{}",
            cred.ssid,
            cred.password.as_deref().unwrap_or("<none/enterprise>")
        );
    }
    info!("{} network(s)", creds.len());
    Ok(ExitCode::SUCCESS)
}

/// `discover [pattern...]`: list readable credential files.
fn cmd_discover(args: &[String]) -> CliResult {
    let patterns: Vec<&str> = if args.is_empty() {
        DEFAULT_PATTERNS.to_vec()
    } else {
        args.iter().map(String::as_str).collect()
    };

    let sources = discover_sources(&patterns);
    if sources.is_empty() {
        eprintln!("No readable credential files found (root copy needed?)");
        return Ok(ExitCode::FAILURE);
    }
    for source in &sources {
        match source.list() {
            Ok(creds) => println!(
                "{}\t{}\t{} network(s)",
                source.name(),
                source.path().display(),
                creds.len()
            ),
            Err(e) => println!("{}\t{}\t{}", source.name(), source.path().display(), e),
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// `export <file> [out.json]`: JSON export to a file or stdout.
fn cmd_export(args: &[String]) -> CliResult {
    let (file, out) = match args {
        [file] => (file, None),
        [file, out] => (file, Some(out)),
        _ => return Err(usage_error("export <file> [out.json]")),
    };

    let creds = source_for_path(file).list()?;
    let json = export::to_json(&creds)?;
    match out {
        Some(out) => {
            std::fs::write(out, &json)?;
            info!("Exported {} network(s) to {}", creds.len(), out);
        }
        None => println!("{}", json),
    }
    Ok(ExitCode::SUCCESS)
}

/// `fetch ...`: fetch the barcode through the cache and print its path.
fn cmd_fetch(args: &[String], settings: &Settings) -> CliResult {
    let config = network_from_args(args)?;
    let url = chart_url(&config, &settings.chart);

    let storage = FileStorage::new(settings.barcode_dir())?;
    let mut cache = BarcodeCache::new(storage, BarcodeCacheConfig::default())?;
    let fetcher = HttpFetcher::new(wifi_barcode::barcode::DEFAULT_FETCH_TIMEOUT)?;

    let len = cache.get_or_fetch(&url, &fetcher)?.len();
    info!("Barcode ready ({} bytes)", len);
    println!("{}", cache.storage().path_for(url.as_str()).display());
    Ok(ExitCode::SUCCESS)
}

/// `decode <payload>`: print the fields of a scanned barcode.
fn cmd_decode(args: &[String]) -> CliResult {
    let [payload] = args else {
        return Err(usage_error("decode <payload>"));
    };

    let config = WifiConfig::from_payload(payload)?;
    println!("SSID: {}", config.ssid);
    println!("Type: {}", config.network_type);
    if !config.is_open() {
        println!("Password: {}", config.password);
    }
    Ok(ExitCode::SUCCESS)
}

/// `flush`: drop the supplicant copy and all cached barcodes.
fn cmd_flush(settings: &Settings) -> CliResult {
    flush_cached_copy(&settings.supplicant_copy())?;

    let dir: PathBuf = settings.barcode_dir();
    if dir.is_dir() {
        let mut storage = FileStorage::new(dir)?;
        storage.clear()?;
        info!("Cleared barcode cache {:?}", storage.dir());
    }
    Ok(ExitCode::SUCCESS)
}

/// Parse `<ssid> [password] [--type t]` into a validated network.
fn network_from_args(args: &[String]) -> Result<WifiConfig, Box<dyn std::error::Error>> {
    let mut positional = Vec::new();
    let mut network_type: Option<NetworkType> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--type" || arg == "-t" {
            let value = iter
                .next()
                .ok_or_else(|| usage_error("--type needs a value"))?;
            network_type = Some(value.parse()?);
        } else {
            positional.push(arg.as_str());
        }
    }

    let (ssid, password) = match positional.as_slice() {
        [ssid] => (*ssid, ""),
        [ssid, password] => (*ssid, *password),
        _ => return Err(usage_error("<ssid> [password] [--type nopass|wep|wpa]")),
    };

    let network_type = network_type.unwrap_or(if password.is_empty() {
        NetworkType::Open
    } else {
        NetworkType::Wpa
    });

    Ok(WifiConfig::new(ssid, password, network_type)?)
}

fn usage_error(expected: &str) -> Box<dyn std::error::Error> {
    format!("usage: wifi-barcode {}", expected).into()
}
