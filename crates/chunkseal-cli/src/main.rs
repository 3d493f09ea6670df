//! chunkseal: local driver for the chunk encryption engine
//!
//! Commands:
//!   genpass                        - generate a transfer password
//!   encrypt <input> <output>       - encrypt a file into a JSON envelope of chunks
//!   decrypt <input> <output>       - verify and decrypt an envelope in order
//!   config show                    - display current configuration

mod envelope;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use chunkseal_core::ChunksealConfig;
use chunkseal_crypto::{
    decrypt_chunks, encrypt_chunk, generate_random_password, is_file_size_valid_for_encryption,
    CryptoConfig, EncryptionDetails, PasswordEncoding, ProgressStage, TextEncoding,
};

use crate::envelope::Envelope;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "chunkseal",
    version,
    about = "Client-side chunk encryption",
    long_about = "chunkseal: encrypt files into independently sealed chunks and decrypt them with in-order verification"
)]
struct Cli {
    /// Path to chunkseal.toml configuration file
    #[arg(long, short = 'c', env = "CHUNKSEAL_CONFIG", default_value = "chunkseal.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides [log].level
    #[arg(long, env = "CHUNKSEAL_LOG")]
    log: Option<String>,

    /// Log format (json, text); overrides [log].format
    #[arg(long, env = "CHUNKSEAL_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a random password for a new transfer
    Genpass,

    /// Encrypt a file into a JSON envelope of base64 chunks
    Encrypt {
        /// Plaintext input file
        input: PathBuf,
        /// Envelope output path
        output: PathBuf,
        /// Text password (generated and printed to stderr when omitted)
        #[arg(long, short = 'p', env = "CHUNKSEAL_PASSWORD")]
        password: Option<String>,
    },

    /// Decrypt a JSON envelope back into the original file
    Decrypt {
        /// Envelope input path
        input: PathBuf,
        /// Plaintext output file
        output: PathBuf,
        /// Password (prompted for when omitted)
        #[arg(long, short = 'p', env = "CHUNKSEAL_PASSWORD")]
        password: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config).await?;

    let level = cli.log.as_deref().unwrap_or(&config.log.level);
    let format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| log_format_from_config(&config.log.format));
    init_logging(level, &format);

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "chunkseal starting"
    );

    match cli.command {
        Commands::Genpass => cmd_genpass(&config.crypto),
        Commands::Encrypt { input, output, password } => {
            cmd_encrypt(&config.crypto, &input, &output, password).await
        }
        Commands::Decrypt { input, output, password } => {
            cmd_decrypt(&config.crypto, &input, &output, password).await
        }
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &cli.config),
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn log_format_from_config(format: &str) -> LogFormat {
    match format {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    }
}

async fn load_config(path: &Path) -> Result<ChunksealConfig> {
    if path.exists() {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config: {}", path.display()))?;
        ChunksealConfig::from_toml_str(&content)
            .with_context(|| format!("parsing config: {}", path.display()))
    } else {
        Ok(ChunksealConfig::default())
    }
}

fn make_progress_bar(total: u64, prefix: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("building progress style")?
            .progress_chars("=>-"),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

// ── `chunkseal genpass` ───────────────────────────────────────────────────────

fn cmd_genpass(config: &CryptoConfig) -> Result<()> {
    let generated = generate_random_password(config).context("generating password")?;
    println!("{}", generated.value.expose_secret());
    eprintln!(
        "version: {} ({:?}), encoding: {}, raw octets: {}",
        generated.version.tag(),
        generated.version,
        generated.encoding,
        generated.raw_length()
    );
    Ok(())
}

// ── `chunkseal encrypt` ───────────────────────────────────────────────────────

async fn cmd_encrypt(
    config: &CryptoConfig,
    input: &Path,
    output: &Path,
    password: Option<String>,
) -> Result<()> {
    let (password, version, encoding) = match password {
        Some(p) => (
            SecretString::from(p),
            PasswordEncoding::TextPassword,
            TextEncoding::Base64,
        ),
        None => {
            let generated = generate_random_password(config).context("generating password")?;
            eprintln!("password: {}", generated.value.expose_secret());
            (generated.value, generated.version, generated.encoding)
        }
    };

    let data = tokio::fs::read(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    let size = data.len() as u64;
    let epoch = config.encryption_key_version_new_files;
    if !is_file_size_valid_for_encryption(size, epoch, config) {
        anyhow::bail!(
            "{}: {size} bytes exceeds the {} byte limit for epoch {epoch}",
            input.display(),
            config.crypto_gcm_max_file_size
        );
    }

    let details = EncryptionDetails::for_new_file(password, version, encoding, config);
    let chunk_size = usize::try_from(config.upload_chunk_size).context("chunk size too large")?;
    let total = data.len().div_ceil(chunk_size) as u64;
    info!(path = %input.display(), size, chunks = total, %epoch, "encrypting");

    let pb = make_progress_bar(total, "encrypt")?;
    let task_pb = pb.clone();
    let task_config = config.clone();
    let task_details = details.clone();
    let chunks = tokio::task::spawn_blocking(move || {
        data.chunks(chunk_size)
            .enumerate()
            .map(|(i, plain)| {
                let chunk = encrypt_chunk(plain, i as u64, &task_details, &task_config);
                task_pb.inc(1);
                chunk
            })
            .collect::<Result<Vec<_>, _>>()
    })
    .await
    .context("encryption task failed")?
    .context("encrypting chunks")?;
    pb.finish_with_message("done");

    let envelope = Envelope::new(&details, config, size, &chunks);
    let json = serde_json::to_vec_pretty(&envelope).context("serializing envelope")?;
    tokio::fs::write(output, json)
        .await
        .with_context(|| format!("writing {}", output.display()))?;

    println!("{} -> {} ({} chunks)", input.display(), output.display(), chunks.len());
    Ok(())
}

// ── `chunkseal decrypt` ───────────────────────────────────────────────────────

async fn cmd_decrypt(
    config: &CryptoConfig,
    input: &Path,
    output: &Path,
    password: Option<String>,
) -> Result<()> {
    let raw = tokio::fs::read(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    let envelope: Envelope = serde_json::from_slice(&raw)
        .with_context(|| format!("parsing envelope: {}", input.display()))?;

    let password = match password {
        Some(p) => SecretString::from(p),
        None => SecretString::from(
            rpassword::prompt_password("Password: ").context("reading password")?,
        ),
    };

    let details = envelope.details(password)?;
    let chunks = envelope.encrypted_chunks()?;
    let crypto = envelope.crypto_config(config);
    if crypto.upload_chunk_size != config.upload_chunk_size {
        debug!(
            envelope = crypto.upload_chunk_size,
            configured = config.upload_chunk_size,
            "using the envelope's chunk size"
        );
    }
    info!(path = %input.display(), chunks = chunks.len(), epoch = %details.epoch, "decrypting");

    let pb = make_progress_bar(chunks.len() as u64, "decrypt")?;
    let task_pb = pb.clone();
    let plaintexts = tokio::task::spawn_blocking(move || {
        decrypt_chunks(&chunks, &details, &crypto, |progress| match progress.stage {
            ProgressStage::Verifying => task_pb.set_message(format!("chunk {}", progress.index)),
            ProgressStage::Decrypted => task_pb.inc(1),
            ProgressStage::Failed => {
                task_pb.set_message(format!("chunk {} rejected", progress.index))
            }
        })
    })
    .await
    .context("decryption task failed")?;

    let plaintexts = match plaintexts {
        Ok(p) => p,
        Err(e) => {
            pb.abandon_with_message("failed");
            return Err(e).context("decrypting chunks");
        }
    };
    pb.finish_with_message("verified");

    let data = plaintexts.concat();
    if data.len() as u64 != envelope.size {
        anyhow::bail!(
            "decrypted {} bytes but the envelope records {}",
            data.len(),
            envelope.size
        );
    }
    tokio::fs::write(output, &data)
        .await
        .with_context(|| format!("writing {}", output.display()))?;

    println!("{} -> {} ({} bytes)", input.display(), output.display(), data.len());
    Ok(())
}

// ── `chunkseal config show` ───────────────────────────────────────────────────

fn cmd_config_show(config: &ChunksealConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}
