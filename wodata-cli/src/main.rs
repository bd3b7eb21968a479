mod keygen;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wodata_records::{run, BatchSummary, Mode, RecordError, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "wodata", author, version, about = "Encrypt and decrypt work-order data BLOBs", long_about = None)]
struct Cli {
    /// Passphrase for a protected private key file
    #[arg(long, global = true, env = "WODATA_KEY_PASSPHRASE", hide_env_values = true)]
    passphrase: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt the BLOBs of a request for the worker's public key
    Encrypt {
        /// Recipient public key file
        #[arg(short = 'r', long = "public-key")]
        public_key: PathBuf,
        /// Data key store file, created if missing
        #[arg(short = 'a', long)]
        keystore: PathBuf,
        #[command(flatten)]
        io: IoArgs,
    },
    /// Decrypt BLOBs with the private key or the data key store
    Decrypt {
        /// Recipient private key file
        #[arg(short = 'r', long = "private-key")]
        private_key: Option<PathBuf>,
        /// Data key store file, used when no private key is given
        #[arg(short = 'a', long)]
        keystore: Option<PathBuf>,
        #[command(flatten)]
        io: IoArgs,
    },
    /// Generate a recipient key pair
    Keygen {
        #[arg(long = "public-key")]
        public_key: PathBuf,
        #[arg(long = "private-key")]
        private_key: PathBuf,
        /// Overwrite existing key files
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
struct IoArgs {
    /// Input JSON file, or file name base with --file-list
    #[arg(short, long)]
    input: PathBuf,
    /// Output JSON file, or file name base with --file-list
    #[arg(short, long)]
    output: PathBuf,
    /// Object holding the "Data" array [default: params for encrypt, result for decrypt]
    #[arg(short = 'p', long)]
    object_name: Option<String>,
    /// Process <base>001, <base>002, ... until the first missing file
    #[arg(short = 'l', long)]
    file_list: bool,
}

impl IoArgs {
    fn into_config(self, mode: Mode) -> RunConfig {
        let object_name = self
            .object_name
            .unwrap_or_else(|| mode.default_object_name().to_string());
        RunConfig::new(mode, self.input, self.output)
            .with_object_name(object_name)
            .indexed(self.file_list)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}

fn execute(cli: Cli) -> Result<()> {
    let passphrase = cli.passphrase;
    match cli.command {
        Commands::Encrypt {
            public_key,
            keystore,
            io,
        } => {
            let mut config = io
                .into_config(Mode::Encrypt)
                .with_key_file(public_key)
                .with_keystore(keystore);
            config.passphrase = passphrase;
            report(&run(&config)?);
        }
        Commands::Decrypt {
            private_key,
            keystore,
            io,
        } => {
            let mut config = io.into_config(Mode::Decrypt);
            config.key_file = private_key;
            config.keystore_file = keystore;
            config.passphrase = passphrase;
            report(&run(&config)?);
        }
        Commands::Keygen {
            public_key,
            private_key,
            force,
        } => {
            keygen::generate(&public_key, &private_key, passphrase.as_deref(), force)?;
            println!("{}", public_key.display());
            println!("{}", private_key.display());
        }
    }
    Ok(())
}

fn report(summary: &BatchSummary) {
    if summary.is_empty() {
        println!("Nothing to process");
        return;
    }
    for file in &summary.processed {
        println!("{} -> {}", file.input.display(), file.output.display());
    }
    info!(
        files = summary.len(),
        records = summary.total_records(),
        "run-complete"
    );
}

/// Missing or invalid parameters exit with 2, the same status clap uses
/// for usage errors; everything else exits with 1.
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<RecordError>() {
        Some(RecordError::Config(_)) => 2,
        _ => 1,
    }
}
