use anyhow::{bail, Result};
use std::path::Path;
use tracing::info;
use wodata_crypto::generate_recipient_keypair;
use wodata_crypto::keyfile::{encode_public_key_file, encode_secret_key_file};
use wodata_records::files::{write_secret_text, write_text};

/// Writes a fresh recipient key pair. Existing files are kept unless `force`.
pub fn generate(
    public_path: &Path,
    secret_path: &Path,
    passphrase: Option<&str>,
    force: bool,
) -> Result<()> {
    if !force {
        for path in [public_path, secret_path] {
            if path.exists() {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
        }
    }

    let pair = generate_recipient_keypair();
    write_secret_text(secret_path, &encode_secret_key_file(&pair.secret, passphrase)?)?;
    write_text(public_path, &encode_public_key_file(&pair.public)?)?;

    info!(
        public = %public_path.display(),
        secret = %secret_path.display(),
        protected = passphrase.is_some(),
        "keygen-complete"
    );
    Ok(())
}
