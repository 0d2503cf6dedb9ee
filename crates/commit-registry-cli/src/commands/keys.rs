//! Client-side helpers: sealing commitments, deriving accounts and signing
//! on-behalf-of authorizations. None of these touch the state file.

use clap::Subcommand;
use commit_registry::{
    AccountId, AuthorizationProof, AuthorizationRequest, Commitment, ExtraData, SigningKey,
};
use serde::Serialize;

use super::{decode_array, parse_extra};
use crate::error::{CliError, CliResult};
use crate::output::{print_fields, OutputFormat};

/// Key and commitment helper subcommands
#[derive(Subcommand)]
pub enum KeyCommands {
    /// Seal a payload under a secret salt into a commitment
    Seal {
        /// Secret salt (UTF-8)
        #[arg(long)]
        salt: String,
        /// Payload to commit to (UTF-8)
        #[arg(long)]
        payload: String,
    },

    /// Show the account controlled by an Ed25519 key
    Account {
        /// Hex-encoded 32-byte secret key
        #[arg(long, required_unless_present = "public_key", conflicts_with = "public_key")]
        secret: Option<String>,
        /// Hex-encoded 32-byte public key
        #[arg(long)]
        public_key: Option<String>,
    },

    /// Sign an authorization for a relayer to commit on your behalf
    Sign {
        /// Hex-encoded 32-byte secret key of the committer
        #[arg(long)]
        secret: String,
        /// Account that will submit the commitment
        #[arg(long)]
        caller: AccountId,
        /// Commitment being authorized
        #[arg(long)]
        commitment: Commitment,
        /// Hex-encoded extra data the relayer will attach
        #[arg(long, value_parser = parse_extra)]
        extra: Option<ExtraData>,
    },
}

#[derive(Serialize)]
struct SealInfo {
    commitment: Commitment,
}

#[derive(Serialize)]
struct AccountInfo {
    account: AccountId,
    public_key: String,
}

#[derive(Serialize)]
struct ProofInfo {
    committer: AccountId,
    public_key: String,
    signature: String,
}

/// Execute key command
pub fn execute(command: KeyCommands, format: OutputFormat) -> CliResult<()> {
    match command {
        KeyCommands::Seal { salt, payload } => seal(&salt, &payload, format),
        KeyCommands::Account { secret, public_key } => {
            account(secret.as_deref(), public_key.as_deref(), format)
        }
        KeyCommands::Sign {
            secret,
            caller,
            commitment,
            extra,
        } => sign(&secret, caller, commitment, extra.unwrap_or_default(), format),
    }
}

pub(crate) fn signing_key(secret: &str) -> CliResult<SigningKey> {
    Ok(SigningKey::from_bytes(&decode_array::<32>("secret key", secret)?))
}

fn seal(salt: &str, payload: &str, format: OutputFormat) -> CliResult<()> {
    let commitment = Commitment::seal(salt.as_bytes(), payload.as_bytes());
    print_fields(
        &SealInfo { commitment },
        &[("Commitment", commitment.to_string())],
        format,
    )
}

fn account(secret: Option<&str>, public_key: Option<&str>, format: OutputFormat) -> CliResult<()> {
    let public_key = match (secret, public_key) {
        (Some(secret), _) => signing_key(secret)?.verifying_key().to_bytes(),
        (None, Some(public_key)) => decode_array::<32>("public key", public_key)?,
        (None, None) => {
            return Err(CliError::InvalidArgument(
                "either --secret or --public-key is required".into(),
            ))
        }
    };
    let info = AccountInfo {
        account: AccountId::from_public_key(&public_key),
        public_key: hex::encode(public_key),
    };
    print_fields(
        &info,
        &[
            ("Account", info.account.to_hex()),
            ("Public key", info.public_key.clone()),
        ],
        format,
    )
}

fn sign(
    secret: &str,
    caller: AccountId,
    commitment: Commitment,
    extra: ExtraData,
    format: OutputFormat,
) -> CliResult<()> {
    let key = signing_key(secret)?;
    let committer = AccountId::from_public_key(&key.verifying_key().to_bytes());
    let proof = AuthorizationProof::sign(
        &key,
        &AuthorizationRequest {
            caller: &caller,
            committer: &committer,
            commitment: &commitment,
            extra_data: &extra,
        },
    );
    let AuthorizationProof::Signature {
        public_key,
        signature,
    } = proof
    else {
        return Err(CliError::InvalidArgument(
            "signing produced a non-signature proof".into(),
        ));
    };

    let info = ProofInfo {
        committer,
        public_key: hex::encode(public_key),
        signature: hex::encode(signature),
    };
    print_fields(
        &info,
        &[
            ("Committer", info.committer.to_hex()),
            ("Public key", info.public_key.clone()),
            ("Signature", info.signature.clone()),
        ],
        format,
    )
}
