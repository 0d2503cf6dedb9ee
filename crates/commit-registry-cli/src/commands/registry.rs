//! Commands that read or change the registry state file.

use clap::Subcommand;
use colored::Colorize;
use commit_registry::{
    AccountId, AuthorizationProof, CallContext, CommitEvent, Commitment, CommitmentRecord,
    CommitmentRegistry, EventFilter, ExtraData, RecordFilter, RegistryConfig, RegistryInterface,
    Timepoint,
};
use serde::Serialize;
use tabled::Tabled;

use super::{decode_array, parse_extra};
use crate::error::{CliError, CliResult};
use crate::output::{print_fields, print_json, print_rows, print_success, OutputFormat};
use crate::Context;

/// Registry subcommands
#[derive(Subcommand)]
pub enum RegistryCommands {
    /// Commit a value as the caller
    Commit {
        /// Submitting account (also the committer)
        #[arg(long)]
        caller: AccountId,
        /// Commitment value
        #[arg(long)]
        commitment: Commitment,
        /// Time hint; defaults to the current UNIX second
        #[arg(long)]
        time: Option<u64>,
    },

    /// Commit a value on behalf of another account
    CommitFrom {
        /// Submitting account
        #[arg(long)]
        caller: AccountId,
        /// Account the commitment is made for
        #[arg(long)]
        from: AccountId,
        /// Commitment value
        #[arg(long)]
        commitment: Commitment,
        /// Hex-encoded extra data
        #[arg(long, value_parser = parse_extra)]
        extra: Option<ExtraData>,
        /// Committer's hex-encoded public key (from `sign`)
        #[arg(long, requires = "signature")]
        public_key: Option<String>,
        /// Committer's hex-encoded signature (from `sign`)
        #[arg(long, requires = "public_key")]
        signature: Option<String>,
        /// Time hint; defaults to the current UNIX second
        #[arg(long)]
        time: Option<u64>,
    },

    /// Look up the record for a commitment
    Lookup {
        commitment: Commitment,
        /// Restrict to one committer
        #[arg(long)]
        committer: Option<AccountId>,
    },

    /// Check a reveal against a stored commitment and retire it
    Reveal {
        commitment: Commitment,
        #[arg(long)]
        salt: String,
        #[arg(long)]
        payload: String,
        /// Committer whose record to retire (default: all records for the value)
        #[arg(long)]
        committer: Option<AccountId>,
    },

    /// Remove a commitment
    Remove {
        commitment: Commitment,
        /// Remove only this committer's record
        #[arg(long)]
        committer: Option<AccountId>,
    },

    /// List stored records in timepoint order
    List {
        /// Filter by committer
        #[arg(long)]
        committer: Option<AccountId>,
        /// Maximum number to show
        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Show published commit events
    Events {
        /// Filter by committer
        #[arg(long)]
        from: Option<AccountId>,
        /// Filter by commitment value
        #[arg(long)]
        commitment: Option<Commitment>,
    },

    /// Show supported interfaces and their identifiers
    Interfaces,

    /// Show the effective configuration
    Config,
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Timepoint")]
    timepoint: String,
    #[tabled(rename = "Commitment")]
    commitment: String,
    #[tabled(rename = "Committer")]
    committer: String,
    #[tabled(rename = "Extra")]
    extra: String,
}

impl From<&CommitmentRecord> for RecordRow {
    fn from(record: &CommitmentRecord) -> Self {
        Self {
            timepoint: record.timepoint.to_string(),
            commitment: record.commitment.short_id(),
            committer: record.committer.short_id(),
            extra: extra_summary(&record.extra_data),
        }
    }
}

impl From<&CommitEvent> for RecordRow {
    fn from(event: &CommitEvent) -> Self {
        Self {
            timepoint: event.timepoint.to_string(),
            commitment: event.commitment.short_id(),
            committer: event.from.short_id(),
            extra: extra_summary(&event.extra_data),
        }
    }
}

#[derive(Serialize, Tabled)]
struct InterfaceRow {
    #[tabled(rename = "Interface")]
    name: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Signature")]
    signature: String,
    #[tabled(rename = "Enabled")]
    enabled: bool,
}

#[derive(Serialize)]
struct Accepted {
    commitment: Commitment,
    committer: AccountId,
    timepoint: Timepoint,
}

/// Execute registry command
pub(crate) fn execute(command: RegistryCommands, ctx: &Context) -> CliResult<()> {
    match command {
        RegistryCommands::Commit {
            caller,
            commitment,
            time,
        } => {
            let mut session = ctx.open()?;
            let call = call_context(caller, time);
            let timepoint = session.registry.commit(&call, commitment)?;
            session.save()?;
            report_accepted(commitment, caller, timepoint, ctx.format)
        }
        RegistryCommands::CommitFrom {
            caller,
            from,
            commitment,
            extra,
            public_key,
            signature,
            time,
        } => {
            let proof = match (public_key, signature) {
                (Some(public_key), Some(signature)) => Some(AuthorizationProof::Signature {
                    public_key: decode_array::<32>("public key", &public_key)?,
                    signature: decode_array::<64>("signature", &signature)?.to_vec(),
                }),
                _ => None,
            };
            let mut session = ctx.open()?;
            let call = call_context(caller, time);
            let timepoint = session.registry.commit_from(
                &call,
                from,
                commitment,
                extra.unwrap_or_default(),
                proof.as_ref(),
            )?;
            session.save()?;
            report_accepted(commitment, from, timepoint, ctx.format)
        }
        RegistryCommands::Lookup {
            commitment,
            committer,
        } => {
            let session = ctx.open()?;
            let record = match committer {
                Some(committer) => session.registry.lookup_by(&committer, &commitment),
                None => session.registry.lookup(&commitment),
            }
            .ok_or_else(|| CliError::NotFound(commitment.to_string()))?;
            print_record(record, ctx.format)
        }
        RegistryCommands::Reveal {
            commitment,
            salt,
            payload,
            committer,
        } => {
            if !commitment.matches_reveal(salt.as_bytes(), payload.as_bytes()) {
                return Err(CliError::InvalidArgument(format!(
                    "reveal does not match {commitment}"
                )));
            }
            remove(ctx, commitment, committer)
        }
        RegistryCommands::Remove {
            commitment,
            committer,
        } => remove(ctx, commitment, committer),
        RegistryCommands::List { committer, limit } => {
            let session = ctx.open()?;
            let mut filter = RecordFilter::new();
            if let Some(committer) = committer {
                filter = filter.with_committer(committer);
            }
            let records: Vec<&CommitmentRecord> = session
                .registry
                .query(&filter)
                .into_iter()
                .take(limit)
                .collect();
            let rows = records.iter().map(|r| RecordRow::from(*r)).collect();
            print_rows(&records, rows, ctx.format)
        }
        RegistryCommands::Events { from, commitment } => {
            let session = ctx.open()?;
            let mut filter = EventFilter::new();
            if let Some(from) = from {
                filter = filter.with_from(from);
            }
            if let Some(commitment) = commitment {
                filter = filter.with_commitment(commitment);
            }
            let events = session.journal.query(&filter);
            let rows = events.iter().map(RecordRow::from).collect();
            print_rows(&events, rows, ctx.format)
        }
        RegistryCommands::Interfaces => {
            let registry = CommitmentRegistry::new(ctx.config.clone());
            let rows: Vec<InterfaceRow> = RegistryInterface::ALL
                .iter()
                .map(|interface| InterfaceRow {
                    name: interface.to_string(),
                    id: interface.id().to_string(),
                    signature: interface.signature().to_string(),
                    enabled: registry.supports_interface(&interface.id()),
                })
                .collect();
            match ctx.format {
                OutputFormat::Json => print_json(&rows),
                OutputFormat::Table => {
                    println!("{}", tabled::Table::new(rows));
                    Ok(())
                }
            }
        }
        RegistryCommands::Config => show_config(&ctx.config, ctx.format),
    }
}

fn call_context(caller: AccountId, time: Option<u64>) -> CallContext {
    match time {
        Some(hint) => CallContext::new(caller, hint),
        None => CallContext::wall_clock(caller),
    }
}

fn remove(ctx: &Context, commitment: Commitment, committer: Option<AccountId>) -> CliResult<()> {
    let mut session = ctx.open()?;
    let removed: Vec<CommitmentRecord> = match committer {
        Some(committer) => session
            .registry
            .remove_by(&committer, &commitment)?
            .into_iter()
            .collect(),
        None => session.registry.remove(&commitment)?,
    };
    session.save()?;

    match ctx.format {
        OutputFormat::Json => print_json(&removed),
        OutputFormat::Table => {
            print_success(&format!(
                "Removed {} record(s) for {}",
                removed.len(),
                commitment
            ));
            Ok(())
        }
    }
}

fn report_accepted(
    commitment: Commitment,
    committer: AccountId,
    timepoint: Timepoint,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&Accepted {
            commitment,
            committer,
            timepoint,
        }),
        OutputFormat::Table => {
            print_success(&format!(
                "Accepted {} from {} at {}",
                commitment,
                committer,
                timepoint.to_string().bold()
            ));
            Ok(())
        }
    }
}

fn print_record(record: &CommitmentRecord, format: OutputFormat) -> CliResult<()> {
    print_fields(
        record,
        &[
            ("Commitment", record.commitment.to_string()),
            ("Committer", record.committer.to_hex()),
            ("Timepoint", record.timepoint.to_string()),
            ("Extra data", extra_summary(&record.extra_data)),
        ],
        format,
    )
}

fn show_config(config: &RegistryConfig, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(config),
        OutputFormat::Table => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn extra_summary(extra: &ExtraData) -> String {
    if extra.is_empty() {
        "-".to_string()
    } else {
        format!("0x{}", extra.to_hex())
    }
}
