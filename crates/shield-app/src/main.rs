//! PanicShield - on-device wellness tracker.
//!
//! Command-line surface over the secure storage facade: log emotions, manage
//! panic sessions and emergency contacts, export/import encrypted backups.
//! All data stays on this device.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use shield_app::{EmotionJournal, FallbackCache, Hydration, WriteOutcome};
use shield_storage::models::{EmergencyContact, EmotionRecord, PanicSessionRecord};
use shield_storage::{SecureStore, SessionOutcome};

/// PanicShield - private, on-device emotion and panic-relief tracking
#[derive(Parser, Debug)]
#[command(name = "panic-shield", version, about)]
struct Args {
    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Override the data directory (database, key, backup cache)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// PIN to unlock a store protected with set-pin. Required on every
    /// invocation once set-pin has run; without it the encrypted
    /// collections stay sealed under the PIN-derived key.
    #[arg(long)]
    pin: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log an emotion
    Log {
        /// Emotion id from the taxonomy, e.g. happy_joyful
        emotion: String,

        /// Intensity, 1-3
        #[arg(short, long, default_value_t = 2)]
        intensity: u8,

        /// Trigger tags (repeatable)
        #[arg(short, long)]
        trigger: Vec<String>,

        /// Free-text notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List logged emotions
    List,

    /// Remove the most recent log
    Undo,

    /// Start a panic-relief session
    SessionStart {
        /// Exercise tags, e.g. breathing grounding
        exercises: Vec<String>,
    },

    /// End a panic-relief session
    SessionEnd {
        /// Session id returned by session-start
        id: String,

        /// resolved | escalated | abandoned
        #[arg(long)]
        outcome: String,

        /// Effectiveness rating, 1-5
        #[arg(long)]
        effectiveness: Option<u8>,
    },

    /// List panic-relief sessions
    Sessions,

    /// Add an emergency contact
    ContactAdd {
        name: String,
        phone: String,
        #[arg(long)]
        relationship: Option<String>,
    },

    /// List emergency contacts
    Contacts,

    /// Remove an emergency contact
    ContactRemove { id: String },

    /// Export all data as an encrypted backup file
    Export {
        /// Output file
        output: PathBuf,

        /// Include plain settings in the bundle
        #[arg(long)]
        include_settings: bool,
    },

    /// Import an encrypted backup file
    Import { file: PathBuf },

    /// Show per-collection counts and disk usage
    Stats,

    /// Delete all emotions, sessions, and contacts
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Protect the store with a PIN-derived key, re-encrypting existing data
    SetPin { pin: String },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let data_dir = match &args.data_dir {
        Some(dir) => dir.clone(),
        None => SecureStore::default_data_dir().context("resolving data directory")?,
    };

    let store = SecureStore::open_at(data_dir.join("shield.db"), &data_dir)
        .context("opening secure store")?;

    // Opening loads the persisted device key; a PIN-protected store needs
    // the derived key installed before any command touches sealed records.
    if let Some(pin) = &args.pin {
        store
            .derive_key_from_secret(pin)
            .context("deriving key from PIN")?;
    }

    run(args.command, store, FallbackCache::in_dir(&data_dir))
}

fn run(command: Command, store: SecureStore, cache: FallbackCache) -> anyhow::Result<()> {
    match command {
        Command::Log {
            emotion,
            intensity,
            trigger,
            notes,
        } => {
            let journal = EmotionJournal::new(store, cache);
            let outcome = journal.add_log(EmotionRecord {
                id: None,
                emotion_id: emotion,
                intensity,
                triggers: trigger,
                notes,
                suggestion: None,
                timestamp: None,
            })?;

            match outcome {
                WriteOutcome::Stored(id) => println!("Logged {id}"),
                WriteOutcome::FellBack { id, reason } => {
                    println!("Logged {id} (UNENCRYPTED fallback - secure store failed: {reason})")
                }
            }
        }

        Command::List => {
            let journal = EmotionJournal::new(store, cache);
            match journal.load_logs() {
                Hydration::Primary(records) => {
                    for record in &records {
                        println!(
                            "{}  {}  intensity {}  [{}]",
                            record.timestamp.as_deref().unwrap_or("-"),
                            record.emotion_id,
                            record.intensity,
                            record.triggers.join(", "),
                        );
                    }
                    println!("{} log(s)", records.len());
                }
                Hydration::Degraded(records) => {
                    println!("(degraded mode - showing unencrypted backup list)");
                    for record in &records {
                        println!(
                            "{}  {}  intensity {}",
                            record.timestamp, record.emotion_id, record.intensity
                        );
                    }
                    println!("{} log(s)", records.len());
                }
            }
        }

        Command::Undo => {
            let journal = EmotionJournal::new(store, cache);
            match journal.undo_last()? {
                Some(id) => println!("Removed {id}"),
                None => println!("Nothing to undo"),
            }
        }

        Command::SessionStart { exercises } => {
            let id = store.save_panic_session(PanicSessionRecord {
                id: None,
                start_time: chrono::Utc::now().timestamp_millis(),
                end_time: None,
                exercises,
                outcome: None,
                effectiveness: None,
            })?;
            println!("Session started: {id}");
        }

        Command::SessionEnd {
            id,
            outcome,
            effectiveness,
        } => {
            let Some(outcome) = SessionOutcome::parse(&outcome) else {
                bail!("outcome must be one of: resolved, escalated, abandoned");
            };
            let Some(mut session) = store.get_panic_session(&id)? else {
                bail!("no session with id {id}");
            };

            session.end_time = Some(chrono::Utc::now().timestamp_millis());
            session.outcome = Some(outcome);
            session.effectiveness = effectiveness;
            store.save_panic_session(session)?;
            println!("Session ended: {id}");
        }

        Command::Sessions => {
            let sessions = store.get_all_panic_sessions()?;
            for session in &sessions {
                println!(
                    "{}  start {}  end {}  outcome {}  [{}]",
                    session.id.as_deref().unwrap_or("-"),
                    session.start_time,
                    session
                        .end_time
                        .map_or("(active)".to_string(), |t| t.to_string()),
                    session.outcome.map_or("-", |o| o.as_str()),
                    session.exercises.join(", "),
                );
            }
            println!("{} session(s)", sessions.len());
        }

        Command::ContactAdd {
            name,
            phone,
            relationship,
        } => {
            let id = store.save_emergency_contact(EmergencyContact {
                id: None,
                name,
                phone,
                relationship,
            })?;
            println!("Contact added: {id}");
        }

        Command::Contacts => {
            let contacts = store.get_emergency_contacts()?;
            for contact in &contacts {
                println!(
                    "{}  {}  {}  {}",
                    contact.id.as_deref().unwrap_or("-"),
                    contact.name,
                    contact.phone,
                    contact.relationship.as_deref().unwrap_or("-"),
                );
            }
            println!("{} contact(s)", contacts.len());
        }

        Command::ContactRemove { id } => {
            store.delete_emergency_contact(&id)?;
            println!("Contact removed");
        }

        Command::Export {
            output,
            include_settings,
        } => {
            let blob = store.export_data(include_settings)?;
            std::fs::write(&output, blob).context("writing export file")?;
            println!("Exported to {}", output.display());
        }

        Command::Import { file } => {
            let blob = std::fs::read_to_string(&file).context("reading import file")?;
            let summary = store.import_data(blob.trim())?;
            println!(
                "Imported {} emotion(s), {} session(s), {} contact(s), {} setting(s)",
                summary.emotions,
                summary.panic_sessions,
                summary.emergency_contacts,
                summary.settings
            );
        }

        Command::Stats => {
            let stats = store.storage_stats()?;
            println!("Emotions:        {}", stats.emotion_count);
            println!("Panic sessions:  {}", stats.panic_session_count);
            println!("Contacts:        {}", stats.contact_count);
            match stats.estimated_size {
                Some(bytes) => println!("Disk usage:      {bytes} bytes"),
                None => println!("Disk usage:      unavailable"),
            }
        }

        Command::Clear { yes } => {
            if !yes {
                bail!("refusing to clear without --yes");
            }
            let journal = EmotionJournal::new(store, cache);
            journal.clear()?;
            println!("All emotions, sessions, and contacts deleted");
        }

        Command::SetPin { pin } => {
            store.rotate_key_to_secret(&pin)?;
            println!("Store re-encrypted under PIN-derived key");
            println!("Pass --pin on every future invocation to unlock the store");
        }
    }

    Ok(())
}
