//! One-off maintenance tasks for the WhiskerBond database.
//!
//! ```bash
//! whiskerbond-maint seed
//! whiskerbond-maint migrate-legacy-bookings
//! whiskerbond-maint sync-pet --name kutta
//! ```

use std::error::Error;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use db::maintenance::{fix_appointment_dates, migrate_legacy_bookings, seed_sample_data};
use db::{find_pet_by_name, manual_sync_pet, resync_pets, sync_appointment_to_pet, Db};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "whiskerbond-maint")]
#[command(about = "Maintenance tasks for the WhiskerBond database", long_about = None)]
#[command(version)]
struct Cli {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Apply pending schema migrations before running the task
    #[arg(long)]
    migrate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the demo business accounts and their provider documents
    Seed,

    /// Move unmigrated legacy vet bookings onto vet documents
    MigrateLegacyBookings,

    /// Rebuild appointment times that are missing or unparseable
    FixAppointmentDates,

    /// Copy a pet's completed appointment into its appointment list
    SyncPet {
        /// Case-insensitive fragment of the pet's name
        #[arg(long)]
        name: String,
    },

    /// Re-copy one appointment into its pet's appointment list
    SyncAppointment {
        /// Appointment id
        #[arg(long)]
        id: Uuid,
    },

    /// Rebuild the appointment lists of every pet
    ResyncAll,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let db: Db = db::connect(&cli.database_url, 2).await?;
    if cli.migrate {
        db::migrate(&db).await?;
        info!("migrations applied");
    }

    match cli.command {
        Commands::Seed => print_json(&seed_sample_data(&db).await?),
        Commands::MigrateLegacyBookings => print_json(&migrate_legacy_bookings(&db).await?),
        Commands::FixAppointmentDates => print_json(&fix_appointment_dates(&db).await?),
        Commands::SyncPet { name } => {
            let Some(pet) = find_pet_by_name(&db, None, &name).await? else {
                return Err(format!("no pet matching `{name}`").into());
            };
            let Some(synced) = manual_sync_pet(&db, pet.id).await? else {
                return Err(format!("no completed appointment found for {}", pet.name).into());
            };
            info!(pet = %pet.name, total = synced.total_appointments, "pet synced");
            print_json(&synced.appointment)
        }
        Commands::SyncAppointment { id } => {
            if !sync_appointment_to_pet(&db, id).await? {
                return Err(format!("appointment {id} not found or not linked to a pet").into());
            }
            info!(appointment_id = %id, "appointment synced");
            Ok(())
        }
        Commands::ResyncAll => print_json(&resync_pets(&db, None).await?),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "maintenance task failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sync_pet_takes_a_name() {
        let cli = Cli::try_parse_from([
            "whiskerbond-maint",
            "--database-url",
            "postgres://localhost/wb",
            "sync-pet",
            "--name",
            "kutta",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::SyncPet { ref name } if name == "kutta"));
        assert!(!cli.migrate);
    }

    #[test]
    fn sync_appointment_rejects_malformed_ids() {
        let parsed = Cli::try_parse_from([
            "whiskerbond-maint",
            "--database-url",
            "postgres://localhost/wb",
            "sync-appointment",
            "--id",
            "nope",
        ]);
        assert!(parsed.is_err());
    }
}
