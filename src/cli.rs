//! CLI argument parsing for the atelio-worker binary.

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "atelio-worker", about = "Atelio appointment platform backend worker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the worker server (default if no subcommand given)
    Serve,
    /// Run database migrations and exit
    Migrate,
    /// Create or update an admin user interactively
    CreateAdmin {
        /// Admin email address
        #[arg(long)]
        email: String,
    },
    /// Fetch a chatbot appointment payload from a URL and reconcile it
    ImportAppointment {
        /// URL of the JSON payload
        #[arg(long)]
        url: String,
        /// User account the appointment belongs to
        #[arg(long)]
        user_id: Uuid,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_migrate_command_parses() {
        let cli = Cli::parse_from(["atelio-worker", "migrate"]);
        assert!(matches!(cli.command, Some(Command::Migrate)));
    }

    #[test]
    fn test_cli_no_command_defaults_to_none() {
        let cli = Cli::parse_from(["atelio-worker"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_create_admin_requires_email() {
        let result = Cli::try_parse_from(["atelio-worker", "create-admin"]);
        assert!(result.is_err());

        let cli = Cli::parse_from(["atelio-worker", "create-admin", "--email", "a@b.fr"]);
        match cli.command {
            Some(Command::CreateAdmin { email }) => assert_eq!(email, "a@b.fr"),
            _ => panic!("expected create-admin command"),
        }
    }

    #[test]
    fn test_cli_import_appointment_parses_uuid() {
        let cli = Cli::parse_from([
            "atelio-worker",
            "import-appointment",
            "--url",
            "https://example.com/data.json",
            "--user-id",
            "123e4567-e89b-12d3-a456-426614174000",
        ]);
        match cli.command {
            Some(Command::ImportAppointment { url, user_id }) => {
                assert_eq!(url, "https://example.com/data.json");
                assert_eq!(user_id.to_string(), "123e4567-e89b-12d3-a456-426614174000");
            }
            _ => panic!("expected import-appointment command"),
        }
    }
}
