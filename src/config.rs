use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::auth::Role;
use crate::http_client::DEFAULT_LOGIN_PATH;

/// Used when neither `--base-url` nor `CLINIC_API_BASE_URL` is given
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:7070/api";

const APP_DIR: &str = "clinic-client";
const SESSION_DB_FILE: &str = "session.sqlite3";

/// Clinic Client - admin command line for the clinic appointment API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Base URL of the clinic API
    #[arg(short = 'u', long, env = "CLINIC_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub base_url: String,

    /// Path to the SQLite database holding stored credentials
    #[arg(short = 's', long, env = "CLINIC_SESSION_DB")]
    pub session_db: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// HTTP connect timeout in seconds
    #[arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "10")]
    pub connect_timeout: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub http_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in; the credential is stored under the role the server returns
    Login {
        #[arg(short, long)]
        email: String,

        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Register a new patient account
    Register(RegisterArgs),

    /// Log out one role, or every role when none is given
    Logout {
        #[arg(short, long)]
        role: Option<Role>,
    },

    /// Show which roles are signed in
    Whoami,

    /// Manage user accounts (admin)
    #[command(subcommand)]
    Users(UsersCommand),

    /// Manage appointments (admin)
    #[command(subcommand)]
    Appointments(AppointmentsCommand),

    /// Manage doctor records (admin)
    #[command(subcommand)]
    Doctors(DoctorsCommand),

    /// Manage patient records (admin)
    #[command(subcommand)]
    Patients(PatientsCommand),

    /// Moderate patient feedback (admin)
    #[command(subcommand)]
    Feedbacks(FeedbacksCommand),

    /// Doctor workspace: own appointments and feedback
    #[command(subcommand)]
    Doctor(DoctorCommand),

    /// Show appointments as calendar events grouped by day
    Calendar {
        /// Only this day (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Use the signed-in doctor's appointments instead of the admin listing
        #[arg(long)]
        doctor: bool,
    },
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub email: String,

    /// Defaults to the email address
    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub full_name: String,

    #[arg(long)]
    pub phone: Option<String>,

    /// Prompted for when omitted
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List users
    List {
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one user
    Get { id: i64 },

    /// Create a user
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "PATIENT")]
        role: Role,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Create the account disabled
        #[arg(long)]
        disabled: bool,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Update username, email, role or status
    Update {
        id: i64,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<Role>,
        #[arg(long)]
        enabled: Option<bool>,
    },

    /// Delete a user
    Delete { id: i64 },

    /// Enable or disable a user
    ToggleStatus { id: i64 },

    /// Set a new password for a user
    ChangePassword {
        id: i64,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AppointmentsCommand {
    /// List appointments
    List {
        /// Only this day (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Show one appointment
    Get { id: i64 },

    /// Cancel an appointment
    Cancel {
        id: i64,
        #[arg(short, long)]
        reason: String,
    },

    /// Delete an appointment
    Delete { id: i64 },
}

/// Fields of a doctor record as given on the command line
#[derive(Args, Debug)]
pub struct DoctorArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub full_name: String,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub specialization: Option<String>,
    #[arg(long)]
    pub qualification: Option<String>,
    /// Years of practice
    #[arg(long)]
    pub experience: Option<i32>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub bio: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum DoctorsCommand {
    /// List doctors
    List {
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one doctor
    Get { id: i64 },

    /// Create a doctor account; the password is prompted for
    Create(DoctorArgs),

    /// Replace a doctor's details; the password is left unchanged
    Update {
        id: i64,
        #[command(flatten)]
        doctor: DoctorArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum PatientsCommand {
    /// List patients
    List {
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one patient
    Get { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum FeedbacksCommand {
    /// List feedback
    List {
        /// Only feedback with this status (e.g. PENDING)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Show one feedback
    Get { id: i64 },

    /// Feedback about a doctor
    ForDoctor { doctor_id: i64 },

    /// Feedback written by a patient
    ForPatient { patient_id: i64 },

    /// Hide a feedback from public view
    Hide { id: i64 },

    /// Make a hidden feedback visible again
    Unhide { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum DoctorCommand {
    /// Show the signed-in doctor's profile
    Profile,

    /// List own appointments
    Appointments {
        /// Only this day (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Show one appointment
    Appointment { id: i64 },

    /// Confirm a pending appointment
    Confirm { id: i64 },

    /// Cancel an appointment
    Cancel {
        id: i64,
        #[arg(short, long)]
        reason: String,
    },

    /// List feedback received
    Feedbacks,

    /// Reply to a feedback
    Reply {
        id: i64,
        #[arg(short, long)]
        message: String,
        /// Replace an existing reply
        #[arg(long)]
        edit: bool,
    },

    /// Show the average rating
    Rating,
}

#[derive(Clone, Debug)]
pub struct Config {
    // API
    pub api_base_url: String,
    pub login_path: String,

    // Credential storage
    pub session_db: PathBuf,

    // HTTP client
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    // Logging
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Build configuration from parsed arguments (CLI > ENV > defaults).
    /// Call `dotenvy::dotenv()` before parsing so `.env` values count as ENV.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let session_db = match &args.session_db {
            Some(path) => expand_tilde(path),
            None => default_session_db()
                .context("Could not determine a data directory; set CLINIC_SESSION_DB")?,
        };

        Ok(Config {
            api_base_url: args.base_url.trim_end_matches('/').to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            session_db,
            http_connect_timeout: args.connect_timeout,
            http_request_timeout: args.http_timeout,
            log_level: args.log_level.clone(),
            log_format: args.log_format,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            anyhow::bail!(
                "CLINIC_API_BASE_URL must start with http:// or https://: {}",
                self.api_base_url
            );
        }

        if self.http_connect_timeout == 0 || self.http_request_timeout == 0 {
            anyhow::bail!("HTTP timeouts must be greater than zero");
        }

        Ok(())
    }
}

/// Default location of the session database
fn default_session_db() -> Option<PathBuf> {
    Some(dirs::data_dir()?.join(APP_DIR).join(SESSION_DB_FILE))
}

/// Expand tilde (~) in file paths to user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(base_url: &str) -> Config {
        Config {
            api_base_url: base_url.to_string(),
            login_path: "/login".to_string(),
            session_db: PathBuf::from("/tmp/session.sqlite3"),
            http_connect_timeout: 10,
            http_request_timeout: 30,
            log_level: "warn".to_string(),
            log_format: LogFormat::Text,
        }
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/test/session.sqlite3");
        assert!(path.to_string_lossy().contains("test/session.sqlite3"));
        assert!(!path.to_string_lossy().starts_with("~"));

        let path = expand_tilde("/absolute/path");
        assert_eq!(path, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_tilde_just_tilde() {
        // Just "~" without slash should not expand
        let path = expand_tilde("~");
        assert_eq!(path, PathBuf::from("~"));
    }

    #[test]
    fn test_from_args_explicit_values() {
        let args = CliArgs::try_parse_from([
            "clinic-client",
            "--base-url",
            "https://clinic.example/api/",
            "--session-db",
            "/var/lib/clinic/session.db",
            "--http-timeout",
            "5",
            "whoami",
        ])
        .unwrap();

        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.api_base_url, "https://clinic.example/api");
        assert_eq!(config.session_db, PathBuf::from("/var/lib/clinic/session.db"));
        assert_eq!(config.http_request_timeout, 5);
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(matches!(args.command, Command::Whoami));
    }

    #[test]
    fn test_parse_users_subcommand() {
        let args = CliArgs::try_parse_from([
            "clinic-client",
            "users",
            "create",
            "--username",
            "drwho",
            "--email",
            "who@clinic.test",
            "--role",
            "doctor",
            "--disabled",
        ])
        .unwrap();

        match args.command {
            Command::Users(UsersCommand::Create {
                role,
                disabled,
                password,
                ..
            }) => {
                assert_eq!(role, Role::Doctor);
                assert!(disabled);
                assert!(password.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_json_log_format() {
        let args =
            CliArgs::try_parse_from(["clinic-client", "--log-format", "json", "whoami"]).unwrap();
        assert_eq!(args.log_format, LogFormat::Json);
    }

    #[test]
    fn test_parse_rejects_unknown_role() {
        let result = CliArgs::try_parse_from(["clinic-client", "logout", "--role", "nurse"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_calendar_date() {
        let args =
            CliArgs::try_parse_from(["clinic-client", "calendar", "--date", "2025-06-02"]).unwrap();
        match args.command {
            Command::Calendar { date, doctor } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 2));
                assert!(!doctor);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_doctor_workspace_reply() {
        let args = CliArgs::try_parse_from([
            "clinic-client",
            "doctor",
            "reply",
            "9",
            "--message",
            "Thank you",
            "--edit",
        ])
        .unwrap();

        match args.command {
            Command::Doctor(DoctorCommand::Reply { id, message, edit }) => {
                assert_eq!(id, 9);
                assert_eq!(message, "Thank you");
                assert!(edit);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_doctors_update() {
        let args = CliArgs::try_parse_from([
            "clinic-client",
            "doctors",
            "update",
            "5",
            "--username",
            "house",
            "--email",
            "house@clinic.test",
            "--full-name",
            "Gregory House",
            "--experience",
            "20",
        ])
        .unwrap();

        match args.command {
            Command::Doctors(DoctorsCommand::Update { id, doctor }) => {
                assert_eq!(id, 5);
                assert_eq!(doctor.full_name, "Gregory House");
                assert_eq!(doctor.experience, Some(20));
                assert!(doctor.specialization.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_validate() {
        assert!(config_for("http://localhost:7070/api").validate().is_ok());
        assert!(config_for("https://clinic.example").validate().is_ok());
        assert!(config_for("localhost:7070").validate().is_err());

        let mut config = config_for("http://localhost:7070/api");
        config.http_connect_timeout = 0;
        assert!(config.validate().is_err());
    }
}
