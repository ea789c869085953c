use anyhow::Result;
use clap::Parser;
use dialoguer::Password;
use serde::Serialize;
use std::sync::Arc;

use clinic_client::auth::{RegisterRequest, Role, Session, SqliteStore};
use clinic_client::calendar;
use clinic_client::config::{
    AppointmentsCommand, CliArgs, Command, Config, DoctorArgs, DoctorCommand, DoctorsCommand,
    FeedbacksCommand, LogFormat, PatientsCommand, UsersCommand,
};
use clinic_client::error::ApiError;
use clinic_client::http_client::ClinicHttpClient;
use clinic_client::models::{CreateUserRequest, DoctorRequest, UpdateUserRequest};
use clinic_client::services::{
    AppointmentService, AuthService, DirectoryService, DoctorService, FeedbackService, UserService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let config = Config::from_args(&args)?;
    config.validate()?;

    // Initialize logging with a configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }

    tracing::debug!("API base URL: {}", config.api_base_url);

    let store = SqliteStore::open(&config.session_db)?;
    let session = Arc::new(Session::new(Arc::new(store)));

    let client = Arc::new(
        ClinicHttpClient::new(
            &config.api_base_url,
            session,
            config.http_connect_timeout,
            config.http_request_timeout,
        )?
        .with_login_path(config.login_path.clone()),
    );

    match run(args.command, client).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_forced_logout() => {
            tracing::debug!(error = %e, "Forced logout");
            eprintln!("Your session has ended and all stored credentials were cleared.");
            eprintln!("Log in again with: clinic-client login --email <EMAIL>");
            std::process::exit(2);
        }
        Err(e) => Err(e.into()),
    }
}

async fn run(command: Command, client: Arc<ClinicHttpClient>) -> Result<(), ApiError> {
    match command {
        Command::Login { email, password } => {
            let password = password_or_prompt(password, "Password")?;
            let response = AuthService::new(client).login(&email, &password).await?;
            println!("Logged in as {} ({})", response.username, response.role);
        }

        Command::Register(args) => {
            let password = password_or_prompt(args.password, "Choose a password")?;
            let request = RegisterRequest {
                username: args.username.unwrap_or_else(|| args.email.clone()),
                email: args.email,
                password,
                full_name: args.full_name,
                phone: args.phone,
                role: Role::Patient,
            };
            let response = AuthService::new(client).register(&request).await?;
            println!("Registered and logged in as {} ({})", response.username, response.role);
        }

        Command::Logout { role } => {
            let auth = AuthService::new(client);
            match role {
                Some(role) => {
                    auth.logout(role)?;
                    println!("Logged out {}", role);
                }
                None => {
                    auth.logout_all()?;
                    println!("Logged out of every role");
                }
            }
        }

        Command::Whoami => {
            let session = client.session();
            let roles = session.active_roles()?;
            if roles.is_empty() {
                println!("Not logged in");
            }
            for role in roles {
                match session.credential(role)?.and_then(|c| c.user) {
                    Some(user) => println!("{:<8} {} <{}>", role, user.username, user.email),
                    None => println!("{:<8} (no cached profile)", role),
                }
            }
        }

        Command::Users(cmd) => run_users(cmd, UserService::new(client)).await?,

        Command::Appointments(cmd) => run_appointments(cmd, AppointmentService::new(client)).await?,

        Command::Doctors(cmd) => run_doctors(cmd, DirectoryService::new(client)).await?,

        Command::Patients(cmd) => {
            let directory = DirectoryService::new(client);
            match cmd {
                PatientsCommand::List { search } => {
                    print_json(&directory.list_patients(search.as_deref()).await?)?
                }
                PatientsCommand::Get { id } => print_json(&directory.get_patient(id).await?)?,
            }
        }

        Command::Feedbacks(cmd) => run_feedbacks(cmd, FeedbackService::new(client)).await?,

        Command::Doctor(cmd) => run_doctor(cmd, DoctorService::new(client)).await?,

        Command::Calendar { date, doctor } => {
            let appointments = if doctor {
                DoctorService::new(client).appointments(date).await?
            } else {
                AppointmentService::new(client).list(date).await?
            };
            let days = calendar::group_by_day(calendar::to_events(&appointments));
            if days.is_empty() {
                println!("No appointments");
            }
            for (day, events) in days {
                println!("{}", day.format("%A %Y-%m-%d"));
                for event in events {
                    println!(
                        "  {}-{}  [{}] {}",
                        event.start.format("%H:%M"),
                        event.end.format("%H:%M"),
                        event.status,
                        event.title
                    );
                }
            }
        }
    }

    Ok(())
}

async fn run_users(cmd: UsersCommand, users: UserService) -> Result<(), ApiError> {
    match cmd {
        UsersCommand::List { search } => print_json(&users.list(search.as_deref()).await?)?,

        UsersCommand::Get { id } => print_json(&users.get(id).await?)?,

        UsersCommand::Create {
            username,
            email,
            role,
            full_name,
            phone,
            disabled,
            password,
        } => {
            let password = password_or_prompt(password, "Password for the new user")?;
            let request = CreateUserRequest {
                username,
                email,
                password,
                role,
                enabled: !disabled,
                full_name,
                phone,
            };
            print_json(&users.create(&request).await?)?;
        }

        UsersCommand::Update {
            id,
            username,
            email,
            role,
            enabled,
        } => {
            // Fields not given on the command line keep their current value
            let current = users.get(id).await?;
            let mut request = UpdateUserRequest::from(&current);
            if let Some(username) = username {
                request.username = username;
            }
            if let Some(email) = email {
                request.email = email;
            }
            if let Some(role) = role {
                request.role = role;
            }
            if let Some(enabled) = enabled {
                request.enabled = enabled;
            }
            print_json(&users.update(id, &request).await?)?;
        }

        UsersCommand::Delete { id } => {
            users.delete(id).await?;
            println!("Deleted user {}", id);
        }

        UsersCommand::ToggleStatus { id } => {
            let user = users.toggle_status(id).await?;
            let state = if user.enabled { "enabled" } else { "disabled" };
            println!("User {} is now {}", user.username, state);
        }

        UsersCommand::ChangePassword { id, password } => {
            let password = password_or_prompt(password, "New password")?;
            users.change_password(id, &password).await?;
            println!("Password changed for user {}", id);
        }
    }

    Ok(())
}

async fn run_appointments(
    cmd: AppointmentsCommand,
    appointments: AppointmentService,
) -> Result<(), ApiError> {
    match cmd {
        AppointmentsCommand::List { date } => print_json(&appointments.list(date).await?)?,

        AppointmentsCommand::Get { id } => print_json(&appointments.get(id).await?)?,

        AppointmentsCommand::Cancel { id, reason } => {
            print_json(&appointments.cancel(id, &reason).await?)?
        }

        AppointmentsCommand::Delete { id } => {
            appointments.delete(id).await?;
            println!("Deleted appointment {}", id);
        }
    }

    Ok(())
}

async fn run_doctors(cmd: DoctorsCommand, directory: DirectoryService) -> Result<(), ApiError> {
    match cmd {
        DoctorsCommand::List { search } => {
            print_json(&directory.list_doctors(search.as_deref()).await?)?
        }

        DoctorsCommand::Get { id } => print_json(&directory.get_doctor(id).await?)?,

        DoctorsCommand::Create(args) => {
            let password = password_or_prompt(None, "Password for the new doctor")?;
            let request = doctor_request(args, Some(password));
            print_json(&directory.create_doctor(&request).await?)?;
        }

        DoctorsCommand::Update { id, doctor } => {
            let request = doctor_request(doctor, None);
            print_json(&directory.update_doctor(id, &request).await?)?;
        }
    }

    Ok(())
}

fn doctor_request(args: DoctorArgs, password: Option<String>) -> DoctorRequest {
    DoctorRequest {
        username: args.username,
        email: args.email,
        password,
        full_name: args.full_name,
        phone: args.phone,
        specialization: args.specialization,
        qualification: args.qualification,
        experience: args.experience,
        address: args.address,
        bio: args.bio,
    }
}

async fn run_feedbacks(cmd: FeedbacksCommand, feedbacks: FeedbackService) -> Result<(), ApiError> {
    match cmd {
        FeedbacksCommand::List { status } => {
            print_json(&feedbacks.list(status.as_deref()).await?)?
        }
        FeedbacksCommand::Get { id } => print_json(&feedbacks.get(id).await?)?,
        FeedbacksCommand::ForDoctor { doctor_id } => {
            print_json(&feedbacks.by_doctor(doctor_id).await?)?
        }
        FeedbacksCommand::ForPatient { patient_id } => {
            print_json(&feedbacks.by_patient(patient_id).await?)?
        }
        FeedbacksCommand::Hide { id } => {
            feedbacks.hide(id).await?;
            println!("Feedback {} hidden", id);
        }
        FeedbacksCommand::Unhide { id } => {
            feedbacks.unhide(id).await?;
            println!("Feedback {} visible", id);
        }
    }

    Ok(())
}

async fn run_doctor(cmd: DoctorCommand, doctor: DoctorService) -> Result<(), ApiError> {
    match cmd {
        DoctorCommand::Profile => print_json(&doctor.profile().await?)?,

        DoctorCommand::Appointments { date } => print_json(&doctor.appointments(date).await?)?,

        DoctorCommand::Appointment { id } => print_json(&doctor.appointment(id).await?)?,

        DoctorCommand::Confirm { id } => {
            let appointment = doctor.confirm_appointment(id).await?;
            println!("Appointment {} is now {}", appointment.id, appointment.status);
        }

        DoctorCommand::Cancel { id, reason } => {
            print_json(&doctor.cancel_appointment(id, &reason).await?)?
        }

        DoctorCommand::Feedbacks => print_json(&doctor.feedbacks().await?)?,

        DoctorCommand::Reply { id, message, edit } => {
            if message.trim().is_empty() {
                return Err(ApiError::Config("reply cannot be empty".to_string()));
            }
            print_json(&doctor.reply_to_feedback(id, &message, edit).await?)?;
        }

        DoctorCommand::Rating => print_json(&doctor.average_rating().await?)?,
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ApiError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn password_or_prompt(password: Option<String>, prompt: &str) -> Result<String, ApiError> {
    if let Some(password) = password {
        return Ok(password);
    }

    let password = Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| ApiError::Config(format!("Failed to read password: {}", e)))?;

    if password.is_empty() {
        return Err(ApiError::Config("password cannot be empty".to_string()));
    }
    Ok(password)
}
