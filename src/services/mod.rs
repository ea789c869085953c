// Typed wrappers over the clinic API

pub mod appointments;
pub mod auth;
pub mod directory;
pub mod doctor;
pub mod feedback;
pub mod users;

pub use appointments::AppointmentService;
pub use auth::AuthService;
pub use directory::DirectoryService;
pub use doctor::DoctorService;
pub use feedback::FeedbackService;
pub use users::UserService;
