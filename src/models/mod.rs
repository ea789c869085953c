// Data models for the clinic API

pub mod appointment;
pub mod directory;
pub mod feedback;
pub mod user;

pub use appointment::{Appointment, AppointmentStatus, CancelAppointmentRequest};
pub use directory::{Doctor, DoctorRequest, Patient, PatientRequest};
pub use feedback::{Feedback, FeedbackReply};
pub use user::{ChangePasswordRequest, CreateUserRequest, UpdateUserRequest, User};
