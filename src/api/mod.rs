pub mod attendance;
pub mod biometric;
pub mod department;
pub mod employee;
pub mod leave_request;
pub mod report;
pub mod role;
pub mod shift;
