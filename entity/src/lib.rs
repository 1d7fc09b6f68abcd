//! Wire types shared by the HR backend client and the dashboard.
//!
//! Each module mirrors one backend resource. `Model` is what the backend
//! returns; `Draft` is what create/update calls send.

pub mod auth;
pub mod certifications;
pub mod compliance;
pub mod dashboard;
pub mod datetime;
pub mod departments;
pub mod employees;
pub mod enrollments;
pub mod trainings;

pub use certifications::Model as Certification;
pub use departments::Model as Department;
pub use employees::Model as Employee;
pub use enrollments::Model as Enrollment;
pub use trainings::Model as Training;
