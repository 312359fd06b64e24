mod certificate_repository;
mod course_repository;
mod employee_repository;
mod enrollment_repository;
mod progress_repository;

pub use certificate_repository::CertificateRepository;
pub use course_repository::CourseRepository;
pub use employee_repository::{CreateEmployeeOutcome, EmployeeRepository};
pub use enrollment_repository::EnrollmentRepository;
pub use progress_repository::ProgressRepository;
