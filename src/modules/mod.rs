pub mod certificates;
pub mod employees;
pub mod enrollments;
pub mod progress;
