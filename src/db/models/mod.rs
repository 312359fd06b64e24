mod certificate;
mod course;
mod employee;
mod enrollment;
mod progress;
mod user;

pub use certificate::*;
pub use course::*;
pub use employee::*;
pub use enrollment::*;
pub use progress::*;
pub use user::*;
