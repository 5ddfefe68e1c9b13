pub mod auth;
pub mod courses;
pub mod departments;
pub mod enrollments;
pub mod faculties;
pub mod grades;
pub mod health;
pub mod materials;
pub mod notes;
pub mod ratings;
pub mod users;

pub use auth::*;
pub use courses::*;
pub use departments::*;
pub use enrollments::*;
pub use faculties::*;
pub use grades::*;
pub use health::*;
pub use materials::*;
pub use notes::*;
pub use ratings::*;
pub use users::*;
