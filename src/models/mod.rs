pub mod attendance;
pub mod class;
pub mod course;
pub mod enrollment;
pub mod project;
pub mod submission;
pub mod user;
