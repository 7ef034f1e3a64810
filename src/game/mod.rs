pub mod feedback;
pub mod judgment;
pub mod note;
pub mod play_status;
pub mod processor;
pub mod session;
