pub mod email;
pub mod variations;

pub use email::EmailAddress;
pub use variations::generate_variations;
