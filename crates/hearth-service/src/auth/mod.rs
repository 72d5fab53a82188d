pub mod depot;
pub mod password;
pub mod token;
