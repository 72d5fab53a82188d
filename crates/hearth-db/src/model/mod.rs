pub mod calendar;
pub mod news;
pub mod travel;
pub mod user;
