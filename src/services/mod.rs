pub mod bookings;
pub mod mail;
pub mod password;
pub mod report;
pub mod rooms;
pub mod token;
pub mod users;
