pub mod cities;
pub mod rides;
pub mod session;
