pub mod coordinate;
pub mod filter;
pub mod google;
pub mod restaurant;
pub mod session;
