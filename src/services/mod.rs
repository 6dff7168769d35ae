pub mod audit;
pub mod bookings;
pub mod sales;
