pub mod booking;
pub mod customer;
pub mod sale;
pub mod service;
pub mod staff;

pub use booking::{Booking, BookingStatus};
pub use customer::Customer;
pub use sale::{PaymentMethod, Sale, SaleStatus};
pub use service::{Service, ServiceStatus};
pub use staff::{Staff, StaffStatus};
