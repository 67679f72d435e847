pub mod bookings;
pub mod customers;
pub mod payment_records;
pub mod payment_sessions;
