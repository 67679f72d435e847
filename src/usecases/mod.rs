pub mod gateway;
pub mod payment_methods;
pub mod payments;
pub mod refunds;
pub mod subscriptions;
