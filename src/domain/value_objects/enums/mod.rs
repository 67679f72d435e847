pub mod customer_plans;
pub mod payment_record_statuses;
pub mod payment_types;
pub mod session_statuses;
pub mod subscription_statuses;
