use anyhow::{Ok, Result};

use super::config_model::DotEnvyConfig;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = super::config_model::Server {
        port: std::env::var("SERVER_PORT")
            .expect("SERVER_PORT is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = super::config_model::Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let stripe = super::config_model::Stripe {
        secret_key: std::env::var("STRIPE_SECRET_KEY").expect("STRIPE_SECRET_KEY is invalid"),
        currency: std::env::var("STRIPE_CURRENCY").unwrap_or_else(|_| "usd".to_string()),
    };

    let plans = super::config_model::Plans {
        golden_monthly_price: std::env::var("STRIPE_PRICE_GOLDEN_MONTHLY")
            .expect("STRIPE_PRICE_GOLDEN_MONTHLY is invalid"),
        golden_yearly_price: std::env::var("STRIPE_PRICE_GOLDEN_YEARLY")
            .expect("STRIPE_PRICE_GOLDEN_YEARLY is invalid"),
    };

    Ok(DotEnvyConfig {
        server,
        database,
        stripe,
        plans,
    })
}
