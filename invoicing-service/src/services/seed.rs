//! Sample data for a fresh installation.

use rust_decimal::Decimal;
use service_core::error::AppError;
use tracing::{info, instrument};

use super::store::InvoiceStore;
use crate::models::{CreateCustomer, CreateRate};

fn sample_customers() -> Vec<CreateCustomer> {
    vec![
        CreateCustomer {
            name: "Cliënt A".to_string(),
            email: "client-a@example.com".to_string(),
            address: Some("Hoofdstraat 1, 1234 AB Amsterdam".to_string()),
            phone_number: Some("020-1234567".to_string()),
        },
        CreateCustomer {
            name: "Bedrijf B".to_string(),
            email: "info@bedrijfb.nl".to_string(),
            address: Some("Zakenweg 10, 5678 CD Utrecht".to_string()),
            phone_number: Some("030-7654321".to_string()),
        },
    ]
}

fn sample_rates() -> Vec<CreateRate> {
    [
        ("CONSULT", "Consult 60 minuten", 85, "per sessie"),
        ("MASSAGE", "Massage behandeling", 65, "per behandeling"),
        ("COACHING", "Coaching sessie", 110, "per uur"),
        ("TRAJECT", "Compleet begeleidingstraject", 750, "per traject"),
    ]
    .into_iter()
    .map(|(code, description, amount, period)| CreateRate {
        code: code.to_string(),
        description: description.to_string(),
        amount: Decimal::from(amount),
        period: period.to_string(),
        vat_rate: Decimal::from(21),
        default_quantity: Decimal::ONE,
    })
    .collect()
}

/// Insert sample customers and rates when no customers exist yet. Rates whose
/// code is already present are left alone. Returns whether anything was seeded.
#[instrument(skip(store))]
pub async fn seed_sample_data(store: &dyn InvoiceStore) -> Result<bool, AppError> {
    if !store.list_customers().await?.is_empty() {
        info!("Customers present, skipping sample data");
        return Ok(false);
    }

    for customer in sample_customers() {
        store.create_customer(&customer).await?;
    }

    let mut rates_created = 0;
    for rate in sample_rates() {
        if store.get_rate_by_code(&rate.code).await?.is_none() {
            store.create_rate(&rate).await?;
            rates_created += 1;
        }
    }

    info!(rates_created = rates_created, "Sample data seeded");
    Ok(true)
}
