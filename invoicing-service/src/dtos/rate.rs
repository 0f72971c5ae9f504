use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use super::{validate_non_negative, validate_positive};
use crate::models::{CreateRate, UpdateRate};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRateRequest {
    #[validate(length(min = 1, message = "Code is required"))]
    pub code: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(custom(function = "validate_non_negative"))]
    pub amount: Decimal,
    #[validate(length(min = 1, message = "Period is required"))]
    pub period: String,
    #[validate(custom(function = "validate_non_negative"))]
    pub vat_rate: Decimal,
    #[validate(custom(function = "validate_positive"))]
    pub default_quantity: Option<Decimal>,
}

impl From<CreateRateRequest> for CreateRate {
    fn from(req: CreateRateRequest) -> Self {
        Self {
            code: req.code,
            description: req.description,
            amount: req.amount,
            period: req.period,
            vat_rate: req.vat_rate,
            default_quantity: req.default_quantity.unwrap_or(Decimal::ONE),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRateRequest {
    #[validate(length(min = 1, message = "Code is required"))]
    pub code: Option<String>,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_non_negative"))]
    pub amount: Option<Decimal>,
    #[validate(length(min = 1, message = "Period is required"))]
    pub period: Option<String>,
    #[validate(custom(function = "validate_non_negative"))]
    pub vat_rate: Option<Decimal>,
    #[validate(custom(function = "validate_positive"))]
    pub default_quantity: Option<Decimal>,
}

impl From<UpdateRateRequest> for UpdateRate {
    fn from(req: UpdateRateRequest) -> Self {
        Self {
            code: req.code,
            description: req.description,
            amount: req.amount,
            period: req.period,
            vat_rate: req.vat_rate,
            default_quantity: req.default_quantity,
        }
    }
}
