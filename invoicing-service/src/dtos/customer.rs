use serde::Deserialize;
use validator::Validate;

use super::double_option;
use crate::models::{CreateCustomer, UpdateCustomer};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

impl From<CreateCustomerRequest> for CreateCustomer {
    fn from(req: CreateCustomerRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            address: req.address,
            phone_number: req.phone_number,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone_number: Option<Option<String>>,
}

impl From<UpdateCustomerRequest> for UpdateCustomer {
    fn from(req: UpdateCustomerRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            address: req.address,
            phone_number: req.phone_number,
        }
    }
}
