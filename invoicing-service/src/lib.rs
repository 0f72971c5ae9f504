//! Invoicing Service - customers, rate templates, billable items and invoice assembly.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;
