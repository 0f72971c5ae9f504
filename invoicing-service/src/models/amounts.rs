//! Derived money fields of an invoice item and invoice aggregates.
//!
//! All arithmetic is exact base-10 (`Decimal`); nothing is rounded between the
//! subtotal and the VAT step. Rounding to cents is left to whoever renders the
//! numbers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

use super::{InvoiceItem, UpdateInvoiceItem};

/// A derived or summed amount does not fit in a `Decimal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("amount out of range")]
pub struct AmountOverflow;

impl From<AmountOverflow> for AppError {
    fn from(err: AmountOverflow) -> Self {
        AppError::BadRequest(anyhow::Error::new(err))
    }
}

/// subtotal / VAT / total triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amounts {
    pub subtotal: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
}

impl Amounts {
    pub const ZERO: Amounts = Amounts {
        subtotal: Decimal::ZERO,
        vat_amount: Decimal::ZERO,
        total: Decimal::ZERO,
    };

    /// `subtotal = quantity * unit_price`, `vat_amount = subtotal * (vat_rate / 100)`,
    /// `total = subtotal + vat_amount`. `vat_rate` is a percentage (21 means 21%).
    pub fn derive(
        quantity: Decimal,
        unit_price: Decimal,
        vat_rate: Decimal,
    ) -> Result<Self, AmountOverflow> {
        let subtotal = quantity.checked_mul(unit_price).ok_or(AmountOverflow)?;
        let vat_amount = vat_rate
            .checked_div(Decimal::ONE_HUNDRED)
            .and_then(|rate| subtotal.checked_mul(rate))
            .ok_or(AmountOverflow)?;
        Ok(Self {
            subtotal,
            vat_amount,
            total: subtotal.checked_add(vat_amount).ok_or(AmountOverflow)?,
        })
    }

    pub fn checked_add(self, rhs: Amounts) -> Result<Amounts, AmountOverflow> {
        Ok(Amounts {
            subtotal: self.subtotal.checked_add(rhs.subtotal).ok_or(AmountOverflow)?,
            vat_amount: self
                .vat_amount
                .checked_add(rhs.vat_amount)
                .ok_or(AmountOverflow)?,
            total: self.total.checked_add(rhs.total).ok_or(AmountOverflow)?,
        })
    }

    /// Field-wise sum, failing instead of overflowing.
    pub fn try_sum(iter: impl IntoIterator<Item = Amounts>) -> Result<Amounts, AmountOverflow> {
        iter.into_iter()
            .try_fold(Amounts::ZERO, |acc, amounts| acc.checked_add(amounts))
    }
}

/// Sum of plain amounts, failing instead of overflowing.
pub fn try_sum_decimals(
    iter: impl IntoIterator<Item = Decimal>,
) -> Result<Decimal, AmountOverflow> {
    iter.into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value).ok_or(AmountOverflow))
}

/// Re-derive an item's amounts when the patch touches quantity, unit price or
/// VAT rate. Patch values take precedence, the stored values fill the gaps, and
/// all three derived fields are recomputed together. Returns `None` when the
/// patch leaves the inputs alone.
pub fn recompute_if_needed(
    existing: &InvoiceItem,
    patch: &UpdateInvoiceItem,
) -> Result<Option<Amounts>, AmountOverflow> {
    if patch.quantity.is_none() && patch.unit_price.is_none() && patch.vat_rate.is_none() {
        return Ok(None);
    }

    Amounts::derive(
        patch.quantity.unwrap_or(existing.quantity),
        patch.unit_price.unwrap_or(existing.unit_price),
        patch.vat_rate.unwrap_or(existing.vat_rate),
    )
    .map(Some)
}
