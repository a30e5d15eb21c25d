//! Sales domain models

use super::number::{flexible_f64, flexible_f64_opt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "PAGO_MOVIL")]
    PagoMovil,
    #[serde(rename = "PUNTO")]
    Punto,
    #[serde(rename = "DIVISAS")]
    Divisas,
    #[serde(rename = "USDT")]
    Usdt,
    /// Legacy sales recorded without a method
    #[serde(other)]
    Unspecified,
}

impl PaymentMethod {
    /// Local-currency methods are charged in Bs, the rest in USD
    pub fn currency(self) -> PayCurrency {
        match self {
            PaymentMethod::PagoMovil | PaymentMethod::Punto => PayCurrency::Ves,
            _ => PayCurrency::Usd,
        }
    }

    pub fn requires_reference(self) -> bool {
        self == PaymentMethod::PagoMovil
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::PagoMovil => "PAGO_MOVIL",
            PaymentMethod::Punto => "PUNTO",
            PaymentMethod::Divisas => "DIVISAS",
            PaymentMethod::Usdt => "USDT",
            PaymentMethod::Unspecified => "",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PAGO_MOVIL" => Ok(PaymentMethod::PagoMovil),
            "PUNTO" => Ok(PaymentMethod::Punto),
            "DIVISAS" => Ok(PaymentMethod::Divisas),
            "USDT" => Ok(PaymentMethod::Usdt),
            other => Err(format!("unknown payment method: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PayCurrency {
    Usd,
    Ves,
}

impl PayCurrency {
    pub fn as_str(self) -> &'static str {
        match self {
            PayCurrency::Usd => "USD",
            PayCurrency::Ves => "VES",
        }
    }
}

/// Sale line as written by the client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleItemWrite {
    pub product_id: i64,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price_usd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleCreatePayload {
    pub store: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub items: Vec<SaleItemWrite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_currency_set: Option<PayCurrency>,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_id_doc: String,
    pub customer_phone: String,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: i64,
    pub product: i64,
    pub quantity: i64,
    #[serde(default, deserialize_with = "flexible_f64_opt")]
    pub unit_price: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64_opt")]
    pub unit_price_usd: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub line_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    pub store: i64,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_address: String,
    #[serde(default)]
    pub customer_id_doc: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default = "unspecified_method")]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_reference: String,
    #[serde(default, deserialize_with = "flexible_f64_opt")]
    pub vat_rate: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64_opt")]
    pub subtotal_bs: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64_opt")]
    pub vat_bs: Option<f64>,
    #[serde(deserialize_with = "flexible_f64")]
    pub total: f64,
    #[serde(default, deserialize_with = "flexible_f64_opt")]
    pub total_usd: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64_opt")]
    pub fx_usd: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub pay_currency: Option<PayCurrency>,
    #[serde(default)]
    pub items_detail: Vec<SaleItem>,
}

/// Query parameters of the sales list
#[derive(Debug, Clone, Default, Serialize)]
pub struct SalesQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
}

fn unspecified_method() -> PaymentMethod {
    PaymentMethod::Unspecified
}
