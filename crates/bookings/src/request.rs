//! Booking submissions, before any stock is allocated.

use serde::{Deserialize, Serialize};

use rentbook_core::DomainError;

use crate::booking::BookingDetails;

/// One requested line: an item by display name and a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedLine {
    pub name: String,
    pub quantity: i64,
    /// Overrides the catalog price when set.
    #[serde(default)]
    pub unit_price: Option<i64>,
}

impl RequestedLine {
    pub fn new(name: impl Into<String>, quantity: i64) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_price: None,
        }
    }

    pub fn with_price(mut self, unit_price: i64) -> Self {
        self.unit_price = Some(unit_price);
        self
    }
}

/// What the front desk submits to create a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub details: BookingDetails,
    pub lines: Vec<RequestedLine>,
    /// Overrides the computed `Σ quantity × unit_price`.
    #[serde(default)]
    pub total_due: Option<i64>,
    /// Paid up front.
    #[serde(default)]
    pub deposit: i64,
}

impl BookingRequest {
    /// Reject malformed submissions before any storage call.
    pub fn validate(&self) -> Result<(), DomainError> {
        self.details.validate()?;
        if self.lines.is_empty() {
            return Err(DomainError::validation("a booking needs at least one line item"));
        }
        for (idx, line) in self.lines.iter().enumerate() {
            if line.name.trim().is_empty() {
                return Err(DomainError::validation(format!(
                    "line {idx}: item name cannot be empty"
                )));
            }
            if line.quantity <= 0 {
                return Err(DomainError::validation(format!(
                    "line {idx}: quantity must be positive"
                )));
            }
            if line.unit_price.is_some_and(|p| p < 0) {
                return Err(DomainError::validation(format!(
                    "line {idx}: unit price cannot be negative"
                )));
            }
        }
        if self.total_due.is_some_and(|t| t < 0) {
            return Err(DomainError::validation("total due cannot be negative"));
        }
        if self.deposit < 0 {
            return Err(DomainError::validation("deposit cannot be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::ClientInfo;
    use chrono::NaiveDate;

    fn request() -> BookingRequest {
        let day = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        BookingRequest {
            details: BookingDetails {
                event_name: "Birthday".to_string(),
                client: ClientInfo {
                    name: "Bola".to_string(),
                    ..ClientInfo::default()
                },
                event_date: day,
                return_by: day,
                location: String::new(),
                notes: String::new(),
            },
            lines: vec![RequestedLine::new("Chairs", 10).with_price(150)],
            total_due: None,
            deposit: 0,
        }
    }

    #[test]
    fn valid_request_passes() {
        request().validate().unwrap();
    }

    #[test]
    fn rejects_bad_lines_and_amounts() {
        let cases: Vec<Box<dyn Fn(&mut BookingRequest)>> = vec![
            Box::new(|r| r.lines.clear()),
            Box::new(|r| r.lines[0].quantity = 0),
            Box::new(|r| r.lines[0].name = "   ".to_string()),
            Box::new(|r| r.lines[0].unit_price = Some(-1)),
            Box::new(|r| r.total_due = Some(-5)),
            Box::new(|r| r.deposit = -1),
            Box::new(|r| r.details.event_name.clear()),
        ];

        for mutate in cases {
            let mut r = request();
            mutate(&mut r);
            assert!(matches!(r.validate(), Err(DomainError::Validation(_))));
        }
    }

    #[test]
    fn optional_fields_default_when_deserializing() {
        let json = serde_json::json!({
            "details": {
                "event_name": "Party",
                "client": { "name": "C", "phone": "", "email": "" },
                "event_date": "2026-06-01",
                "return_by": "2026-06-02",
                "location": "",
                "notes": ""
            },
            "lines": [{ "name": "Chairs", "quantity": 3 }]
        });
        let r: BookingRequest = serde_json::from_value(json).unwrap();
        assert_eq!(r.deposit, 0);
        assert_eq!(r.total_due, None);
        assert_eq!(r.lines[0].unit_price, None);
    }
}
