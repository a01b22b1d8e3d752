//! Edit form for the three mutable load fields

use serde::Serialize;
use thiserror::Error;

use crate::loads::Load;

/// Form validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Rate must be a number, got {0:?}")]
    InvalidRate(String),
}

/// The transient editing slot
///
/// Holds a copy of the selected load plus the form inputs. The rate input is
/// kept as typed and only parsed on validation, so an invalid entry never
/// reaches the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditForm {
    #[serde(skip)]
    original: Load,
    pub id: String,
    pub load_reference: String,
    pub commodity: String,
    pub rate_input: String,
}

impl EditForm {
    pub fn new(load: Load) -> Self {
        Self {
            id: load.id.clone(),
            load_reference: load.load_reference.clone(),
            commodity: load.commodity.clone(),
            rate_input: load.rate_amount.map(|r| r.to_string()).unwrap_or_default(),
            original: load,
        }
    }

    /// The load as it was when selected
    pub fn original(&self) -> &Load {
        &self.original
    }

    pub fn set_load_reference(&mut self, value: impl Into<String>) {
        self.load_reference = value.into();
    }

    pub fn set_commodity(&mut self, value: impl Into<String>) {
        self.commodity = value.into();
    }

    pub fn set_rate_input(&mut self, value: impl Into<String>) {
        self.rate_input = value.into();
    }

    /// Parse the rate input
    ///
    /// An empty input is only accepted when the load had no rate to begin
    /// with. NaN and infinities are rejected.
    pub fn parse_rate(&self) -> Result<Option<f64>, EditError> {
        let input = self.rate_input.trim();

        if input.is_empty() {
            return match self.original.rate_amount {
                None => Ok(None),
                Some(_) => Err(EditError::InvalidRate(self.rate_input.clone())),
            };
        }

        input
            .parse::<f64>()
            .ok()
            .filter(|r| r.is_finite())
            .map(Some)
            .ok_or_else(|| EditError::InvalidRate(self.rate_input.clone()))
    }

    /// The full edited load: the original with the three fields replaced
    pub fn validate(&self) -> Result<Load, EditError> {
        let rate_amount = self.parse_rate()?;

        Ok(Load {
            load_reference: self.load_reference.clone(),
            commodity: self.commodity.clone(),
            rate_amount,
            ..self.original.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::{LoadStatus, Stop};

    fn load() -> Load {
        Load::new("42")
            .reference("RC-1")
            .rate(1200.75)
            .commodity("Paper")
            .status(LoadStatus::PushedToTms)
            .stops(vec![Stop::new("Tulsa", "OK", "2024-02-02")])
    }

    #[test]
    fn test_unchanged_form_round_trips() {
        let form = EditForm::new(load());
        assert_eq!(form.rate_input, "1200.75");
        assert_eq!(form.validate().unwrap(), load());
    }

    #[test]
    fn test_edits_only_touch_mutable_fields() {
        let mut form = EditForm::new(load());
        form.set_load_reference("RC-2");
        form.set_commodity("Cardboard");
        form.set_rate_input(" 1300 ");

        let edited = form.validate().unwrap();
        assert_eq!(edited.load_reference, "RC-2");
        assert_eq!(edited.commodity, "Cardboard");
        assert_eq!(edited.rate_amount, Some(1300.0));
        assert_eq!(edited.status, LoadStatus::PushedToTms);
        assert_eq!(edited.raw_data, load().raw_data);
        assert_eq!(edited.id, "42");
    }

    #[test]
    fn test_invalid_rates_rejected() {
        let mut form = EditForm::new(load());

        for bad in ["abc", "", "NaN", "inf", "12abc"] {
            form.set_rate_input(bad);
            assert_eq!(
                form.validate().unwrap_err(),
                EditError::InvalidRate(bad.to_string())
            );
        }
    }

    #[test]
    fn test_negative_rate_accepted() {
        let mut form = EditForm::new(load());
        form.set_rate_input("-50");
        assert_eq!(form.parse_rate().unwrap(), Some(-50.0));
    }

    #[test]
    fn test_empty_rate_kept_absent() {
        let form = EditForm::new(Load::new("1"));
        assert_eq!(form.rate_input, "");
        assert_eq!(form.parse_rate().unwrap(), None);
    }
}
