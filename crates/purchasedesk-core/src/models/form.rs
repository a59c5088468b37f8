//! Multi-row purchase entry form.
//!
//! Rows are edited as plain text and only converted to `NewPurchase` values
//! by `PurchaseForm::validate`, which applies the same rules the server
//! expects: all fields filled, a five digit card number, a positive amount
//! and a calendar date.

use chrono::NaiveDate;
use thiserror::Error;

use super::purchase::NewPurchase;

/// Maximum length for the free-text columns
pub const MAX_TEXT_LENGTH: usize = 200;

/// Card numbers are exactly this many digits
pub const CARD_NUMBER_DIGITS: usize = 5;

/// Date format typed into the form
const INPUT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Date format the API stores
const API_DATE_FORMAT: &str = "%m-%d-%Y";

/// Columns of the entry form, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseField {
    Item,
    Store,
    Runner,
    Amount,
    CardNumber,
    TransactionDate,
}

impl PurchaseField {
    pub const ALL: [PurchaseField; 6] = [
        PurchaseField::Item,
        PurchaseField::Store,
        PurchaseField::Runner,
        PurchaseField::Amount,
        PurchaseField::CardNumber,
        PurchaseField::TransactionDate,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            PurchaseField::Item => "Items*",
            PurchaseField::Store => "Store*",
            PurchaseField::Runner => "Runner's Name*",
            PurchaseField::Amount => "Amount*",
            PurchaseField::CardNumber => "Card No.*",
            PurchaseField::TransactionDate => "Transaction Date*",
        }
    }

    /// Get the next column (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            PurchaseField::Item => PurchaseField::Store,
            PurchaseField::Store => PurchaseField::Runner,
            PurchaseField::Runner => PurchaseField::Amount,
            PurchaseField::Amount => PurchaseField::CardNumber,
            PurchaseField::CardNumber => PurchaseField::TransactionDate,
            PurchaseField::TransactionDate => PurchaseField::Item,
        }
    }

    /// Get the previous column (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            PurchaseField::Item => PurchaseField::TransactionDate,
            PurchaseField::Store => PurchaseField::Item,
            PurchaseField::Runner => PurchaseField::Store,
            PurchaseField::Amount => PurchaseField::Runner,
            PurchaseField::CardNumber => PurchaseField::Amount,
            PurchaseField::TransactionDate => PurchaseField::CardNumber,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("Add at least one purchase row.")]
    NoRows,

    #[error("Please fill out all required fields.")]
    MissingFields { row: usize },

    #[error("Card number must be exactly 5 digits for item: {item}")]
    CardNumber { row: usize, item: String },

    #[error("Amount must be a positive number for item: {item}")]
    Amount { row: usize, item: String },

    #[error("Transaction date must be YYYY-MM-DD for item: {item}")]
    TransactionDate { row: usize, item: String },
}

impl FormError {
    /// Row the error refers to, if any
    pub fn row(&self) -> Option<usize> {
        match self {
            FormError::NoRows => None,
            FormError::MissingFields { row }
            | FormError::CardNumber { row, .. }
            | FormError::Amount { row, .. }
            | FormError::TransactionDate { row, .. } => Some(*row),
        }
    }
}

/// One row of the form as typed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseDraft {
    pub line_item_name: String,
    pub store: String,
    pub runners_name: String,
    pub amount: String,
    pub card_number: String,
    pub transaction_date: String,
}

impl PurchaseDraft {
    pub fn field(&self, field: PurchaseField) -> &str {
        match field {
            PurchaseField::Item => &self.line_item_name,
            PurchaseField::Store => &self.store,
            PurchaseField::Runner => &self.runners_name,
            PurchaseField::Amount => &self.amount,
            PurchaseField::CardNumber => &self.card_number,
            PurchaseField::TransactionDate => &self.transaction_date,
        }
    }

    fn field_mut(&mut self, field: PurchaseField) -> &mut String {
        match field {
            PurchaseField::Item => &mut self.line_item_name,
            PurchaseField::Store => &mut self.store,
            PurchaseField::Runner => &mut self.runners_name,
            PurchaseField::Amount => &mut self.amount,
            PurchaseField::CardNumber => &mut self.card_number,
            PurchaseField::TransactionDate => &mut self.transaction_date,
        }
    }

    /// Append a character if the column accepts it. Returns whether it was added.
    pub fn push_char(&mut self, field: PurchaseField, c: char) -> bool {
        if !can_add_char(field, self.field(field), c) {
            return false;
        }
        self.field_mut(field).push(c);
        true
    }

    pub fn pop_char(&mut self, field: PurchaseField) {
        self.field_mut(field).pop();
    }

    fn is_complete(&self) -> bool {
        PurchaseField::ALL
            .iter()
            .all(|f| !self.field(*f).trim().is_empty())
    }

    fn to_purchase(&self, row: usize) -> Result<NewPurchase, FormError> {
        if !self.is_complete() {
            return Err(FormError::MissingFields { row });
        }
        let item = self.line_item_name.trim().to_string();

        let card_number = parse_card_number(&self.card_number)
            .ok_or_else(|| FormError::CardNumber { row, item: item.clone() })?;

        let amount = self
            .amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|a| a.is_finite() && *a > 0.0)
            .ok_or_else(|| FormError::Amount { row, item: item.clone() })?;

        let transaction_date = format_transaction_date(&self.transaction_date)
            .ok_or_else(|| FormError::TransactionDate { row, item: item.clone() })?;

        Ok(NewPurchase {
            line_item_name: item,
            store: self.store.trim().to_string(),
            runners_name: self.runners_name.trim().to_string(),
            amount,
            card_number,
            transaction_date,
        })
    }
}

/// Check whether a character can be added to a form column
pub fn can_add_char(field: PurchaseField, current: &str, c: char) -> bool {
    if c.is_control() {
        return false;
    }
    let len = current.chars().count();
    match field {
        PurchaseField::Item | PurchaseField::Store | PurchaseField::Runner => {
            len < MAX_TEXT_LENGTH
        }
        PurchaseField::CardNumber => len < CARD_NUMBER_DIGITS && c.is_ascii_digit(),
        PurchaseField::Amount => {
            c.is_ascii_digit() || (c == '.' && !current.contains('.'))
        }
        PurchaseField::TransactionDate => len < 10 && (c.is_ascii_digit() || c == '-'),
    }
}

/// Card numbers travel as integers, so a leading zero would drop a digit.
fn parse_card_number(input: &str) -> Option<u32> {
    let input = input.trim();
    if input.len() != CARD_NUMBER_DIGITS || !input.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let number: u32 = input.parse().ok()?;
    (number >= 10_u32.pow(CARD_NUMBER_DIGITS as u32 - 1)).then_some(number)
}

/// Convert a typed `YYYY-MM-DD` date into the API's `MM-DD-YYYY`
pub fn format_transaction_date(input: &str) -> Option<String> {
    NaiveDate::parse_from_str(input.trim(), INPUT_DATE_FORMAT)
        .ok()
        .map(|d| d.format(API_DATE_FORMAT).to_string())
}

/// The rows being entered in the purchase modal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseForm {
    rows: Vec<PurchaseDraft>,
}

impl Default for PurchaseForm {
    fn default() -> Self {
        Self {
            rows: vec![PurchaseDraft::default()],
        }
    }
}

impl PurchaseForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[PurchaseDraft] {
        &self.rows
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut PurchaseDraft> {
        self.rows.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a blank row, returning its index
    pub fn add_row(&mut self) -> usize {
        self.rows.push(PurchaseDraft::default());
        self.rows.len() - 1
    }

    /// Remove a row. Every row may be removed, leaving the form empty.
    pub fn remove_row(&mut self, index: usize) -> Option<PurchaseDraft> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    /// Back to a single blank row
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Validate every row, stopping at the first problem
    pub fn validate(&self) -> Result<Vec<NewPurchase>, FormError> {
        if self.rows.is_empty() {
            return Err(FormError::NoRows);
        }
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| row.to_purchase(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_row() -> PurchaseDraft {
        PurchaseDraft {
            line_item_name: "Cement".to_string(),
            store: "Home Depot".to_string(),
            runners_name: "Sam".to_string(),
            amount: "120.50".to_string(),
            card_number: "12345".to_string(),
            transaction_date: "2024-10-01".to_string(),
        }
    }

    #[test]
    fn test_form_starts_with_one_blank_row() {
        let form = PurchaseForm::new();
        assert_eq!(form.len(), 1);
        assert_eq!(form.rows()[0], PurchaseDraft::default());
    }

    #[test]
    fn test_add_and_remove_rows() {
        let mut form = PurchaseForm::new();
        assert_eq!(form.add_row(), 1);
        assert_eq!(form.add_row(), 2);
        assert!(form.remove_row(1).is_some());
        assert_eq!(form.len(), 2);
        assert!(form.remove_row(5).is_none());

        form.remove_row(0);
        form.remove_row(0);
        assert!(form.is_empty());

        form.reset();
        assert_eq!(form.len(), 1);
    }

    #[test]
    fn test_validate_converts_rows() {
        let mut form = PurchaseForm::new();
        *form.row_mut(0).expect("row") = filled_row();

        let rows = form.validate().expect("valid form");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, 120.5);
        assert_eq!(rows[0].card_number, 12345);
        assert_eq!(rows[0].transaction_date, "10-01-2024");
    }

    #[test]
    fn test_validate_empty_form() {
        let mut form = PurchaseForm::new();
        form.remove_row(0);
        assert_eq!(form.validate(), Err(FormError::NoRows));
    }

    #[test]
    fn test_validate_missing_fields() {
        let mut form = PurchaseForm::new();
        *form.row_mut(0).expect("row") = filled_row();
        let second = form.add_row();
        form.row_mut(second).expect("row").line_item_name = "Nails".to_string();

        let err = form.validate().expect_err("second row incomplete");
        assert_eq!(err, FormError::MissingFields { row: 1 });
        assert_eq!(err.to_string(), "Please fill out all required fields.");
    }

    #[test]
    fn test_validate_card_number() {
        let mut form = PurchaseForm::new();
        let mut row = filled_row();
        row.card_number = "1234".to_string();
        *form.row_mut(0).expect("row") = row;

        let err = form.validate().expect_err("short card");
        assert_eq!(
            err.to_string(),
            "Card number must be exactly 5 digits for item: Cement"
        );

        form.row_mut(0).expect("row").card_number = "01234".to_string();
        assert!(matches!(form.validate(), Err(FormError::CardNumber { row: 0, .. })));
    }

    #[test]
    fn test_validate_amount_and_date() {
        let mut form = PurchaseForm::new();
        let mut row = filled_row();
        row.amount = "0".to_string();
        *form.row_mut(0).expect("row") = row;
        assert!(matches!(form.validate(), Err(FormError::Amount { row: 0, .. })));

        let row = form.row_mut(0).expect("row");
        row.amount = "5".to_string();
        row.transaction_date = "2024-13-01".to_string();
        assert!(matches!(
            form.validate(),
            Err(FormError::TransactionDate { row: 0, .. })
        ));
    }

    #[test]
    fn test_can_add_char() {
        assert!(can_add_char(PurchaseField::Item, "", 'a'));
        assert!(!can_add_char(PurchaseField::Item, &"x".repeat(200), 'a'));
        assert!(!can_add_char(PurchaseField::Item, "", '\n'));

        assert!(can_add_char(PurchaseField::CardNumber, "1234", '5'));
        assert!(!can_add_char(PurchaseField::CardNumber, "12345", '6'));
        assert!(!can_add_char(PurchaseField::CardNumber, "", 'a'));

        assert!(can_add_char(PurchaseField::Amount, "12", '.'));
        assert!(!can_add_char(PurchaseField::Amount, "12.5", '.'));
        assert!(!can_add_char(PurchaseField::Amount, "", '-'));

        assert!(can_add_char(PurchaseField::TransactionDate, "2024", '-'));
        assert!(!can_add_char(PurchaseField::TransactionDate, "2024-10-01", '1'));
    }

    #[test]
    fn test_push_and_pop_char() {
        let mut row = PurchaseDraft::default();
        assert!(row.push_char(PurchaseField::CardNumber, '1'));
        assert!(!row.push_char(PurchaseField::CardNumber, 'x'));
        row.pop_char(PurchaseField::CardNumber);
        assert_eq!(row.card_number, "");
    }

    #[test]
    fn test_field_cycling() {
        assert_eq!(PurchaseField::Item.next(), PurchaseField::Store);
        assert_eq!(PurchaseField::TransactionDate.next(), PurchaseField::Item);
        assert_eq!(PurchaseField::Item.prev(), PurchaseField::TransactionDate);
    }
}
