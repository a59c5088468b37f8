use serde::{Deserialize, Deserializer, Serialize};

/// A material purchase as listed by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialPurchase {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub line_item_name: String,
    #[serde(default)]
    pub store: String,
    #[serde(default)]
    pub runners_name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub amount: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub card_number: String,
    #[serde(default)]
    pub transaction_date: String,
}

/// One page of the purchase list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchasePage {
    #[serde(default)]
    pub data: Vec<MaterialPurchase>,
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default = "first_page")]
    pub last_page: u32,
    #[serde(default)]
    pub total: Option<u64>,
}

fn first_page() -> u32 {
    1
}

/// A purchase row ready to submit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPurchase {
    pub line_item_name: String,
    pub store: String,
    pub runners_name: String,
    pub amount: f64,
    pub card_number: u32,
    /// MM-DD-YYYY
    pub transaction_date: String,
}

/// Accepts `12.5`, `"12.5"` or `null`, keeping the value as display text.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Current position in a paged list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    current: u32,
    last: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { current: 1, last: 1 }
    }
}

impl Pagination {
    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn last(&self) -> u32 {
        self.last
    }

    /// Move to `page` if it is within `1..=last`. Returns whether it moved.
    pub fn go_to(&mut self, page: u32) -> bool {
        if page > 0 && page <= self.last && page != self.current {
            self.current = page;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.current.saturating_add(1))
    }

    pub fn prev(&mut self) -> bool {
        self.go_to(self.current.saturating_sub(1))
    }

    /// Record the page count reported by the server
    pub fn set_last(&mut self, last: u32) {
        self.last = last.max(1);
        if self.current > self.last {
            self.current = self.last;
        }
    }

    pub fn has_prev(&self) -> bool {
        self.current > 1
    }

    pub fn has_next(&self) -> bool {
        self.current < self.last
    }

    pub fn label(&self) -> String {
        format!("Page {} of {}", self.current, self.last)
    }
}
