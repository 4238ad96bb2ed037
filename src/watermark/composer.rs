//! Watermark text composition.
//!
//! Joins the provenance fields into the single line that becomes the tile
//! text, in a fixed order:
//!
//! 1. recipient
//! 2. purpose
//! 3. date label (`YYYY-MM-DD`)
//! 4. hash label (`HASH: ` + first 12 hex characters)
//! 5. extra text
//!
//! Empty or absent fields are dropped entirely, so there is never a leading,
//! trailing or doubled separator.

use chrono::NaiveDate;

/// Visual separator placed between fields.
pub const FIELD_SEPARATOR: &str = "  •  ";

/// Number of hash characters shown in the hash label.
pub const HASH_PREFIX_LEN: usize = 12;

/// The optional provenance fields of a watermark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkFields {
    pub recipient: Option<String>,
    pub purpose: Option<String>,
    pub extra_text: Option<String>,
    pub include_date: bool,
    pub include_hash: bool,
}

impl Default for WatermarkFields {
    fn default() -> Self {
        Self {
            recipient: None,
            purpose: None,
            extra_text: None,
            include_date: true,
            include_hash: true,
        }
    }
}

impl WatermarkFields {
    /// All fields off.
    pub fn empty() -> Self {
        Self {
            include_date: false,
            include_hash: false,
            ..Self::default()
        }
    }

    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn with_extra_text(mut self, extra: impl Into<String>) -> Self {
        self.extra_text = Some(extra.into());
        self
    }

    pub fn with_date(mut self, include: bool) -> Self {
        self.include_date = include;
        self
    }

    pub fn with_hash(mut self, include: bool) -> Self {
        self.include_hash = include;
        self
    }
}

/// Compose the watermark text using today's local date.
pub fn compose(fields: &WatermarkFields, content_hash: &str) -> String {
    compose_on(fields, content_hash, chrono::Local::now().date_naive())
}

/// Compose the watermark text for a given date.
pub fn compose_on(fields: &WatermarkFields, content_hash: &str, today: NaiveDate) -> String {
    let date_label = fields.include_date.then(|| format_date(today));
    let hash_label = fields.include_hash.then(|| hash_label(content_hash));

    let parts = [
        non_blank(fields.recipient.as_deref()),
        non_blank(fields.purpose.as_deref()),
        date_label.as_deref(),
        hash_label.as_deref(),
        non_blank(fields.extra_text.as_deref()),
    ];

    parts
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(FIELD_SEPARATOR)
}

/// Formats a date as a 10-character `YYYY-MM-DD` string.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `HASH: ` followed by the first 12 characters of the hash.
pub fn hash_label(content_hash: &str) -> String {
    let prefix: String = content_hash.chars().take(HASH_PREFIX_LEN).collect();
    format!("HASH: {}", prefix)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
