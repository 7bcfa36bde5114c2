use serde::Serialize;

/// Placeholder stored for any field the extractor could not locate
pub const MISSING_FIELD: &str = "N/A";

/// One product scraped from a detail page
///
/// Records are built once per successfully fetched detail page and never
/// modified afterwards. Column names are the CSV header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    #[serde(rename = "Product URL")]
    pub url: String,

    #[serde(rename = "Title")]
    pub title: String,

    #[serde(rename = "ASIN")]
    pub asin: String,

    #[serde(rename = "Description")]
    pub description: String,

    #[serde(rename = "Manufacturer")]
    pub manufacturer: String,
}

impl ProductRecord {
    /// Builds a record, substituting [`MISSING_FIELD`] for absent values
    pub fn new(
        url: impl Into<String>,
        title: Option<String>,
        asin: Option<String>,
        description: Option<String>,
        manufacturer: Option<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: or_missing(title),
            asin: or_missing(asin),
            description: or_missing(description),
            manufacturer: or_missing(manufacturer),
        }
    }
}

fn or_missing(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| MISSING_FIELD.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let record = ProductRecord::new("https://example.com/dp/1", None, None, None, None);
        assert_eq!(record.title, "N/A");
        assert_eq!(record.asin, "N/A");
        assert_eq!(record.description, "N/A");
        assert_eq!(record.manufacturer, "N/A");
    }

    #[test]
    fn test_blank_fields_default() {
        let record = ProductRecord::new(
            "https://example.com/dp/1",
            Some("  Travel Bag ".to_string()),
            Some("   ".to_string()),
            None,
            Some("Acme".to_string()),
        );
        assert_eq!(record.title, "Travel Bag");
        assert_eq!(record.asin, "N/A");
        assert_eq!(record.manufacturer, "Acme");
    }
}
