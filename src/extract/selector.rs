use crate::config::{parse_selector, ExtractConfig};
use crate::extract::{Extractor, ListingPage, ProductFields};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// Extractor driven entirely by configured CSS selectors and labels
///
/// # Listing pages
///
/// - Product links: `href` of every element matching `detail-link-selector`
/// - Next page: present when `next-page-selector` matches anything; with an
///   empty selector the listing is assumed to continue for as long as pages
///   keep yielding product links
///
/// # Detail pages
///
/// - Title: text of the first element matching `title-selector`
/// - Description: `content` of `<meta name="{description-meta}">`
/// - ASIN / manufacturer: label table lookup, i.e. the first `<td>` following
///   a `<th>` whose text equals the configured label
#[derive(Debug, Clone)]
pub struct SelectorExtractor {
    detail_links: Selector,
    next_page: Option<Selector>,
    title: Selector,
    meta: Selector,
    table_cells: Selector,
    description_meta: String,
    asin_label: String,
    manufacturer_label: String,
}

impl SelectorExtractor {
    /// Builds an extractor from the `[extract]` configuration section
    ///
    /// # Returns
    ///
    /// * `Ok(SelectorExtractor)` - All selectors parsed
    /// * `Err(ConfigError)` - A configured selector is not valid CSS
    pub fn from_config(config: &ExtractConfig) -> Result<Self, ConfigError> {
        let next_page = if config.next_page_selector.trim().is_empty() {
            None
        } else {
            Some(parse_selector(&config.next_page_selector)?)
        };

        Ok(Self {
            detail_links: parse_selector(&config.detail_link_selector)?,
            next_page,
            title: parse_selector(&config.title_selector)?,
            meta: parse_selector("meta[name]")?,
            table_cells: parse_selector("th, td")?,
            description_meta: config.description_meta.clone(),
            asin_label: config.asin_label.clone(),
            manufacturer_label: config.manufacturer_label.clone(),
        })
    }

    fn extract_title(&self, document: &Html) -> Option<String> {
        document
            .select(&self.title)
            .next()
            .map(|element| collapse_whitespace(&element_text(element)))
            .filter(|s| !s.is_empty())
    }

    fn extract_meta(&self, document: &Html, name: &str) -> Option<String> {
        document
            .select(&self.meta)
            .find(|element| {
                element
                    .value()
                    .attr("name")
                    .map(|n| n.trim().eq_ignore_ascii_case(name))
                    .unwrap_or(false)
            })
            .and_then(|element| element.value().attr("content"))
            .map(|content| content.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Finds the value cell following a header cell labelled `label`
    fn extract_labelled(&self, document: &Html, label: &str) -> Option<String> {
        let mut label_seen = false;

        for cell in document.select(&self.table_cells) {
            let is_header = cell.value().name() == "th";
            if !label_seen {
                if is_header && collapse_whitespace(&element_text(cell)) == label {
                    label_seen = true;
                }
                continue;
            }

            if !is_header {
                let value = collapse_whitespace(&element_text(cell));
                return (!value.is_empty()).then_some(value);
            }
        }

        None
    }
}

impl Extractor for SelectorExtractor {
    fn extract_listing_page(&self, body: &str) -> ListingPage {
        let document = Html::parse_document(body);

        let detail_urls: Vec<String> = document
            .select(&self.detail_links)
            .filter_map(|element| element.value().attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty())
            .collect();

        let has_next_page = match &self.next_page {
            Some(selector) => document.select(selector).next().is_some(),
            None => !detail_urls.is_empty(),
        };

        ListingPage {
            detail_urls,
            has_next_page,
        }
    }

    fn extract_detail_page(&self, body: &str) -> ProductFields {
        let document = Html::parse_document(body);

        ProductFields {
            title: self.extract_title(&document),
            asin: self.extract_labelled(&document, &self.asin_label),
            description: self.extract_meta(&document, &self.description_meta),
            manufacturer: self.extract_labelled(&document, &self.manufacturer_label),
        }
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> SelectorExtractor {
        SelectorExtractor::from_config(&ExtractConfig::default()).unwrap()
    }

    const DETAIL_PAGE: &str = r#"
        <html>
        <head>
            <title>  Travel Duffel Bag,
                Black </title>
            <meta name="description" content="A roomy bag for weekend trips.">
        </head>
        <body>
            <table id="details">
                <tr><th>Brand</th><td>Acme</td></tr>
                <tr><th> ASIN </th><td> B0TEST1234 </td></tr>
                <tr><th>Manufacturer</th><td>Acme Luggage Co.</td></tr>
            </table>
        </body>
        </html>
    "#;

    #[test]
    fn test_extract_listing_links() {
        let html = r#"
            <html><body>
                <div class="result"><a class="product-link" href="/dp/1">One</a></div>
                <div class="result"><a class="product-link" href="https://shop.example.com/dp/2">Two</a></div>
                <div class="result"><a class="product-link">No href</a></div>
                <a href="/help">Help</a>
                <a rel="next" href="?page=2">Next</a>
            </body></html>
        "#;
        let page = extractor().extract_listing_page(html);
        assert_eq!(
            page.detail_urls,
            vec!["/dp/1".to_string(), "https://shop.example.com/dp/2".to_string()]
        );
        assert!(page.has_next_page);
    }

    #[test]
    fn test_listing_without_next_link() {
        let html = r#"<html><body><a class="product-link" href="/dp/1">One</a></body></html>"#;
        let page = extractor().extract_listing_page(html);
        assert_eq!(page.detail_urls.len(), 1);
        assert!(!page.has_next_page);
    }

    #[test]
    fn test_empty_next_selector_continues_while_products_found() {
        let config = ExtractConfig {
            next_page_selector: String::new(),
            ..ExtractConfig::default()
        };
        let extractor = SelectorExtractor::from_config(&config).unwrap();

        let with_products = r#"<a class="product-link" href="/dp/1">One</a>"#;
        assert!(extractor.extract_listing_page(with_products).has_next_page);

        let without_products = "<p>No results</p>";
        assert!(!extractor.extract_listing_page(without_products).has_next_page);
    }

    #[test]
    fn test_custom_link_selector() {
        let config = ExtractConfig {
            detail_link_selector: "div[data-component-type='s-search-result'] a.a-link-normal"
                .to_string(),
            ..ExtractConfig::default()
        };
        let extractor = SelectorExtractor::from_config(&config).unwrap();
        let html = r#"
            <div data-component-type="s-search-result"><a class="a-link-normal" href="/dp/A">A</a></div>
            <div data-component-type="sponsored"><a class="a-link-normal" href="/dp/B">B</a></div>
        "#;
        assert_eq!(
            extractor.extract_listing_page(html).detail_urls,
            vec!["/dp/A".to_string()]
        );
    }

    #[test]
    fn test_extract_detail_fields() {
        let fields = extractor().extract_detail_page(DETAIL_PAGE);
        assert_eq!(fields.title.as_deref(), Some("Travel Duffel Bag, Black"));
        assert_eq!(
            fields.description.as_deref(),
            Some("A roomy bag for weekend trips.")
        );
        assert_eq!(fields.asin.as_deref(), Some("B0TEST1234"));
        assert_eq!(fields.manufacturer.as_deref(), Some("Acme Luggage Co."));
    }

    #[test]
    fn test_missing_fields_are_absent() {
        let fields = extractor().extract_detail_page("<html><body><p>Sold out</p></body></html>");
        assert_eq!(fields, ProductFields::default());
    }

    #[test]
    fn test_garbled_markup_is_tolerated() {
        let html = r#"<html><head><title>Half a page</title><body><table><tr><th>ASIN<td>B0X"#;
        let fields = extractor().extract_detail_page(html);
        assert_eq!(fields.title.as_deref(), Some("Half a page"));
        assert_eq!(fields.asin.as_deref(), Some("B0X"));
        assert_eq!(fields.manufacturer, None);
    }

    #[test]
    fn test_label_without_value_cell() {
        let html = r#"<table><tr><th>ASIN</th></tr></table>"#;
        assert_eq!(extractor().extract_detail_page(html).asin, None);
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let config = ExtractConfig {
            title_selector: "div[[".to_string(),
            ..ExtractConfig::default()
        };
        assert!(matches!(
            SelectorExtractor::from_config(&config),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }
}
