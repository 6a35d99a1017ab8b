//! # TDnet Listing Collaborator
//!
//! Scrapes TDnet's (Tokyo Stock Exchange disclosure portal) paginated daily
//! listing pages into structured records, the direct analogue of the
//! original `TDnetAnalyzer.get_DisclosureRecordList`.

use std::thread;
use std::time::Duration;

use bon::bon;
use chrono::NaiveDate;
use url::Url;

use crate::error::{JpxError, JpxResult};

const LISTING_BASE_URL: &str = "https://www.release.tdnet.info/inbs/";
const MAX_ATTEMPTS: u32 = 10;
const RETRY_DELAY: Duration = Duration::from_secs(10);

/// One row of a TDnet daily disclosure listing.
#[derive(Debug, Clone)]
pub struct TdnetDisclosure {
    pub time: String,
    pub code: String,
    pub name: String,
    pub title: String,
    pub pdf_url: Option<String>,
    pub xbrl_url: Option<String>,
    pub place: String,
    pub history: String,
}

/// Fetches and parses TDnet's disclosure listing for a given date.
pub struct TdnetAnalyzer {
    client: reqwest::blocking::Client,
    base_url: Url,
}

#[bon]
impl TdnetAnalyzer {
    #[builder]
    pub fn new(#[builder(into)] base_url: Option<String>) -> JpxResult<Self> {
        let base_url = base_url.unwrap_or_else(|| LISTING_BASE_URL.to_string());
        Ok(Self {
            client: reqwest::blocking::Client::new(),
            base_url: Url::parse(&base_url).map_err(|e| JpxError::Other(e.to_string()))?,
        })
    }

    /// Page through `date`'s listing until a page 404s, returning every
    /// disclosure row encountered. The date is an explicit argument, unlike
    /// the hardcoded `20240517` literal the original scraper shipped with.
    pub fn get_disclosure_record_list(&self, date: NaiveDate) -> JpxResult<Vec<TdnetDisclosure>> {
        let mut records = Vec::new();
        let date_str = date.format("%Y%m%d").to_string();

        for page in 1.. {
            let page_url = self.page_url(page, &date_str)?;

            match self.fetch_page(&page_url)? {
                Some(text) => {
                    records.extend(parse_listing_page(&text, &page_url)?);
                }
                None => break,
            }
        }

        Ok(records)
    }

    fn page_url(&self, page: u32, date_str: &str) -> JpxResult<Url> {
        let file_name = format!("I_list_{page:03}_{date_str}");
        self.base_url
            .join(&file_name)
            .map_err(|e| JpxError::Other(e.to_string()))
    }

    /// `Ok(None)` on a 404 (end of list); retries other non-success statuses
    /// up to [`MAX_ATTEMPTS`] times with a [`RETRY_DELAY`] back-off.
    fn fetch_page(&self, url: &Url) -> JpxResult<Option<String>> {
        for attempt in 1..=MAX_ATTEMPTS {
            let response = self.client.get(url.clone()).send()?;

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                log::debug!("tdnet: {url} is 404, end of listing");
                return Ok(None);
            }
            if response.status().is_success() {
                return Ok(Some(response.text()?));
            }

            log::debug!(
                "tdnet: {url} returned {} (attempt {attempt}/{MAX_ATTEMPTS})",
                response.status()
            );
            if attempt < MAX_ATTEMPTS {
                thread::sleep(RETRY_DELAY);
            }
        }

        Err(JpxError::Other(format!(
            "tdnet: {url} did not succeed after {MAX_ATTEMPTS} attempts"
        )))
    }
}

fn parse_listing_page(text: &str, page_url: &Url) -> JpxResult<Vec<TdnetDisclosure>> {
    let doc = roxmltree::Document::parse(text)?;

    let rows: Vec<_> = doc
        .descendants()
        .filter(|n| n.tag_name().name() == "tr" && row_has_listing_cells(*n))
        .collect();

    let mut records = Vec::new();
    for row in rows {
        let cell = |class_name: &str| -> Option<String> {
            row.descendants()
                .find(|n| n.attribute("class") == Some(class_name))
                .and_then(|n| n.text())
                .map(|s| s.trim().to_string())
        };

        // kjTitle's text sits inside a nested <a>, not as the <td>'s own
        // text node, so `cell` (which reads `.text()` directly) always
        // returns None for it.
        let title = row
            .descendants()
            .find(|n| n.attribute("class") == Some("kjTitle"))
            .and_then(|n| n.descendants().find(|a| a.tag_name().name() == "a"))
            .and_then(|a| a.text())
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        let pdf_url = row
            .descendants()
            .find(|n| n.attribute("class") == Some("kjTitle"))
            .and_then(|n| n.descendants().find(|a| a.tag_name().name() == "a"))
            .and_then(|a| a.attribute("href"))
            .and_then(|href| page_url.join(href).ok())
            .map(|u| u.to_string());

        let xbrl_url = row
            .descendants()
            .find(|n| n.attribute("class") == Some("kjXbrl"))
            .and_then(|n| n.descendants().find(|a| a.tag_name().name() == "a"))
            .and_then(|a| a.attribute("href"))
            .and_then(|href| page_url.join(href).ok())
            .map(|u| u.to_string());

        records.push(TdnetDisclosure {
            time: cell("kjTime").unwrap_or_default(),
            code: cell("kjCode").unwrap_or_default(),
            name: cell("kjName").unwrap_or_default(),
            title,
            pdf_url,
            xbrl_url,
            place: cell("kjPlace").unwrap_or_default(),
            history: cell("kjHistroy").unwrap_or_default(),
        });
    }

    Ok(records)
}

fn row_has_listing_cells(row: roxmltree::Node) -> bool {
    row.descendants().any(|n| n.attribute("class") == Some("kjCode"))
}

// ================================================
// UNIT TESTS
// ================================================
#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r#"<html><body><table id="main-list-table">
        <tr>
            <td class="kjTime">15:00</td>
            <td class="kjCode">1234</td>
            <td class="kjName">Example Co., Ltd.</td>
            <td class="kjTitle"><a href="140120240517500000.pdf">Q1 Results</a></td>
            <td class="kjXbrl"><a href="140120240517500000-qcedjpfr-asbc.zip">XBRL</a></td>
            <td class="kjPlace">Tokyo</td>
            <td class="kjHistroy"></td>
        </tr>
    </table></body></html>"#;

    #[test]
    fn test_parse_listing_page_extracts_row_fields() {
        let page_url = Url::parse("https://www.release.tdnet.info/inbs/I_list_001_20240517.html").unwrap();
        let records = parse_listing_page(SAMPLE_PAGE, &page_url).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code, "1234");
        assert_eq!(records[0].name, "Example Co., Ltd.");
        assert_eq!(records[0].title, "Q1 Results");
        assert_eq!(
            records[0].pdf_url.as_deref(),
            Some("https://www.release.tdnet.info/inbs/140120240517500000.pdf")
        );
    }

    #[test]
    fn test_page_url_is_joined_not_concatenated() {
        let analyzer = TdnetAnalyzer::builder().build().unwrap();
        let url = analyzer.page_url(3, "20240517").unwrap();
        assert_eq!(url.as_str(), "https://www.release.tdnet.info/inbs/I_list_003_20240517");
    }
}
