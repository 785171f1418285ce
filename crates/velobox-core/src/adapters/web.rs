//! Profile page retrieval and field extraction.
//!
//! The credential portals render server-side HTML; fields are pulled out
//! with CSS selectors (student pages) or label heuristics (staff pages,
//! whose markup varies). Network and HTTP failures collapse into a single
//! `Scrape` error so the dispatcher can abort the scan.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::config::HttpConfig;
use crate::domain::entities::{BearerCategory, ProfileData, ProfileDetails};
use crate::domain::text::fold;
use crate::error::AccessError;
use crate::ports::outbound::ProfileFetcher;

/// Blocking HTTP profile fetcher.
pub struct HttpProfileFetcher {
    client: reqwest::blocking::Client,
}

impl HttpProfileFetcher {
    /// Build a client from the HTTP settings.
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self { client })
    }

    fn retrieve(&self, url: &str) -> Result<String, AccessError> {
        let scrape = |reason: String| AccessError::Scrape {
            url: url.to_owned(),
            reason,
        };

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(scrape("unsupported scheme".to_owned()));
        }

        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|err| scrape(err.to_string()))?;
        response.text().map_err(|err| scrape(err.to_string()))
    }
}

impl ProfileFetcher for HttpProfileFetcher {
    fn fetch(&self, scan_key: &str, category: BearerCategory) -> Result<ProfileData, AccessError> {
        debug!("[dispatch] fetching profile page {scan_key}");
        let html = self.retrieve(scan_key)?;
        match category {
            BearerCategory::Student => extract_student(&html),
            BearerCategory::Staff => extract_staff(&html),
        }
    }
}

fn sel(selector: &str) -> Selector {
    Selector::parse(selector).expect("static selector")
}

fn element_text(el: &ElementRef) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn select_text(doc: &Html, selector: &str) -> String {
    doc.select(&sel(selector))
        .next()
        .map(|el| element_text(&el))
        .unwrap_or_default()
}

/// Student portal: fields sit in dedicated classed divs; the highlighted
/// block carries the enrollment status and sometimes the shift.
fn extract_student(html: &str) -> Result<ProfileData, AccessError> {
    let doc = Html::parse_document(html);

    let identifier = select_text(&doc, "div.boleta");
    if identifier.is_empty() {
        return Err(AccessError::Extraction {
            field: "identifier",
        });
    }

    let mut status = String::new();
    let mut shift = String::new();
    if let Some(block) = doc
        .select(&sel(r#"div[style*="background-color"]"#))
        .next()
    {
        let text = element_text(&block);
        status = if text.contains("Inscrito") {
            "Inscrito".to_owned()
        } else {
            text.clone()
        };
        if let Some((_, tail)) = text.split_once("Turno:") {
            shift = tail.trim().to_owned();
        }
    }

    Ok(ProfileData {
        identifier,
        name: select_text(&doc, "div.nombre"),
        status,
        details: ProfileDetails::Student {
            national_id: select_text(&doc, "div.curp"),
            program: select_text(&doc, "div.carrera"),
            school: select_text(&doc, "div.escuela"),
            shift,
        },
    })
}

/// Staff portal markup varies; walk labels (`span`/`label`/`strong`) in
/// document order and take each value from the next `div`/`span` after it.
fn extract_staff(html: &str) -> Result<ProfileData, AccessError> {
    let doc = Html::parse_document(html);
    let elements: Vec<ElementRef> = doc
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .collect();

    let mut identifier = String::new();
    let mut name = String::new();
    let mut budget_code = String::new();
    let mut department = String::new();

    for (i, el) in elements.iter().enumerate() {
        if !matches!(el.value().name(), "span" | "label" | "strong") {
            continue;
        }
        let label = fold(&element_text(el));
        if label.is_empty() {
            continue;
        }

        let value = || {
            elements[i + 1..]
                .iter()
                .find(|c| matches!(c.value().name(), "div" | "span"))
                .map(element_text)
                .unwrap_or_default()
        };

        if label.contains("numero") && label.contains("empleado") && identifier.is_empty() {
            identifier = value();
        } else if label.contains("nombre") && name.is_empty() {
            name = value();
        } else if label.contains("clave") && label.contains("presupuestal") && budget_code.is_empty()
        {
            budget_code = value();
        } else if label.contains("adscripcion") && department.is_empty() {
            department = value();
        }
    }

    if identifier.is_empty() {
        return Err(AccessError::Extraction {
            field: "identifier",
        });
    }

    Ok(ProfileData {
        identifier,
        name,
        status: staff_status(&doc),
        details: ProfileDetails::Staff {
            budget_code,
            department,
        },
    })
}

/// Credential state from the alert block; anything but a positive
/// `alert-success` is "No válida".
fn staff_status(doc: &Html) -> String {
    if let Some(ok) = doc.select(&sel(".alert-success")).next() {
        if fold(&element_text(&ok)).contains("valida") {
            return "Válida".to_owned();
        }
    }
    "No válida".to_owned()
}
