//! Lookup page rendering
//!
//! The page shell is embedded in the binary and split once at startup
//! around its content marker; each request only renders the results
//! section. Provider-supplied text is always HTML-escaped.

use rust_embed::RustEmbed;
use std::fmt::Write;
use thiserror::Error;

use crate::lookup::{LocationRecord, LookupReport, UNKNOWN};

#[derive(RustEmbed)]
#[folder = "templates/"]
struct Templates;

const PAGE: &str = "index.html";

/// Placeholder in the page shell replaced by the rendered results
pub const CONTENT_MARKER: &str = "<!-- results -->";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template {0} is not embedded in the binary")]
    Missing(&'static str),
    #[error("template {0} is not valid UTF-8")]
    Encoding(&'static str),
    #[error("template {0} has no results marker")]
    NoMarker(&'static str),
}

#[derive(Debug, Clone)]
pub struct PageTemplate {
    head: String,
    tail: String,
}

impl PageTemplate {
    pub fn load() -> Result<Self, TemplateError> {
        let file = Templates::get(PAGE).ok_or(TemplateError::Missing(PAGE))?;
        let source = std::str::from_utf8(&file.data).map_err(|_| TemplateError::Encoding(PAGE))?;
        Self::parse(source).ok_or(TemplateError::NoMarker(PAGE))
    }

    fn parse(source: &str) -> Option<Self> {
        let (head, tail) = source.split_once(CONTENT_MARKER)?;
        Some(Self {
            head: head.to_string(),
            tail: tail.to_string(),
        })
    }

    /// Render the page; `None` is the blank form shown before any submission
    pub fn render(&self, report: Option<&LookupReport>) -> String {
        let mut content = String::new();

        match report {
            Some(report) if !report.results.is_empty() => render_report(&mut content, report),
            _ => content.push_str(
                r#"<p class="text-info">No geolocation results found.</p>"#,
            ),
        }

        let mut page = String::with_capacity(self.head.len() + content.len() + self.tail.len());
        page.push_str(&self.head);
        page.push_str(&content);
        page.push_str(&self.tail);
        page
    }
}

fn render_report(out: &mut String, report: &LookupReport) {
    match &report.route_url {
        Some(url) => {
            let _ = write!(
                out,
                r#"<div class="card mt-3"><div class="card-body"><h2>Google Maps Route:</h2><a href="{}" target="_blank" rel="noopener" class="btn btn-primary">View Route on Google Maps</a></div></div>"#,
                escape_html(url)
            );
        }
        None => out.push_str(
            r#"<p class="text-danger mt-3">Cannot generate Google Maps route because there are insufficient locations.</p>"#,
        ),
    }

    if !report.top5.is_empty() {
        out.push_str(r#"<div class="card mt-3"><div class="card-body"><h2>Top 5 Most Repeated IPs:</h2><ul class="list-group">"#);
        for entry in &report.top5 {
            let _ = write!(
                out,
                r#"<li class="list-group-item"><strong>IP:</strong> {}<br><strong>Count:</strong> {}</li>"#,
                escape_html(&entry.address),
                entry.count
            );
        }
        out.push_str("</ul></div></div>");
    }

    out.push_str(r#"<div class="card mt-3"><div class="card-body"><h2>Geolocation Results:</h2><ul class="list-group">"#);
    for (index, record) in report.results.iter().enumerate() {
        render_record(out, index + 1, record);
    }
    out.push_str("</ul></div></div>");
}

fn render_record(out: &mut String, index: usize, record: &LocationRecord) {
    let _ = write!(
        out,
        r#"<li class="list-group-item"><strong>IP:</strong> {}<br><strong>ISP:</strong> {}<br><a href="javascript:void(0);" onclick="toggleAdditionalInfo('info-{index}')">Read more</a><div class="additional-info" id="info-{index}">"#,
        escape_html(&record.address),
        escape_html(&record.isp),
    );

    let latitude = optional(record.latitude);
    let longitude = optional(record.longitude);
    let offset = optional(record.offset);
    let details: [(&str, &str); 20] = [
        ("Country", record.country_name.as_str()),
        ("City", record.city.as_str()),
        ("Latitude", latitude.as_str()),
        ("Longitude", longitude.as_str()),
        ("Continent", record.continent.as_str()),
        ("Continent Code", record.continent_code.as_str()),
        ("Country Code", record.country_code.as_str()),
        ("Region", record.region.as_str()),
        ("Region Name", record.region_name.as_str()),
        ("District", record.district.as_str()),
        ("Zip", record.zip.as_str()),
        ("Timezone", record.timezone.as_str()),
        ("Offset", offset.as_str()),
        ("Currency", record.currency.as_str()),
        ("Organization", record.org.as_str()),
        ("AS", record.as_number.as_str()),
        ("AS Name", record.as_name.as_str()),
        ("Mobile", yes_no(record.mobile)),
        ("Proxy", yes_no(record.proxy)),
        ("Hosting", yes_no(record.hosting)),
    ];
    for (label, value) in details {
        let _ = write!(out, "<strong>{label}:</strong> {}<br>", escape_html(value));
    }

    out.push_str("</div></li>");
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "True"
    } else {
        "False"
    }
}

/// Escape text for use in HTML element content and quoted attributes
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
