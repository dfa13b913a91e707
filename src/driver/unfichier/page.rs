//! Page parser for 1fichier download pages.
//!
//! A 1fichier file page has this shape (only the parts read here):
//!
//! ```html
//! <div class="ct_warn">The requested file has been deleted</div>
//! <table class="premium">
//!   <tr><td class="normal">File name :</td><td class="normal">movie.mkv</td></tr>
//!   <tr><td class="normal">Size :</td><td class="normal">1 MB</td></tr>
//! </table>
//! <form method="post"><input type="hidden" name="adz" value="TOKEN"></form>
//! <a class="ok btn-general btn-orange" href="https://a-1.1fichier.com/...">Click here</a>
//! ```
//!
//! The free-download flow first serves the table and the `adz` form; posting
//! the token back returns a page carrying the `a.ok` direct link, or a
//! `ct_warn` asking to wait between free downloads.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::driver::utils::compile_static_regex;

static WARNING_SEL: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("div.ct_warn"));
static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("table.premium tr"));
static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("td"));
static BOLD_NAME_SEL: LazyLock<Selector> = LazyLock::new(|| {
    compile_static_selector(r#"table.premium td.normal span[style*="bold"]"#)
});
static TOKEN_SEL: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(r#"input[name="adz"]"#));
static LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("a.ok[href], a.btn-orange[href]"));

static COOLDOWN_MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"(?i)(?:wait|attendre)\s+(?:at least\s+|au moins\s+)?(\d+)\s*min")
});
static COOLDOWN_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"(?i)(?:must wait|devez attendre|try again later|réessayer plus tard)")
});
static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"(?i)^\s*(\d+(?:[.,]\d+)?)\s*([kmgt]i?[bo]|[bo]|bytes|octets)?\s*$")
});

fn compile_static_selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid static selector '{css}': {e:?}"))
}

/// A host-imposed wait reported in place of a download link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cooldown {
    /// Warning text as shown by the host.
    pub message: String,
    /// Advertised wait, when the text carries one.
    pub wait: Option<Duration>,
}

/// Fields extracted from one 1fichier page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnFichierPage {
    file_name: Option<String>,
    file_size: Option<u64>,
    file_error: Option<String>,
    anonymous_token: Option<String>,
    download_link: Option<String>,
}

impl UnFichierPage {
    /// Parses a page body.
    #[must_use]
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let (labelled_name, labelled_size) = labelled_rows(&document);

        Self {
            file_name: labelled_name.or_else(|| bold_file_name(&document)),
            file_size: labelled_size.or_else(|| first_size_cell(&document)),
            file_error: first_text(&document, &WARNING_SEL),
            anonymous_token: first_attr(&document, &TOKEN_SEL, "value"),
            download_link: first_attr(&document, &LINK_SEL, "href"),
        }
    }

    /// File name shown on the page.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// File size in bytes.
    #[must_use]
    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    /// Error or warning text the page reports.
    #[must_use]
    pub fn file_error(&self) -> Option<&str> {
        self.file_error.as_deref()
    }

    /// Token that must be posted back to unlock the direct link.
    #[must_use]
    pub fn anonymous_token(&self) -> Option<&str> {
        self.anonymous_token.as_deref()
    }

    /// Direct download link, when already present.
    #[must_use]
    pub fn download_link(&self) -> Option<&str> {
        self.download_link.as_deref()
    }

    /// Returns the cooldown when the page's warning is a "wait" notice.
    #[must_use]
    pub fn cooldown(&self) -> Option<Cooldown> {
        let message = self.file_error.as_deref()?;
        let wait = COOLDOWN_MINUTES_RE
            .captures(message)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .map(|minutes| Duration::from_secs(minutes * 60));

        (wait.is_some() || COOLDOWN_MARKER_RE.is_match(message)).then(|| Cooldown {
            message: message.to_string(),
            wait,
        })
    }
}

/// Parses a human-readable size ("1 MB", "700 Ko", "1,5 Go", "1048576").
///
/// Units are binary multiples; French octet units are accepted.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn parse_size(raw: &str) -> Option<u64> {
    let caps = SIZE_RE.captures(raw)?;
    let value: f64 = caps.get(1)?.as_str().replace(',', ".").parse().ok()?;
    let unit = caps
        .get(2)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default();

    let exponent = match unit.chars().next() {
        None | Some('b' | 'o') => 0,
        Some('k') => 1,
        Some('m') => 2,
        Some('g') => 3,
        Some('t') => 4,
        Some(_) => return None,
    };

    Some((value * 1024_f64.powi(exponent)).round() as u64)
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(|element| element_text(&element))
        .find(|text| !text.is_empty())
}

fn first_attr(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document
        .select(selector)
        .filter_map(|element| element.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn labelled_rows(document: &Html) -> (Option<String>, Option<u64>) {
    let mut name = None;
    let mut size = None;

    for row in document.select(&ROW_SEL) {
        let cells: Vec<String> = row.select(&CELL_SEL).map(|c| element_text(&c)).collect();
        let [label, value, ..] = cells.as_slice() else {
            continue;
        };
        let label = label.trim_end_matches(':').trim().to_lowercase();

        if name.is_none() && (label.starts_with("file name") || label.starts_with("nom du fichier"))
        {
            name = Some(value.clone()).filter(|v| !v.is_empty());
        } else if size.is_none() && (label.starts_with("size") || label.starts_with("taille")) {
            size = parse_size(value);
        }
    }

    (name, size)
}

fn bold_file_name(document: &Html) -> Option<String> {
    first_text(document, &BOLD_NAME_SEL)
}

// Unlabelled cells also hold counters and ids, so only "<number> <unit>" counts.
fn first_size_cell(document: &Html) -> Option<u64> {
    document
        .select(&ROW_SEL)
        .flat_map(|row| row.select(&CELL_SEL).collect::<Vec<_>>())
        .find_map(|cell| parse_size_with_unit(&element_text(&cell)))
}

fn parse_size_with_unit(raw: &str) -> Option<u64> {
    SIZE_RE
        .captures(raw)?
        .get(2)
        .and_then(|_| parse_size(raw))
}
