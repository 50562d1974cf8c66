//! ESG score extraction from the Yahoo sustainability page.
//!
//! The page inlines its application state as a JavaScript object assigned to
//! `root.App.main`. The total ESG risk score lives at
//! `context.dispatcher.stores.QuoteSummaryStore.esgScores.totalEsg.raw`.
//! Everything that depends on that undocumented layout is kept in this module.

use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

/// Substring identifying the script block that carries the state payload
pub const ESG_MARKER: &str = "root.App.main";

/// Keys leading from the payload root to the ESG scores object
const ESG_SCORES_PATH: [&str; 5] = [
    "context",
    "dispatcher",
    "stores",
    "QuoteSummaryStore",
    "esgScores",
];

static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid script selector"));

#[derive(Debug, Error)]
pub enum EsgExtractError {
    #[error("no script block contains the root.App.main payload")]
    NoMarkerBlock,

    #[error("root.App.main payload has no balanced object")]
    UnbalancedPayload,

    #[error("payload is not valid JSON: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("payload has no `{0}` entry")]
    MissingPath(&'static str),

    #[error("`totalEsg.raw` is not a number")]
    NonNumericScore,
}

impl EsgExtractError {
    /// The page simply has no ESG data, as opposed to a page we could not read.
    pub fn is_missing_data(&self) -> bool {
        matches!(
            self,
            EsgExtractError::NoMarkerBlock | EsgExtractError::MissingPath(_)
        )
    }
}

/// Extract the total ESG risk score from a sustainability page.
///
/// Script blocks containing the marker are tried in document order; a block
/// whose payload lacks the key path is skipped in favour of the next one.
pub fn extract_esg_score(html: &str) -> Result<f64, EsgExtractError> {
    let document = Html::parse_document(html);
    let mut last_missing = EsgExtractError::NoMarkerBlock;

    for script in document.select(&SCRIPT_SELECTOR) {
        let text: String = script.text().collect();
        let Some(marker_at) = text.find(ESG_MARKER) else {
            continue;
        };

        let payload = balanced_object(&text[marker_at + ESG_MARKER.len()..])
            .ok_or(EsgExtractError::UnbalancedPayload)?;
        let state: Value = serde_json::from_str(payload)?;

        match total_esg(&state) {
            Ok(score) => return Ok(score),
            Err(e) if e.is_missing_data() => last_missing = e,
            Err(e) => return Err(e),
        }
    }

    Err(last_missing)
}

/// Walk the state payload down to `esgScores.totalEsg.raw`.
fn total_esg(state: &Value) -> Result<f64, EsgExtractError> {
    let esg_scores = ESG_SCORES_PATH.iter().try_fold(state, |node, key| {
        node.get(*key).ok_or(EsgExtractError::MissingPath(*key))
    })?;

    let raw = esg_scores
        .get("totalEsg")
        .ok_or(EsgExtractError::MissingPath("totalEsg"))?
        .get("raw")
        .ok_or(EsgExtractError::MissingPath("raw"))?;

    match raw {
        Value::Number(number) => number.as_f64().ok_or(EsgExtractError::NonNumericScore),
        Value::String(text) => text
            .trim()
            .parse()
            .map_err(|_| EsgExtractError::NonNumericScore),
        Value::Null => Err(EsgExtractError::MissingPath("raw")),
        _ => Err(EsgExtractError::NonNumericScore),
    }
}

/// Return the first `{...}` object in `text`, matched by brace depth.
///
/// Braces inside JSON string literals (including escaped quotes) do not count,
/// so trailing script code after the object is never swallowed.
pub(crate) fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}
