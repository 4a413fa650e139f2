use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;
use serde_json::{Map, Value};

use crate::domain::{
    company::CompanyRecord,
    parse_outcome::{ModelPayload, Normalization, ParseOutcome},
    sanitize::Sanitize,
};

static RE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:[ \t]*(json|JSON|[A-Za-z0-9_+-]+[ \t]*\r?\n))?(.*?)(?:```|\z)").unwrap()
});

static RE_TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([\]}])").unwrap());

/// One step of the repair chain. Tiers run in order until one yields a
/// JSON object.
struct ParseTier {
    name: &'static str,
    outcome: ParseOutcome,
    parse: fn(&str) -> Option<Map<String, Value>>,
}

const TIERS: [ParseTier; 3] = [
    ParseTier {
        name: "strict",
        outcome: ParseOutcome::Valid,
        parse: parse_strict,
    },
    ParseTier {
        name: "trailing-comma repair",
        outcome: ParseOutcome::AutoFixed,
        parse: parse_repaired,
    },
    ParseTier {
        name: "json5",
        outcome: ParseOutcome::AutoFixed,
        parse: parse_lenient,
    },
];

/// Turn free-form model output into a company record. Output that no tier
/// accepts comes back untouched as [`ModelPayload::Raw`].
pub fn normalize(response: &str) -> Normalization {
    let body = strip_code_fence(response);

    for tier in TIERS.iter() {
        if let Some(object) = (tier.parse)(body) {
            log::debug!("Model response accepted by {} parser", tier.name);
            let record = CompanyRecord::from_object(object).sanitize();
            return Normalization {
                payload: ModelPayload::Record(Box::new(record)),
                outcome: tier.outcome,
            };
        }
    }

    log::warn!(
        "Model response is not valid JSON after cleaning ({} chars)",
        response.len()
    );
    Normalization {
        payload: ModelPayload::Raw(response.to_string()),
        outcome: ParseOutcome::Invalid,
    }
}

/// Inner content of the first fenced block, preferring one labelled JSON.
pub fn strip_code_fence(text: &str) -> &str {
    let mut first = None;

    for caps in RE_FENCE.captures_iter(text) {
        let Some(body) = caps.get(2) else {
            continue;
        };
        let is_json = caps
            .get(1)
            .is_some_and(|label| label.as_str().trim().eq_ignore_ascii_case("json"));

        if is_json {
            return body.as_str().trim();
        }
        first.get_or_insert(body.as_str().trim());
    }

    first.unwrap_or(text)
}

pub fn remove_trailing_commas(text: &str) -> Cow<'_, str> {
    RE_TRAILING_COMMA.replace_all(text, "$1")
}

fn parse_strict(text: &str) -> Option<Map<String, Value>> {
    serde_json::from_str(text).ok().and_then(into_object)
}

fn parse_repaired(text: &str) -> Option<Map<String, Value>> {
    let repaired = remove_trailing_commas(text);
    if let Cow::Borrowed(_) = repaired {
        return None;
    }
    serde_json::from_str(&repaired).ok().and_then(into_object)
}

fn parse_lenient(text: &str) -> Option<Map<String, Value>> {
    json5::from_str(&remove_trailing_commas(text))
        .ok()
        .and_then(into_object)
}

/// Only an object can become a record.
fn into_object(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(object) => Some(object),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::domain::parse_outcome::ParseOutcome;

    use super::{normalize, remove_trailing_commas, strip_code_fence};

    #[test]
    fn strict_json_is_valid() {
        let result = normalize(r#"{"name": "Airbnb", "founded_year": 2008}"#);

        assert_eq!(result.outcome, ParseOutcome::Valid);
        let record = result.record().unwrap();
        assert_eq!(record.name.as_deref(), Some("Airbnb"));
        assert_eq!(record.founded_year, Some(2008));
    }

    #[test]
    fn any_strict_object_is_valid() {
        let responses = [
            r#"{"name":"Airbnb","location":{"city":"San Francisco","country":"US"}}"#,
            r#"{"last_funding_date": 2021}"#,
            r#"{"key_people":[{"name":"Brian","title":["CEO","Founder"]}]}"#,
            r#"{"news":[{"title":"x","url":"u","date":20240101}]}"#,
        ];

        for response in responses {
            let result = normalize(response);
            assert_eq!(result.outcome, ParseOutcome::Valid, "response: {}", response);
            assert!(result.record().is_some());
        }

        let record = normalize(responses[1]).record().cloned().unwrap();
        assert_eq!(record.last_funding_date.as_deref(), Some("2021"));
    }

    #[test]
    fn trailing_comma_is_auto_fixed_to_same_record() {
        let strict = normalize(r#"{"name": "Airbnb", "investors": ["Sequoia"]}"#);
        let sloppy = normalize(r#"{"name": "Airbnb", "investors": ["Sequoia"],}"#);

        assert_eq!(strict.outcome, ParseOutcome::Valid);
        assert_eq!(sloppy.outcome, ParseOutcome::AutoFixed);
        assert_eq!(strict.record(), sloppy.record());
    }

    #[test]
    fn unquoted_keys_need_json5() {
        let result = normalize("{name: 'Airbnb', // comment\n tech_stack: ['Rust']}");

        assert_eq!(result.outcome, ParseOutcome::AutoFixed);
        let record = result.record().unwrap();
        assert_eq!(record.name.as_deref(), Some("Airbnb"));
        assert_eq!(record.tech_stack, vec!["Rust"]);
    }

    #[test]
    fn gibberish_is_returned_verbatim() {
        let response = "Sorry, I could not find that company.";
        let result = normalize(response);

        assert_eq!(result.outcome, ParseOutcome::Invalid);
        assert_eq!(result.raw(), Some(response));
        assert!(result.record().is_none());
    }

    #[test]
    fn non_object_json_is_invalid() {
        let result = normalize("[1, 2, 3]");

        assert_eq!(result.outcome, ParseOutcome::Invalid);
        assert_eq!(result.raw(), Some("[1, 2, 3]"));
    }

    #[test]
    fn fenced_json_ignores_commentary() {
        let response = "Here is the data you asked for:\n```json\n{\"a\":1}\n```\nLet me know!";
        let result = normalize(response);

        assert_eq!(result.outcome, ParseOutcome::Valid);
        let record = result.record().unwrap();
        assert_eq!(record.extra.get("a"), Some(&json!(1)));
        assert_eq!(serde_json::to_value(record).unwrap()["a"], json!(1));
    }

    #[test]
    fn fence_variants() {
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```javascript\n{a:1}\n```"), "{a:1}");
        assert_eq!(strip_code_fence("```json {\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\nnotes\n```\n```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```json\n{\"open\": true"), "{\"open\": true");
        assert_eq!(strip_code_fence("{\"plain\": 1}"), "{\"plain\": 1}");
    }

    #[test]
    fn trailing_commas_before_closers() {
        assert_eq!(remove_trailing_commas("[1, 2,\n]"), "[1, 2]");
        assert_eq!(remove_trailing_commas("{\"a\": [1,], }"), "{\"a\": [1]}");
        assert_eq!(remove_trailing_commas("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn record_strings_are_sanitized() {
        let result = normalize(r#"{"description": "Stays &amp; experiences\n\n worldwide"}"#);

        assert_eq!(
            result.record().unwrap().description.as_deref(),
            Some("Stays & experiences worldwide")
        );
    }
}
