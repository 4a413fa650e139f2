use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use super::company::{CompanyRecord, KeyPerson, NewsItem};

const UNKNOWN_ENTITY: char = '\u{FFFD}';

static RE_UNICODE_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\u([0-9a-fA-F]{4})").unwrap());

static RE_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9a-fA-F]+);").unwrap());

static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Structure-preserving text cleanup applied to every string leaf.
pub trait Sanitize {
    fn sanitize(self) -> Self;
}

impl Sanitize for String {
    fn sanitize(self) -> Self {
        sanitize_str(&self)
    }
}

impl<T: Sanitize> Sanitize for Option<T> {
    fn sanitize(self) -> Self {
        self.map(Sanitize::sanitize)
    }
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn sanitize(self) -> Self {
        self.into_iter().map(Sanitize::sanitize).collect()
    }
}

impl Sanitize for Value {
    fn sanitize(self) -> Self {
        match self {
            Value::String(s) => Value::String(sanitize_str(&s)),
            Value::Array(values) => Value::Array(values.sanitize()),
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, value.sanitize()))
                    .collect(),
            ),
            other => other,
        }
    }
}

impl Sanitize for KeyPerson {
    fn sanitize(self) -> Self {
        match self {
            KeyPerson::Structured { name, title } => KeyPerson::Structured {
                name: name.sanitize(),
                title: title.sanitize(),
            },
            KeyPerson::Flat(s) => KeyPerson::Flat(s.sanitize()),
        }
    }
}

impl Sanitize for NewsItem {
    fn sanitize(self) -> Self {
        NewsItem {
            date: self.date.sanitize(),
            source: self.source.sanitize(),
            title: self.title.sanitize(),
            url: self.url.sanitize(),
            link: self.link.sanitize(),
        }
    }
}

impl Sanitize for CompanyRecord {
    fn sanitize(self) -> Self {
        CompanyRecord {
            name: self.name.sanitize(),
            description: self.description.sanitize(),
            company_overview: self.company_overview.sanitize(),
            website: self.website.sanitize(),
            location: self.location.sanitize(),
            founded_year: self.founded_year,
            employee_count: self.employee_count.sanitize(),
            total_funding: self.total_funding.sanitize(),
            last_funding_type: self.last_funding_type.sanitize(),
            last_funding_date: self.last_funding_date.sanitize(),
            investors: self.investors.sanitize(),
            key_people: self.key_people.sanitize(),
            tech_stack: self.tech_stack.sanitize(),
            industry_categories: self.industry_categories.sanitize(),
            news: self.news.sanitize(),
            news_summary: self.news_summary.sanitize(),
            extra: self
                .extra
                .into_iter()
                .map(|(key, value)| (key, value.sanitize()))
                .collect(),
        }
    }
}

/// Runs the cleanup pass until the text stops changing, so that
/// `sanitize_str(&sanitize_str(s)) == sanitize_str(s)`. Passes never grow
/// the text, and once whitespace is collapsed any change shortens it.
pub fn sanitize_str(raw: &str) -> String {
    let mut current = clean_once(raw);

    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_once(raw: &str) -> String {
    let text = raw.replace("\\n", "\n").replace("\\r", "\r");
    let text = decode_unicode_escapes(&text).unwrap_or(text);
    let text = decode_entities(&text);

    RE_WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Decodes `\uXXXX` escapes, pairing surrogates. Returns `None` when an
/// escape does not form a valid character.
fn decode_unicode_escapes(text: &str) -> Option<String> {
    if !RE_UNICODE_ESCAPE.is_match(text) {
        return None;
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut pending_high: Option<u16> = None;

    for caps in RE_UNICODE_ESCAPE.captures_iter(text) {
        let whole = caps.get(0)?;
        let unit = u16::from_str_radix(&caps[1], 16).ok()?;

        if let Some(high) = pending_high.take() {
            // A high surrogate must be immediately followed by its low half.
            if whole.start() != last || !(0xDC00..=0xDFFF).contains(&unit) {
                return None;
            }
            let decoded = char::decode_utf16([high, unit]).next()?.ok()?;
            out.push(decoded);
            last = whole.end();
            continue;
        }

        out.push_str(&text[last..whole.start()]);
        last = whole.end();

        match unit {
            0xD800..=0xDBFF => pending_high = Some(unit),
            0xDC00..=0xDFFF => return None,
            _ => out.push(char::from_u32(unit as u32)?),
        }
    }

    if pending_high.is_some() {
        return None;
    }

    out.push_str(&text[last..]);
    Some(out)
}

fn decode_entities(text: &str) -> String {
    RE_ENTITY
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[0];
            let decoded = html_escape::decode_html_entities(entity);
            if decoded == entity {
                UNKNOWN_ENTITY.to_string()
            } else {
                decoded.into_owned()
            }
        })
        .into_owned()
}
