use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Structured company data, either scraped from the profile DOM or returned
/// by the model-assisted extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default, alias = "overview", deserialize_with = "lenient_text")]
    pub company_overview: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_year")]
    pub founded_year: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub employee_count: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub total_funding: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub last_funding_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub last_funding_date: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub investors: Vec<String>,
    #[serde(default, deserialize_with = "people_list")]
    pub key_people: Vec<KeyPerson>,
    #[serde(default, deserialize_with = "string_list")]
    pub tech_stack: Vec<String>,
    #[serde(default, alias = "industry", deserialize_with = "string_list")]
    pub industry_categories: Vec<String>,
    #[serde(default, deserialize_with = "news_list")]
    pub news: Vec<NewsItem>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_text"
    )]
    pub news_summary: Option<String>,
    /// Keys the model returned that have no dedicated field.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Field names that also map onto a dedicated field.
const ALIASES: [(&str, &str); 2] = [
    ("overview", "company_overview"),
    ("industry", "industry_categories"),
];

impl CompanyRecord {
    /// Maps any JSON object onto a record. Values that don't fit a typed
    /// field are coerced to text, and keys without a field land in `extra`.
    pub fn from_object(mut object: Map<String, Value>) -> Self {
        // An alias next to its canonical key would be a duplicate field.
        let mut shadowed = Map::new();
        for (alias, canonical) in ALIASES {
            if object.contains_key(canonical) {
                if let Some(value) = object.remove(alias) {
                    shadowed.insert(alias.to_string(), value);
                }
            }
        }

        let mut record = match serde_json::from_value::<CompanyRecord>(Value::Object(object.clone()))
        {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Keeping model output as untyped fields: {}", e);
                CompanyRecord {
                    extra: object,
                    ..Default::default()
                }
            }
        };
        record.extra.extend(shadowed);

        record
    }
}

/// A key person comes back either as a `{name, title}` object or as an
/// already flattened `"Name (Title)"` string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPerson {
    Structured {
        #[serde(default, deserialize_with = "lenient_text")]
        name: Option<String>,
        #[serde(default, deserialize_with = "lenient_text")]
        title: Option<String>,
    },
    Flat(String),
}

impl KeyPerson {
    pub fn display(&self) -> String {
        match self {
            KeyPerson::Structured { name, title } => format!(
                "{} ({})",
                name.as_deref().unwrap_or_default(),
                title.as_deref().unwrap_or_default()
            ),
            KeyPerson::Flat(s) => s.clone(),
        }
    }
}

impl From<Value> for KeyPerson {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(mut person) => KeyPerson::Structured {
                name: person.remove("name").and_then(value_text),
                title: person.remove("title").and_then(value_text),
            },
            other => KeyPerson::Flat(value_text(other).unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub source: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_text")]
    pub link: Option<String>,
}

impl NewsItem {
    /// The article location, `url` first and `link` as the fallback.
    pub fn article_url(&self) -> Option<&str> {
        [self.url.as_deref(), self.link.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|u| !u.is_empty())
    }
}

impl From<Value> for NewsItem {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(mut item) => {
                let mut field = |key: &str| item.remove(key).and_then(value_text);
                NewsItem {
                    date: field("date"),
                    source: field("source"),
                    title: field("title").unwrap_or_default(),
                    url: field("url"),
                    link: field("link"),
                }
            }
            other => NewsItem {
                title: value_text(other).unwrap_or_default(),
                ..Default::default()
            },
        }
    }
}

/// Text form of an arbitrary JSON value; lists are comma-joined.
fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Array(values) => {
            let parts: Vec<String> = values.into_iter().filter_map(value_text).collect();
            Some(parts.join(", "))
        }
        other => Some(other.to_string()),
    }
}

/// Entries of a list-valued field; a lone non-null value counts as one entry.
fn entries(value: Value) -> Vec<Value> {
    match value {
        Value::Null => vec![],
        Value::Array(values) => values.into_iter().filter(|v| !v.is_null()).collect(),
        other => vec![other],
    }
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = match Value::deserialize(deserializer)? {
        Value::String(s) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        Value::Object(_) => vec![],
        other => entries(other).into_iter().filter_map(value_text).collect(),
    };

    Ok(list)
}

fn people_list<'de, D>(deserializer: D) -> Result<Vec<KeyPerson>, D::Error>
where
    D: Deserializer<'de>,
{
    let people = entries(Value::deserialize(deserializer)?)
        .into_iter()
        .map(KeyPerson::from)
        .collect();

    Ok(people)
}

fn news_list<'de, D>(deserializer: D) -> Result<Vec<NewsItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let news = entries(Value::deserialize(deserializer)?)
        .into_iter()
        .map(NewsItem::from)
        .collect();

    Ok(news)
}

fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let year = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };

    Ok(year)
}

/// Models report counts, amounts and dates as either numbers or strings.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(Value::deserialize(deserializer)?))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CompanyRecord, KeyPerson, NewsItem};

    fn object(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn any_object_maps_onto_a_record() {
        let record = CompanyRecord::from_object(object(json!({
            "name": "Airbnb",
            "location": {"city": "San Francisco", "country": "US"},
            "last_funding_date": 2021,
            "key_people": [{"name": "Brian", "title": ["CEO", "Founder"]}, 42],
            "news": [{"title": "x", "url": "u", "date": 20240101}]
        })));

        assert_eq!(record.name.as_deref(), Some("Airbnb"));
        assert_eq!(
            record.location.as_deref(),
            Some(r#"{"city":"San Francisco","country":"US"}"#)
        );
        assert_eq!(record.last_funding_date.as_deref(), Some("2021"));
        assert_eq!(
            record.key_people,
            vec![
                KeyPerson::Structured {
                    name: Some("Brian".to_string()),
                    title: Some("CEO, Founder".to_string()),
                },
                KeyPerson::Flat("42".to_string()),
            ]
        );
        assert_eq!(record.news[0].date.as_deref(), Some("20240101"));
        assert_eq!(record.news[0].url.as_deref(), Some("u"));
    }

    #[test]
    fn alias_beside_canonical_key_is_kept_as_extra() {
        let record = CompanyRecord::from_object(object(json!({
            "company_overview": "Long form",
            "overview": "Short form",
            "industry": "Travel"
        })));

        assert_eq!(record.company_overview.as_deref(), Some("Long form"));
        assert_eq!(record.extra.get("overview"), Some(&json!("Short form")));
        assert_eq!(record.industry_categories, vec!["Travel"]);
    }

    #[test]
    fn key_people_accepts_both_shapes() {
        let record: CompanyRecord = serde_json::from_value(json!({
            "key_people": [
                {"name": "Brian Chesky", "title": "CEO"},
                "Nathan Blecharczyk (CTO)"
            ]
        }))
        .unwrap();

        let people: Vec<String> = record.key_people.iter().map(KeyPerson::display).collect();
        assert_eq!(people, vec!["Brian Chesky (CEO)", "Nathan Blecharczyk (CTO)"]);
    }

    #[test]
    fn model_aliases_and_loose_types() {
        let record: CompanyRecord = serde_json::from_value(json!({
            "name": "Airbnb",
            "overview": "Travel marketplace",
            "industry": "Travel, Hospitality",
            "founded_year": "2008",
            "employee_count": 5000,
            "investors": null,
            "ceo": "Brian Chesky"
        }))
        .unwrap();

        assert_eq!(record.company_overview.as_deref(), Some("Travel marketplace"));
        assert_eq!(record.industry_categories, vec!["Travel", "Hospitality"]);
        assert_eq!(record.founded_year, Some(2008));
        assert_eq!(record.employee_count.as_deref(), Some("5000"));
        assert!(record.investors.is_empty());
        assert_eq!(record.extra.get("ceo"), Some(&json!("Brian Chesky")));
    }

    #[test]
    fn unparsable_year_is_null() {
        let record: CompanyRecord =
            serde_json::from_value(json!({"founded_year": "unknown"})).unwrap();

        assert_eq!(record.founded_year, None);
    }

    #[test]
    fn article_url_prefers_url_then_link() {
        let item = NewsItem {
            url: Some(" ".to_string()),
            link: Some("https://example.com/a".to_string()),
            ..Default::default()
        };
        assert_eq!(item.article_url(), Some("https://example.com/a"));

        let item = NewsItem {
            url: Some("https://example.com/b".to_string()),
            link: Some("https://example.com/a".to_string()),
            ..Default::default()
        };
        assert_eq!(item.article_url(), Some("https://example.com/b"));

        assert_eq!(NewsItem::default().article_url(), None);
    }

    #[test]
    fn summary_omitted_until_set() {
        let value = serde_json::to_value(CompanyRecord::default()).unwrap();

        assert!(value.get("news_summary").is_none());
        assert_eq!(value.get("news"), Some(&json!([])));
        assert_eq!(value.get("description"), Some(&json!(null)));
    }
}
