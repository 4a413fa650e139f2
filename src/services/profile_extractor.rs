use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::domain::{
    company::{CompanyRecord, NewsItem},
    sanitize::Sanitize,
};

const NEWS_SECTION_TITLE: &str = "Recent News";
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];
// "—" read back through the wrong code page, plus the real thing
const SOURCE_DASH_ARTIFACTS: [&str; 2] = ["‚Äî", "—"];

static RE_SHORT_DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""target_short_description"\s*:\s*"([^"]+)""#).unwrap());

static RE_DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""description"\s*:\s*"([^"]+)""#).unwrap());

static RE_CATEGORIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)"categories"\s*:\s*\[(.*?)\]"#).unwrap());

static RE_CATEGORY_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""value"\s*:\s*"([^"]+)""#).unwrap());

/// A place industry categories can be read from.
pub trait CategorySource {
    fn categories(&self) -> Vec<String>;
}

/// Categories listed in the page's serialized application state.
pub struct EmbeddedStateCategories<'a> {
    pub state: &'a str,
}

impl CategorySource for EmbeddedStateCategories<'_> {
    fn categories(&self) -> Vec<String> {
        let Some(array) = capture(&RE_CATEGORIES, self.state) else {
            return vec![];
        };

        RE_CATEGORY_VALUE
            .captures_iter(array)
            .map(|caps| caps[1].to_string())
            .collect()
    }
}

/// Categories rendered as chips in the visible profile.
pub struct ChipLabelCategories<'a> {
    pub document: &'a Html,
}

impl CategorySource for ChipLabelCategories<'_> {
    fn categories(&self) -> Vec<String> {
        let chip_selector = Selector::parse("div.chip-text").unwrap();

        self.document
            .select(&chip_selector)
            .map(element_text)
            .filter(|label| !label.is_empty())
            .collect()
    }
}

/// Scrape the overview fields and recent news from a company profile page.
/// Absent elements come back as `None` or empty lists.
pub fn extract_company_profile(html: &str) -> CompanyRecord {
    let document = Html::parse_document(html);
    let script_selector = Selector::parse(r#"script#ng-state[type="application/json"]"#).unwrap();

    let embedded_state: Option<String> = document
        .select(&script_selector)
        .next()
        .map(|script| script.text().collect::<String>())
        .filter(|state| !state.trim().is_empty());
    if embedded_state.is_none() {
        log::debug!("No embedded state found, matching against the whole page");
    }
    let state = embedded_state.as_deref().unwrap_or(html);

    let sources: [&dyn CategorySource; 2] = [
        &EmbeddedStateCategories { state },
        &ChipLabelCategories {
            document: &document,
        },
    ];
    let industry_categories = sources
        .iter()
        .map(|source| source.categories())
        .find(|categories| !categories.is_empty())
        .unwrap_or_default();

    let news = extract_news(&document);
    log::info!(
        "Extracted {} categories and {} news items",
        industry_categories.len(),
        news.len()
    );

    CompanyRecord {
        description: capture(&RE_SHORT_DESCRIPTION, state).map(str::to_string),
        company_overview: capture(&RE_DESCRIPTION, state).map(str::to_string),
        industry_categories,
        news,
        ..Default::default()
    }
    .sanitize()
}

/// Rows of the first "Recent News" card, keeping only rows with a title and
/// a link.
fn extract_news(document: &Html) -> Vec<NewsItem> {
    let title_selector = Selector::parse("section-card h2.section-title").unwrap();
    let row_selector = Selector::parse(".activity-row").unwrap();

    let section = document
        .select(&title_selector)
        .filter(|h2| h2.text().collect::<String>().contains(NEWS_SECTION_TITLE))
        .find_map(|h2| {
            h2.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "section-card")
        });

    let Some(section) = section else {
        return vec![];
    };

    section.select(&row_selector).filter_map(news_row).collect()
}

fn news_row(row: ElementRef) -> Option<NewsItem> {
    let date_selector = Selector::parse(".activity-title .field-type-date").unwrap();
    let link_selector = Selector::parse("a").unwrap();
    let source_selector = Selector::parse("press-reference span").unwrap();

    let link = row.select(&link_selector).next()?;
    let title = element_text(link);
    let url = link.attr("href").map(str::trim).filter(|href| !href.is_empty())?;
    if title.is_empty() {
        return None;
    }

    let date = row
        .select(&date_selector)
        .next()
        .and_then(|tag| tag.attr("title"))
        .map(str::trim)
        .filter(|date| !date.is_empty())
        .map(str::to_string);

    let source = row.select(&source_selector).next().map(|tag| {
        SOURCE_DASH_ARTIFACTS
            .iter()
            .fold(element_text(tag), |text, artifact| text.replace(artifact, ""))
            .trim()
            .to_string()
    });

    Some(NewsItem {
        date,
        source,
        title,
        url: Some(url.to_string()),
        link: None,
    })
}

/// Visible text of a page, one text node per line, cut to `limit`
/// characters. This is what the extraction prompt is built from.
pub fn page_text(html: &str, limit: usize) -> String {
    let document = Html::parse_document(html);

    let lines: Vec<&str> = document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent().and_then(ElementRef::wrap)?;
            if HIDDEN_ELEMENTS.contains(&parent.value().name()) {
                return None;
            }
            let text = text.trim();
            (!text.is_empty()).then_some(text)
        })
        .collect();

    lines.join("\n").chars().take(limit).collect()
}

fn element_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

fn capture<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::{extract_company_profile, page_text};

    const PROFILE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Airbnb - Crunchbase Company Profile</title>
<script id="ng-state" type="application/json">{"properties":{"identifier":{"value":"Airbnb"},"target_short_description":"Online marketplace for stays &amp; experiences","categories":[{"value":"Hospitality","permalink":"hospitality"},{"value":"Travel","permalink":"travel"}]},"cards":{"overview":{"description":"Airbnb is an online community\n\nmarketplace for   lodging."}}}</script>
</head>
<body>
<div class="chip-text">Should Not Appear</div>
<section-card>
  <h2 class="section-title">About</h2>
</section-card>
<section-card>
  <h2 class="section-title">Recent News &amp; Activity</h2>
  <div class="activity-row">
    <div class="activity-title"><span class="field-type-date" title=" Mar 12, 2024 ">Mar 12</span></div>
    <a href="https://news.example.com/airbnb-ipo">Airbnb   files for &amp; IPO</a>
    <press-reference><span>‚Äî TechCrunch</span></press-reference>
  </div>
  <div class="activity-row">
    <div class="activity-title"><span class="field-type-date" title="Feb 2, 2024">Feb 2</span></div>
    <a>Untitled link without target</a>
    <press-reference><span>Reuters</span></press-reference>
  </div>
  <div class="activity-row">
    <a href="https://news.example.com/second">Second story</a>
  </div>
</section-card>
<section-card>
  <h2 class="section-title">Recent News</h2>
  <div class="activity-row"><a href="https://news.example.com/ignored">Ignored</a></div>
</section-card>
</body>
</html>"#;

    #[test]
    fn reads_fields_from_embedded_state() {
        let record = extract_company_profile(PROFILE_PAGE);

        assert_eq!(
            record.description.as_deref(),
            Some("Online marketplace for stays & experiences")
        );
        assert_eq!(
            record.company_overview.as_deref(),
            Some("Airbnb is an online community marketplace for lodging.")
        );
        assert_eq!(record.industry_categories, vec!["Hospitality", "Travel"]);
        assert_eq!(record.name, None);
        assert_eq!(record.total_funding, None);
    }

    #[test]
    fn news_keeps_linked_rows_in_order() {
        let record = extract_company_profile(PROFILE_PAGE);
        let titles: Vec<&str> = record.news.iter().map(|n| n.title.as_str()).collect();

        assert_eq!(titles, vec!["Airbnb files for & IPO", "Second story"]);

        let first = &record.news[0];
        assert_eq!(first.date.as_deref(), Some("Mar 12, 2024"));
        assert_eq!(first.source.as_deref(), Some("TechCrunch"));
        assert_eq!(first.url.as_deref(), Some("https://news.example.com/airbnb-ipo"));

        let second = &record.news[1];
        assert_eq!(second.date, None);
        assert_eq!(second.source, None);
    }

    #[test]
    fn categories_fall_back_to_chips() {
        let html = r#"<html><body>
            <div class="chip-text"> Software </div>
            <div class="chip-text">Artificial Intelligence (AI)</div>
            <div class="chip-text">   </div>
            <div class="chip-text">SaaS</div>
        </body></html>"#;

        let record = extract_company_profile(html);

        assert_eq!(
            record.industry_categories,
            vec!["Software", "Artificial Intelligence (AI)", "SaaS"]
        );
        assert!(record.news.is_empty());
    }

    #[test]
    fn empty_categories_array_falls_back_to_chips() {
        let html = r#"<html><head><script id="ng-state" type="application/json">{"categories":[]}</script></head>
            <body><div class="chip-text">Fintech</div></body></html>"#;

        assert_eq!(extract_company_profile(html).industry_categories, vec!["Fintech"]);
    }

    #[test]
    fn without_state_script_the_page_is_searched() {
        let html = r#"<html><body><script>window.data = {"description":"Inline blob"};</script></body></html>"#;

        let record = extract_company_profile(html);

        assert_eq!(record.company_overview.as_deref(), Some("Inline blob"));
        assert_eq!(record.description, None);
    }

    #[test]
    fn empty_state_script_falls_back_to_page() {
        let html = r#"<html><head><script id="ng-state" type="application/json">  </script></head>
            <body><script>{"target_short_description":"Stays","description":"Homes"}</script></body></html>"#;

        let record = extract_company_profile(html);

        assert_eq!(record.description.as_deref(), Some("Stays"));
        assert_eq!(record.company_overview.as_deref(), Some("Homes"));
    }

    #[test]
    fn nested_markup_text_joins_without_separator() {
        let html = r#"<html><body>
            <div class="chip-text">E-<b>commerce</b></div>
            <section-card>
              <h2 class="section-title">Recent News</h2>
              <div class="activity-row"><a href="https://n.test/1">Air<b>bnb</b></a></div>
            </section-card>
        </body></html>"#;

        let record = extract_company_profile(html);

        assert_eq!(record.industry_categories, vec!["E-commerce"]);
        assert_eq!(record.news[0].title, "Airbnb");
    }

    #[test]
    fn malformed_document_yields_empty_record() {
        for html in ["", "<<<>>> not html at all", "<div><section-card><h2 class=\"section-title\">Recent News"] {
            let record = extract_company_profile(html);

            assert_eq!(record.description, None);
            assert_eq!(record.company_overview, None);
            assert!(record.industry_categories.is_empty());
            assert!(record.news.is_empty());
        }
    }

    #[test]
    fn page_text_skips_scripts_and_truncates() {
        let html = r#"<html><head><style>p { color: red }</style></head>
            <body><h1>Airbnb</h1><script>var x = 1;</script><p>Founded   2008</p><p>  </p></body></html>"#;

        assert_eq!(page_text(html, 8000), "Airbnb\nFounded   2008");
        assert_eq!(page_text(html, 6), "Airbnb");
    }
}
