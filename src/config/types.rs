use serde::{Deserialize, Serialize};

/// Main configuration structure for Sumi-Harvest
///
/// Every section except `[target]` may be omitted; omitted sections take the
/// built-in site profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub target: TargetConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub fields: FieldConfig,
}

impl Config {
    /// Builds a configuration for `base_url` with every other section defaulted
    pub fn for_url(base_url: impl Into<String>) -> Self {
        Self {
            target: TargetConfig {
                base_url: base_url.into(),
                pagination: PaginationMode::default(),
                page_parameter: default_page_parameter(),
            },
            crawl: CrawlConfig::default(),
            user_agent: UserAgentConfig::default(),
            output: OutputConfig::default(),
            selectors: SelectorConfig::default(),
            fields: FieldConfig::default(),
        }
    }
}

/// The listing site to harvest
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TargetConfig {
    /// First list page; pagination is derived from it
    pub base_url: String,

    /// Which pagination mechanism to drive
    #[serde(default)]
    pub pagination: PaginationMode,

    /// Query parameter carrying the page index (indexed-parameter strategy)
    #[serde(default = "default_page_parameter")]
    pub page_parameter: String,
}

fn default_page_parameter() -> String {
    "pageno".to_string()
}

/// Pagination mechanism selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaginationMode {
    /// `?pageno=N`
    #[default]
    IndexedParameter,
    /// A "next" control clicked until it disappears or is disabled
    NextControl,
    /// Numbered page controls clicked in turn
    IndexedControl,
    /// Probe the first page and pick one of the above
    Auto,
}

/// Crawl loop behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlConfig {
    /// Hard cap on list pages, regardless of what the pages look like
    pub max_pages: u32,

    /// Pages before a "no new listings" page is trusted as the end
    pub min_iterations_before_stale_check: u32,

    /// Timeout for every navigation or control activation (milliseconds)
    pub navigation_timeout_ms: u64,

    /// Timeout for listing markup to appear (milliseconds)
    pub selector_timeout_ms: u64,

    /// Pause after a page loads before extracting (milliseconds)
    pub settle_delay_ms: u64,

    /// Minimum time between two navigations (milliseconds)
    pub politeness_delay_ms: u64,

    /// Visit every listing's detail page after the list phase
    pub enrich_details: bool,

    /// Consecutive detail failures that end the detail phase (0 = never)
    pub max_consecutive_detail_failures: u32,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 25,
            min_iterations_before_stale_check: 3,
            navigation_timeout_ms: 30_000,
            selector_timeout_ms: 15_000,
            settle_delay_ms: 600,
            politeness_delay_ms: 1_000,
            enrich_details: true,
            max_consecutive_detail_failures: 5,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,

    /// Email address for crawler-related contact
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SumiHarvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/sumi-harvest".to_string(),
            contact_email: "crawler@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the user agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Path of the JSON document
    pub path: String,

    /// Full records or identifiers only
    pub mode: OutputMode,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "docs/listings.json".to_string(),
            mode: OutputMode::Full,
        }
    }
}

/// Shape of the `listings` array in the output document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// Full listing records (detail pass allowed)
    #[default]
    Full,
    /// Identifier strings only (no detail pass)
    UrlsOnly,
}

/// A selector plus the attribute holding a URL
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttributeSource {
    pub selector: String,
    pub attribute: String,
}

impl AttributeSource {
    fn new(selector: &str, attribute: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attribute: attribute.to_string(),
        }
    }
}

/// Page-structure selectors
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SelectorConfig {
    /// Any of these present means listing markup rendered
    pub listing_markers: Vec<String>,

    /// Where listing identifiers live, in priority order
    pub identity_sources: Vec<AttributeSource>,

    /// Listing card containers scoping coarse fields
    pub cards: Vec<String>,

    /// "Next page" control candidates
    pub next_control: Vec<String>,

    /// Numbered page controls
    pub page_controls: Vec<String>,

    /// Any of these present means a detail page rendered
    pub detail_markers: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing_markers: strings(&[".dh-property-list", ".storemapdata", "a.seeDetailsDL"]),
            identity_sources: vec![
                AttributeSource::new(".storemapdata", "data-url"),
                AttributeSource::new("a.seeDetailsDL", "href"),
            ],
            cards: strings(&[
                ".dh-property-list .property-item",
                ".dh-property-list li",
                "article.listing",
            ]),
            next_control: strings(&[
                "a[rel='next']",
                ".pagination .next a",
                ".pagination a.next",
                "button.next",
                "a[aria-label='Next']",
            ]),
            page_controls: strings(&[
                ".pagination a",
                ".pager a",
                "nav[aria-label='pagination'] a",
            ]),
            detail_markers: strings(&[
                ".property-details",
                ".dh-property-details",
                ".property-description",
                "h1",
            ]),
        }
    }
}

/// One extraction strategy in a field's fallback chain
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StrategyConfig {
    /// Value of `attribute` on the first element matching `selector`
    Attribute { selector: String, attribute: String },
    /// Text content of the first element matching `selector`
    Text { selector: String },
    /// First capture group (or whole match) of `pattern` over the scope's text
    Pattern { pattern: String },
}

impl StrategyConfig {
    fn attribute(selector: &str, attribute: &str) -> Self {
        Self::Attribute {
            selector: selector.to_string(),
            attribute: attribute.to_string(),
        }
    }

    fn text(selector: &str) -> Self {
        Self::Text {
            selector: selector.to_string(),
        }
    }

    fn pattern(pattern: &str) -> Self {
        Self::Pattern {
            pattern: pattern.to_string(),
        }
    }
}

/// Per-field fallback chains and collection limits
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FieldConfig {
    pub price: Vec<StrategyConfig>,
    pub bedrooms: Vec<StrategyConfig>,
    pub bathrooms: Vec<StrategyConfig>,
    pub address: Vec<StrategyConfig>,
    pub description: Vec<StrategyConfig>,

    /// Feature list item selectors; the first one matching anything wins
    pub features: Vec<String>,

    /// Image URL candidates; every source contributes
    pub images: Vec<AttributeSource>,

    /// Hosts images may come from (wildcards allowed); empty accepts all
    pub asset_hosts: Vec<String>,

    pub max_images: usize,
    pub max_features: usize,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            price: vec![
                StrategyConfig::attribute("[data-price]", "data-price"),
                StrategyConfig::text(".price"),
                StrategyConfig::text("[class*='price']"),
                StrategyConfig::pattern(r"(\$\s?[0-9][0-9,]*(?:\.[0-9]{2})?)"),
            ],
            bedrooms: vec![
                StrategyConfig::attribute("[data-bedrooms]", "data-bedrooms"),
                StrategyConfig::text(".beds"),
                StrategyConfig::text(".bedrooms"),
                StrategyConfig::pattern(r"(?i)([0-9]+)\s*(?:bed(?:room)?s?|bd|br)\b"),
            ],
            bathrooms: vec![
                StrategyConfig::attribute("[data-bathrooms]", "data-bathrooms"),
                StrategyConfig::text(".baths"),
                StrategyConfig::text(".bathrooms"),
                StrategyConfig::pattern(r"(?i)([0-9]+)(?:\.[0-9]+)?\s*(?:bath(?:room)?s?|ba)\b"),
            ],
            address: vec![
                StrategyConfig::attribute("[data-address]", "data-address"),
                StrategyConfig::text(".address"),
                StrategyConfig::text("address"),
                StrategyConfig::text(".site-number"),
            ],
            description: vec![
                StrategyConfig::text(".property-description"),
                StrategyConfig::text(".dh-property-description"),
                StrategyConfig::text("#description"),
                StrategyConfig::text(".description"),
                StrategyConfig::attribute("meta[name='description']", "content"),
                StrategyConfig::attribute("meta[property='og:description']", "content"),
            ],
            features: strings(&[
                ".property-features li",
                ".features li",
                ".amenities li",
                ".highlights li",
            ]),
            images: vec![
                AttributeSource::new("img", "src"),
                AttributeSource::new("img", "data-src"),
                AttributeSource::new("source", "srcset"),
                AttributeSource::new("meta[property='og:image']", "content"),
            ],
            asset_hosts: strings(&[
                "*.sunoutdoors.com",
                "*.cloudinary.com",
                "*.cloudfront.net",
                "*.imgix.net",
            ]),
            max_images: 20,
            max_features: 30,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
