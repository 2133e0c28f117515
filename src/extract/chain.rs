//! Prioritized fallback chains
//!
//! A field is described by an ordered list of strategies. Each strategy is a
//! pure lookup against a scope element; the chain returns the first value a
//! strategy produces (and, for typed fields, that parses).

use crate::config::{compile_pattern, compile_selector, StrategyConfig};
use crate::extract::text::element_text;
use crate::ConfigError;
use regex::Regex;
use scraper::{ElementRef, Selector};

/// One compiled extraction strategy
#[derive(Debug, Clone)]
pub enum Strategy {
    /// Attribute of the first matching element carrying a non-empty value
    Attribute { selector: Selector, attribute: String },
    /// Text of the first matching element with non-empty text
    Text { selector: Selector },
    /// Regular expression over the scope's collapsed text
    Pattern { regex: Regex },
}

impl Strategy {
    /// Compiles a configured strategy
    pub fn compile(config: &StrategyConfig) -> Result<Self, ConfigError> {
        Ok(match config {
            StrategyConfig::Attribute {
                selector,
                attribute,
            } => Self::Attribute {
                selector: compile_selector(selector)?,
                attribute: attribute.clone(),
            },
            StrategyConfig::Text { selector } => Self::Text {
                selector: compile_selector(selector)?,
            },
            StrategyConfig::Pattern { pattern } => Self::Pattern {
                regex: compile_pattern(pattern)?,
            },
        })
    }

    /// Applies the strategy to a scope element
    pub fn apply(&self, scope: ElementRef<'_>) -> Option<String> {
        match self {
            Self::Attribute {
                selector,
                attribute,
            } => within(scope, selector)
                .filter_map(|element| element.value().attr(attribute))
                .map(|value| value.split_whitespace().collect::<Vec<_>>().join(" "))
                .find(|value| !value.is_empty()),

            Self::Text { selector } => within(scope, selector)
                .map(element_text)
                .find(|text| !text.is_empty()),

            Self::Pattern { regex } => {
                let text = element_text(scope);
                let caps = regex.captures(&text)?;
                caps.get(1)
                    .or_else(|| caps.get(0))
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|value| !value.is_empty())
            }
        }
    }
}

/// Iterates the scope itself (if it matches) followed by matching descendants
/// in document order
pub fn within<'a>(
    scope: ElementRef<'a>,
    selector: &'a Selector,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    std::iter::once(scope)
        .filter(move |element| selector.matches(element))
        .chain(scope.select(selector))
}

/// An ordered fallback chain for one field
#[derive(Debug, Clone)]
pub struct FieldChain {
    field: &'static str,
    strategies: Vec<Strategy>,
}

impl FieldChain {
    /// Compiles the configured strategies for `field`
    pub fn compile(field: &'static str, configs: &[StrategyConfig]) -> Result<Self, ConfigError> {
        let strategies = configs
            .iter()
            .map(Strategy::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { field, strategies })
    }

    /// Returns the first non-empty value any strategy produces
    pub fn resolve(&self, scope: ElementRef<'_>) -> Option<String> {
        self.resolve_with(scope, Some)
    }

    /// Returns the first value that a strategy produces and `parse` accepts
    ///
    /// A strategy whose value fails to parse does not end the chain; the next
    /// strategy is tried.
    pub fn resolve_with<T>(
        &self,
        scope: ElementRef<'_>,
        parse: impl Fn(String) -> Option<T>,
    ) -> Option<T> {
        self.strategies
            .iter()
            .enumerate()
            .find_map(|(position, strategy)| {
                let raw = strategy.apply(scope)?;
                let parsed = parse(raw);
                if parsed.is_none() {
                    tracing::trace!(field = self.field, position, "strategy value rejected");
                }
                parsed
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn text(selector: &str) -> StrategyConfig {
        StrategyConfig::Text {
            selector: selector.to_string(),
        }
    }

    fn attribute(selector: &str, attribute: &str) -> StrategyConfig {
        StrategyConfig::Attribute {
            selector: selector.to_string(),
            attribute: attribute.to_string(),
        }
    }

    fn pattern(pattern: &str) -> StrategyConfig {
        StrategyConfig::Pattern {
            pattern: pattern.to_string(),
        }
    }

    #[test]
    fn test_first_strategy_wins() {
        let html = Html::parse_document(
            r#"<div><p class="primary">Primary text</p><p class="secondary">Fallback text</p></div>"#,
        );
        let chain = FieldChain::compile("description", &[text(".primary"), text(".secondary")])
            .unwrap();
        assert_eq!(
            chain.resolve(html.root_element()).as_deref(),
            Some("Primary text")
        );
    }

    #[test]
    fn test_falls_through_empty_strategy() {
        let html = Html::parse_document(
            r#"<div><p class="primary">   </p><p class="secondary">Fallback text</p></div>"#,
        );
        let chain = FieldChain::compile("description", &[text(".primary"), text(".secondary")])
            .unwrap();
        assert_eq!(
            chain.resolve(html.root_element()).as_deref(),
            Some("Fallback text")
        );
    }

    #[test]
    fn test_all_strategies_empty_is_absent() {
        let html = Html::parse_document("<div><p>Nothing here</p></div>");
        let chain = FieldChain::compile("price", &[text(".price"), attribute("[data-price]", "data-price")])
            .unwrap();
        assert_eq!(chain.resolve(html.root_element()), None);
    }

    #[test]
    fn test_attribute_strategy_on_scope_itself() {
        let html = Html::parse_document(r#"<div class="card" data-price="$99,000"><a>x</a></div>"#);
        let selector = Selector::parse(".card").unwrap();
        let card = html.select(&selector).next().unwrap();

        let chain = FieldChain::compile("price", &[attribute("[data-price]", "data-price")]).unwrap();
        assert_eq!(chain.resolve(card).as_deref(), Some("$99,000"));
    }

    #[test]
    fn test_pattern_uses_first_capture_group() {
        let html = Html::parse_document("<div>Now only $149,900 firm</div>");
        let chain = FieldChain::compile("price", &[pattern(r"(\$[0-9,]+)")]).unwrap();
        assert_eq!(
            chain.resolve(html.root_element()).as_deref(),
            Some("$149,900")
        );
    }

    #[test]
    fn test_pattern_without_group_uses_whole_match() {
        let html = Html::parse_document("<div>Site 42B on the lake</div>");
        let chain = FieldChain::compile("address", &[pattern(r"Site [0-9]+[A-Z]?")]).unwrap();
        assert_eq!(
            chain.resolve(html.root_element()).as_deref(),
            Some("Site 42B")
        );
    }

    #[test]
    fn test_resolve_with_skips_unparseable() {
        let html = Html::parse_document(
            r#"<div><span class="beds">Ask us</span><span class="rooms">3</span></div>"#,
        );
        let chain = FieldChain::compile("bedrooms", &[text(".beds"), text(".rooms")]).unwrap();
        let count = chain.resolve_with(html.root_element(), |raw| raw.parse::<u32>().ok());
        assert_eq!(count, Some(3));
    }

    #[test]
    fn test_within_respects_document_order() {
        let html = Html::parse_document(
            r#"<ul><li class="f">one</li><li class="f">two</li></ul>"#,
        );
        let selector = Selector::parse(".f").unwrap();
        let items: Vec<String> = within(html.root_element(), &selector)
            .map(element_text)
            .collect();
        assert_eq!(items, vec!["one".to_string(), "two".to_string()]);
    }
}
