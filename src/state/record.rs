//! Listing record types and the non-regressing merge rule
use crate::url::ListingId;
use serde::Serialize;

/// Every optional field a listing can carry
///
/// Produced by the extractor (list-page cards and detail pages) and folded
/// into the stored record with [`ListingFields::absorb`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedroom_count: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathroom_count: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Absolute image URLs, deduplicated, first-seen order, capped
    pub images: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Feature bullet points, capped
    pub features: Vec<String>,
}

impl ListingFields {
    /// Folds `incoming` into `self`
    ///
    /// A present, non-empty incoming value replaces the current one; an
    /// absent or empty one never clears it. Sequences are replaced whole.
    pub fn absorb(&mut self, incoming: ListingFields) {
        absorb_text(&mut self.price, incoming.price);
        absorb_value(&mut self.bedroom_count, incoming.bedroom_count);
        absorb_value(&mut self.bathroom_count, incoming.bathroom_count);
        absorb_text(&mut self.address, incoming.address);
        absorb_list(&mut self.images, incoming.images);
        absorb_text(&mut self.description, incoming.description);
        absorb_list(&mut self.features, incoming.features);
    }

    /// Folds detail-page fields into `self`
    ///
    /// Detail pages are the richer source for images, description and
    /// features, so those follow [`ListingFields::absorb`]. Price, counts
    /// and address found on a detail page only fill slots the list page
    /// left empty.
    pub fn enrich(&mut self, detail: ListingFields) {
        fill_text(&mut self.price, detail.price);
        fill_value(&mut self.bedroom_count, detail.bedroom_count);
        fill_value(&mut self.bathroom_count, detail.bathroom_count);
        fill_text(&mut self.address, detail.address);
        absorb_list(&mut self.images, detail.images);
        absorb_text(&mut self.description, detail.description);
        absorb_list(&mut self.features, detail.features);
    }

    /// Returns true if no field carries a value
    pub fn is_empty(&self) -> bool {
        self.price.is_none()
            && self.bedroom_count.is_none()
            && self.bathroom_count.is_none()
            && self.address.is_none()
            && self.images.is_empty()
            && self.description.is_none()
            && self.features.is_empty()
    }
}

fn absorb_text(slot: &mut Option<String>, incoming: Option<String>) {
    if let Some(value) = incoming.filter(|v| !v.trim().is_empty()) {
        *slot = Some(value);
    }
}

fn absorb_value<T>(slot: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *slot = incoming;
    }
}

fn fill_text(slot: &mut Option<String>, incoming: Option<String>) {
    if slot.is_none() {
        absorb_text(slot, incoming);
    }
}

fn fill_value<T>(slot: &mut Option<T>, incoming: Option<T>) {
    if slot.is_none() {
        *slot = incoming;
    }
}

fn absorb_list(slot: &mut Vec<String>, incoming: Vec<String>) {
    if !incoming.is_empty() {
        *slot = incoming;
    }
}

/// A listing sighting: its identifier plus whatever fields were visible
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFragment {
    pub id: ListingId,
    pub fields: ListingFields,
}

impl ListingFragment {
    /// Creates a fragment carrying only the identifier
    pub fn bare(id: ListingId) -> Self {
        Self {
            id,
            fields: ListingFields::default(),
        }
    }
}

impl From<ListingRecord> for ListingFragment {
    fn from(record: ListingRecord) -> Self {
        Self {
            id: record.id,
            fields: record.fields,
        }
    }
}

/// The canonical record for one listing, owned by the identity store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRecord {
    #[serde(rename = "url")]
    pub id: ListingId,

    #[serde(flatten)]
    pub fields: ListingFields,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> ListingFields {
        ListingFields {
            price: Some("$189,900".to_string()),
            bedroom_count: Some(2),
            bathroom_count: Some(1),
            address: Some("12 Lakeview Dr".to_string()),
            images: vec!["https://img.site.test/1.jpg".to_string()],
            description: Some("Bright cottage".to_string()),
            features: vec!["Deck".to_string()],
        }
    }

    #[test]
    fn test_absorb_empty_never_regresses() {
        let mut fields = populated();
        fields.absorb(ListingFields::default());
        assert_eq!(fields, populated());
    }

    #[test]
    fn test_absorb_blank_text_ignored() {
        let mut fields = populated();
        fields.absorb(ListingFields {
            description: Some("   ".to_string()),
            ..Default::default()
        });
        assert_eq!(fields.description.as_deref(), Some("Bright cottage"));
    }

    #[test]
    fn test_absorb_replaces_with_non_empty() {
        let mut fields = populated();
        fields.absorb(ListingFields {
            price: Some("$179,900".to_string()),
            images: vec![
                "https://img.site.test/a.jpg".to_string(),
                "https://img.site.test/b.jpg".to_string(),
            ],
            ..Default::default()
        });
        assert_eq!(fields.price.as_deref(), Some("$179,900"));
        assert_eq!(fields.images.len(), 2);
        assert_eq!(fields.bedroom_count, Some(2));
    }

    #[test]
    fn test_enrich_keeps_list_page_scalars() {
        let mut fields = populated();
        fields.enrich(ListingFields {
            price: Some("$4,500".to_string()),
            bedroom_count: Some(1),
            description: Some("Lakeside site with dock".to_string()),
            features: vec!["Dock".to_string(), "Fire pit".to_string()],
            ..Default::default()
        });

        assert_eq!(fields.price, populated().price);
        assert_eq!(fields.bedroom_count, Some(2));
        assert_eq!(fields.description.as_deref(), Some("Lakeside site with dock"));
        assert_eq!(fields.features.len(), 2);
    }

    #[test]
    fn test_enrich_fills_missing_scalars() {
        let mut fields = ListingFields::default();
        fields.enrich(ListingFields {
            price: Some("$89,000".to_string()),
            bathroom_count: Some(1),
            address: Some("   ".to_string()),
            ..Default::default()
        });

        assert_eq!(fields.price.as_deref(), Some("$89,000"));
        assert_eq!(fields.bathroom_count, Some(1));
        assert_eq!(fields.address, None);
    }

    #[test]
    fn test_is_empty() {
        assert!(ListingFields::default().is_empty());
        assert!(!populated().is_empty());
    }

    #[test]
    fn test_record_json_shape() {
        let record = ListingRecord {
            id: ListingId::parse("https://site.test/listing/1").unwrap(),
            fields: ListingFields {
                bedroom_count: Some(3),
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["url"], "https://site.test/listing/1");
        assert_eq!(json["bedroomCount"], 3);
        assert!(json.get("price").is_none());
        assert_eq!(json["images"], serde_json::json!([]));
    }
}
