use crate::state::record::{ListingFields, ListingFragment, ListingRecord};
use crate::url::ListingId;
use std::collections::HashMap;

/// Result of inserting a sighting into the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// True if the identifier had not been seen before
    pub is_new: bool,

    /// Number of unique identifiers after the upsert
    pub total: usize,
}

/// Deduplicating, insertion-ordered collection of listing records
///
/// The store is the only owner of listing records during a crawl. The
/// extractor and the detail enricher hand it fragments; it decides whether a
/// fragment is a new listing or another sighting of a known one.
#[derive(Debug, Default, Clone)]
pub struct IdentityStore {
    index: HashMap<ListingId, usize>,
    records: Vec<ListingRecord>,
}

impl IdentityStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new listing or folds the fragment into the known one
    ///
    /// Known listings keep their original position; their fields are only
    /// ever replaced by non-empty values.
    pub fn upsert(&mut self, fragment: ListingFragment) -> UpsertOutcome {
        let is_new = match self.index.get(&fragment.id) {
            Some(&position) => {
                self.records[position].fields.absorb(fragment.fields);
                false
            }
            None => {
                self.index.insert(fragment.id.clone(), self.records.len());
                self.records.push(ListingRecord {
                    id: fragment.id,
                    fields: fragment.fields,
                });
                true
            }
        };

        UpsertOutcome {
            is_new,
            total: self.records.len(),
        }
    }

    /// Merges detail-page fields into a known listing
    ///
    /// Returns false (and changes nothing) if the identifier is unknown.
    /// See [`ListingFields::enrich`] for which fields may be replaced.
    pub fn merge(&mut self, id: &ListingId, fields: ListingFields) -> bool {
        match self.index.get(id) {
            Some(&position) => {
                self.records[position].fields.enrich(fields);
                true
            }
            None => false,
        }
    }

    /// Number of unique listings
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no listing has been seen
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns true if the identifier is known
    pub fn contains(&self, id: &ListingId) -> bool {
        self.index.contains_key(id)
    }

    /// Looks up a record by identifier
    pub fn get(&self, id: &ListingId) -> Option<&ListingRecord> {
        self.index.get(id).map(|&position| &self.records[position])
    }

    /// All records in first-seen order
    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    /// All identifiers in first-seen order
    pub fn identifiers(&self) -> impl Iterator<Item = &ListingId> {
        self.records.iter().map(|record| &record.id)
    }

    /// Consumes the store, yielding records in first-seen order
    pub fn into_records(self) -> Vec<ListingRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(path: &str) -> ListingId {
        ListingId::parse(&format!("https://site.test{}", path)).unwrap()
    }

    fn priced(path: &str, price: &str) -> ListingFragment {
        ListingFragment {
            id: id(path),
            fields: ListingFields {
                price: Some(price.to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_upsert_new_then_known() {
        let mut store = IdentityStore::new();

        let first = store.upsert(ListingFragment::bare(id("/listing/1")));
        assert_eq!(first, UpsertOutcome { is_new: true, total: 1 });

        let again = store.upsert(ListingFragment::bare(id("/listing/1")));
        assert_eq!(again, UpsertOutcome { is_new: false, total: 1 });
    }

    #[test]
    fn test_idempotent_identity() {
        let mut store = IdentityStore::new();
        store.upsert(priced("/listing/1", "$100"));
        let before = store.records().to_vec();

        store.upsert(priced("/listing/1", "$100"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.records(), before.as_slice());
    }

    #[test]
    fn test_upsert_does_not_regress_fields() {
        let mut store = IdentityStore::new();
        store.upsert(priced("/listing/1", "$100"));
        store.upsert(ListingFragment::bare(id("/listing/1")));

        let record = store.get(&id("/listing/1")).unwrap();
        assert_eq!(record.fields.price.as_deref(), Some("$100"));
    }

    #[test]
    fn test_unique_count_never_decreases_across_pages() {
        let pages: [&[&str]; 4] = [
            &["/listing/1", "/listing/2", "/listing/3"],
            &["/listing/3", "/listing/4", "/listing/1"],
            &["/listing/2", "/listing/4"],
            &["/listing/5", "/listing/5", "/listing/2"],
        ];

        let mut store = IdentityStore::new();
        let mut totals_after_page = Vec::new();
        let mut last_total = 0;

        for page in pages {
            for path in page {
                let outcome = store.upsert(ListingFragment::bare(id(path)));
                assert!(outcome.total >= last_total);
                assert_eq!(outcome.total, store.len());
                last_total = outcome.total;
            }
            totals_after_page.push(store.len());
        }

        assert_eq!(totals_after_page, vec![3, 4, 4, 5]);
        assert!(totals_after_page.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_first_seen_order_preserved() {
        let mut store = IdentityStore::new();
        for path in ["/listing/3", "/listing/1", "/listing/2", "/listing/1"] {
            store.upsert(ListingFragment::bare(id(path)));
        }

        let order: Vec<&str> = store.identifiers().map(ListingId::as_str).collect();
        assert_eq!(
            order,
            vec![
                "https://site.test/listing/3",
                "https://site.test/listing/1",
                "https://site.test/listing/2",
            ]
        );
    }

    #[test]
    fn test_relative_and_absolute_sightings_collapse() {
        let page = url::Url::parse("https://site.test/homes?pageno=1").unwrap();
        let mut store = IdentityStore::new();

        store.upsert(ListingFragment::bare(
            ListingId::resolve("/listing/42", &page).unwrap(),
        ));
        let outcome = store.upsert(ListingFragment::bare(
            ListingId::resolve("https://site.test/listing/42", &page).unwrap(),
        ));

        assert!(!outcome.is_new);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_merge_known_and_unknown() {
        let mut store = IdentityStore::new();
        store.upsert(priced("/listing/1", "$100"));

        let merged = store.merge(
            &id("/listing/1"),
            ListingFields {
                description: Some("Waterfront".to_string()),
                ..Default::default()
            },
        );
        assert!(merged);

        let record = store.get(&id("/listing/1")).unwrap();
        assert_eq!(record.fields.price.as_deref(), Some("$100"));
        assert_eq!(record.fields.description.as_deref(), Some("Waterfront"));

        assert!(!store.merge(&id("/listing/9"), ListingFields::default()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_merge_never_empties_field() {
        let mut store = IdentityStore::new();
        store.upsert(priced("/listing/1", "$100"));
        store.merge(
            &id("/listing/1"),
            ListingFields {
                price: Some(String::new()),
                ..Default::default()
            },
        );
        assert_eq!(
            store.get(&id("/listing/1")).unwrap().fields.price.as_deref(),
            Some("$100")
        );
    }
}
