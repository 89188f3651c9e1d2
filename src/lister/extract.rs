use crate::models::{FilingPage, FilingRecord, FilingResource};

/// Language code of a filing: the two characters right before the first `.json`.
///
/// The parse is purely positional and relies on the API's `json_url` shape
/// (`.../report-en.json`). Returns an empty string when there is no `.json` or fewer
/// than two characters precede it.
pub fn extract_lang(json_url: &str) -> String {
    json_url
        .find(".json")
        .and_then(|pos| {
            let prefix = &json_url[..pos];
            prefix
                .char_indices()
                .rev()
                .nth(1)
                .map(|(start, _)| &prefix[start..])
        })
        .unwrap_or_default()
        .to_string()
}

/// Filing identifier: segment 1 of `json_url` split on `/`.
///
/// API URLs start with `/`, so segment 1 is the first path component (usually the LEI).
pub fn extract_identifier(json_url: &str) -> String {
    json_url.split('/').nth(1).unwrap_or_default().to_string()
}

impl FilingRecord {
    /// Flattens an API resource into a row. Returns `None` when the filing has no `json_url`.
    pub fn from_resource(resource: FilingResource) -> Option<Self> {
        let FilingResource {
            id,
            attributes,
            relationships,
        } = resource;
        let json_url = attributes.json_url?;

        Some(Self {
            country: attributes.country,
            identifier: extract_identifier(&json_url),
            entity_id: relationships.entity.data.id,
            lang: extract_lang(&json_url),
            period_end: attributes.period_end,
            filing_id: id,
            package_url: attributes.package_url,
            json_url,
            processed: attributes.processed,
        })
    }
}

/// Extracts the rows of a single listing page, dropping filings without a `json_url`.
pub fn extract_filing_data(page: FilingPage) -> Vec<FilingRecord> {
    page.data
        .into_iter()
        .filter_map(FilingRecord::from_resource)
        .collect()
}

/// Sorts the listing table by `period_end`, then `processed`. The sort is stable, so rows
/// that tie on both keys keep their page order. A missing `processed` sorts first.
pub fn sort_filings(records: &mut [FilingRecord]) {
    records.sort_by(|a, b| {
        a.period_end
            .cmp(&b.period_end)
            .then_with(|| a.processed.cmp(&b.processed))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        EntityRelationship, FilingAttributes, PageLinks, Relationships, ResourceId,
    };

    fn resource(id: &str, json_url: Option<&str>, package_url: Option<&str>) -> FilingResource {
        FilingResource {
            id: id.to_string(),
            attributes: FilingAttributes {
                country: "GB".to_string(),
                period_end: "2021-12-31".to_string(),
                processed: Some("2022-04-01 09:00:00".to_string()),
                json_url: json_url.map(str::to_string),
                package_url: package_url.map(str::to_string),
            },
            relationships: Relationships {
                entity: EntityRelationship {
                    data: ResourceId {
                        id: "entity-1".to_string(),
                    },
                },
            },
        }
    }

    fn record(period_end: &str, processed: Option<&str>, filing_id: &str) -> FilingRecord {
        FilingRecord {
            country: "DK".to_string(),
            identifier: "LEI".to_string(),
            entity_id: "e".to_string(),
            lang: "da".to_string(),
            period_end: period_end.to_string(),
            filing_id: filing_id.to_string(),
            package_url: None,
            json_url: "/LEI/x/report-da.json".to_string(),
            processed: processed.map(str::to_string),
        }
    }

    #[test]
    fn lang_is_positional_before_json() {
        assert_eq!(extract_lang("abc/xy/report.json"), "rt");
        assert_eq!(
            extract_lang("534900ABCDEF-GB/2021-12-31/report-en.json"),
            "en"
        );
    }

    #[test]
    fn lang_counts_characters_not_bytes() {
        assert_eq!(extract_lang("/X/2021/report-ö.json"), "-ö");
        assert_eq!(extract_lang("/X/2021/年報.json"), "年報");
        assert_eq!(extract_lang("/X/2021/é.json"), "/é");
    }

    #[test]
    fn lang_without_json_suffix_is_empty() {
        assert_eq!(extract_lang("abc/xy/report.xhtml"), "");
        assert_eq!(extract_lang("x.json"), "");
        assert_eq!(extract_lang("ö.json"), "");
    }

    #[test]
    fn identifier_is_second_segment() {
        assert_eq!(extract_identifier("a/BUYER123/2021/report.json"), "BUYER123");
        assert_eq!(
            extract_identifier("/213800ABCD/2021-12-31/ESEF/GB/0/report-en.json"),
            "213800ABCD"
        );
    }

    #[test]
    fn identifier_single_segment_is_empty() {
        assert_eq!(extract_identifier("report.json"), "");
    }

    #[test]
    fn from_resource_flattens_fields() {
        let row = FilingRecord::from_resource(resource(
            "4242",
            Some("/213800ABCD/2021-12-31/ESEF/GB/0/report-en.json"),
            Some("/213800ABCD/2021-12-31/ESEF/GB/0/213800ABCD-2021-12-31-en.zip"),
        ))
        .unwrap();

        assert_eq!(row.country, "GB");
        assert_eq!(row.identifier, "213800ABCD");
        assert_eq!(row.entity_id, "entity-1");
        assert_eq!(row.lang, "en");
        assert_eq!(row.filing_id, "4242");
        assert!(row.package_url.is_some());
    }

    #[test]
    fn extract_filing_data_drops_rows_without_json_url() {
        let page = FilingPage {
            data: vec![
                resource("1", Some("/A/2021/report-en.json"), None),
                resource("2", None, Some("/A/2021/pkg.zip")),
                resource("3", Some("/B/2021/report-fr.json"), Some("/B/2021/pkg.zip")),
            ],
            links: PageLinks {
                self_link: "s".to_string(),
                last: Some("s".to_string()),
                next: None,
            },
        };

        let rows = extract_filing_data(page);
        let ids: Vec<_> = rows.iter().map(|r| r.filing_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn sort_orders_by_period_then_processed() {
        let mut rows = vec![
            record("2022-12-31", Some("2023-01-02"), "a"),
            record("2021-12-31", Some("2022-05-01"), "b"),
            record("2021-12-31", Some("2022-03-01"), "c"),
            record("2021-12-31", None, "d"),
        ];
        sort_filings(&mut rows);

        let ids: Vec<_> = rows.iter().map(|r| r.filing_id.as_str()).collect();
        assert_eq!(ids, vec!["d", "c", "b", "a"]);
        for pair in rows.windows(2) {
            assert!(
                (pair[0].period_end.as_str(), pair[0].processed.as_deref())
                    <= (pair[1].period_end.as_str(), pair[1].processed.as_deref())
            );
        }
    }

    #[test]
    fn sort_is_stable_on_ties() {
        let mut rows = vec![
            record("2021-12-31", Some("2022-03-01"), "first"),
            record("2021-12-31", Some("2022-03-01"), "second"),
        ];
        sort_filings(&mut rows);
        assert_eq!(rows[0].filing_id, "first");
        assert_eq!(rows[1].filing_id, "second");
    }
}
