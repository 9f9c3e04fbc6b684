//! Whole-store analysis
//!
//! A single pass over every `(canon, symbol)` row producing:
//! - bundle size summary (average, median, mode, histogram)
//! - http / https / other symbol counts
//! - domain (`base.tld`) and TLD frequencies of http(s) symbols
//! - singleton bundles
//! - canons without a canon row (integrity warning)

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;
use regex::Regex;
use serde::Serialize;
use crate::symbol::Pair;

static AUTHORITY: OnceLock<Regex> = OnceLock::new();

fn authority_regex() -> &'static Regex {
    AUTHORITY.get_or_init(|| Regex::new(r"(?i)^https?://([^/]+)").expect("authority regex is valid"))
}

/// Analysis report for one store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analysis {
    /// Total rows (symbols)
    pub rows: usize,
    /// Distinct canons
    pub bundles: usize,
    /// `None` for an empty store
    pub sizes: Option<BundleSizes>,
    pub schemes: SchemeCounts,
    /// `base.tld` frequencies, most frequent first
    pub domains: Vec<Frequency>,
    /// TLD frequencies, most frequent first
    pub tlds: Vec<Frequency>,
    /// Symbols alone in their bundle, ascending
    pub singletons: Vec<String>,
    /// Canons referenced by rows but lacking their own `(canon, canon)` row
    pub missing_canons: Vec<String>,
}

impl Analysis {
    pub fn is_consistent(&self) -> bool {
        self.missing_canons.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundleSizes {
    pub average: f64,
    /// Lower-middle element when the bundle count is even
    pub median: usize,
    /// Most common size, smallest on ties
    pub mode: usize,
    pub largest: usize,
    /// size -> number of bundles of that size
    pub histogram: BTreeMap<usize, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemeCounts {
    pub http: usize,
    pub https: usize,
    pub other: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frequency {
    pub name: String,
    pub count: usize,
}

struct BundleScan<'a> {
    size: usize,
    has_canon_row: bool,
    first: &'a str,
}

/// Analyse a full dump of a store's rows
pub fn analyse(pairs: &[Pair]) -> Analysis {
    if pairs.is_empty() {
        return Analysis::default();
    }

    let mut bundles: BTreeMap<&str, BundleScan<'_>> = BTreeMap::new();
    let mut schemes = SchemeCounts::default();
    let mut domains: HashMap<String, usize> = HashMap::new();
    let mut tlds: HashMap<String, usize> = HashMap::new();

    for pair in pairs {
        let scan = bundles.entry(pair.canon.as_str()).or_insert(BundleScan {
            size: 0,
            has_canon_row: false,
            first: pair.symbol.as_str(),
        });
        scan.size += 1;
        scan.has_canon_row |= pair.is_canon();

        let symbol = pair.symbol.as_str();
        if has_scheme(symbol, "https://") {
            schemes.https += 1;
        } else if has_scheme(symbol, "http://") {
            schemes.http += 1;
        } else {
            schemes.other += 1;
            continue;
        }

        if let Some((domain, tld)) = domain_and_tld(symbol) {
            *domains.entry(domain).or_insert(0) += 1;
            *tlds.entry(tld).or_insert(0) += 1;
        }
    }

    let mut sizes: Vec<usize> = bundles.values().map(|b| b.size).collect();
    sizes.sort_unstable();

    let mut histogram: BTreeMap<usize, usize> = BTreeMap::new();
    for size in &sizes {
        *histogram.entry(*size).or_insert(0) += 1;
    }

    let mut mode = (0, 0);
    for (size, count) in &histogram {
        if *count > mode.1 {
            mode = (*size, *count);
        }
    }

    let mut singletons: Vec<String> = bundles
        .values()
        .filter(|b| b.size == 1)
        .map(|b| b.first.to_string())
        .collect();
    singletons.sort();

    let missing_canons = bundles
        .iter()
        .filter(|(_, b)| !b.has_canon_row)
        .map(|(canon, _)| canon.to_string())
        .collect();

    Analysis {
        rows: pairs.len(),
        bundles: bundles.len(),
        sizes: Some(BundleSizes {
            average: pairs.len() as f64 / bundles.len() as f64,
            median: sizes[(sizes.len() - 1) / 2],
            mode: mode.0,
            largest: sizes[sizes.len() - 1],
            histogram,
        }),
        schemes,
        domains: ranked(domains),
        tlds: ranked(tlds),
        singletons,
        missing_canons,
    }
}

/// Split the host of an http(s) URL into (`base.tld`, `tld`).
///
/// The authority runs up to the first `/`; userinfo and port are dropped
/// and the host is lowercased. The scheme matches in any case.
pub fn domain_and_tld(url: &str) -> Option<(String, String)> {
    let authority = authority_regex().captures(url)?.get(1)?.as_str();
    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let host = host.split(['?', '#']).next().unwrap_or(host);
    let host = match host.rsplit_once(':') {
        Some((h, port)) if port.chars().all(|c| c.is_ascii_digit()) => h,
        _ => host,
    };
    let host = host.to_ascii_lowercase();

    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    let tld = *labels.last()?;
    let domain = if labels.len() >= 2 {
        format!("{}.{}", labels[labels.len() - 2], tld)
    } else {
        tld.to_string()
    };
    Some((domain, tld.to_string()))
}

/// URL schemes compare case-insensitively
fn has_scheme(symbol: &str, prefix: &str) -> bool {
    symbol
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn ranked(counts: HashMap<String, usize>) -> Vec<Frequency> {
    let mut ranked: Vec<Frequency> = counts
        .into_iter()
        .map(|(name, count)| Frequency { name, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(canon: &str, symbol: &str) -> Pair {
        Pair::new(canon, symbol)
    }

    #[test]
    fn test_empty_store_gives_minimal_report() {
        let report = analyse(&[]);
        assert_eq!(report.rows, 0);
        assert!(report.sizes.is_none());
        assert!(report.is_consistent());
    }

    #[test]
    fn test_bundle_size_summary() {
        // sizes: 1, 2, 3, 2
        let report = analyse(&[
            p("a", "a"),
            p("b", "b"),
            p("b", "b2"),
            p("c", "c"),
            p("c", "c2"),
            p("c", "c3"),
            p("d", "d"),
            p("d", "d2"),
        ]);
        let sizes = report.sizes.unwrap();
        assert_eq!(report.rows, 8);
        assert_eq!(report.bundles, 4);
        assert!((sizes.average - 2.0).abs() < f64::EPSILON);
        // sorted 1,2,2,3 -> lower middle is 2
        assert_eq!(sizes.median, 2);
        assert_eq!(sizes.mode, 2);
        assert_eq!(sizes.largest, 3);
        assert_eq!(sizes.histogram.get(&2), Some(&2));
        assert_eq!(report.singletons, vec!["a"]);
    }

    #[test]
    fn test_median_lower_middle_and_mode_tie() {
        // sizes 1 and 3: median picks 1, mode tie picks the smaller size
        let report = analyse(&[p("a", "a"), p("b", "b"), p("b", "x"), p("b", "y")]);
        let sizes = report.sizes.unwrap();
        assert_eq!(sizes.median, 1);
        assert_eq!(sizes.mode, 1);
    }

    #[test]
    fn test_schemes_and_domains() {
        let report = analyse(&[
            p("http://dbpedia.org/resource/Paris", "http://dbpedia.org/resource/Paris"),
            p("http://dbpedia.org/resource/Paris", "https://www.wikidata.org/wiki/Q90"),
            p("http://dbpedia.org/resource/Paris", "http://fr.dbpedia.org:8080/resource/Paris"),
            p("http://dbpedia.org/resource/Paris", "urn:x-city:paris"),
        ]);
        assert_eq!(report.schemes, SchemeCounts { http: 2, https: 1, other: 1 });
        assert_eq!(
            report.domains,
            vec![
                Frequency { name: "dbpedia.org".into(), count: 2 },
                Frequency { name: "wikidata.org".into(), count: 1 },
            ]
        );
        assert_eq!(report.tlds, vec![Frequency { name: "org".into(), count: 3 }]);
    }

    #[test]
    fn test_domain_parsing_edges() {
        assert_eq!(
            domain_and_tld("http://user@Example.COM:80/x"),
            Some(("example.com".into(), "com".into()))
        );
        assert_eq!(domain_and_tld("http://localhost/"), Some(("localhost".into(), "localhost".into())));
        assert_eq!(domain_and_tld("https:///nohost"), None);
        assert_eq!(domain_and_tld("ftp://example.com"), None);
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let report = analyse(&[
            p("HTTP://Example.org/a", "HTTP://Example.org/a"),
            p("HTTP://Example.org/a", "Https://www.example.org/b"),
            p("HTTP://Example.org/a", "httpx://example.org/c"),
            p("HTTP://Example.org/a", "ht"),
        ]);
        assert_eq!(report.schemes.http, 1);
        assert_eq!(report.schemes.https, 1);
        assert_eq!(report.schemes.other, 2);
        assert_eq!(report.domains, vec![Frequency { name: "example.org".into(), count: 2 }]);
    }

    #[test]
    fn test_missing_canon_is_reported() {
        let report = analyse(&[p("a", "a"), p("a", "b"), p("ghost", "c"), p("ghost", "d")]);
        assert_eq!(report.missing_canons, vec!["ghost"]);
        assert!(!report.is_consistent());
    }
}
