//! Query candidate planning for Taiwanese dispatch addresses.
//!
//! Dispatch addresses come in a few shapes:
//! - Street addresses: `"高雄市苓雅區建國一路100號"`
//! - District only: `"高雄市苓雅區"`
//! - Intersections: `"鼎強街和鼎正街"`, `"信義路&忠孝路"`
//!
//! Nominatim handles the literal address well enough most of the time, but
//! intersections and district-qualified roads often miss. [`CandidatePlanner`]
//! yields the alternate phrasings to try, best first.

use std::sync::LazyLock;

use regex::Regex;

/// Two road-like tokens joined by 和 / & / 與 / 、.
static INTERSECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(.+?[路街道])(?:和|&|與|、)(.+?[路街道])").expect("valid regex")
});

/// Which rewrite produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// `"<road1> & <road2>, <city>"` built from an intersection.
    Intersection,
    /// The address exactly as published.
    Literal,
    /// `"<city><road>"` with the district dropped.
    RoadOnly,
}

/// One query to send to the geocoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Free-text query.
    pub query: String,
    /// How the query was derived.
    pub kind: CandidateKind,
}

/// The two roads of a detected intersection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intersection {
    /// First road, with the city name and district markers removed.
    pub road1: String,
    /// Second road, as matched.
    pub road2: String,
}

/// Builds query candidates for addresses within one city.
#[derive(Debug, Clone)]
pub struct CandidatePlanner {
    city: String,
    city_road_re: Regex,
}

impl CandidatePlanner {
    /// Creates a planner for `city` (e.g. `"高雄市"`).
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if the city-road pattern cannot be compiled.
    pub fn new(city: &str) -> Result<Self, regex::Error> {
        let city_road_re = Regex::new(&format!(
            r"({})(.+?[區])?(.+?[路街道])",
            regex::escape(city)
        ))?;

        Ok(Self {
            city: city.to_owned(),
            city_road_re,
        })
    }

    /// Returns the city this planner targets.
    #[must_use]
    pub fn city(&self) -> &str {
        &self.city
    }

    /// Detects an intersection of two roads.
    #[must_use]
    pub fn intersection(&self, address: &str) -> Option<Intersection> {
        let caps = INTERSECTION_RE.captures(address)?;
        let road1 = caps[1].replace(self.city.as_str(), "").replace('區', "");
        let road2 = caps[2].to_owned();
        Some(Intersection { road1, road2 })
    }

    /// Returns `"<city><road>"` for a city(-district)-road address.
    #[must_use]
    pub fn road_only(&self, address: &str) -> Option<String> {
        let caps = self.city_road_re.captures(address)?;
        let road = caps.get(3)?.as_str();
        Some(format!("{}{road}", &caps[1]))
    }

    /// Returns the candidates for `address`, best first.
    ///
    /// The road-only fallback is only computed once the earlier candidates
    /// have been consumed. It is omitted when it would repeat the literal
    /// address, so a literal query that failed (for example on a timeout)
    /// is not retried under the road-only stage.
    #[must_use]
    pub fn candidates<'a>(&'a self, address: &'a str) -> Candidates<'a> {
        let intersection = self.intersection(address).map(|i| {
            log::debug!("Detected intersection: {} & {}", i.road1, i.road2);
            format!("{} & {}, {}", i.road1, i.road2, self.city)
        });

        Candidates {
            planner: self,
            address,
            intersection,
            stage: Stage::Intersection,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Intersection,
    Literal,
    RoadOnly,
    Done,
}

/// Lazy iterator over the query candidates of one address.
#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    planner: &'a CandidatePlanner,
    address: &'a str,
    intersection: Option<String>,
    stage: Stage,
}

impl Iterator for Candidates<'_> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            match self.stage {
                Stage::Intersection => {
                    self.stage = Stage::Literal;
                    if let Some(query) = self.intersection.clone() {
                        return Some(Candidate {
                            query,
                            kind: CandidateKind::Intersection,
                        });
                    }
                }
                Stage::Literal => {
                    self.stage = Stage::RoadOnly;
                    return Some(Candidate {
                        query: self.address.to_owned(),
                        kind: CandidateKind::Literal,
                    });
                }
                Stage::RoadOnly => {
                    self.stage = Stage::Done;
                    if self.intersection.is_some() {
                        return None;
                    }
                    // Skip when the rewrite is identical to the literal query.
                    return self
                        .planner
                        .road_only(self.address)
                        .filter(|query| query != self.address)
                        .map(|query| Candidate {
                            query,
                            kind: CandidateKind::RoadOnly,
                        });
                }
                Stage::Done => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner() -> CandidatePlanner {
        CandidatePlanner::new("高雄市").unwrap()
    }

    fn queries(address: &str) -> Vec<(String, CandidateKind)> {
        planner()
            .candidates(address)
            .map(|c| (c.query, c.kind))
            .collect()
    }

    #[test]
    fn intersection_comes_before_literal() {
        assert_eq!(
            queries("信義路和忠孝路, 高雄市"),
            vec![
                ("信義路 & 忠孝路, 高雄市".to_string(), CandidateKind::Intersection),
                ("信義路和忠孝路, 高雄市".to_string(), CandidateKind::Literal),
            ]
        );
    }

    #[test]
    fn recognises_every_conjunction() {
        for sep in ["和", "&", "與", "、"] {
            let address = format!("鼎強街{sep}鼎正街");
            let planned = queries(&address);
            assert_eq!(planned.len(), 2, "separator {sep}");
            assert_eq!(planned[0].0, "鼎強街 & 鼎正街, 高雄市");
        }
    }

    #[test]
    fn intersection_strips_city_and_district_from_first_road() {
        let intersection = planner()
            .intersection("高雄市苓雅區建國一路和中正一路")
            .unwrap();

        assert_eq!(
            intersection,
            Intersection {
                road1: "苓雅建國一路".to_string(),
                road2: "中正一路".to_string(),
            }
        );
    }

    #[test]
    fn intersection_suppresses_road_fallback() {
        let planned = queries("高雄市苓雅區建國一路和中正一路");

        assert_eq!(planned.len(), 2);
        assert!(planned.iter().all(|(_, kind)| *kind != CandidateKind::RoadOnly));
    }

    #[test]
    fn district_road_gets_road_only_fallback_last() {
        assert_eq!(
            queries("高雄市苓雅區建國一路100號"),
            vec![
                ("高雄市苓雅區建國一路100號".to_string(), CandidateKind::Literal),
                ("高雄市建國一路".to_string(), CandidateKind::RoadOnly),
            ]
        );
    }

    #[test]
    fn road_without_district_still_falls_back() {
        assert_eq!(
            planner().road_only("高雄市建國一路100號").as_deref(),
            Some("高雄市建國一路")
        );
    }

    #[test]
    fn identical_fallback_is_not_repeated() {
        assert_eq!(
            queries("高雄市建國一路"),
            vec![("高雄市建國一路".to_string(), CandidateKind::Literal)]
        );
    }

    #[test]
    fn district_only_address_is_literal_only() {
        assert_eq!(
            queries("高雄市苓雅區"),
            vec![("高雄市苓雅區".to_string(), CandidateKind::Literal)]
        );
    }

    #[test]
    fn other_city_gets_no_fallback() {
        assert_eq!(
            queries("臺南市東區中華東路"),
            vec![("臺南市東區中華東路".to_string(), CandidateKind::Literal)]
        );
    }

    #[test]
    fn planner_uses_configured_city() {
        let planner = CandidatePlanner::new("臺南市").unwrap();

        let planned: Vec<String> = planner
            .candidates("臺南市東區中華東路一段")
            .map(|c| c.query)
            .collect();

        assert_eq!(planner.city(), "臺南市");
        assert_eq!(planned, ["臺南市東區中華東路一段", "臺南市中華東路"]);
    }

    #[test]
    fn candidates_are_lazy() {
        let planner = planner();
        let mut candidates = planner.candidates("信義路和忠孝路");

        let first = candidates.next().unwrap();

        assert_eq!(first.kind, CandidateKind::Intersection);
        assert_eq!(candidates.stage, Stage::Literal);
    }
}
