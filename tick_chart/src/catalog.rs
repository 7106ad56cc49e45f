//! Static reference tables for grades, route types and ascent styles.
//!
//! Every lookup here is total: unmatched input yields `None` rather than an
//! error, and callers decide what an unknown value means for a tick.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TickError;

/// Yosemite Decimal System labels, easiest first.
const YDS_LABELS: &[&str] = &[
    "3rd", "4th", "5.0", "5.1", "5.2", "5.3", "5.4", "5.5", "5.6", "5.7", "5.8", "5.9",
    "5.10-", "5.10a/b", "5.10a", "5.10b", "5.10", "5.10+", "5.10c", "5.10d",
    "5.11-", "5.11a/b", "5.11a", "5.11b", "5.11", "5.11+", "5.11c", "5.11d",
    "5.12-", "5.12a/b", "5.12a", "5.12b", "5.12", "5.12+", "5.12c", "5.12d",
    "5.13-", "5.13a/b", "5.13a", "5.13b", "5.13", "5.13+", "5.13c", "5.13d",
    "5.14-", "5.14a/b", "5.14a", "5.14b", "5.14", "5.14+", "5.14c", "5.14d",
    "5.15-", "5.15a/b", "5.15a", "5.15b", "5.15", "5.15+", "5.15c", "5.15d",
];

/// Hueco V-scale labels, easiest first. Slash grades sit between the `+` of
/// the lower grade and the `-` of the upper one.
const V_LABELS: &[&str] = &[
    "V-easy", "V0-", "V0", "V0+", "V0-1", "V1-", "V1", "V1+", "V1-2", "V2-", "V2", "V2+",
    "V2-3", "V3-", "V3", "V3+", "V3-4", "V4-", "V4", "V4+", "V4-5", "V5-", "V5", "V5+", "V5-6",
    "V6-", "V6", "V6+", "V6-7", "V7-", "V7", "V7+", "V7-8", "V8-", "V8", "V8+", "V8-9", "V9-",
    "V9", "V9+", "V9-10", "V10-", "V10", "V10+", "V10-11", "V11-", "V11", "V11+", "V11-12",
    "V12-", "V12", "V12+", "V12-13", "V13-", "V13", "V13+", "V13-14", "V14-", "V14", "V14+",
    "V14-15", "V15-", "V15", "V15+", "V15-16", "V16-", "V16", "V16+", "V16-17", "V17-", "V17",
];

/// An ordered grade vocabulary. The index of a label is its rank.
#[derive(Clone, Copy, Debug)]
pub struct GradeScale {
    labels: &'static [&'static str],
}

pub const YDS: GradeScale = GradeScale { labels: YDS_LABELS };

pub const V_SCALE: GradeScale = GradeScale { labels: V_LABELS };

impl GradeScale {
    /// Exact, case-sensitive lookup.
    pub fn rank_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|known| *known == label)
    }

    pub fn label(&self, rank: usize) -> Option<&'static str> {
        self.labels.get(rank).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.labels.iter().copied()
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RouteType {
    Boulder,
    Sport,
    Trad,
    TopRope,
    Alpine,
}

impl RouteType {
    pub const ALL: [RouteType; 5] = [
        RouteType::Boulder,
        RouteType::Sport,
        RouteType::Trad,
        RouteType::TopRope,
        RouteType::Alpine,
    ];

    /// Label as written in the tick export.
    pub fn label(self) -> &'static str {
        match self {
            RouteType::Boulder => "Boulder",
            RouteType::Sport => "Sport",
            RouteType::Trad => "Trad",
            RouteType::TopRope => "TR",
            RouteType::Alpine => "Alpine",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            RouteType::TopRope => &["Top Rope"],
            _ => &[],
        }
    }

    fn matches(self, text: &str, case_insensitive: bool) -> bool {
        std::iter::once(self.label())
            .chain(self.aliases().iter().copied())
            .any(|name| {
                if case_insensitive {
                    name.eq_ignore_ascii_case(text)
                } else {
                    name == text
                }
            })
    }
}

impl FromStr for RouteType {
    type Err = TickError;

    /// Lenient parse for command-line use: accepts labels, aliases and
    /// variant names in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        RouteType::ALL
            .into_iter()
            .find(|rt| rt.matches(wanted, true) || format!("{:?}", rt).eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TickError::InvalidParameter(format!("unknown route type '{}'", s)))
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How cleanly a route was climbed. Variants are declared in classification
/// priority: when a note mentions several, the earliest variant wins.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SendStyle {
    Onsight,
    Flash,
    Redpoint,
}

impl SendStyle {
    pub const ALL: [SendStyle; 3] = [SendStyle::Onsight, SendStyle::Flash, SendStyle::Redpoint];

    pub fn label(self) -> &'static str {
        match self {
            SendStyle::Onsight => "Onsight",
            SendStyle::Flash => "Flash",
            SendStyle::Redpoint => "Redpoint",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            SendStyle::Onsight => &["onsight", "on-sight"],
            SendStyle::Flash => &["flash"],
            // Boulder ticks log a worked ascent as "Send".
            SendStyle::Redpoint => &["redpoint", "pinkpoint", "send"],
        }
    }
}

impl fmt::Display for SendStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AscentStyle {
    Lead,
}

impl AscentStyle {
    pub const ALL: [AscentStyle; 1] = [AscentStyle::Lead];

    pub fn label(self) -> &'static str {
        match self {
            AscentStyle::Lead => "Lead",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            AscentStyle::Lead => &["lead"],
        }
    }
}

impl fmt::Display for AscentStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProtectionRating {
    PG13,
    R,
    X,
}

impl ProtectionRating {
    pub const ALL: [ProtectionRating; 3] =
        [ProtectionRating::PG13, ProtectionRating::R, ProtectionRating::X];

    pub fn label(self) -> &'static str {
        match self {
            ProtectionRating::PG13 => "PG13",
            ProtectionRating::R => "R",
            ProtectionRating::X => "X",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }
}

/// Split an export rating such as `5.10a PG13` into its grade label and a
/// trailing protection rating. Ratings without a protection suffix come back
/// trimmed and unchanged.
pub fn split_rating(rating: &str) -> (&str, Option<ProtectionRating>) {
    let trimmed = rating.trim();
    if let Some((grade, suffix)) = trimmed.rsplit_once(char::is_whitespace) {
        if let Some(protection) = ProtectionRating::from_label(suffix) {
            return (grade.trim_end(), Some(protection));
        }
    }
    (trimmed, None)
}

fn first_keyword_match<T: Copy>(
    text: &str,
    candidates: &[T],
    keywords: impl Fn(T) -> &'static [&'static str],
) -> Option<T> {
    let lowered = text.to_lowercase();
    candidates
        .iter()
        .copied()
        .find(|candidate| keywords(*candidate).iter().any(|kw| lowered.contains(kw)))
}

/// Read-only lookup surface shared by every preprocessing pass.
#[derive(Clone, Debug)]
pub struct Catalog {
    pub routes: GradeScale,
    pub boulders: GradeScale,
    pub case_insensitive: bool,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            routes: YDS,
            boulders: V_SCALE,
            case_insensitive: false,
        }
    }
}

impl Catalog {
    pub fn with_case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    /// Rank of a label on the route (YDS) scale.
    pub fn rank_of(&self, label: &str) -> Option<usize> {
        self.routes.rank_of(label)
    }

    pub fn scale_for(&self, route_type: RouteType) -> &GradeScale {
        match route_type {
            RouteType::Boulder => &self.boulders,
            _ => &self.routes,
        }
    }

    /// Rank of a label on the scale the discipline is graded with.
    pub fn rank_for(&self, route_type: RouteType, label: &str) -> Option<usize> {
        self.scale_for(route_type).rank_of(label)
    }

    pub fn is_known_route_type(&self, label: &str) -> bool {
        self.normalize_route_type(label).is_some()
    }

    /// Map an export route-type field onto `RouteType`. Compound values such
    /// as `Trad, Alpine` resolve to their first known component.
    pub fn normalize_route_type(&self, label: &str) -> Option<RouteType> {
        label.split(',').map(str::trim).find_map(|part| {
            RouteType::ALL
                .into_iter()
                .find(|rt| rt.matches(part, self.case_insensitive))
        })
    }

    /// Onsight > Flash > Redpoint when several keywords appear.
    pub fn classify_send_style(&self, text: &str) -> Option<SendStyle> {
        first_keyword_match(text, &SendStyle::ALL, SendStyle::keywords)
    }

    pub fn classify_ascent_style(&self, text: &str) -> Option<AscentStyle> {
        first_keyword_match(text, &AscentStyle::ALL, AscentStyle::keywords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_scales_are_unique() {
        for scale in [YDS, V_SCALE] {
            let unique: HashSet<_> = scale.iter().collect();
            assert_eq!(unique.len(), scale.len());
        }
    }

    #[test]
    fn test_yds_ordering() {
        let ranks: Vec<usize> = ["5.9", "5.10-", "5.10a/b", "5.10a", "5.10", "5.10+", "5.10d", "5.11-"]
            .iter()
            .map(|g| YDS.rank_of(g).unwrap())
            .collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(YDS.rank_of("3rd"), Some(0));
        assert_eq!(YDS.label(YDS.len() - 1), Some("5.15d"));
    }

    #[test]
    fn test_rank_lookup_is_exact() {
        let catalog = Catalog::default();
        assert_eq!(catalog.rank_of("5.10A"), None);
        assert_eq!(catalog.rank_of(" 5.10a"), None);
        assert_eq!(catalog.rank_of("5.c9"), None);
        assert_eq!(catalog.rank_of("V3"), None);
        assert_eq!(catalog.rank_for(RouteType::Boulder, "V3"), V_SCALE.rank_of("V3"));
        assert!(catalog.rank_for(RouteType::Boulder, "V3").unwrap() > V_SCALE.rank_of("V2-3").unwrap());
    }

    #[test]
    fn test_normalize_route_type() {
        let catalog = Catalog::default();
        assert_eq!(catalog.normalize_route_type("Boulder"), Some(RouteType::Boulder));
        assert_eq!(catalog.normalize_route_type("TR"), Some(RouteType::TopRope));
        assert_eq!(catalog.normalize_route_type("Top Rope"), Some(RouteType::TopRope));
        assert_eq!(catalog.normalize_route_type("Trad, Alpine"), Some(RouteType::Trad));
        assert_eq!(catalog.normalize_route_type("Mixed, Sport"), Some(RouteType::Sport));
        assert_eq!(catalog.normalize_route_type("Mixed"), None);
        assert_eq!(catalog.normalize_route_type("sport"), None);
        assert_eq!(catalog.normalize_route_type(""), None);
        assert!(!catalog.is_known_route_type("Ice"));

        let relaxed = Catalog::default().with_case_insensitive(true);
        assert_eq!(relaxed.normalize_route_type("sport"), Some(RouteType::Sport));
        assert_eq!(relaxed.normalize_route_type("tr"), Some(RouteType::TopRope));
    }

    #[test]
    fn test_route_type_from_str() {
        assert_eq!("boulder".parse::<RouteType>().unwrap(), RouteType::Boulder);
        assert_eq!("toprope".parse::<RouteType>().unwrap(), RouteType::TopRope);
        assert_eq!("TR".parse::<RouteType>().unwrap(), RouteType::TopRope);
        assert!("ice".parse::<RouteType>().is_err());
    }

    #[test]
    fn test_send_style_priority() {
        let catalog = Catalog::default();
        assert_eq!(catalog.classify_send_style("Flash"), Some(SendStyle::Flash));
        assert_eq!(
            catalog.classify_send_style("redpoint after a flash attempt"),
            Some(SendStyle::Flash)
        );
        assert_eq!(
            catalog.classify_send_style("Lead Redpoint, almost an onsight"),
            Some(SendStyle::Onsight)
        );
        assert_eq!(catalog.classify_send_style("Send"), Some(SendStyle::Redpoint));
        assert_eq!(catalog.classify_send_style("Lead Fell/Hung"), None);
        assert_eq!(catalog.classify_send_style(""), None);
    }

    #[test]
    fn test_ascent_style() {
        let catalog = Catalog::default();
        assert_eq!(catalog.classify_ascent_style("Lead Onsight"), Some(AscentStyle::Lead));
        assert_eq!(catalog.classify_ascent_style("Follow"), None);
        assert_eq!(catalog.classify_ascent_style("TR"), None);
    }

    #[test]
    fn test_split_rating() {
        assert_eq!(split_rating("5.10a PG13"), ("5.10a", Some(ProtectionRating::PG13)));
        assert_eq!(split_rating(" 5.9 R "), ("5.9", Some(ProtectionRating::R)));
        assert_eq!(split_rating("V3"), ("V3", None));
        assert_eq!(split_rating("5.11 b"), ("5.11 b", None));
        assert_eq!(split_rating(""), ("", None));
    }
}
