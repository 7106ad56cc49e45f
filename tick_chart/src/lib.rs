//! Tick export preprocessing: turns a climbing tick export into per-discipline
//! series ready for charting.

pub mod catalog;
pub mod progression;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub use catalog::{
    split_rating, AscentStyle, Catalog, GradeScale, ProtectionRating, RouteType,
    SendStyle, V_SCALE, YDS,
};

pub const COL_DATE: &str = "Date";
pub const COL_ROUTE: &str = "Route";
pub const COL_RATING: &str = "Rating";
pub const COL_ROUTE_TYPE: &str = "Route Type";
pub const COL_STYLE: &str = "Style";
pub const COL_LEAD_STYLE: &str = "Lead Style";

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

#[derive(Error, Debug)]
pub enum TickError {
    #[error("input has no header row")]
    MissingHeader,
    #[error("header is missing required column '{0}'")]
    MissingColumn(String),
    #[error("failed to read CSV: {0}")]
    Csv(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub case_insensitive_route_types: bool,
    pub strip_protection: bool,
    pub sends_only: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            case_insensitive_route_types: false,
            strip_protection: true,
            sends_only: false,
        }
    }
}

impl Params {
    pub fn catalog(&self) -> Catalog {
        Catalog::default().with_case_insensitive(self.case_insensitive_route_types)
    }
}

/// Column positions resolved from the header row by exact name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Columns {
    pub date: usize,
    pub rating: usize,
    pub route_type: usize,
    pub style: usize,
    pub route: Option<usize>,
    pub lead_style: Option<usize>,
}

impl Columns {
    pub fn from_header(header: &StringRecord) -> Result<Self, TickError> {
        if header.iter().all(|field| field.trim().is_empty()) {
            return Err(TickError::MissingHeader);
        }
        let find = |name: &str| header.iter().position(|field| field == name);
        let require =
            |name: &str| find(name).ok_or_else(|| TickError::MissingColumn(name.to_string()));
        Ok(Self {
            date: require(COL_DATE)?,
            rating: require(COL_RATING)?,
            route_type: require(COL_ROUTE_TYPE)?,
            style: require(COL_STYLE)?,
            route: find(COL_ROUTE),
            lead_style: find(COL_LEAD_STYLE),
        })
    }
}

/// One export row with its date already parsed. Other fields are kept as the
/// raw text the export supplied.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TickRecord {
    pub row_index: usize,
    pub date: NaiveDate,
    pub route: String,
    pub rating: String,
    pub route_type: String,
    pub style: String,
    pub lead_style: String,
}

impl TickRecord {
    /// Returns `None` when the date field cannot be parsed.
    pub fn from_row(row: &StringRecord, columns: &Columns, row_index: usize) -> Option<Self> {
        let field = |idx: usize| row.get(idx).unwrap_or("").to_string();
        let optional = |idx: Option<usize>| idx.map(field).unwrap_or_default();
        let date = parse_date(row.get(columns.date)?)?;
        Some(Self {
            row_index,
            date,
            route: optional(columns.route),
            rating: field(columns.rating),
            route_type: field(columns.route_type),
            style: field(columns.style),
            lead_style: optional(columns.lead_style),
        })
    }

    fn style_text(&self) -> String {
        if self.lead_style.is_empty() {
            self.style.clone()
        } else {
            format!("{} {}", self.style, self.lead_style)
        }
    }
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlottedPoint {
    pub date: NaiveDate,
    pub route_type: RouteType,
    pub grade: String,
    /// `None` when the grade is not in the discipline's scale. Such points
    /// count towards the discipline but are left off rank-based plots.
    pub grade_rank: Option<usize>,
    pub protection: Option<ProtectionRating>,
    pub send_style: Option<SendStyle>,
    pub ascent_style: Option<AscentStyle>,
    pub route: String,
    pub row_index: usize,
}

impl PlottedPoint {
    pub fn is_send(&self) -> bool {
        self.send_style.is_some()
    }

    pub fn is_ranked(&self) -> bool {
        self.grade_rank.is_some()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestStats {
    pub total_rows: usize,
    /// Rows dropped for an unparseable date or an unreadable record.
    pub skipped_rows: usize,
    pub unknown_route_type: usize,
    /// Rows dropped because `Params::sends_only` is set and no send style matched.
    pub not_sends: usize,
    /// Bucketed rows whose grade has no rank.
    pub unranked: usize,
}

impl IngestStats {
    pub fn excluded(&self) -> usize {
        self.skipped_rows + self.unknown_route_type + self.not_sends
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChartDataset {
    pub series: BTreeMap<RouteType, Vec<PlottedPoint>>,
    pub stats: IngestStats,
}

impl Default for ChartDataset {
    fn default() -> Self {
        Self {
            series: RouteType::ALL.into_iter().map(|rt| (rt, Vec::new())).collect(),
            stats: IngestStats::default(),
        }
    }
}

impl ChartDataset {
    pub fn points(&self, route_type: RouteType) -> &[PlottedPoint] {
        self.series
            .get(&route_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Points carrying a grade rank, in date order.
    pub fn plottable(&self, route_type: RouteType) -> impl Iterator<Item = &PlottedPoint> + '_ {
        self.points(route_type).iter().filter(|p| p.is_ranked())
    }

    pub fn row_count(&self, route_type: RouteType) -> usize {
        self.points(route_type).len()
    }

    pub fn bucketed(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }
}

/// Preprocess with default parameters.
pub fn preprocess(raw: &str, catalog: &Catalog) -> Result<ChartDataset, TickError> {
    preprocess_with(raw, catalog, &Params::default())
}

/// Parse a tick export and bucket its rows by discipline. Only a missing or
/// unusable header is an error; bad rows are counted in `IngestStats`.
/// `Params::case_insensitive_route_types` relaxes route-type matching on top
/// of whatever the catalog already allows.
pub fn preprocess_with(
    raw: &str,
    catalog: &Catalog,
    params: &Params,
) -> Result<ChartDataset, TickError> {
    let relaxed;
    let catalog = if params.case_insensitive_route_types && !catalog.case_insensitive {
        relaxed = catalog.clone().with_case_insensitive(true);
        &relaxed
    } else {
        catalog
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Fields)
        .from_reader(raw.as_bytes());

    let header = reader
        .headers()
        .map_err(|e| TickError::Csv(e.to_string()))?
        .clone();
    let columns = Columns::from_header(&header)?;

    let mut dataset = ChartDataset::default();
    let mut row = StringRecord::new();
    let mut row_index = 0usize;
    loop {
        match reader.read_record(&mut row) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => {
                // The reader resynchronises on the next line; count and carry on.
                warn!("row {}: unreadable record: {}", row_index, err);
                dataset.stats.total_rows += 1;
                dataset.stats.skipped_rows += 1;
                row_index += 1;
                continue;
            }
        }
        dataset.stats.total_rows += 1;
        let current = row_index;
        row_index += 1;

        let Some(tick) = TickRecord::from_row(&row, &columns, current) else {
            debug!("row {}: unparseable date, skipping", current);
            dataset.stats.skipped_rows += 1;
            continue;
        };

        let Some(point) = plot_tick(&tick, catalog, params) else {
            debug!("row {}: unknown route type '{}'", current, tick.route_type);
            dataset.stats.unknown_route_type += 1;
            continue;
        };

        if params.sends_only && !point.is_send() {
            dataset.stats.not_sends += 1;
            continue;
        }
        if !point.is_ranked() {
            debug!("row {}: grade '{}' has no rank", current, point.grade);
            dataset.stats.unranked += 1;
        }
        dataset
            .series
            .entry(point.route_type)
            .or_default()
            .push(point);
    }

    for points in dataset.series.values_mut() {
        // Stable: equal dates keep export order.
        points.sort_by_key(|p| p.date);
    }

    debug!(
        "preprocessed {} rows: {} bucketed, {} skipped, {} unknown type, {} unranked",
        dataset.stats.total_rows,
        dataset.bucketed(),
        dataset.stats.skipped_rows,
        dataset.stats.unknown_route_type,
        dataset.stats.unranked
    );
    Ok(dataset)
}

/// Map one tick onto the catalog. `None` means the route type is unknown.
pub fn plot_tick(tick: &TickRecord, catalog: &Catalog, params: &Params) -> Option<PlottedPoint> {
    let route_type = catalog.normalize_route_type(&tick.route_type)?;
    let (grade, protection) = if params.strip_protection {
        split_rating(&tick.rating)
    } else {
        (tick.rating.trim(), None)
    };
    let style = tick.style_text();
    Some(PlottedPoint {
        date: tick.date,
        route_type,
        grade: grade.to_string(),
        grade_rank: catalog.rank_for(route_type, grade),
        protection,
        send_style: catalog.classify_send_style(&style),
        ascent_style: catalog.classify_ascent_style(&style),
        route: tick.route.clone(),
        row_index: tick.row_index,
    })
}
