use std::collections::BTreeMap;
use std::fs;
use std::fs::File;
use std::io::{self, Write};
use std::panic;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, NaiveDate};
use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};
use plotters::prelude::*;
use rayon::prelude::*;
use tick_chart::progression::running_best;
use tick_chart::{
    plot_tick, preprocess_with, Catalog, ChartDataset, Columns, GradeScale, Params, PlottedPoint,
    RouteType, SendStyle, TickRecord,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_DISCIPLINES: [RouteType; 3] = [RouteType::Boulder, RouteType::Sport, RouteType::Trad];

#[derive(Parser, Debug)]
#[command(author, version, about = "Climbing tick export charts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build per-discipline series and charts from one or more tick exports
    Chart(ChartArgs),
    /// Report how the rows of tick exports map onto the grade and route-type tables
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct ChartArgs {
    /// Tick export CSV files
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    inputs: Vec<PathBuf>,

    /// Output directory (`-` writes CSV rows to stdout and skips charts)
    #[arg(short, long, default_value = ".", value_hint = ValueHint::DirPath)]
    output_dir: PathBuf,

    /// Disciplines to write and chart (comma separated, e.g. boulder,sport,tr)
    #[arg(long)]
    disciplines: Option<String>,

    /// Chart image format
    #[arg(long, value_enum, default_value_t = ChartKind::Png)]
    format: ChartKind,

    /// Disable chart rendering
    #[arg(long, action = ArgAction::SetTrue)]
    no_plot: bool,

    /// Also write the full dataset as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Optional JSON file holding preprocessing parameters
    #[arg(long, value_hint = ValueHint::FilePath)]
    params: Option<PathBuf>,

    /// Match route types ignoring case
    #[arg(long, action = ArgAction::SetTrue)]
    case_insensitive: bool,

    /// Keep protection suffixes (PG13/R/X) in the grade label
    #[arg(long, action = ArgAction::SetTrue)]
    keep_protection: bool,

    /// Drop ticks without an onsight/flash/redpoint style
    #[arg(long, action = ArgAction::SetTrue)]
    sends_only: bool,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Profile major stages with timings
    #[arg(long, action = ArgAction::SetTrue)]
    profile: bool,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Tick export CSV files
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    inputs: Vec<PathBuf>,

    /// Output report path (`-` for stdout)
    #[arg(short, long, default_value = "tick_report.txt", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Match route types ignoring case
    #[arg(long, action = ArgAction::SetTrue)]
    case_insensitive: bool,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ChartKind {
    Png,
    Svg,
}

impl ChartKind {
    fn extension(self) -> &'static str {
        match self {
            ChartKind::Png => "png",
            ChartKind::Svg => "svg",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = match &cli.command {
        Command::Chart(args) => args.verbose,
        Command::Inspect(args) => args.verbose,
    };
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Chart(args) => handle_chart(args),
        Command::Inspect(args) => handle_inspect(args),
    }
}

fn resolve_params(args: &ChartArgs) -> Result<Params> {
    let mut params = match args.params.as_ref() {
        Some(path) => load_params(path)?,
        None => Params::default(),
    };
    if args.case_insensitive {
        params.case_insensitive_route_types = true;
    }
    if args.keep_protection {
        params.strip_protection = false;
    }
    if args.sends_only {
        params.sends_only = true;
    }
    Ok(params)
}

fn load_params(path: &Path) -> Result<Params> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read params {}", path.display()))?;
    let params: Params = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid params file", path.display()))?;
    Ok(params)
}

fn parse_discipline_list(input: Option<&str>) -> Result<Vec<RouteType>> {
    let Some(input) = input else {
        return Ok(DEFAULT_DISCIPLINES.to_vec());
    };
    let mut out = Vec::new();
    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            continue;
        }
        let route_type: RouteType = trimmed.parse()?;
        if !out.contains(&route_type) {
            out.push(route_type);
        }
    }
    if out.is_empty() {
        return Err(anyhow!("--disciplines list was empty"));
    }
    Ok(out)
}

fn discipline_slug(route_type: RouteType) -> &'static str {
    match route_type {
        RouteType::Boulder => "boulder",
        RouteType::Sport => "sport",
        RouteType::Trad => "trad",
        RouteType::TopRope => "toprope",
        RouteType::Alpine => "alpine",
    }
}

fn input_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("ticks")
        .to_string()
}

fn output_path(dir: &Path, stem: &str, suffix: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}_{}.{}", stem, suffix, extension))
}

fn check_chart_args(args: &ChartArgs) -> Result<()> {
    if args.output_dir.as_os_str() == "-" && args.json {
        return Err(anyhow!("--json needs an output directory, not `-`"));
    }
    Ok(())
}

fn handle_chart(args: ChartArgs) -> Result<()> {
    check_chart_args(&args)?;
    let params = resolve_params(&args)?;
    let disciplines = parse_discipline_list(args.disciplines.as_deref())?;
    let catalog = params.catalog();
    let to_stdout = args.output_dir.as_os_str() == "-";
    if !to_stdout {
        fs::create_dir_all(&args.output_dir)
            .with_context(|| format!("failed to create {}", args.output_dir.display()))?;
    }

    // Each export is independent; the catalog is shared read-only.
    let t_parse = Instant::now();
    let inputs: Vec<(usize, PathBuf)> = args.inputs.iter().cloned().enumerate().collect();
    let mut datasets: Vec<(usize, PathBuf, ChartDataset)> = inputs
        .par_iter()
        .map(|(idx, path)| -> Result<(usize, PathBuf, ChartDataset)> {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let dataset = preprocess_with(&raw, &catalog, &params)
                .with_context(|| format!("failed to preprocess {}", path.display()))?;
            Ok((*idx, path.clone(), dataset))
        })
        .collect::<Result<Vec<_>>>()?;
    datasets.sort_by_key(|(idx, _, _)| *idx);

    if args.profile || args.verbose {
        info!(
            "Preprocess stage: {:.1} ms ({} inputs)",
            t_parse.elapsed().as_secs_f64() * 1000.0,
            datasets.len()
        );
    }

    if to_stdout {
        let stdout = io::stdout();
        let mut writer = csv::Writer::from_writer(stdout.lock());
        write_header(&mut writer)?;
        for (_, _, dataset) in &datasets {
            for &route_type in &disciplines {
                write_series_rows(dataset.points(route_type), &mut writer)?;
            }
        }
        writer.flush()?;
        return Ok(());
    }

    for (_, path, dataset) in &datasets {
        log_stats(path, dataset);
        let stem = input_stem(path);

        for &route_type in &disciplines {
            let csv_path = output_path(&args.output_dir, &stem, discipline_slug(route_type), "csv");
            write_series_csv(dataset.points(route_type), &csv_path)?;
            debug!("Wrote {} rows: {}", route_type, csv_path.display());
        }
        info!(
            "Wrote {} discipline CSVs for {}",
            disciplines.len(),
            path.display()
        );

        if args.json {
            let json_path = output_path(&args.output_dir, &stem, "dataset", "json");
            let text = serde_json::to_string_pretty(dataset)?;
            fs::write(&json_path, text)
                .with_context(|| format!("failed to write {}", json_path.display()))?;
            info!("Wrote dataset JSON: {}", json_path.display());
        }

        if args.no_plot {
            continue;
        }
        let t_plot = Instant::now();
        for &route_type in &disciplines {
            let chart_path = output_path(
                &args.output_dir,
                &stem,
                discipline_slug(route_type),
                args.format.extension(),
            );
            let scale = catalog.scale_for(route_type);
            let title = format!("{} sends", route_type);
            if let Err(err) = render_chart_guard(
                dataset.points(route_type),
                scale,
                &title,
                &chart_path,
                args.format,
            ) {
                warn!("Skipping chart ({}): {}", chart_path.display(), err);
            } else {
                info!("Wrote chart: {}", chart_path.display());
            }
        }
        if args.profile || args.verbose {
            info!(
                "Plot stage: {:.1} ms",
                t_plot.elapsed().as_secs_f64() * 1000.0
            );
        }
    }

    Ok(())
}

fn log_stats(path: &Path, dataset: &ChartDataset) {
    let stats = &dataset.stats;
    info!(
        "{}: {} rows, {} bucketed, {} unranked",
        path.display(),
        stats.total_rows,
        dataset.bucketed(),
        stats.unranked
    );
    if stats.skipped_rows > 0 {
        warn!(
            "{}: skipped {} rows with unreadable dates",
            path.display(),
            stats.skipped_rows
        );
    }
    if stats.unknown_route_type > 0 {
        info!(
            "{}: {} rows with unknown route types left out",
            path.display(),
            stats.unknown_route_type
        );
    }
}

fn write_series_csv(points: &[PlottedPoint], path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    write_header(&mut writer)?;
    write_series_rows(points, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn write_header<W: Write>(writer: &mut csv::Writer<W>) -> Result<()> {
    writer.write_record([
        "discipline",
        "date",
        "route",
        "grade",
        "grade_rank",
        "protection",
        "send_style",
        "ascent_style",
        "best_rank",
    ])?;
    Ok(())
}

fn write_series_rows<W: Write>(points: &[PlottedPoint], writer: &mut csv::Writer<W>) -> Result<()> {
    // running_best yields one entry per ranked send, in the same order.
    let mut best = running_best(points).into_iter();
    for point in points {
        let best_rank = if point.is_send() && point.is_ranked() {
            best.next().map(|p| p.rank.to_string()).unwrap_or_default()
        } else {
            String::new()
        };
        writer.write_record([
            point.route_type.label().to_string(),
            point.date.format("%Y-%m-%d").to_string(),
            point.route.clone(),
            point.grade.clone(),
            point.grade_rank.map(|r| r.to_string()).unwrap_or_default(),
            point.protection.map(|p| p.label().to_string()).unwrap_or_default(),
            point.send_style.map(|s| s.label().to_string()).unwrap_or_default(),
            point.ascent_style.map(|s| s.label().to_string()).unwrap_or_default(),
            best_rank,
        ])?;
    }
    Ok(())
}

fn render_chart_guard(
    points: &[PlottedPoint],
    scale: &GradeScale,
    title: &str,
    path: &Path,
    kind: ChartKind,
) -> Result<()> {
    let render = || -> Result<()> {
        match kind {
            ChartKind::Png => {
                let root = BitMapBackend::new(path, (1200, 700)).into_drawing_area();
                draw_discipline_chart(root, points, scale, title)
            }
            ChartKind::Svg => {
                let root = SVGBackend::new(path, (1200, 700)).into_drawing_area();
                draw_discipline_chart(root, points, scale, title)
            }
        }
    };
    // Font lookup inside plotters can panic on hosts without system fonts.
    panic::catch_unwind(panic::AssertUnwindSafe(render))
        .map_err(|_| anyhow!("chart backend panicked"))?
}

fn send_color(style: Option<SendStyle>) -> RGBColor {
    match style {
        Some(SendStyle::Onsight) => RGBColor(0, 150, 80),
        Some(SendStyle::Flash) => RGBColor(240, 160, 0),
        Some(SendStyle::Redpoint) => RGBColor(200, 0, 100),
        None => RGBColor(160, 160, 160),
    }
}

/// Axis extents: (first date, day span, min rank, max rank).
fn chart_bounds(points: &[PlottedPoint]) -> Option<(NaiveDate, f64, usize, usize)> {
    let mut ranked = points
        .iter()
        .filter_map(|p| Some((p.date, p.grade_rank?)));
    let (first_date, first_rank) = ranked.next()?;
    let (mut last_date, mut lo, mut hi) = (first_date, first_rank, first_rank);
    for (date, rank) in ranked {
        last_date = last_date.max(date);
        lo = lo.min(rank);
        hi = hi.max(rank);
    }
    let span = (last_date - first_date).num_days().max(1) as f64;
    Some((first_date, span, lo, hi))
}

fn draw_discipline_chart<DB>(
    root: DrawingArea<DB, plotters::coord::Shift>,
    points: &[PlottedPoint],
    scale: &GradeScale,
    title: &str,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    // An empty discipline still gets a chart, just without series.
    let (start, span, lo, hi) = chart_bounds(points).unwrap_or_else(|| {
        let today = points
            .first()
            .map(|p| p.date)
            .unwrap_or_else(|| chrono::Utc::now().date_naive());
        (today, 1.0, 0, scale.len().saturating_sub(1).min(10))
    });
    let y_min = lo.saturating_sub(1) as f64;
    let y_max = (hi + 1) as f64;
    let x_max = span + 1.0;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26).into_font())
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(-1.0..x_max, y_min..y_max)?;

    let date_label = |v: &f64| (start + Duration::days(v.round() as i64)).format("%Y-%m-%d").to_string();
    let grade_label = |v: &f64| {
        if v.fract().abs() > 1e-6 || *v < 0.0 {
            return String::new();
        }
        scale.label(*v as usize).unwrap_or("").to_string()
    };
    chart
        .configure_mesh()
        .light_line_style(&TRANSPARENT)
        .x_labels(8)
        .y_labels((hi + 2 - lo.saturating_sub(1)).min(30))
        .x_label_formatter(&date_label)
        .y_label_formatter(&grade_label)
        .label_style(("sans-serif", 16).into_font().color(&BLACK.mix(0.85)))
        .draw()?;

    let day_offset = |date: NaiveDate| (date - start).num_days() as f64;

    chart.draw_series(points.iter().filter_map(|p| {
        let rank = p.grade_rank?;
        let size = if p.is_send() { 5 } else { 3 };
        Some(Circle::new(
            (day_offset(p.date), rank as f64),
            size,
            send_color(p.send_style).filled(),
        ))
    }))?;

    let best = running_best(points);
    if !best.is_empty() {
        let line_color = RGBColor(50, 50, 50);
        chart
            .draw_series(LineSeries::new(
                best.iter().map(|p| (day_offset(p.date), p.rank as f64)),
                ShapeStyle {
                    color: line_color.to_rgba(),
                    filled: false,
                    stroke_width: 2,
                },
            ))?
            .label("Hardest send")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], line_color));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.7))
            .border_style(&BLACK.mix(0.3))
            .position(SeriesLabelPosition::UpperLeft)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

#[derive(Default)]
struct InspectSummary {
    rows: usize,
    bad_dates: usize,
    per_discipline: BTreeMap<RouteType, usize>,
    unknown_types: BTreeMap<String, usize>,
    unknown_grades: BTreeMap<String, usize>,
    send_styles: BTreeMap<String, usize>,
}

fn inspect_export(raw: &str, catalog: &Catalog) -> Result<(Vec<String>, InspectSummary)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Fields)
        .from_reader(raw.as_bytes());
    let header = reader.headers()?.clone();
    let columns = Columns::from_header(&header)?;
    let names: Vec<String> = header.iter().map(str::to_string).collect();
    let params = Params::default();

    let mut summary = InspectSummary::default();
    for (row_index, record) in reader.records().enumerate() {
        summary.rows += 1;
        let Ok(record) = record else {
            summary.bad_dates += 1;
            continue;
        };
        let Some(tick) = TickRecord::from_row(&record, &columns, row_index) else {
            summary.bad_dates += 1;
            continue;
        };
        let Some(point) = plot_tick(&tick, catalog, &params) else {
            *summary.unknown_types.entry(tick.route_type.clone()).or_insert(0) += 1;
            continue;
        };
        *summary.per_discipline.entry(point.route_type).or_insert(0) += 1;
        if !point.is_ranked() {
            *summary
                .unknown_grades
                .entry(format!("{} ({})", point.grade, point.route_type))
                .or_insert(0) += 1;
        }
        let style = point
            .send_style
            .map(|s| s.label().to_string())
            .unwrap_or_else(|| "(none)".to_string());
        *summary.send_styles.entry(style).or_insert(0) += 1;
    }
    Ok((names, summary))
}

fn push_counts(report: &mut String, title: &str, counts: &BTreeMap<String, usize>, limit: usize) {
    if counts.is_empty() {
        return;
    }
    report.push_str(&format!("  {}:\n", title));
    let mut entries: Vec<_> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (label, count) in entries.into_iter().take(limit) {
        report.push_str(&format!("    - {:?}: {}\n", label, count));
    }
}

fn handle_inspect(args: InspectArgs) -> Result<()> {
    let catalog = Catalog::default().with_case_insensitive(args.case_insensitive);
    let mut report = String::new();

    for path in &args.inputs {
        let raw =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let (columns, summary) = inspect_export(&raw, &catalog)
            .with_context(|| format!("failed to inspect {}", path.display()))?;

        report.push_str(&format!("FILE: {}\n", path.display()));
        report.push_str(&format!("  columns: {}\n", columns.join(" | ")));
        report.push_str(&format!("  rows: {}\n", summary.rows));
        report.push_str(&format!("  unreadable_dates: {}\n", summary.bad_dates));
        report.push_str("  disciplines:\n");
        for route_type in RouteType::ALL {
            let count = summary.per_discipline.get(&route_type).copied().unwrap_or(0);
            report.push_str(&format!("    - {}: {}\n", route_type, count));
        }
        push_counts(&mut report, "unknown_route_types", &summary.unknown_types, 25);
        push_counts(&mut report, "unranked_grades", &summary.unknown_grades, 25);
        push_counts(&mut report, "send_styles", &summary.send_styles, 10);
        report.push('\n');
    }

    if args.output.as_os_str() == "-" {
        io::stdout().write_all(report.as_bytes())?;
    } else {
        fs::write(&args.output, report)
            .with_context(|| format!("failed to write {}", args.output.display()))?;
        info!("Inspection report written: {}", args.output.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tick_chart::preprocess;

    const EXPORT: &str = "Date,Route,Rating,Route Type,Style,Lead Style\n\
                          2022-05-01,Warmup,5.9,Sport,Lead,Onsight\n\
                          2022-05-01,Project,5.11a,Sport,Lead,Fell/Hung\n\
                          2022-05-03,Project,5.11a,Sport,Lead,Redpoint\n\
                          2022-05-04,Mystery,5.c9,Sport,Lead,Redpoint\n\
                          2022-05-04,Blob,V2,Boulder,Flash,\n\
                          oops,Nothing,5.8,Trad,Lead,Onsight\n\
                          2022-05-05,Couloir,5.6,Snow,Lead,Onsight\n";

    #[test]
    fn test_parse_discipline_list() {
        assert_eq!(parse_discipline_list(None).unwrap(), DEFAULT_DISCIPLINES.to_vec());
        assert_eq!(
            parse_discipline_list(Some("tr, boulder,,TR")).unwrap(),
            vec![RouteType::TopRope, RouteType::Boulder]
        );
        assert!(parse_discipline_list(Some(" , ")).is_err());
        assert!(parse_discipline_list(Some("sport,ice")).is_err());
    }

    #[test]
    fn test_stdout_output_rejects_json() {
        let args = ChartArgs::parse_from(["chart", "ticks.csv", "-o", "-", "--json"]);
        assert!(check_chart_args(&args).is_err());
        let args = ChartArgs::parse_from(["chart", "ticks.csv", "-o", "-"]);
        assert!(check_chart_args(&args).is_ok());
        let args = ChartArgs::parse_from(["chart", "ticks.csv", "-o", "out", "--json"]);
        assert!(check_chart_args(&args).is_ok());
    }

    #[test]
    fn test_output_naming() {
        let dir = Path::new("out");
        assert_eq!(input_stem(Path::new("exports/ticks-2023.csv")), "ticks-2023");
        assert_eq!(
            output_path(dir, "ticks", discipline_slug(RouteType::TopRope), "png"),
            PathBuf::from("out/ticks_toprope.png")
        );
    }

    #[test]
    fn test_series_rows_carry_running_best() {
        let dataset = preprocess(EXPORT, &Catalog::default()).unwrap();
        let mut writer = csv::Writer::from_writer(Vec::new());
        write_header(&mut writer).unwrap();
        write_series_rows(dataset.points(RouteType::Sport), &mut writer).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        let rank_59 = tick_chart::YDS.rank_of("5.9").unwrap();
        let rank_11a = tick_chart::YDS.rank_of("5.11a").unwrap();
        assert!(lines[1].ends_with(&format!(",Onsight,Lead,{}", rank_59)));
        assert!(lines[2].ends_with(",Lead,"));
        assert!(lines[3].ends_with(&format!(",Redpoint,Lead,{}", rank_11a)));
        assert!(lines[4].contains(",5.c9,,"));
    }

    #[test]
    fn test_chart_bounds() {
        let dataset = preprocess(EXPORT, &Catalog::default()).unwrap();
        let (start, span, lo, hi) = chart_bounds(dataset.points(RouteType::Sport)).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2022, 5, 1).unwrap());
        assert_eq!(span, 2.0);
        assert_eq!(lo, tick_chart::YDS.rank_of("5.9").unwrap());
        assert_eq!(hi, tick_chart::YDS.rank_of("5.11a").unwrap());
        assert!(chart_bounds(dataset.points(RouteType::Trad)).is_none());
    }

    #[test]
    fn test_inspect_export() {
        let (columns, summary) = inspect_export(EXPORT, &Catalog::default()).unwrap();
        assert_eq!(columns.len(), 6);
        assert_eq!(summary.rows, 7);
        assert_eq!(summary.bad_dates, 1);
        assert_eq!(summary.per_discipline.get(&RouteType::Sport), Some(&4));
        assert_eq!(summary.per_discipline.get(&RouteType::Boulder), Some(&1));
        assert_eq!(summary.unknown_types.get("Snow"), Some(&1));
        assert_eq!(summary.unknown_grades.get("5.c9 (Sport)"), Some(&1));
        assert_eq!(summary.send_styles.get("(none)"), Some(&1));
    }

    #[test]
    fn test_load_params_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        fs::write(&path, r#"{"sends_only": true}"#).unwrap();
        let loaded = load_params(&path).unwrap();
        assert!(loaded.sends_only);
        assert!(loaded.strip_protection);

        let args = ChartArgs::parse_from([
            "chart",
            "ticks.csv",
            "--params",
            path.to_str().unwrap(),
            "--keep-protection",
        ]);
        let params = resolve_params(&args).unwrap();
        assert!(params.sends_only);
        assert!(!params.strip_protection);
        assert!(!params.case_insensitive_route_types);
    }

    #[test]
    fn test_series_csv_written_per_discipline() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = preprocess(EXPORT, &Catalog::default()).unwrap();
        let path = output_path(dir.path(), "ticks", discipline_slug(RouteType::Trad), "csv");
        write_series_csv(dataset.points(RouteType::Trad), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("discipline,date,route"));
    }
}
