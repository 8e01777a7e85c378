use crate::error::Result;
use crate::gpx_input::{events, load_route, read_gpx};
use crate::settings::{Command, Metric, RoutePair, Settings};
use kp_lib::{
    CompareConfig, Comparator, EllipsoidalDistance, GeodesicDistance, HaversineDistance,
    PlanarDistance, RouteModel, RouteTranslator, TranslationResult,
};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Run the requested command with the selected distance metric
pub fn run(settings: &Settings) -> Result<()> {
    match settings.metric {
        Metric::Planar => run_with(settings, PlanarDistance),
        Metric::Haversine => run_with(settings, HaversineDistance),
        Metric::Geodesic => run_with(settings, EllipsoidalDistance),
    }
}

fn run_with<D: GeodesicDistance + Clone>(settings: &Settings, distance: D) -> Result<()> {
    let output = settings.output.as_deref();
    match &settings.command {
        Command::Compare {
            routes,
            threshold_deg,
            sequential,
        } => {
            let source_gpx = read_gpx(&routes.source)?;
            let target_gpx = read_gpx(&routes.target)?;
            let (source, target) = load_pair(routes, &source_gpx, &target_gpx, distance)?;

            let config = CompareConfig {
                alter_course_threshold_deg: *threshold_deg,
                parallel: !sequential,
            };
            let report = Comparator::new(&source, &target, config)?
                .compare(events(&source_gpx), events(&target_gpx))?;
            write_json(&report, output)
        }
        Command::Translate { routes, kp } => {
            let source_gpx = read_gpx(&routes.source)?;
            let target_gpx = read_gpx(&routes.target)?;
            let (source, target) = load_pair(routes, &source_gpx, &target_gpx, distance)?;

            let translator = RouteTranslator::new(&source, &target)?;
            let results = translate_reporting_failures(&translator, kp);
            write_json(&results, output)
        }
        Command::Project { route, point } => {
            let gpx = read_gpx(route)?;
            let route = load_route(route, &gpx, distance, None)?;
            let projections: Vec<_> = point.iter().map(|&p| route.project(p)).collect();
            write_json(&projections, output)
        }
        Command::Markers { route, interval } => {
            let gpx = read_gpx(route)?;
            let route = load_route(route, &gpx, distance, None)?;
            let markers = route.kp_markers(*interval)?;
            tracing::info!("Placed {} marker(s) every {interval} m", markers.len());
            write_json(&markers, output)
        }
    }
}

fn load_pair<D: GeodesicDistance + Clone>(
    routes: &RoutePair,
    source_gpx: &gpx::Gpx,
    target_gpx: &gpx::Gpx,
    distance: D,
) -> Result<(RouteModel<D>, RouteModel<D>)> {
    let source = load_route(
        &routes.source,
        source_gpx,
        distance.clone(),
        routes.source_frame.as_deref(),
    )?;
    let target = load_route(
        &routes.target,
        target_gpx,
        distance,
        routes.target_frame.as_deref(),
    )?;
    Ok((source, target))
}

/// Translate every value, logging and dropping the ones outside the source route
fn translate_reporting_failures<D: GeodesicDistance>(
    translator: &RouteTranslator<'_, D>,
    kps: &[f64],
) -> Vec<TranslationResult> {
    kps.iter()
        .zip(translator.translate_all(kps))
        .filter_map(|(kp, result)| match result {
            Ok(translation) => Some(translation),
            Err(e) => {
                tracing::warn!("Skipping KP {kp}: {e}");
                None
            }
        })
        .collect()
}

/// Write a value as pretty JSON to a file, or to stdout if no file is given
fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            let mut writer = std::io::BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
            tracing::info!("Wrote {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, value)?;
            writeln!(lock)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;

    fn route(points: &[(f64, f64)]) -> RouteModel<PlanarDistance> {
        let part: Vec<Coord<f64>> = points.iter().map(|&(x, y)| Coord { x, y }).collect();
        RouteModel::new(vec![part], PlanarDistance).unwrap()
    }

    #[test]
    fn test_translate_skips_out_of_range() {
        let source = route(&[(0.0, 0.0), (100.0, 0.0)]);
        let target = route(&[(0.0, 2.0), (100.0, 2.0)]);
        let translator = RouteTranslator::new(&source, &target).unwrap();

        let results = translate_reporting_failures(&translator, &[10.0, -5.0, 150.0, 90.0]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source_kp, 10.0);
        assert_eq!(results[1].source_kp, 90.0);
        assert!((results[1].spatial_offset_m - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_write_json_to_file() {
        let path =
            std::env::temp_dir().join(format!("kp-compare-test-{}.json", std::process::id()));
        let markers = route(&[(0.0, 0.0), (25.0, 0.0)]).kp_markers(10.0).unwrap();

        write_json(&markers, Some(&path)).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        let array = written.as_array().unwrap();
        assert_eq!(array.len(), markers.len());
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["kp"], serde_json::json!(10.0));
        assert_eq!(array[1]["reverse_kp"], serde_json::json!(5.0));
    }
}
