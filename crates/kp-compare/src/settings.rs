use clap::{Args, Parser, Subcommand, ValueEnum};
use geo::Coord;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// KP Compare - Chainage translation and design vs. as-laid comparison of GPX routes
pub struct Settings {
    #[clap(subcommand)]
    pub command: Command,

    /// Distance metric used to measure chainage and offsets
    #[clap(long, value_enum, default_value = "geodesic", global = true)]
    pub metric: Metric,

    /// Write JSON output to this file instead of stdout
    #[clap(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Compare matching events between a design route and an as-laid route
    Compare {
        #[clap(flatten)]
        routes: RoutePair,

        /// Minimum heading change for a vertex to count as an alter course
        #[clap(long, default_value = "2.0")]
        threshold_deg: f64,

        /// Compute offsets on a single thread
        #[clap(long, default_value = "false")]
        sequential: bool,
    },
    /// Translate chainage values from the source route onto the target route
    Translate {
        #[clap(flatten)]
        routes: RoutePair,

        /// Source chainage values, in meters
        #[clap(long, required = true, num_args = 1.., allow_negative_numbers = true)]
        kp: Vec<f64>,
    },
    /// Project points onto a route
    Project {
        /// GPX file holding the route
        #[clap(long, value_name = "FILE")]
        route: PathBuf,

        /// Points as `x,y` (longitude,latitude for GPX routes)
        #[clap(
            long,
            required = true,
            num_args = 1..,
            allow_hyphen_values = true,
            value_parser = parse_coord
        )]
        point: Vec<Coord<f64>>,
    },
    /// Place regularly spaced KP markers along a route
    Markers {
        /// GPX file holding the route
        #[clap(long, value_name = "FILE")]
        route: PathBuf,

        /// Spacing between markers, in meters
        #[clap(long, default_value = "1000.0")]
        interval: f64,
    },
}

/// Source and target GPX files with optional reference frame tags
#[derive(Args, Debug, Clone)]
pub struct RoutePair {
    /// Source (design) GPX file
    #[clap(long, value_name = "FILE")]
    pub source: PathBuf,

    /// Target (as-laid) GPX file
    #[clap(long, value_name = "FILE")]
    pub target: PathBuf,

    /// Reference frame tag of the source route, e.g. EPSG:4326
    #[clap(long)]
    pub source_frame: Option<String>,

    /// Reference frame tag of the target route
    #[clap(long)]
    pub target_frame: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Euclidean distance in the units of the input coordinates
    Planar,
    /// Great-circle distance on a sphere, for lon/lat degrees
    Haversine,
    /// Distance on the WGS84 ellipsoid, for lon/lat degrees
    Geodesic,
}

/// Parse a coordinate written as `x,y`
pub fn parse_coord(s: &str) -> Result<Coord<f64>, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{s}`"))?;
    let x: f64 = x
        .trim()
        .parse()
        .map_err(|e| format!("invalid x in `{s}`: {e}"))?;
    let y: f64 = y
        .trim()
        .parse()
        .map_err(|e| format!("invalid y in `{s}`: {e}"))?;
    Ok(Coord { x, y })
}

impl Settings {
    /// Default log filter for the requested verbosity
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coord() {
        assert_eq!(parse_coord("1.5,-2").unwrap(), Coord { x: 1.5, y: -2.0 });
        assert_eq!(parse_coord(" -0.1 , 51.5 ").unwrap(), Coord { x: -0.1, y: 51.5 });
        assert!(parse_coord("1.5").is_err());
        assert!(parse_coord("a,2").is_err());
        assert!(parse_coord("1,b").is_err());
    }

    #[test]
    fn test_compare_defaults() {
        let settings = Settings::try_parse_from([
            "kp-compare",
            "compare",
            "--source",
            "a.gpx",
            "--target",
            "b.gpx",
        ])
        .unwrap();

        assert_eq!(settings.metric, Metric::Geodesic);
        assert_eq!(settings.verbose, 0);
        assert!(settings.output.is_none());
        match settings.command {
            Command::Compare {
                routes,
                threshold_deg,
                sequential,
            } => {
                assert_eq!(routes.source, PathBuf::from("a.gpx"));
                assert_eq!(routes.target, PathBuf::from("b.gpx"));
                assert!(routes.source_frame.is_none());
                assert_eq!(threshold_deg, 2.0);
                assert!(!sequential);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_translate_args() {
        let settings = Settings::try_parse_from([
            "kp-compare",
            "translate",
            "--source",
            "a.gpx",
            "--target",
            "b.gpx",
            "--source-frame",
            "EPSG:4326",
            "--metric",
            "planar",
            "-vv",
            "--kp",
            "0",
            "1500.5",
        ])
        .unwrap();

        assert_eq!(settings.metric, Metric::Planar);
        assert_eq!(settings.log_filter(), "trace");
        match settings.command {
            Command::Translate { routes, kp } => {
                assert_eq!(routes.source_frame.as_deref(), Some("EPSG:4326"));
                assert_eq!(kp, vec![0.0, 1500.5]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_project_points() {
        let settings = Settings::try_parse_from([
            "kp-compare",
            "project",
            "--route",
            "r.gpx",
            "--point",
            "-0.1,51.5",
            "2,3",
        ])
        .unwrap();

        match settings.command {
            Command::Project { point, .. } => {
                assert_eq!(point, vec![Coord { x: -0.1, y: 51.5 }, Coord { x: 2.0, y: 3.0 }]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_args() {
        assert!(
            Settings::try_parse_from(["kp-compare", "translate", "--source", "a.gpx"]).is_err()
        );
        assert!(Settings::try_parse_from(["kp-compare", "project", "--route", "r.gpx"]).is_err());
    }
}
