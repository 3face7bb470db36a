//! # Springcalc CLI
//!
//! Command-line front end for `spring_core`: list wire materials, solve a
//! spring from known values, and run the force, stress and verification
//! checks on the result.
//!
//! ```bash
//! spring_cli solve --variant compression --ending closed-ground --fixing fix-pivot \
//!     --material A227 -p d=1 -p DE=10 -p Nt=8 -p Lo=20 --force 10 --cycles 1e6
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, warn};

use spring_core::calculations::{
    BucklingCheck, FatigueCheck, ForceResult, IndexCheck, Load, LocationRating, StressInput,
    StressRating, StressResult, DEFAULT_FATIGUE_CYCLES,
};
use spring_core::config::{DEFAULT_DEADLINE_SECS, DEFAULT_MATERIAL};
use spring_core::equations::Equation;
use spring_core::params::HookGeometry;
use spring_core::{
    MaterialDb, MaterialProvider, ParamName, SolveStatus, Spring, SpringConfig, SpringError,
    SpringResult, SpringSummary, StressLocation, Variant,
};

#[derive(Parser)]
#[command(name = "spring_cli")]
#[command(about = "Springcalc CLI - Helical spring calculator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the wire materials in the property table
    Materials {
        /// TOML material table (defaults to the built-in table)
        #[arg(long)]
        materials: Option<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Solve a spring from known parameter values
    Solve(SolveArgs),
}

#[derive(clap::Args)]
struct SolveArgs {
    /// compression, extension or torsion
    #[arg(long, default_value = "compression")]
    variant: String,
    /// closed-ground, closed, open-ground or open
    #[arg(long, default_value = "closed-ground")]
    ending: String,
    /// fix-parallel, fix-pivot, both-pivot or hinged-free
    #[arg(long, default_value = "fix-parallel")]
    fixing: String,
    /// Wire material identifier
    #[arg(long, default_value = DEFAULT_MATERIAL)]
    material: String,
    /// TOML material table (defaults to the built-in table)
    #[arg(long)]
    materials: Option<PathBuf>,
    /// Known value as NAME=VALUE (e.g. -p d=1 -p DE=10)
    #[arg(short = 'p', long = "param")]
    params: Vec<String>,
    /// Solve deadline in seconds
    #[arg(long, default_value_t = DEFAULT_DEADLINE_SECS)]
    timeout: f64,
    /// Torsion leg length 1 (mm)
    #[arg(long, default_value_t = 0.0)]
    leg1: f64,
    /// Torsion leg length 2 (mm)
    #[arg(long, default_value_t = 0.0)]
    leg2: f64,
    /// Extension hook extra wire length La (mm)
    #[arg(long, default_value_t = 0.0)]
    hook_length: f64,
    /// Extension hook radius at A (mm, 0 = DM)
    #[arg(long, default_value_t = 0.0)]
    ra: f64,
    /// Extension hook radius at B (mm, 0 = DM)
    #[arg(long, default_value_t = 0.0)]
    rb: f64,
    /// Applied force (N, torsion: N·mm)
    #[arg(long, conflicts_with = "deflection")]
    force: Option<f64>,
    /// Applied deflection (mm, torsion: deg)
    #[arg(long)]
    deflection: Option<f64>,
    /// Target stress as a ratio of the minimum tensile strength
    #[arg(long)]
    stress: Option<f64>,
    /// Stress location for extension springs: body, hook-a or hook-b
    #[arg(long)]
    location: Option<String>,
    /// Fatigue cycle count (1e5, 1e6 or 1e7)
    #[arg(long, default_value_t = DEFAULT_FATIGUE_CYCLES)]
    cycles: f64,
    /// Also list the equations used to resolve each parameter
    #[arg(long)]
    equations: bool,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

/// Everything computed by `solve`, serialized for `--json`
#[derive(Debug, Serialize)]
struct SolveReport {
    status: SolveStatus,
    spring: SpringSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    tensile_strength_mpa: Option<f64>,
    /// Why stress and fatigue were skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    strength_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<IndexCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    buckling: Option<BucklingCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    load: Option<ForceResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stress: Option<StressResult>,
    /// Worst of `ratings`
    #[serde(skip_serializing_if = "Option::is_none")]
    rating: Option<StressRating>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ratings: Vec<LocationRating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fatigue: Option<FatigueCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    equations: Option<BTreeMap<ParamName, Equation>>,
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Materials { materials, json } => cmd_materials(materials.as_deref(), json),
        Commands::Solve(args) => cmd_solve(&args),
    };

    if let Err(e) = result {
        print_error(&e);
        std::process::exit(1);
    }
}

fn load_materials(path: Option<&Path>) -> SpringResult<MaterialDb> {
    match path {
        Some(path) => MaterialDb::load(path),
        None => MaterialDb::builtin(),
    }
}

fn cmd_materials(path: Option<&Path>, json: bool) -> SpringResult<()> {
    let db = load_materials(path)?;
    let materials = db
        .list_materials()
        .into_iter()
        .map(|id| db.lookup(&id))
        .collect::<SpringResult<Vec<_>>>()?;

    if json {
        println!("{}", to_json(&materials)?);
        return Ok(());
    }

    println!("{:<6} {:<42} {:>9} {:>9} {}", "ID", "Name", "G (MPa)", "E (MPa)", "Fatigue group");
    for m in &materials {
        println!(
            "{:<6} {:<42} {:>9.0} {:>9.0} {}",
            m.id, m.name, m.shear_modulus_mpa, m.elastic_modulus_mpa, m.fatigue_group
        );
    }
    Ok(())
}

fn build_spring(args: &SolveArgs, provider: Arc<dyn MaterialProvider>) -> SpringResult<Spring> {
    let variant = Variant::from_str_flexible(&args.variant)?;
    let config = SpringConfig::parse(&args.ending, &args.fixing, &args.material)?;

    match variant {
        Variant::Compression => Spring::compression(config, provider),
        Variant::Extension => {
            let mut spring = Spring::extension(config, provider)?;
            spring.set_hook_geometry(HookGeometry::Extension {
                la_mm: args.hook_length,
                ra_mm: args.ra,
                rb_mm: args.rb,
            })?;
            Ok(spring)
        }
        Variant::Torsion => Spring::torsion(config, provider, args.leg1, args.leg2),
    }
}

fn cmd_solve(args: &SolveArgs) -> SpringResult<()> {
    let (spring, report) = solve_report(args)?;

    if args.json {
        println!("{}", to_json(&report)?);
    } else {
        print_report(&spring, &report);
        if args.equations {
            println!();
            print!("{}", spring.equations_used().generate_report_markdown());
        }
    }
    Ok(())
}

/// Build, solve and check a spring without printing anything
fn solve_report(args: &SolveArgs) -> SpringResult<(Spring, SolveReport)> {
    let provider: Arc<dyn MaterialProvider> =
        Arc::new(load_materials(args.materials.as_deref())?);
    let mut spring = build_spring(args, provider)?;
    let location = args
        .location
        .as_deref()
        .map(StressLocation::from_str_flexible)
        .transpose()?;
    debug!(variant = %spring.variant(), known = args.params.len(), "spring configured");

    let status = spring.solve_text(args.timeout, &args.params)?;

    let mut report = SolveReport {
        status,
        spring: spring.summary(),
        tensile_strength_mpa: None,
        strength_note: None,
        index: spring.check_index().ok(),
        buckling: spring.check_buckling().ok().flatten(),
        load: None,
        stress: None,
        rating: None,
        ratings: Vec::new(),
        fatigue: None,
        equations: args.equations.then(|| spring.equations_used().sources()),
    };

    if !spring.is_solved() {
        return Ok((spring, report));
    }

    let load = match (args.force, args.deflection) {
        (Some(f), _) => Some(Load::Force(f)),
        (None, Some(x)) => Some(Load::Deflection(x)),
        (None, None) => None,
    };
    if let Some(load) = load {
        report.load = Some(spring.force_or_deflection(load)?);
    }

    match spring.tensile_strength() {
        Ok(sut) => report.tensile_strength_mpa = Some(sut),
        Err(e @ SpringError::OutOfRange { .. }) => {
            warn!(error = %e, "no tensile strength, stress and fatigue skipped");
            report.strength_note = Some(e.to_string());
            return Ok((spring, report));
        }
        Err(e) => return Err(e),
    }

    let stress_input = match (args.stress, report.load) {
        (Some(s), _) => Some(StressInput::Stress(s)),
        (None, Some(load)) => Some(StressInput::Force(load.force)),
        (None, None) => None,
    };
    if let Some(input) = stress_input {
        let stress = match location {
            Some(location) => spring.stress_at(location, input)?,
            None => spring.stress(input)?,
        };
        report.ratings = spring.rate_stress_result(&stress)?;
        report.rating = report.ratings.iter().map(|r| r.rating).max();
        report.stress = Some(stress);
    }

    report.fatigue = Some(spring.check_fatigue(args.cycles)?);
    Ok((spring, report))
}

fn print_report(spring: &Spring, report: &SolveReport) {
    let (force_unit, deflection_unit) = match spring.variant() {
        Variant::Torsion => ("N*mm", "deg"),
        _ => ("N", "mm"),
    };

    let rule = "═".repeat(39);
    println!("{}", rule);
    println!("  {}", spring.variant().display_name().to_uppercase());
    println!("{}", rule);
    println!();
    println!("Configuration:");
    println!("  Ending:   {}", spring.ending().display_name());
    println!("  Fixing:   {}", spring.fixing().display_name());
    println!("  Material: {}", spring.material());
    if let Some(sut) = report.tensile_strength_mpa {
        println!("  Sut:      {:.0} MPa", sut);
    }
    if let Some(note) = &report.strength_note {
        println!("  Sut:      unavailable ({}); stress and fatigue skipped", note);
    }
    println!();
    println!("Parameters:");
    print!("{}", spring.parameters());

    if let SolveStatus::Insufficient { unresolved } = &report.status {
        let names: Vec<&str> = unresolved.iter().map(|p| p.symbol()).collect();
        println!();
        println!("Not enough known values to resolve: {}", names.join(", "));
    }

    println!();
    println!("Checks:");
    if let Some(index) = &report.index {
        print!("  Spring index C = {:.2}: {}", index.spring_index, index.verdict.display_name());
        match index.verdict.recommendation() {
            Some(advice) => println!(" ({})", advice),
            None => println!(),
        }
    }
    if let Some(buckling) = &report.buckling {
        println!(
            "  Buckling: Lo = {:.2} mm, limit {:.2} mm (alpha {}) {}",
            buckling.free_length_mm,
            buckling.max_free_length_mm,
            buckling.alpha,
            status_icon(!buckling.buckles)
        );
    }
    if let Some(load) = &report.load {
        println!(
            "  Load: F = {:.3} {}, x = {:.3} {}{}",
            load.force,
            force_unit,
            load.deflection,
            deflection_unit,
            if load.clamped { " (clamped to solid height)" } else { "" }
        );
    }
    if let Some(stress) = &report.stress {
        println!(
            "  Stress ({}): {:.3} Sut ({:.0} MPa) at F = {:.3} {}",
            stress.location.display_name(),
            stress.ratio,
            stress.stress_mpa,
            stress.force,
            force_unit
        );
        for rating in &report.ratings {
            println!(
                "    {:<18} {:.3} Sut  {}",
                rating.location.display_name(),
                rating.ratio,
                rating.rating
            );
        }
        if let Some(rating) = report.rating {
            println!("  Rating (worst location): {}", rating);
        }
    }
    if let Some(fatigue) = &report.fatigue {
        println!();
        println!("Fatigue ({:.0e} cycles):", fatigue.cycles);
        for location in &fatigue.locations {
            println!(
                "  {:<18} allowable {:.2} Sut -> F = {:.3} {}, x = {:.3} {}",
                location.location.display_name(),
                location.allowable_ratio,
                location.safe_force,
                force_unit,
                location.safe_deflection,
                deflection_unit
            );
        }
        println!(
            "  Safe deflection: {:.3} {} (governs: {})",
            fatigue.safe_deflection,
            deflection_unit,
            fatigue.governing.display_name()
        );
        println!("  Max operating frequency: {:.0} cycles/min", fatigue.max_frequency_cpm);
        println!("  Minimum life: {:.1} min", fatigue.min_life_min);
    }
}

fn to_json<T: Serialize>(value: &T) -> SpringResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| SpringError::SerializationError {
        reason: e.to_string(),
    })
}

fn print_error(e: &SpringError) {
    eprintln!("Error: {}", e);
    if e.is_recoverable() {
        eprintln!("Retry with a larger --timeout.");
    }
    if let Ok(json) = serde_json::to_string_pretty(e) {
        eprintln!();
        eprintln!("Error JSON:");
        eprintln!("{}", json);
    }
}

fn status_icon(pass: bool) -> &'static str {
    if pass { "[OK]" } else { "[FAIL]" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spring_core::{Ending, Fixing};

    fn solve_args(extra: &[&str]) -> SolveArgs {
        let argv = ["spring_cli", "solve"].into_iter().chain(extra.iter().copied());
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Solve(args) => args,
            Commands::Materials { .. } => panic!("parsed the wrong subcommand"),
        }
    }

    fn builtin() -> Arc<dyn MaterialProvider> {
        Arc::new(MaterialDb::builtin().unwrap())
    }

    const REFERENCE: [&str; 10] = [
        "--material", "A227", "-p", "d=1", "-p", "DE=10", "-p", "Nt=8", "-p", "Lo=20",
    ];

    fn reference_with(extra: &[&str]) -> SolveArgs {
        let argv: Vec<&str> = REFERENCE.iter().chain(extra.iter()).copied().collect();
        solve_args(&argv)
    }

    #[test]
    fn test_build_compression_spring() {
        let args = solve_args(&["--ending", "open-ground", "--fixing", "hinged-free"]);
        let spring = build_spring(&args, builtin()).unwrap();
        assert_eq!(spring.variant(), Variant::Compression);
        assert_eq!(spring.ending(), Ending::OpenGround);
        assert_eq!(spring.fixing(), Fixing::HingedFree);
        assert_eq!(spring.hooks(), HookGeometry::None);
    }

    #[test]
    fn test_build_extension_spring_is_pinned() {
        let args = solve_args(&["--variant", "ext", "--hook-length", "12.5", "--ra", "4"]);
        let spring = build_spring(&args, builtin()).unwrap();
        assert_eq!(spring.variant(), Variant::Extension);
        assert_eq!((spring.ending(), spring.fixing()), (Ending::Open, Fixing::BothPivot));
        assert_eq!(
            spring.hooks(),
            HookGeometry::Extension { la_mm: 12.5, ra_mm: 4.0, rb_mm: 0.0 }
        );
    }

    #[test]
    fn test_build_torsion_spring_with_legs() {
        let args = solve_args(&["--variant", "torsion", "--leg1", "20", "--leg2", "35"]);
        let spring = build_spring(&args, builtin()).unwrap();
        assert_eq!(spring.variant(), Variant::Torsion);
        assert_eq!(spring.hooks(), HookGeometry::torsion(20.0, 35.0));
    }

    #[test]
    fn test_build_rejects_unknown_variant() {
        let args = solve_args(&["--variant", "leaf"]);
        let err = build_spring(&args, builtin()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_OPTION");
    }

    #[test]
    fn test_malformed_known_value_is_rejected() {
        let args = solve_args(&["-p", "d=abc"]);
        let err = solve_report(&args).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_VALUE");

        let args = solve_args(&["-p", "d"]);
        assert_eq!(solve_report(&args).unwrap_err().error_code(), "INVALID_VALUE");

        let args = solve_args(&["-p", "d=-1", "-p", "DE=10"]);
        assert_eq!(solve_report(&args).unwrap_err().error_code(), "INVALID_VALUE");
    }

    #[test]
    fn test_json_report_shape() {
        let args = reference_with(&["--force", "10", "--json"]);
        let (_, report) = solve_report(&args).unwrap();
        let v: serde_json::Value = serde_json::from_str(&to_json(&report).unwrap()).unwrap();

        assert_eq!(v["status"]["status"], "solved");
        assert_eq!(v["spring"]["variant"], "compression");
        let dm = v["spring"]["parameters"]["DM"].as_f64().unwrap();
        assert!((dm - 9.0).abs() < 1e-9);
        assert!(v["tensile_strength_mpa"].as_f64().unwrap() > 1000.0);
        assert!((v["load"]["force"].as_f64().unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(v["rating"], "acceptable");
        assert_eq!(v["ratings"].as_array().unwrap().len(), 1);
        assert_eq!(v["fatigue"]["governing"], "body");
        assert!(v.get("strength_note").is_none());
        assert!(v.get("equations").is_none());
    }

    #[test]
    fn test_insufficient_report_has_no_checks() {
        let args = solve_args(&["-p", "d=1", "-p", "DE=10", "--force", "10"]);
        let (spring, report) = solve_report(&args).unwrap();
        assert!(!spring.is_solved());
        assert!(matches!(report.status, SolveStatus::Insufficient { .. }));
        assert!(report.load.is_none() && report.fatigue.is_none());
    }

    #[test]
    fn test_extension_location_rates_one_point() {
        let base = ["--variant", "extension", "-p", "d=1", "-p", "DE=10", "-p", "Nt=8"];

        let at_hook = ["--location", "hook-a", "--stress", "0.47"];
        let argv: Vec<&str> = base.iter().copied().chain(at_hook).collect();
        let (_, report) = solve_report(&solve_args(&argv)).unwrap();
        let stress = report.stress.unwrap();
        assert_eq!(stress.location, StressLocation::HookA);
        assert!((stress.ratio - 0.47).abs() < 1e-9);
        assert_eq!(report.ratings.len(), 1);
        assert_eq!(report.ratings[0].location, StressLocation::HookA);

        let argv: Vec<&str> = base.iter().copied().chain(["--force", "5"]).collect();
        let (_, report) = solve_report(&solve_args(&argv)).unwrap();
        let locations: Vec<StressLocation> = report.ratings.iter().map(|r| r.location).collect();
        assert_eq!(
            locations,
            vec![StressLocation::Body, StressLocation::HookA, StressLocation::HookB]
        );
        assert_eq!(report.rating, report.ratings.iter().map(|r| r.rating).max());
    }

    #[test]
    fn test_location_rejected_for_compression() {
        let err = solve_report(&reference_with(&["--location", "hook-a", "--stress", "0.3"]))
            .unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_OPERATION");

        let err = solve_report(&reference_with(&["--location", "coil"])).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_OPTION");
    }

    #[test]
    fn test_gauge_outside_strength_table_keeps_parameters() {
        let args = solve_args(&[
            "--material", "A227", "-p", "d=0.4", "-p", "DE=4", "-p", "Nt=8", "-p", "Lo=10",
            "--force", "1",
        ]);
        let (spring, report) = solve_report(&args).unwrap();
        assert!(spring.is_solved());
        assert!(report.strength_note.as_deref().unwrap().contains("A227"));
        assert!(report.tensile_strength_mpa.is_none());
        assert!(report.stress.is_none() && report.fatigue.is_none());
        assert!(report.index.is_some());
        assert!(report.load.is_some());
    }

    #[test]
    fn test_equations_flag_lists_sources() {
        let (spring, report) = solve_report(&reference_with(&["--equations"])).unwrap();
        let equations = report.equations.unwrap();
        assert_eq!(equations.get(&ParamName::Na), Some(&Equation::ActiveTurns));
        assert!(spring.equations_used().generate_report_markdown().contains("### Geometry"));

        let (_, report) = solve_report(&reference_with(&[])).unwrap();
        assert!(report.equations.is_none());
    }
}
