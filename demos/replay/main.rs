//! Replays a direction string through the path checker and prints the
//! checked path with its perturbations and the perturbed drawing.
//!
//! Usage:
//! ```text
//! cargo run --example replay                      # default (EENWSS, crosses itself)
//! cargo run --example replay -- E N W S            # letters may be separated
//! cargo run --example replay -- --file path.txt    # read the letters from a file
//! ```

use std::error::Error;

use orthopath::path::{format_checked_path, format_path, parse_path};
use orthopath::{LatticePoint, PathChecker, PerturbStyle};

const DEFAULT_PATH: &str = "EENWSS";

fn read_input() -> Result<String, Box<dyn Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => Ok(DEFAULT_PATH.to_owned()),
        [flag, file] if flag == "--file" => Ok(std::fs::read_to_string(file)?),
        words => Ok(words.join(" ")),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // Default: WARN for everything, INFO for orthopath.
    // Override with RUST_LOG env var (e.g. RUST_LOG=orthopath=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("orthopath=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let dirs = parse_path(&read_input()?)?;
    println!("input:    {}", format_path(&dirs, true));

    let start = LatticePoint::default();
    let mut checker = PathChecker::new();
    let checked = checker.test(start.x, start.y, &dirs)?;
    if checked.has_intersection() {
        println!(
            "rejected: move {} ({}) crosses the path",
            checked.len(),
            dirs[checked.len()]
        );
    }
    println!("checked:  {}", format_checked_path(&checked, false));
    println!("reversed: {}", format_checked_path(&checked, true));

    let style = PerturbStyle::fit(&checked);
    println!("drawing (scale {}):", style.scale());
    for p in checked.to_polyline(start, &style) {
        println!("  {:.3} {:.3}", p.x, p.y);
    }
    Ok(())
}
