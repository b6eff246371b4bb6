//! # Stock Report
//!
//! Prints the stock payload the product page would receive for a product
//! document exported from the document store.
//!
//! ## Usage
//! ```bash
//! # Full report
//! cargo run -p storefront-core --bin stock-report -- ./linen-shirt.json
//!
//! # Also look up one variant
//! cargo run -p storefront-core --bin stock-report -- --color Black --size M ./linen-shirt.json
//!
//! # Show coercion diagnostics
//! RUST_LOG=storefront=debug cargo run -p storefront-core --bin stock-report -- ./linen-shirt.json
//! ```

use std::env;
use std::fs;
use std::process::ExitCode;

use storefront_core::ProductStock;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    println!("Storefront Stock Report");
    println!();
    println!("Usage: stock-report [OPTIONS] <PRODUCT_JSON>");
    println!();
    println!("Options:");
    println!("  -c, --color <NAME>  Color of the variant to look up");
    println!("  -s, --size <LABEL>  Size of the variant to look up");
    println!("  -h, --help          Show this help message");
}

/// Logs go to stderr so stdout stays valid JSON.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,storefront=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    color: Option<String>,
    size: Option<String>,
    path: Option<String>,
    help: bool,
}

/// Parses the arguments after the program name.
///
/// A flag missing its value, an unknown flag, or a second path is an error.
fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--color" | "-c" => {
                let value = iter.next().ok_or_else(|| format!("{} needs a value", arg))?;
                parsed.color = Some(value.clone());
            }
            "--size" | "-s" => {
                let value = iter.next().ok_or_else(|| format!("{} needs a value", arg))?;
                parsed.size = Some(value.clone());
            }
            "--help" | "-h" => parsed.help = true,
            flag if flag.starts_with('-') && flag != "-" => {
                return Err(format!("unknown option {}", flag));
            }
            other => {
                if parsed.path.is_some() {
                    return Err(format!("unexpected argument {}", other));
                }
                parsed.path = Some(other.to_string());
            }
        }
    }

    Ok(parsed)
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("stock-report: {}", e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    if args.help {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let Some(path) = args.path else {
        print_usage();
        return ExitCode::FAILURE;
    };

    init_tracing();

    match run(&path, args.color.as_deref(), args.size.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("stock-report: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(path: &str, color: Option<&str>, size: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let raw = fs::read_to_string(path)?;
    let document: serde_json::Value = serde_json::from_str(&raw)?;

    let product = ProductStock::from_document(&document);
    let report = product.report();

    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(size) = size {
        let label = match color {
            Some(color) => format!("{} / {}", color, size),
            None => size.to_string(),
        };
        match product.view().variant_quantity(color, size) {
            Some(qty) => eprintln!("{}: {}", label, qty),
            None => eprintln!("{}: unknown", label),
        }
    } else if color.is_some() {
        eprintln!("--color needs --size to look up a variant");
    }

    if report.is_low_stock() {
        eprintln!("low stock: {} left", report.total_stock);
    }

    Ok(())
}
