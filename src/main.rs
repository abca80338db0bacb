//! refhub binary entry point.

fn main() {
    if let Err(err) = refhub::cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
