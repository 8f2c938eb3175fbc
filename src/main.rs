fn main() {
    if let Err(err) = csv_parcoords::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
