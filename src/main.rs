fn main() {
    if let Err(err) = dataspark::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
