fn main() {
    if let Err(err) = altoconv::run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
