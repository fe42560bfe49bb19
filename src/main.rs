fn main() {
    if let Err(err) = equipment_datasets::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
