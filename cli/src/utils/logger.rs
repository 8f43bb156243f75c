use log::LevelFilter;

/// Logs go to stderr so command output on stdout stays machine-readable.
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `--verbose`.
pub fn init_logger(verbose: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    match std::env::var("RUST_LOG") {
        Ok(filters) => {
            builder.parse_filters(&filters);
        }
        Err(_) if verbose => {
            builder.filter_level(LevelFilter::Debug);
        }
        Err(_) => {
            builder.filter_level(LevelFilter::Info);
        }
    }
    builder.init();
}
