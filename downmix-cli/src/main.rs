//! # Downmix
//!
//! A command-line tool that blends a newcome audio file into a base audio
//! file and writes the result as WAV.

use log::error;

mod cli;
mod decode;
mod error;
mod logging;
mod runner;
mod wav;

fn main() {
    let args = cli::args::build_cli().get_matches();
    logging::init(args.get_flag("verbose"));

    let code = match runner::run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            -1
        }
    };

    std::process::exit(code)
}
