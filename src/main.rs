mod checker;
mod error_collector;
mod judgement;
mod log;
mod source;

use std::env;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let [filename] = args.as_slice() else {
        eprintln!("usage: stlc <file>");
        eprintln!("Checks one '<term> : <type>' judgement per line.");
        return ExitCode::SUCCESS;
    };
    match checker::run(Path::new(filename)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log_error!("stlc", error = error);
            ExitCode::FAILURE
        }
    }
}
