use std::process::ExitCode;

fn main() -> ExitCode {
    match bactmeasure::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            if let bactmeasure::BactError::InvalidConfig { report, .. } = &err {
                eprint!("{}", report);
            }
            ExitCode::FAILURE
        }
    }
}
