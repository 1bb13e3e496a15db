use std::process::ExitCode;

fn main() -> ExitCode {
    match robant::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
