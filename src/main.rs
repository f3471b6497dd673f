use std::process::ExitCode;

fn main() -> ExitCode {
    match storescrub::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
