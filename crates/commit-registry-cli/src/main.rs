use std::process::ExitCode;

fn main() -> ExitCode {
    match commit_registry_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            commit_registry_cli::print_error(&err.to_string());
            ExitCode::FAILURE
        }
    }
}
