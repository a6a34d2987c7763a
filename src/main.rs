use std::process::ExitCode;

use repokit::ui::output;

fn main() -> ExitCode {
    match repokit::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
