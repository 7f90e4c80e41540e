use std::process::ExitCode;

fn main() -> ExitCode {
    helioflow_cli::run()
}
