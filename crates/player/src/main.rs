use std::process::ExitCode;

mod app;

fn main() -> ExitCode {
    let wiring = match app::build_app() {
        Ok(Some(wiring)) => wiring,
        Ok(None) => return ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };
    app::run(wiring)
}
