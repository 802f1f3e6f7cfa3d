use std::process::ExitCode;

fn main() -> ExitCode {
    // An optional `.env` may carry STDCURVE_* defaults.
    dotenvy::dotenv().ok();

    match std_curve::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
