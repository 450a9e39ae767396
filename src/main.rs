use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match soulscript_cli::cli::run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
