mod app;
mod args;
mod output;
mod prompt;

use app::App;
use args::Args;
use clap::Parser;
use color_eyre::Result;
use media_downloader::DownloadOutcome;
use prompt::Prompter;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    // Logs go to stderr and stay quiet by default so they don't break the
    // in-place progress line
    let default_filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let strict_exit = args.strict_exit;
    let app = App::new(args);
    let mut prompter = Prompter::stdin();

    tokio::select! {
        result = app.run(&mut prompter) => match result {
            Ok(outcome) => {
                let code = exit_code(outcome.as_ref(), strict_exit);
                if code != 0 {
                    std::process::exit(code);
                }
            }
            Err(error) => {
                app.print_error(&error);
                std::process::exit(1);
            }
        },
        _ = tokio::signal::ctrl_c() => {
            app.print_cancelled();
            std::process::exit(0);
        }
    }

    Ok(())
}

/// A finished run exits 0 whatever happened, unless `--strict-exit` asks for
/// failures and runs that never started to exit 1.
fn exit_code(outcome: Option<&DownloadOutcome>, strict_exit: bool) -> i32 {
    let succeeded = outcome.map(|o| o.succeeded).unwrap_or(false);
    if strict_exit && !succeeded {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_downloader::Extraction;
    use rstest::rstest;

    fn succeeded() -> Option<DownloadOutcome> {
        Some(DownloadOutcome::from_extraction(&Extraction::Single { title: None }))
    }

    fn failed() -> Option<DownloadOutcome> {
        Some(DownloadOutcome::failure("ERROR: offline"))
    }

    #[rstest]
    #[case(succeeded(), false, 0)]
    #[case(failed(), false, 0)]
    #[case(None, false, 0)]
    #[case(succeeded(), true, 0)]
    #[case(failed(), true, 1)]
    #[case(None, true, 1)]
    fn exit_code_follows_strict_flag(
        #[case] outcome: Option<DownloadOutcome>,
        #[case] strict_exit: bool,
        #[case] expected: i32,
    ) {
        assert_eq!(exit_code(outcome.as_ref(), strict_exit), expected);
    }
}
