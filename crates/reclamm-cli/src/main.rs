use clap::Parser;

fn main() {
    let args = reclamm_cli::arguments::Arguments::parse();
    observe::tracing::initialize(&args.log_filter, args.log_json);

    match reclamm_cli::run(args) {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(report) => println!("{report}"),
            Err(err) => exit_with(err.into()),
        },
        Err(err) => exit_with(err),
    }
}

fn exit_with(err: anyhow::Error) -> ! {
    tracing::error!(?err, "command failed");
    std::process::exit(1);
}
