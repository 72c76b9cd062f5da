use std::process::ExitCode;

use clap::Parser;
use log::error;

mod cli;
mod error;
mod hashjoin;
mod ird;
mod iso9660;
mod reader;
mod report;
mod udf;
mod verify;

use cli::{Action, Args};
use error::Result;

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let action = match args.resolve_action() {
        Ok(action) => action,
        Err(usage_error) => {
            eprintln!("error: {}", usage_error.0);
            return ExitCode::from(2);
        }
    };

    match run(&args, action) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the chosen action, returning whether the overall result is a
/// success (`true`) — for `check`, this means `GAME DATA VALID`.
fn run(args: &Args, action: Action) -> Result<bool> {
    let ird_container = ird::IrdContainer::open(&args.ird_file)?;

    if let Some(pvd) = iso9660::PrimaryVolumeDescriptor::recognize(&ird_container.header_bytes) {
        log::debug!(
            "ISO9660 PVD recognized: volume_identifier={:?}",
            pvd.volume_identifier
        );
    }

    let volume = udf::UdfVolume::decode(&ird_container.header_bytes)?;
    let mut tree = udf::build_tree(&ird_container.header_bytes, &volume)?;
    hashjoin::HashJoiner::new(&ird_container).fill(&mut tree);

    match action {
        Action::Print => {
            report::print_identity(&ird_container);
            report::print_tree(&tree);
            Ok(true)
        }
        Action::Md5Sums => {
            report::print_md5sums(&tree);
            Ok(true)
        }
        Action::Check => {
            let game_dir = args
                .game_dir
                .as_ref()
                .expect("resolve_action guarantees game_dir is set for Check");
            let verify_report = verify::verify(&tree, game_dir)?;
            report::print_verify_report(&verify_report);
            Ok(verify_report.verdict() == verify::Verdict::Valid)
        }
    }
}
