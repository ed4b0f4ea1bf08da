use std::path::Path;
use std::time::Instant;

use crate::cli::BatchArgs;
use crate::exit_codes;
use fmriclean_rs::{BatchRunner, CleanConfig};

pub fn execute(args: BatchArgs) -> i32 {
    let root = Path::new(&args.root);
    if !root.is_dir() {
        eprintln!("Error: dataset root not found: {}", args.root);
        return exit_codes::INPUT_ERROR;
    }

    let mut config = CleanConfig::default();
    config.extensions = args.extensions.clone();
    if let Some(ref tasks) = args.gradient_tasks {
        config.gradient_tasks = tasks.clone();
    }
    if let Some(ref tasks) = args.no_gradient_tasks {
        config.no_gradient_tasks = tasks.clone();
    }

    let runner = BatchRunner::new(root, config).with_chain(args.chain.into());

    let mut recordings = match runner.index() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::INPUT_ERROR;
        }
    };

    if let Some(ref pattern) = args.pattern {
        let pattern = match glob::Pattern::new(pattern) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error: Invalid glob pattern '{}': {}", pattern, e);
                return exit_codes::INPUT_ERROR;
            }
        };
        recordings.retain(|r| pattern.matches_path(&r.path));
    }

    if recordings.is_empty() {
        eprintln!("Error: No matching recordings found");
        return exit_codes::INPUT_ERROR;
    }

    // Dry-run mode: print the recording list and exit
    if args.dry_run {
        for recording in &recordings {
            println!("{}", recording.path.display());
        }
        if !args.quiet {
            eprintln!("Found {} recording(s)", recordings.len());
        }
        return exit_codes::SUCCESS;
    }

    if !args.quiet {
        eprintln!("Cleaning {} recording(s) under {}...", recordings.len(), args.root);
    }

    let start_time = Instant::now();
    let summary = match runner.run_recordings(&recordings) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    };
    let elapsed = start_time.elapsed();

    if !args.quiet {
        eprintln!(
            "Batch complete: {}/{} cleaned, {} failed, {} skipped, {:.1}s",
            summary.succeeded,
            summary.total,
            summary.failed,
            summary.skipped,
            elapsed.as_secs_f64()
        );
    }

    if summary.failed == 0 {
        exit_codes::SUCCESS
    } else if summary.succeeded > 0 {
        exit_codes::PARTIAL_FAILURE
    } else {
        exit_codes::EXECUTION_ERROR
    }
}
