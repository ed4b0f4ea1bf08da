use std::path::Path;

use crate::cli::IndexArgs;
use crate::exit_codes;
use crate::output;
use fmriclean_rs::dataset::index_dataset;

pub fn execute(args: IndexArgs) -> i32 {
    let root = Path::new(&args.root);
    let recordings = match index_dataset(root, &args.extensions) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::INPUT_ERROR;
        }
    };

    let content = if args.json {
        match output::to_json(&recordings, false) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("Error: {}", e);
                return exit_codes::EXECUTION_ERROR;
            }
        }
    } else {
        let mut lines: Vec<String> = recordings
            .iter()
            .map(|r| {
                format!(
                    "{}\tsub-{}\tses-{}\ttask-{}\trun-{}\t{}",
                    r.path.display(),
                    r.entities.subject,
                    r.entities.session,
                    r.entities.task.as_deref().unwrap_or("-"),
                    r.entities.run.as_deref().unwrap_or("-"),
                    r.entities.modality
                )
            })
            .collect();
        lines.push(format!("{} recording(s)", recordings.len()));
        lines.join("\n")
    };

    if let Err(e) = output::write_output(&content, args.output.as_deref()) {
        eprintln!("Error: {}", e);
        return exit_codes::EXECUTION_ERROR;
    }

    exit_codes::SUCCESS
}
