use crate::cli::SimulateArgs;
use crate::exit_codes;
use fmriclean_rs::sim::DummyDataset;

pub fn execute(args: SimulateArgs) -> i32 {
    let dataset = DummyDataset::new(&args.root)
        .subjects(args.subjects)
        .sessions(args.sessions)
        .runs(args.runs)
        .task(&args.task)
        .data_folder(&args.data_folder)
        .sfreq(args.sfreq)
        .duration(args.duration)
        .channels(args.channels)
        .triggers(args.triggers);

    match dataset.create() {
        Ok(raw_path) => {
            println!("{}", raw_path.display());
            exit_codes::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_codes::EXECUTION_ERROR
        }
    }
}
