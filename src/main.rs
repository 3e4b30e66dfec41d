use abselect::{
    cli::{Cli, OutputFormat},
    dataset::{GroupTable, LabeledDataset},
    describe::{describe, TableSummary},
    hypothesis::{SelectorConfig, TestResult, TestSelector},
    report,
    sample::Group,
};
use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_dataset(args: &Cli) -> Result<LabeledDataset> {
    match (&args.data, &args.control, &args.test) {
        (Some(path), _, _) => LabeledDataset::from_csv_path(path, &args.group_column),
        (None, Some(control), Some(test)) => LabeledDataset::concat(
            GroupTable::from_csv_path(Group::Control, control)?,
            GroupTable::from_csv_path(Group::Test, test)?,
        ),
        _ => bail!("Provide either --data FILE or both --control FILE and --test FILE"),
    }
}

fn print_text(
    args: &Cli,
    data: &LabeledDataset,
    summaries: &[TableSummary],
    result: &TestResult,
    config: &SelectorConfig,
) -> Result<()> {
    for summary in summaries {
        println!("{}", summary.to_report_string());
    }

    for (group, mean) in data.group_means(&args.metric)? {
        match mean {
            Some(mean) => println!("{} mean {}: {:.4}", group, args.metric, mean),
            None => println!("{} mean {}: -", group, args.metric),
        }
    }
    println!();
    print!("{}", report::render_text(result, config));
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = args.selector_config()?;
    let data = load_dataset(&args)?;

    let summaries = if args.describe {
        vec![
            describe(&data.group_table(Group::Control))?,
            describe(&data.group_table(Group::Test))?,
        ]
    } else {
        Vec::new()
    };

    let control = data.sample(Group::Control, &args.metric)?;
    let test = data.sample(Group::Test, &args.metric)?;

    let selector = TestSelector::new(config)?;
    let result = selector.evaluate(&control, &test)?;

    match args.format {
        OutputFormat::Text => print_text(&args, &data, &summaries, &result, selector.config())?,
        OutputFormat::Json => println!(
            "{}",
            report::render_json(&args.metric, &summaries, &result)?
        ),
    }

    Ok(())
}
