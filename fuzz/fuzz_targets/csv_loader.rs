#![no_main]

use abselect::dataset::{GroupTable, LabeledDataset};
use abselect::hypothesis::evaluate;
use abselect::sample::Group;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Loading and testing arbitrary bytes must error, never panic
    if let Ok(table) = GroupTable::from_reader(Group::Control, data) {
        let _ = abselect::describe::describe(&table);
    }

    if let Ok(dataset) = LabeledDataset::from_reader(data, "group") {
        if let Some(metric) = dataset.columns().first() {
            if let (Ok(control), Ok(test)) = (
                dataset.sample(Group::Control, metric),
                dataset.sample(Group::Test, metric),
            ) {
                let _ = evaluate(&control, &test, 0.05);
            }
        }
    }
});
