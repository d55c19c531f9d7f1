//! Fuzz target for the page aggregator
//!
//! Feeds arbitrary frame sequences and verify/reset calls into one aggregator.

#![no_main]

use arbitrary::Arbitrary;
use kitscan_core::{AssemblyOrder, Frame, PageAggregator, ScannerConfig};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Step {
    Frame(Vec<u8>),
    Page { index: u8, payload: Vec<u8> },
    Verify,
    Reset,
}

#[derive(Debug, Arbitrary)]
struct Input {
    page_index_order: bool,
    steps: Vec<Step>,
}

fuzz_target!(|input: Input| {
    let mut aggregator = PageAggregator::new(ScannerConfig {
        assembly_order: if input.page_index_order {
            AssemblyOrder::PageIndex
        } else {
            AssemblyOrder::ScanOrder
        },
        ..ScannerConfig::default()
    });

    for step in input.steps {
        match step {
            Step::Frame(bytes) => {
                aggregator.accept(Frame::from_bytes(&bytes));
            }
            Step::Page { index, payload } => {
                let mut bytes = format!("1{index:02x}").into_bytes();
                bytes.extend_from_slice(&payload);
                aggregator.accept(Frame::from_bytes(&bytes));
            }
            Step::Verify => {
                let _ = aggregator.verify();
            }
            Step::Reset => aggregator.reset(),
        }

        if let Some(session) = aggregator.session() {
            assert!(session.scanned_count() <= usize::from(session.total_pages()));
        }
    }
});
