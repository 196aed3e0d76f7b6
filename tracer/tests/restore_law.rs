//! Exercises `Tracer` against a tiny compiled fixture, checking the
//! restore law: once a one-shot breakpoint fires, the byte written back
//! into the tracee matches the byte that was there before any breakpoint
//! was ever installed.

use std::collections::BTreeMap;
use std::path::Path;

use tracer::{Address, TraceEvent, Tracer};

fn compile_fixture(source: &str, out_path: &Path) {
    let src_path = out_path.with_extension("c");
    std::fs::write(&src_path, source).expect("write fixture source");

    let tool = cc::Build::new()
        .target("x86_64-unknown-linux-gnu")
        .host("x86_64-unknown-linux-gnu")
        .opt_level(0)
        .get_compiler();

    let status = tool
        .to_command()
        .arg("-g")
        .arg(&src_path)
        .arg("-o")
        .arg(out_path)
        .status()
        .expect("invoke c compiler");

    assert!(status.success(), "fixture failed to compile");
}

#[test]
fn breakpoint_byte_is_restored_after_it_fires() {
    let dir = tempfile::tempdir().expect("scratch dir");
    let bin_path = dir.path().join("noop");
    compile_fixture("int main(void) { int x = 1; return x - 1; }\n", &bin_path);

    let lines = linetable::read_lines(&bin_path).expect("read debug info");
    let mut addresses: Vec<Address> = lines
        .values()
        .flat_map(|entries| entries.iter().map(|e| e.address))
        .collect();
    addresses.sort();
    addresses.dedup();
    assert!(!addresses.is_empty(), "fixture produced no instrumented lines");

    let mut tracer = Tracer::load(&bin_path, &[]).expect("launch fixture under trace");
    let saved: BTreeMap<Address, u8> = tracer
        .set_breakpoints(&addresses)
        .expect("install breakpoints");

    let mut remaining = saved.clone();
    loop {
        match tracer.run().expect("tracer run") {
            TraceEvent::Trap { pc } => {
                let original_byte = remaining
                    .remove(&pc)
                    .unwrap_or_else(|| panic!("trap at address with no registered breakpoint: {pc}"));
                assert_eq!(tracer.read_byte(pc).unwrap(), 0xcc);
                tracer.eliminate_hit_breakpoint(pc, original_byte).unwrap();
                assert_eq!(
                    tracer.read_byte(pc).unwrap(),
                    original_byte,
                    "restore law violated at {pc}"
                );
            }
            TraceEvent::Exit { code } => {
                assert_eq!(code, 0);
                break;
            }
            TraceEvent::Error => panic!("tracer reported an unclassifiable event"),
        }
    }

    assert!(
        remaining.is_empty(),
        "some breakpoints never fired: {remaining:?}"
    );
}

#[test]
fn hit_counts_stay_bounded_to_one_per_address() {
    let dir = tempfile::tempdir().expect("scratch dir");
    let bin_path = dir.path().join("loop");
    compile_fixture(
        "int main(void) { int i; for (i = 0; i < 10; i++) { i = i; } return 0; }\n",
        &bin_path,
    );

    let lines = linetable::read_lines(&bin_path).expect("read debug info");
    let mut addresses: Vec<Address> = lines
        .values()
        .flat_map(|entries| entries.iter().map(|e| e.address))
        .collect();
    addresses.sort();
    addresses.dedup();

    let mut tracer = Tracer::load(&bin_path, &[]).expect("launch fixture under trace");
    let saved = tracer
        .set_breakpoints(&addresses)
        .expect("install breakpoints");

    let mut hits: BTreeMap<Address, u32> = BTreeMap::new();
    loop {
        match tracer.run().expect("tracer run") {
            TraceEvent::Trap { pc } => {
                let original_byte = saved[&pc];
                *hits.entry(pc).or_insert(0) += 1;
                tracer.eliminate_hit_breakpoint(pc, original_byte).unwrap();
            }
            TraceEvent::Exit { .. } => break,
            TraceEvent::Error => panic!("tracer reported an unclassifiable event"),
        }
    }

    for (addr, count) in &hits {
        assert_eq!(*count, 1, "address {addr} fired more than once");
    }
}
