#![expect(clippy::unwrap_used)]
use std::{fs, sync::Arc};

use divan::Bencher;
use kphptags::cli::run;
use kphptags_core::config::{BaseConfig, Config, OutputConfig};
use temp_dir::TempDir;

const SAMPLES: &[&str] = &["Sample.php", "UnicodeSample.php"];

fn main() {
    divan::main();
}

#[divan::bench(args = [false, true])]
fn e2e_samples(bencher: Bencher, compact: bool) {
    let d = TempDir::new().unwrap();
    let src = d.child("src");
    fs::create_dir(&src).unwrap();
    // enough files to keep the thread pool busy
    for i in 0..50 {
        for sample in SAMPLES {
            fs::copy(
                format!("../kphptags-core/test-data/{sample}"),
                src.join(format!("{i}-{sample}")),
            )
            .unwrap();
        }
    }

    let config = Config::builder()
        .kphptags(BaseConfig::builder().paths(vec![src]).build())
        .output(
            OutputConfig::builder()
                .compact(compact)
                .out(d.child("kphptags.out"))
                .build(),
        )
        .build();

    let d = Arc::new(d);
    bencher.bench(move || {
        let d = Arc::clone(&d); // keep temp dir around
        run(&config).unwrap();
        d
    });
}
