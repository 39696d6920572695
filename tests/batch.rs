use benchplot::{batch::Batch, Error};

const SAMPLE_SIZE: &str = "mode,sample_size,tot_cr,avg_cr,runtime
rest,1000,3.2,2.1,3600
dp,1000,2.4,1.8,1800
rest,5000,3.9,2.6,9000
dp,5000,2.9,2.0,5400
";

const CONFIG: &str = r#"
[[chart]]
data = "sample_size.csv"
group = "mode"
x = "sample_size"
y = "tot_cr"
output = "plots/sample_size_tot.png"
title = "Total Compression over Sample Size"
x_format = { kind = "thousands" }

[[chart]]
data = "sample_size.csv"
group = "mode"
x = "sample_size"
y = "compression_ratio"
output = "plots/missing_column.png"

[[chart]]
data = "missing.csv"
group = "mode"
x = "sample_size"
y = "runtime"
output = "plots/missing_data.png"

[[chart]]
data = "sample_size.csv"
group = "mode"
x = "sample_size"
y = "runtime"
output = "plots/sample_size_runtime.png"
x_format = { kind = "thousands" }
y_format = { kind = "divide_suffix", scale = 3600, suffix = "h" }
"#;

#[test]
fn failing_jobs_do_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("sample_size.csv"), SAMPLE_SIZE).unwrap();
    let config = dir.path().join("charts.toml");
    std::fs::write(&config, CONFIG).unwrap();

    let batch = Batch::value_parse(&config).unwrap();
    let reports = batch.run();
    assert_eq!(reports.len(), 4);

    let plots = dir.path().join("plots");
    let tot = reports[0].result.as_ref().unwrap();
    assert_eq!(reports[0].output, plots.join("sample_size_tot.png"));
    assert_eq!(tot.legend(), ["dp", "rest"]);
    assert!(tot.x_ticks.iter().any(|t| t.label.ends_with('k')));
    assert!(plots.join("sample_size_tot.png").is_file());

    assert!(matches!(
        &reports[1].result,
        Err(Error::Schema(c)) if c == "compression_ratio"
    ));
    assert!(!plots.join("missing_column.png").exists());

    assert!(matches!(&reports[2].result, Err(Error::Io { .. })));
    assert!(!plots.join("missing_data.png").exists());

    let runtime = reports[3].result.as_ref().unwrap();
    assert!(runtime.y_ticks.iter().all(|t| t.label.ends_with('h')));
    assert_eq!(runtime.series[0].points, vec![(1000., 1800.), (5000., 5400.)]);
    assert!(plots.join("sample_size_runtime.png").is_file());
}

#[test]
fn missing_config_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Batch::value_parse(dir.path().join("charts.toml")),
        Err(Error::Io { .. })
    ));
}
