use std::io::{self, Write};

use console::Style;
use latch_core::bench::{BenchmarkConfig, BenchmarkReport, Timing};
use latch_core::detect::ScoreType;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    warning: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            warning: Style::new().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_benchmark_summary(
    config: &BenchmarkConfig,
    report: &BenchmarkReport,
) -> io::Result<()> {
    write_benchmark_summary(&mut io::stdout().lock(), config, report)
}

pub fn write_benchmark_summary(
    out: &mut impl Write,
    config: &BenchmarkConfig,
    report: &BenchmarkReport,
) -> io::Result<()> {
    let s = Styles::new();

    writeln!(out)?;
    writeln!(out, "  {}", s.title.apply_to("LATCH Benchmark"))?;
    writeln!(out, "  {}", s.title.apply_to("\u{2550}".repeat(15)))?;
    writeln!(out)?;

    writeln!(
        out,
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(config.input.display())
    )?;
    writeln!(
        out,
        "  {:<14}{}",
        s.label.apply_to("Image"),
        s.value.apply_to(format!("{}x{}", report.width, report.height))
    )?;
    writeln!(
        out,
        "  {:<14}{}",
        s.label.apply_to("Device"),
        s.method.apply_to(&report.device)
    )?;
    writeln!(
        out,
        "  {:<14}{}",
        s.label.apply_to("Kernel"),
        s.method.apply_to(&report.kernel)
    )?;
    writeln!(
        out,
        "  {:<14}{}",
        s.label.apply_to("Table"),
        s.value.apply_to(&report.table_version)
    )?;
    writeln!(out)?;

    writeln!(out, "  {}", s.header.apply_to("Keypoints"))?;
    let score = match config.detector.score_type {
        ScoreType::Harris => "Harris",
        ScoreType::Fast => "FAST",
    };
    writeln!(
        out,
        "    {:<12}{}",
        s.label.apply_to("Detector"),
        s.method.apply_to(format!(
            "ORB ({score}, {} levels, x{})",
            config.detector.n_levels, config.detector.scale_factor
        ))
    )?;
    writeln!(
        out,
        "    {:<12}{}",
        s.label.apply_to("Budget"),
        s.value.apply_to(config.detector.n_features)
    )?;
    writeln!(
        out,
        "    {:<12}{}",
        s.label.apply_to("Detected"),
        s.value.apply_to(report.detected)
    )?;
    let kept = if report.survivors == 0 {
        s.warning.apply_to(format!("0 (margin {} px)", config.border_margin))
    } else {
        s.value.apply_to(format!("{} (margin {} px)", report.survivors, config.border_margin))
    };
    writeln!(out, "    {:<12}{}", s.label.apply_to("Kept"), kept)?;
    writeln!(out)?;

    writeln!(out, "  {}", s.header.apply_to("Measurement"))?;
    writeln!(
        out,
        "    {:<12}{}",
        s.label.apply_to("Warm-ups"),
        s.value.apply_to(config.warmups)
    )?;
    writeln!(
        out,
        "    {:<12}{}",
        s.label.apply_to("Runs"),
        s.value.apply_to(config.runs)
    )?;
    writeln!(
        out,
        "    {:<12}{}",
        s.label.apply_to("Errors"),
        s.method.apply_to(config.launch_check)
    )?;
    match report.outcome.timing {
        Timing::Measured { elapsed, .. } => writeln!(
            out,
            "    {:<12}{}",
            s.label.apply_to("Elapsed"),
            s.value.apply_to(format!("{:.3} ms", elapsed.as_secs_f64() * 1e3))
        )?,
        Timing::Skipped => writeln!(
            out,
            "    {:<12}{}",
            s.label.apply_to("Elapsed"),
            s.warning.apply_to("skipped")
        )?,
    }
    if let Some(ref path) = report.dump {
        writeln!(
            out,
            "    {:<12}{}",
            s.label.apply_to("Dump"),
            s.path.apply_to(path.display())
        )?;
    }
    writeln!(out)?;
    Ok(())
}
