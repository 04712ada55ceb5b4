//! # extract 命令实现
//!
//! 批量解析 QChem/Gaussian 输出文件，按能量排序输出表格、
//! CSV 和可选的能量比较图。
//!
//! ## 功能
//! - 收集输出文件（glob 模式，可递归）
//! - rayon 并行解析
//! - 生成终端表格和 CSV 输出
//! - 可选绘制能量比较图
//!
//! ## 依赖关系
//! - 使用 `cli/extract.rs` 定义的参数
//! - 使用 `batch/`, `parsers/`
//! - 使用 `utils/output.rs`

use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::extract::ExtractArgs;
use crate::error::{QcflowError, Result};
use crate::models::QcResult;
use crate::parsers;
use crate::utils::output;

use std::path::Path;
use tabled::{Table, Tabled};

/// 结果表格行
#[derive(Debug, Clone, Tabled)]
struct ResultRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Job")]
    job: String,
    #[tabled(rename = "Energy (Hartree)")]
    energy: String,
    #[tabled(rename = "ΔE (Hartree)")]
    delta_e: String,
    #[tabled(rename = "Conv")]
    convergence: String,
    #[tabled(rename = "Imag")]
    imaginary: String,
}

/// 执行 extract 命令
pub fn execute(args: ExtractArgs) -> Result<()> {
    output::print_header("Extracting QC Results");

    if !args.job_dir.exists() {
        return Err(QcflowError::DirectoryNotFound {
            path: args.job_dir.display().to_string(),
        });
    }

    let files = FileCollector::with_pattern(args.job_dir.clone(), &args.pattern)?
        .recursive(args.recursive)
        .collect();

    if files.is_empty() {
        return Err(QcflowError::NoFilesFound {
            pattern: args.pattern.clone(),
        });
    }

    output::print_info(&format!("Parsing {} output files...", files.len()));

    let program = args.program;
    let summary = BatchRunner::new(args.jobs).run(files, |file| {
        let job_name = file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        match parsers::parse_output_file(file, &job_name, program) {
            Ok(result) => ProcessResult::Parsed(Box::new(result)),
            Err(QcflowError::UnsupportedFormat(_)) => {
                ProcessResult::Skipped(file.display().to_string())
            }
            Err(e) => ProcessResult::Failed(file.display().to_string(), e.to_string()),
        }
    });

    for (path, err) in &summary.failures {
        output::print_warning(&format!("Failed to parse {}: {}", path, err));
    }
    if !summary.skipped.is_empty() {
        output::print_info(&format!(
            "Skipped {} files of unknown origin",
            summary.skipped.len()
        ));
    }
    output::print_info(&format!(
        "Processed {} files: {} parsed, {} failed",
        summary.total(),
        summary.results.len(),
        summary.failures.len()
    ));

    let mut results: Vec<QcResult> = summary
        .results
        .into_iter()
        .filter(|r| r.energy.is_some())
        .collect();

    if results.is_empty() {
        output::print_warning("No parsable results with energies found.");
        return Ok(());
    }

    // 按能量排序
    results.sort_by(|a, b| {
        a.energy
            .partial_cmp(&b.energy)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let min_energy = results[0].energy.unwrap_or(0.0);

    let table_rows: Vec<ResultRow> = results
        .iter()
        .take(args.top_n)
        .enumerate()
        .map(|(i, r)| {
            let e = r.energy.unwrap_or(0.0);
            ResultRow {
                rank: i + 1,
                job: r.job_name.clone(),
                energy: format!("{:.8}", e),
                delta_e: format!("{:.8}", e - min_energy),
                convergence: r.convergence.to_string(),
                imaginary: r.num_imaginary().to_string(),
            }
        })
        .collect();

    output::print_header(&format!(
        "Top {} Jobs by Energy",
        args.top_n.min(results.len())
    ));
    let table = Table::new(&table_rows);
    println!("{}", table);

    save_results_csv(&results, &args.output_csv)?;
    output::print_success(&format!(
        "Full ranking saved to '{}'",
        args.output_csv.display()
    ));

    if args.plot {
        generate_plot(&results, &args.output_plot)?;
        output::print_success(&format!(
            "Energy plot saved to '{}'",
            args.output_plot.display()
        ));
    }

    Ok(())
}

/// 保存结果到 CSV
fn save_results_csv(results: &[QcResult], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path).map_err(QcflowError::CsvError)?;

    wtr.write_record([
        "rank",
        "job",
        "program",
        "energy_hartree",
        "zpe",
        "energy_plus_zpe",
        "convergence",
        "n_imaginary",
        "finished",
    ])?;

    for (i, r) in results.iter().enumerate() {
        wtr.write_record(&[
            (i + 1).to_string(),
            r.job_name.clone(),
            r.program.to_string(),
            r.energy.map(|e| format!("{:.10}", e)).unwrap_or_default(),
            r.zpe.map(|z| format!("{:.10}", z)).unwrap_or_default(),
            r.energy_with_zpe()
                .map(|e| format!("{:.10}", e))
                .unwrap_or_default(),
            r.convergence.to_string(),
            r.num_imaginary().to_string(),
            r.is_finished.to_string(),
        ])?;
    }

    wtr.flush().map_err(|e| QcflowError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 生成能量比较图
fn generate_plot(results: &[QcResult], output_path: &Path) -> Result<()> {
    use plotters::prelude::*;

    let plot_data: Vec<(usize, f64)> = results
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.energy.map(|e| (i + 1, e)))
        .collect();

    if plot_data.is_empty() {
        return Err(QcflowError::Other("No data to plot".to_string()));
    }

    let y_min = plot_data
        .iter()
        .map(|(_, y)| *y)
        .fold(f64::INFINITY, f64::min);
    let y_max = plot_data
        .iter()
        .map(|(_, y)| *y)
        .fold(f64::NEG_INFINITY, f64::max);
    let y_margin = ((y_max - y_min).abs()).max(1e-6) * 0.1;

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| QcflowError::Other(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("QC Energy Comparison", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(
            0.5..(plot_data.len() as f64 + 0.5),
            (y_min - y_margin)..(y_max + y_margin),
        )
        .map_err(|e| QcflowError::Other(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("Rank")
        .y_desc("Energy (Hartree)")
        .draw()
        .map_err(|e| QcflowError::Other(e.to_string()))?;

    chart
        .draw_series(
            plot_data
                .iter()
                .map(|(x, y)| Circle::new((*x as f64, *y), 5, RED.filled())),
        )
        .map_err(|e| QcflowError::Other(e.to_string()))?;

    chart
        .draw_series(LineSeries::new(
            plot_data.iter().map(|(x, y)| (*x as f64, *y)),
            RED.stroke_width(2),
        ))
        .map_err(|e| QcflowError::Other(e.to_string()))?;

    root.present()
        .map_err(|e| QcflowError::Other(e.to_string()))?;

    Ok(())
}
