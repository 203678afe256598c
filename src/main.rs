use clap::Parser;
use std::collections::HashSet;
use std::path::Path;
use tree_match_rust::{cli, config, error, export, extract, loader, normalizer, report, sampler};

use cli::{Cli, Commands};
use config::Config;
use error::Result;
use normalizer::NormalizeOptions;
use report::ReportOptions;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load()?;

    match cli.command {
        Commands::Run {
            table,
            survey,
            secondary,
            images_dir,
            output,
            format,
            min_threshold,
            second_threshold,
            max_cases,
        } => {
            println!("🌳 tree-match - full pipeline\n");

            let options = NormalizeOptions {
                min_threshold,
                second_threshold,
            };

            // 1. Load + normalize
            println!("[1/3] Loading and normalizing tables...");
            let rows = load_and_normalize(&table, survey, &options)?;
            println!("✔ {} rows ({})\n", rows.len(), table.display());

            let secondary_rows = match &secondary {
                Some(path) => {
                    let rows =
                        load_and_normalize(path, tree_match_rust::SurveyKind::Small, &options)?;
                    println!("✔ {} secondary rows ({})\n", rows.len(), path.display());
                    Some(rows)
                }
                None => None,
            };

            // 2. Table re-exports
            println!("[2/3] Exporting normalized table...");
            let stem = format!("{}_normalized", table_stem(&table, "table"));
            let written = export::export_table(&rows, survey, &format, &output, &stem)?;
            for path in &written {
                println!("✔ Table written: {}", path.display());
            }
            println!();

            // 3. Report + maps
            println!("[3/3] Rendering review report...");
            let report_options = ReportOptions {
                title: "Detections and Matches".to_string(),
                images_dir,
                max_cases: max_cases.unwrap_or(config.max_cases),
                zoom_start: config.zoom_start,
                direction_line_length: config.direction_line_length,
            };
            let output_html = output.join("index.html");
            let stats = report::generate_report(
                &rows,
                secondary_rows.as_deref(),
                &report_options,
                &output_html,
            )?;
            println!(
                "✔ Report written: {} ({} cases, {} skipped, {} maps)",
                output_html.display(),
                stats.cases_rendered,
                stats.cases_skipped,
                stats.maps_written
            );

            println!("\n✅ Done");
        }

        Commands::Normalize {
            table,
            survey,
            output,
            format,
            min_threshold,
            second_threshold,
        } => {
            println!("🌳 tree-match - normalize\n");

            let options = NormalizeOptions {
                min_threshold,
                second_threshold,
            };

            println!("[1/2] Loading table...");
            let loaded = loader::load_table(&table)?;
            println!("✔ {} rows\n", loaded.len());

            println!("[2/2] Normalizing and exporting...");
            let (rows, stats) = normalizer::normalize_best_matches(&loaded, survey, &options);
            println!(
                "✔ {} groups, {} rows blanked{}",
                stats.groups,
                stats.rows_blanked,
                if stats.gated_groups > 0 {
                    format!(", {} groups gated out", stats.gated_groups)
                } else {
                    String::new()
                }
            );

            let stem = format!("{}_normalized", table_stem(&table, "table"));
            let written = export::export_table(&rows, survey, &format, &output, &stem)?;
            for path in &written {
                println!("✔ Table written: {}", path.display());
            }

            println!("\n✅ Done");
        }

        Commands::Report {
            table,
            survey,
            secondary,
            images_dir,
            output,
            max_cases,
        } => {
            println!("🌳 tree-match - review report\n");

            let options = NormalizeOptions::default();

            println!("[1/2] Loading and normalizing tables...");
            let rows = load_and_normalize(&table, survey, &options)?;
            println!("✔ {} rows\n", rows.len());

            let secondary_rows = match &secondary {
                Some(path) => Some(load_and_normalize(
                    path,
                    tree_match_rust::SurveyKind::Small,
                    &options,
                )?),
                None => None,
            };

            println!("[2/2] Rendering report...");
            let report_options = ReportOptions {
                title: "Detections and Matches".to_string(),
                images_dir,
                max_cases: max_cases.unwrap_or(config.max_cases),
                zoom_start: config.zoom_start,
                direction_line_length: config.direction_line_length,
            };
            let stats = report::generate_report(
                &rows,
                secondary_rows.as_deref(),
                &report_options,
                &output,
            )?;
            println!(
                "✔ Report written: {} ({} cases, {} skipped, {} maps)",
                output.display(),
                stats.cases_rendered,
                stats.cases_skipped,
                stats.maps_written
            );

            println!("\n✅ Done");
        }

        Commands::Maps {
            table,
            survey,
            output,
        } => {
            println!("🌳 tree-match - maps\n");

            println!("[1/2] Loading and normalizing table...");
            let rows = load_and_normalize(&table, survey, &NormalizeOptions::default())?;
            println!("✔ {} rows\n", rows.len());

            println!("[2/2] Generating maps...");
            let mut written = 0usize;
            for (_, case_rows) in group_cases(&rows) {
                report::map::generate_map(
                    &case_rows,
                    &output,
                    config.zoom_start,
                    config.direction_line_length,
                    None,
                )?;
                written += 1;
            }
            println!("✔ {} maps written to {}", written, output.display());

            println!("\n✅ Done");
        }

        Commands::Extract {
            table,
            column,
            archive,
            output,
        } => {
            println!("🌳 tree-match - image extraction\n");

            println!("[1/2] Reading image list...");
            let names = loader::load_column(&table, &column)?;
            let wanted: HashSet<String> = names
                .iter()
                .map(|name| basename(name).to_string())
                .collect();
            println!("✔ {} distinct images listed\n", wanted.len());

            println!("[2/2] Extracting from archive...");
            let summary = extract::extract_listed_images(&archive, &wanted, &output)?;
            println!(
                "✔ {} of {} images extracted to {}",
                summary.extracted,
                summary.requested,
                output.display()
            );

            if summary.all_found() {
                println!("\n✅ All files were found and extracted");
            } else {
                println!("\n⚠ Missing files:");
                for name in &summary.missing {
                    println!("  ❌ {}", name);
                }
            }
        }

        Commands::Sample {
            table,
            survey,
            count,
            seed,
            output,
        } => {
            println!("🌳 tree-match - review subset\n");

            println!("[1/2] Loading and normalizing table...");
            let rows = load_and_normalize(&table, survey, &NormalizeOptions::default())?;
            println!("✔ {} rows\n", rows.len());

            println!("[2/2] Sampling subset...");
            let seed = seed.unwrap_or(config.sample_seed);
            let selected = sampler::sample_file_names(&rows, count, seed);
            let selected_set: HashSet<String> = selected.into_iter().collect();
            let subset = sampler::subset_rows(&rows, &selected_set);

            std::fs::create_dir_all(&output)?;
            let stem = format!("{}_sample_{}", table_stem(&table, "table"), count);
            let written = export::export_table(
                &subset,
                survey,
                &cli::TableFormat::Csv,
                &output,
                &stem,
            )?;
            for path in &written {
                println!("✔ Subset written: {}", path.display());
            }

            let list_path = output.join(format!("images_sample_{}.txt", count));
            let listed = export::write_file_name_list(&subset, &list_path)?;
            println!("✔ {} image names listed: {}", listed, list_path.display());

            println!("\n✅ Done");
        }

        Commands::Config {
            set_zoom,
            set_max_cases,
            show,
        } => {
            let mut config = config;

            if let Some(zoom) = set_zoom {
                config.set_zoom_start(zoom)?;
                println!("✔ Map zoom set to {}", zoom);
            }

            if let Some(max_cases) = set_max_cases {
                config.set_max_cases(max_cases)?;
                println!("✔ Report case limit set to {}", max_cases);
            }

            if show || (set_zoom.is_none() && set_max_cases.is_none()) {
                println!("Configuration:");
                println!("  Map zoom: {}", config.zoom_start);
                println!("  Direction line length: {}", config.direction_line_length);
                println!("  Report case limit: {}", config.max_cases);
                println!("  Sample seed: {}", config.sample_seed);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "tree_match_rust=debug,info"
    } else {
        "tree_match_rust=info,warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

/// Load a table and collapse each group to its best match (candidate-list
/// repair and text cleanup happen inside the loader).
fn load_and_normalize(
    table: &Path,
    survey: tree_match_rust::SurveyKind,
    options: &NormalizeOptions,
) -> Result<Vec<tree_match_rust::DetectionRow>> {
    let loaded = loader::load_table(table)?;
    let (rows, _stats) = normalizer::normalize_best_matches(&loaded, survey, options);
    Ok(rows)
}

/// Rows per image, preserving table order.
fn group_cases(
    rows: &[tree_match_rust::DetectionRow],
) -> Vec<(String, Vec<tree_match_rust::DetectionRow>)> {
    let mut order: Vec<(String, Vec<tree_match_rust::DetectionRow>)> = Vec::new();
    let mut positions: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    for row in rows {
        match positions.get(&row.file_name) {
            Some(&idx) => order[idx].1.push(row.clone()),
            None => {
                positions.insert(row.file_name.clone(), order.len());
                order.push((row.file_name.clone(), vec![row.clone()]));
            }
        }
    }
    order
}

fn table_stem(table: &Path, fallback: &str) -> String {
    table
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| fallback.to_string())
}

fn basename(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}
