use crate::types::SurveyKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tree-match")]
#[command(about = "Street-tree detection match review and reporting tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize a detection table and render the full review report
    Run {
        /// Detection-match table (.xlsx/.xls/.csv/.txt)
        #[arg(required = true)]
        table: PathBuf,

        /// Survey kind of the table (city/small)
        #[arg(short, long, default_value = "city")]
        survey: SurveyKind,

        /// Small-survey table for the side-by-side report layout
        #[arg(long)]
        secondary: Option<PathBuf>,

        /// Folder containing the annotated detection images
        #[arg(short, long)]
        images_dir: PathBuf,

        /// Output directory (report, maps and table re-exports)
        #[arg(short, long)]
        output: PathBuf,

        /// Table re-export format (xlsx/csv/both)
        #[arg(short, long, default_value = "both")]
        format: TableFormat,

        /// Keep a group's best match only if its angle is below this value
        #[arg(long)]
        min_threshold: Option<f64>,

        /// ...and the second-best angle is above this value
        #[arg(long)]
        second_threshold: Option<f64>,

        /// Maximum number of cases in the report (default from config)
        #[arg(long)]
        max_cases: Option<usize>,
    },

    /// Normalize a detection table and re-export it
    Normalize {
        /// Detection-match table (.xlsx/.xls/.csv/.txt)
        #[arg(required = true)]
        table: PathBuf,

        /// Survey kind of the table (city/small)
        #[arg(short, long, default_value = "city")]
        survey: SurveyKind,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Re-export format (xlsx/csv/both)
        #[arg(short, long, default_value = "both")]
        format: TableFormat,

        /// Keep a group's best match only if its angle is below this value
        #[arg(long)]
        min_threshold: Option<f64>,

        /// ...and the second-best angle is above this value
        #[arg(long)]
        second_threshold: Option<f64>,
    },

    /// Render the paginated review report from a detection table
    Report {
        /// Detection-match table (.xlsx/.xls/.csv/.txt)
        #[arg(required = true)]
        table: PathBuf,

        /// Survey kind of the table (city/small)
        #[arg(short, long, default_value = "city")]
        survey: SurveyKind,

        /// Small-survey table for the side-by-side layout
        #[arg(long)]
        secondary: Option<PathBuf>,

        /// Folder containing the annotated detection images
        #[arg(short, long)]
        images_dir: PathBuf,

        /// Output HTML file (maps are written next to it)
        #[arg(short, long)]
        output: PathBuf,

        /// Maximum number of cases (default from config)
        #[arg(long)]
        max_cases: Option<usize>,
    },

    /// Generate the per-image interactive map documents only
    Maps {
        /// Detection-match table (.xlsx/.xls/.csv/.txt)
        #[arg(required = true)]
        table: PathBuf,

        /// Survey kind of the table (city/small)
        #[arg(short, long, default_value = "city")]
        survey: SurveyKind,

        /// Output directory for the map HTML files
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Extract the images referenced by a table from a ZIP archive
    Extract {
        /// Table listing the wanted images (.xlsx/.xls/.csv/.txt)
        #[arg(required = true)]
        table: PathBuf,

        /// Column holding the image file names
        #[arg(short, long, default_value = "file_name")]
        column: String,

        /// ZIP archive of raw images
        #[arg(short, long)]
        archive: PathBuf,

        /// Output directory for the extracted images
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Sample a reproducible review subset of images
    Sample {
        /// Detection-match table (.xlsx/.xls/.csv/.txt)
        #[arg(required = true)]
        table: PathBuf,

        /// Survey kind of the table (city/small)
        #[arg(short, long, default_value = "city")]
        survey: SurveyKind,

        /// Images to draw from each of the matched and unmatched pools
        #[arg(short, long, default_value = "100")]
        count: usize,

        /// Sampling seed (default from config)
        #[arg(long)]
        seed: Option<u64>,

        /// Output directory (subset CSV and file-name list)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show or edit the stored defaults
    Config {
        /// Set the initial map zoom level
        #[arg(long)]
        set_zoom: Option<u32>,

        /// Set the report case limit
        #[arg(long)]
        set_max_cases: Option<usize>,

        /// Show the current configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Clone, Debug, Default)]
pub enum TableFormat {
    Xlsx,
    Csv,
    #[default]
    Both,
}

impl std::str::FromStr for TableFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xlsx" | "excel" => Ok(TableFormat::Xlsx),
            "csv" => Ok(TableFormat::Csv),
            "both" => Ok(TableFormat::Both),
            _ => Err(format!("Unknown format: {}. Use xlsx, csv, or both", s)),
        }
    }
}

impl std::fmt::Display for TableFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableFormat::Xlsx => write!(f, "xlsx"),
            TableFormat::Csv => write!(f, "csv"),
            TableFormat::Both => write!(f, "both"),
        }
    }
}
