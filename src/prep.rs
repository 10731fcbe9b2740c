use log::{debug, info};

use snafu::{prelude::*, Snafu};

use rand::rngs::StdRng;
use rand::SeedableRng;

use roster_cleaning::*;

use crate::args::{Args, Command};
use crate::prep::config_reader::{read_config, RosterConfig};
use crate::prep::io_common::{backup_file, derived_path};
use crate::prep::io_csv::{read_roster, write_roster, write_voters, RosterTable};

pub mod config_reader;
pub mod io_common;
pub mod io_csv;

#[derive(Debug, Snafu)]
pub enum PrepError {
    #[snafu(display("Input file not found: {path}"))]
    InputNotFound { path: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading a CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Error writing CSV file {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error flushing CSV file {path}"))]
    CsvFlush { source: std::io::Error, path: String },
    #[snafu(display("Missing column {name:?} in the header of {path}"))]
    MissingColumn { name: String, path: String },
    #[snafu(display("Error copying {path} to backup {backup_path}"))]
    BackupCopy {
        source: std::io::Error,
        path: String,
        backup_path: String,
    },
    #[snafu(display("Error opening config file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing config file"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Config field {name} is not a number"))]
    ParsingJsonNumber { name: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PrepResult<T> = Result<T, PrepError>;

/// Names of the roster columns feeding the transforms.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RosterColumns {
    pub matric: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
}

impl Default for RosterColumns {
    fn default() -> Self {
        RosterColumns {
            matric: "Matric No".to_string(),
            first_name: "First Name".to_string(),
            last_name: "Last Name".to_string(),
            username: "Username".to_string(),
        }
    }
}

pub fn run_command(args: &Args) -> PrepResult<()> {
    let cfg = match &args.config {
        Some(p) => read_config(p)?,
        None => RosterConfig::default(),
    };
    let columns = cfg.columns();
    match &args.command {
        Command::Sample {
            input,
            out,
            prefix,
            target,
            seed,
        } => {
            let rules = sampler_rules(&cfg, prefix, target, seed)?;
            run_sample(input, out.clone(), &columns, &rules).map(|_| ())
        }
        Command::Prepare {
            input,
            out,
            reference_year,
            email_domain,
        } => {
            let rules = mapper_rules(&cfg, reference_year, email_domain)?;
            run_prepare(input, out.clone(), &columns, &rules).map(|_| ())
        }
    }
}

// Flag > config field > default, for every option.
fn sampler_rules(
    cfg: &RosterConfig,
    prefix: &Option<String>,
    target: &Option<usize>,
    seed: &Option<u64>,
) -> PrepResult<SamplerRules> {
    let defaults = SamplerRules::default();
    Ok(SamplerRules {
        category_prefix: prefix
            .clone()
            .or_else(|| cfg.category_prefix.clone())
            .unwrap_or(defaults.category_prefix),
        target_count: match target {
            Some(t) => *t,
            None => cfg.target_count()?.unwrap_or(defaults.target_count),
        },
        seed: match seed {
            Some(s) => Some(*s),
            None => cfg.random_seed()?,
        },
    })
}

fn mapper_rules(
    cfg: &RosterConfig,
    reference_year: &Option<i32>,
    email_domain: &Option<String>,
) -> PrepResult<MapperRules> {
    let defaults = MapperRules::default();
    Ok(MapperRules {
        reference_year: match reference_year {
            Some(y) => *y,
            None => cfg.reference_year()?.unwrap_or(defaults.reference_year),
        },
        email_domain: email_domain
            .clone()
            .or_else(|| cfg.email_domain.clone())
            .unwrap_or(defaults.email_domain),
    })
}

/// Downsamples the category rows of a roster file to the target count and
/// writes the result next to the input.
pub fn run_sample(
    input: &str,
    out: Option<String>,
    columns: &RosterColumns,
    rules: &SamplerRules,
) -> PrepResult<SampleStats> {
    info!("run_sample: input {:?} rules {:?}", input, rules);
    let table = read_roster(input)?;
    let matric_idx = table.column(&columns.matric).context(MissingColumnSnafu {
        name: columns.matric.clone(),
        path: input.to_string(),
    })?;

    let backup_path = backup_file(input)?;
    println!("Backup created: {}", backup_path);

    let mut rng: StdRng = match rules.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };
    let RosterTable { header, rows } = table;
    let prefix = rules.category_prefix.as_str();
    let (kept_rows, stats) = downsample(
        rows,
        |r| matches_category(r.get(matric_idx).unwrap_or(""), prefix),
        rules.target_count,
        &mut rng,
    );

    println!("Original records: {} ({} matching {:?}, {} others)",
        stats.total, stats.matching, prefix, stats.non_matching);
    if stats.removed() > 0 {
        println!("Randomly removing {} matching records...", stats.removed());
    } else {
        println!(
            "Matching count ({}) is already at or below the target ({}), nothing removed",
            stats.matching, rules.target_count
        );
    }

    let out_path = out.unwrap_or_else(|| derived_path(input, "_filtered"));
    write_roster(&out_path, &header, &kept_rows)?;

    println!("Filtered file created: {}", out_path);
    println!("New records: {} ({} matching {:?}, {} others)",
        stats.output_total(), stats.kept_matching, prefix, stats.non_matching);
    if stats.output_total() > 0 {
        println!(
            "Share of matching records: {:.2}%",
            (stats.kept_matching as f64) / (stats.output_total() as f64) * 100.0
        );
    }
    Ok(stats)
}

/// Reshapes a roster file into the fixed voter-upload schema and writes it
/// next to the input.
pub fn run_prepare(
    input: &str,
    out: Option<String>,
    columns: &RosterColumns,
    rules: &MapperRules,
) -> PrepResult<MapperStats> {
    info!("run_prepare: input {:?} rules {:?}", input, rules);
    let table = read_roster(input)?;
    // A missing column reads as blank cells, like an absent value in a row.
    let matric_idx = table.column(&columns.matric);
    let first_idx = table.column(&columns.first_name);
    let last_idx = table.column(&columns.last_name);
    let user_idx = table.column(&columns.username);
    debug!(
        "run_prepare: column indices: matric {:?} first {:?} last {:?} user {:?}",
        matric_idx, first_idx, last_idx, user_idx
    );

    let backup_path = backup_file(input)?;
    println!("Backup created: {}", backup_path);

    let mut voters: Vec<Voter> = Vec::new();
    let mut skipped: usize = 0;
    for row in table.rows.iter() {
        let src = VoterSource {
            first_name: cell(row, first_idx).to_string(),
            last_name: cell(row, last_idx).to_string(),
            username: cell(row, user_idx).to_string(),
            matric_no: cell(row, matric_idx).to_string(),
        };
        match map_voter(&src, rules) {
            Some(v) => voters.push(v),
            None => skipped += 1,
        }
    }
    if voters.is_empty() {
        whatever!("No valid voter rows found in {}", input);
    }

    let out_path = out.unwrap_or_else(|| derived_path(input, "_voters_ready"));
    write_voters(&out_path, &voters)?;

    println!("Voters file created: {}", out_path);
    println!("Total voters processed: {}", voters.len());
    println!("Skipped (missing data): {}", skipped);
    println!("First rows:");
    for (i, v) in voters.iter().take(3).enumerate() {
        println!(
            "   {}. {} {} | {} | Level {} | {}",
            i + 1,
            v.first_name,
            v.last_name,
            v.email,
            v.level,
            v.matric_no
        );
    }
    Ok(MapperStats {
        emitted: voters.len(),
        skipped,
    })
}

fn cell(row: &csv::StringRecord, idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i)).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;

    const HEADER: &str = "Matric No,First Name,Last Name,Username";

    fn write_lines(dir: &Path, name: &str, lines: &[String]) -> String {
        let path = dir.join(name);
        fs::write(&path, lines.join("\n")).unwrap();
        path.to_str().unwrap().to_string()
    }

    fn roster_lines(matching: usize, others: usize) -> Vec<String> {
        let mut lines = vec![HEADER.to_string()];
        for i in 0..matching {
            lines.push(format!("SOS/24/25/{:04},First{},Last{},user{}@example.org", i, i, i, i));
        }
        for i in 0..others {
            lines.push(format!("ART/23/24/{:04},Ada{},Byron{},", i, i, i));
        }
        lines
    }

    #[test]
    fn sample_end_to_end_keeps_all_non_matching_rows() {
        let temp = tempfile::tempdir().unwrap();
        let input = write_lines(temp.path(), "roster.csv", &roster_lines(280, 20));

        let rules = SamplerRules {
            category_prefix: "SOS".to_string(),
            target_count: 250,
            seed: Some(17),
        };
        let stats = run_sample(&input, None, &RosterColumns::default(), &rules).unwrap();
        assert_eq!(stats.output_total(), 270);
        assert_eq!(stats.kept_matching, 250);
        assert_eq!(stats.non_matching, 20);

        let out = read_roster(&derived_path(&input, "_filtered")).unwrap();
        assert_eq!(out.header.get(0), Some("Matric No"));
        assert_eq!(out.rows.len(), 270);
        let others = out
            .rows
            .iter()
            .filter(|r| r.get(0).unwrap_or("").starts_with("ART"))
            .count();
        assert_eq!(others, 20);
    }

    #[test]
    fn sample_under_target_drops_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let input = write_lines(temp.path(), "roster.csv", &roster_lines(10, 3));

        let rules = SamplerRules {
            category_prefix: "SOS".to_string(),
            target_count: 250,
            seed: None,
        };
        let stats = run_sample(&input, None, &RosterColumns::default(), &rules).unwrap();
        assert_eq!(stats.removed(), 0);
        let out = read_roster(&derived_path(&input, "_filtered")).unwrap();
        assert_eq!(out.rows.len(), 13);
    }

    #[test]
    fn sample_reports_missing_input() {
        let res = run_sample(
            "/nonexistent/roster.csv",
            None,
            &RosterColumns::default(),
            &SamplerRules::default(),
        );
        assert!(matches!(res, Err(PrepError::InputNotFound { .. })));
    }

    #[test]
    fn sample_reports_missing_matric_column() {
        let temp = tempfile::tempdir().unwrap();
        let input = write_lines(
            temp.path(),
            "roster.csv",
            &["Surname,Given".to_string(), "Byron,Ada".to_string()],
        );
        let res = run_sample(&input, None, &RosterColumns::default(), &SamplerRules::default());
        assert!(matches!(res, Err(PrepError::MissingColumn { .. })));
    }

    #[test]
    fn backup_is_a_byte_copy_of_the_input() {
        let temp = tempfile::tempdir().unwrap();
        let input = write_lines(temp.path(), "roster.csv", &roster_lines(4, 1));
        let original = fs::read(&input).unwrap();

        run_sample(&input, None, &RosterColumns::default(), &SamplerRules::default()).unwrap();

        let backup = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .find(|e| e.file_name().to_string_lossy().contains("_backup_"))
            .expect("no backup file written");
        assert_eq!(fs::read(backup.path()).unwrap(), original);
    }

    #[test]
    fn prepare_end_to_end_writes_the_fixed_schema() {
        let temp = tempfile::tempdir().unwrap();
        let lines = vec![
            HEADER.to_string(),
            "SOS/24/25/0861,Ada,Lovelace,".to_string(),
            "SOS/23/24/0012,Alan,Turing,Alan.Turing@Example.org".to_string(),
            "SOS/0002,Grace,Hopper,grace@example.org".to_string(),
            "SOS/24/25/0003,,Babbage,charles@example.org".to_string(),
        ];
        let input = write_lines(temp.path(), "roster.csv", &lines);

        let stats = run_prepare(
            &input,
            None,
            &RosterColumns::default(),
            &MapperRules::default(),
        )
        .unwrap();
        assert_eq!(stats.emitted, 3);
        assert_eq!(stats.skipped, 1);

        let out = read_roster(&derived_path(&input, "_voters_ready")).unwrap();
        let header: Vec<&str> = out.header.iter().collect();
        assert_eq!(
            header,
            vec!["first_name", "last_name", "email", "level", "Matric No"]
        );
        assert_eq!(out.rows.len(), 3);

        // Synthesized email and level for the row without a username.
        assert_eq!(out.rows[0].get(2), Some("sos_24_25_0861@student.edu"));
        assert_eq!(out.rows[0].get(3), Some("100"));
        // Lowercased username and second-year level.
        assert_eq!(out.rows[1].get(2), Some("alan.turing@example.org"));
        assert_eq!(out.rows[1].get(3), Some("200"));
        // Matric number too short for a level.
        assert_eq!(out.rows[2].get(3), Some(""));
    }

    #[test]
    fn prepare_with_no_valid_rows_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let lines = vec![HEADER.to_string(), ",,only-a-matric,".to_string()];
        let input = write_lines(temp.path(), "roster.csv", &lines);
        let res = run_prepare(
            &input,
            None,
            &RosterColumns::default(),
            &MapperRules::default(),
        );
        assert!(res.is_err());
        assert!(!Path::new(&derived_path(&input, "_voters_ready")).exists());
    }

    #[test]
    fn flags_take_precedence_over_config_fields() {
        let cfg: RosterConfig = serde_json::from_str(
            r#"{"categoryPrefix": "eng", "targetCount": "5", "randomSeed": 42, "referenceYear": 23}"#,
        )
        .unwrap();

        let rules = sampler_rules(&cfg, &Some("SOS".to_string()), &None, &None).unwrap();
        assert_eq!(rules.category_prefix, "SOS");
        assert_eq!(rules.target_count, 5);
        assert_eq!(rules.seed, Some(42));

        let rules = mapper_rules(&cfg, &Some(24), &None).unwrap();
        assert_eq!(rules.reference_year, 24);
        assert_eq!(rules.email_domain, "student.edu");
    }
}
