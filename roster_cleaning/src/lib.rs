mod config;
use log::{debug, info};

use rand::seq::index;
use rand::Rng;

pub use crate::config::*;

/// True when the matric number belongs to the given category.
///
/// The comparison is a case-insensitive prefix match on the trimmed matric
/// number: prefix `SOS` matches `sos/24/25/0861`.
pub fn matches_category(matric_no: &str, prefix: &str) -> bool {
    matric_no
        .trim()
        .to_lowercase()
        .starts_with(&prefix.to_lowercase())
}

/// Downsamples the rows matching the predicate to `target` rows, keeping
/// every other row.
///
/// When more than `target` rows match, an unbiased uniform subset of
/// exactly `target` matching rows is kept, chosen without replacement.
/// Otherwise all matching rows survive. The output holds the non-matching
/// rows first and then the kept matching rows, each group in input order.
pub fn downsample<T, F, R>(
    rows: Vec<T>,
    is_match: F,
    target: usize,
    rng: &mut R,
) -> (Vec<T>, SampleStats)
where
    F: Fn(&T) -> bool,
    R: Rng + ?Sized,
{
    let total = rows.len();
    let mut matching: Vec<T> = Vec::new();
    let mut non_matching: Vec<T> = Vec::new();
    for row in rows {
        if is_match(&row) {
            matching.push(row);
        } else {
            non_matching.push(row);
        }
    }
    let matching_count = matching.len();
    let non_matching_count = non_matching.len();

    let kept: Vec<T> = if matching_count > target {
        let mut idxs = index::sample(rng, matching_count, target).into_vec();
        idxs.sort_unstable();
        debug!("downsample: kept matching indices: {:?}", idxs);
        let mut kept: Vec<T> = Vec::with_capacity(target);
        let mut next = idxs.into_iter().peekable();
        for (i, row) in matching.into_iter().enumerate() {
            if next.peek() == Some(&i) {
                next.next();
                kept.push(row);
            }
        }
        kept
    } else {
        matching
    };

    let stats = SampleStats {
        total,
        matching: matching_count,
        non_matching: non_matching_count,
        kept_matching: kept.len(),
    };
    info!(
        "downsample: {} rows in, {} matching, kept {} matching",
        stats.total, stats.matching, stats.kept_matching
    );

    let mut out = non_matching;
    out.extend(kept);
    (out, stats)
}

/// Derives the academic level from a matric number such as
/// `SOS/24/25/0861`, whose second segment is the two-digit enrollment year.
///
/// A matric number with fewer than 3 segments carries no enrollment year
/// and maps to the empty string. A year segment that does not parse maps
/// to the default level `100`.
pub fn derive_level(matric_no: &str, reference_year: i32) -> String {
    let parts: Vec<&str> = matric_no.split('/').collect();
    if parts.len() < 3 {
        return String::new();
    }
    match parts[1].parse::<i32>() {
        Ok(year) => {
            let years_in_school = reference_year - year;
            format!("{}", years_in_school * 100 + 100)
        }
        Err(_) => "100".to_string(),
    }
}

/// Builds a fallback address from the matric number, with the slashes
/// replaced by underscores: `SOS/24/25/0861` -> `sos_24_25_0861@<domain>`.
pub fn synthesize_email(matric_no: &str, domain: &str) -> String {
    format!("{}@{}", matric_no.replace('/', "_").to_lowercase(), domain)
}

/// Derives one voter-upload row from the raw roster cells.
///
/// Returns `None` when the first name, last name or matric number is blank
/// after trimming; callers count such rows as skipped.
pub fn map_voter(src: &VoterSource, rules: &MapperRules) -> Option<Voter> {
    let first_name = src.first_name.trim();
    let last_name = src.last_name.trim();
    let matric_no = src.matric_no.trim();
    if first_name.is_empty() || last_name.is_empty() || matric_no.is_empty() {
        return None;
    }

    let mut email = src.username.trim().to_lowercase();
    if email.is_empty() {
        email = synthesize_email(matric_no, &rules.email_domain);
    }

    Some(Voter {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email,
        level: derive_level(matric_no, rules.reference_year),
        matric_no: matric_no.to_string(),
    })
}
