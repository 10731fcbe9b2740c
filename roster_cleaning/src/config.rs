// ********* Input data structures ***********

/// Rules governing the downsampling of one roster category.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SamplerRules {
    /// Case-insensitive prefix on the matric number that marks the category
    /// to downsample.
    pub category_prefix: String,
    /// Number of matching records to keep. Non-matching records are always
    /// kept in full.
    pub target_count: usize,
    /// Seed for the random selection. When absent, the selection is seeded
    /// from the operating system and is not reproducible.
    pub seed: Option<u64>,
}

impl Default for SamplerRules {
    fn default() -> Self {
        SamplerRules {
            category_prefix: "SOS".to_string(),
            target_count: 250,
            seed: None,
        }
    }
}

/// Rules governing the voter-schema derivation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MapperRules {
    /// Two-digit intake year of the current first-year cohort. A student
    /// whose matric number carries this enrollment year is at level 100.
    pub reference_year: i32,
    /// Domain of the addresses synthesized for rows without a username.
    pub email_domain: String,
}

impl Default for MapperRules {
    fn default() -> Self {
        MapperRules {
            reference_year: 24,
            email_domain: "student.edu".to_string(),
        }
    }
}

/// The raw cells of one roster row, as handed to the voter derivation.
/// All values are untrimmed strings straight from the file.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct VoterSource {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub matric_no: String,
}

// ******** Output data structures *********

/// One row of the fixed voter-upload schema.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Voter {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub level: String,
    pub matric_no: String,
}

/// Counters describing one downsampling pass.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct SampleStats {
    /// Rows read from the input, header excluded.
    pub total: usize,
    /// Rows whose matric number matched the category prefix.
    pub matching: usize,
    /// Rows outside the category. These are all kept.
    pub non_matching: usize,
    /// Matching rows kept after the random selection.
    pub kept_matching: usize,
}

impl SampleStats {
    /// Matching rows dropped by the selection.
    pub fn removed(&self) -> usize {
        self.matching - self.kept_matching
    }

    /// Rows in the output.
    pub fn output_total(&self) -> usize {
        self.non_matching + self.kept_matching
    }
}

/// Counters describing one voter-schema derivation pass.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct MapperStats {
    /// Rows emitted to the voters file.
    pub emitted: usize,
    /// Rows dropped for missing first name, last name or matric number.
    pub skipped: usize,
}
