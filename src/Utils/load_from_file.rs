//! Loading a reactor task from a text document.
//!
//! The document holds JSON sections under upper-case headers:
//!
//! ```text
//! REACTOR
//! { ... ReactorConfig ... }
//! PROFILES
//! { "default_fun": "linear", "adjust_Np": false, "enzymeA": {...} }
//! DECAY
//! { "Enzyme_A": 0.004, "Enzyme_B": 0.0 }
//! ```
//!
//! Only `REACTOR` is required. Parse errors are reported with the line in the file.
use crate::PoreReactor::reactor_errors::CascadeError;
use crate::PoreReactor::reactor_model::{DecayCoefficients, ProfileConfig};
use crate::PoreReactor::reactor_params::ReactorConfig;
use log::{error, info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub struct LoadData {
    pub file_name: String,
}

impl LoadData {
    pub fn new(file_name: String) -> Self {
        LoadData { file_name }
    }
    pub fn load_reactor(&self) -> Result<ReactorConfig, CascadeError> {
        load_reactor_config(&self.file_name)
    }
    pub fn load_profiles(&self, enzymes: &[String]) -> Result<ProfileConfig, CascadeError> {
        load_profile_config(&self.file_name, enzymes)
    }
    pub fn load_decay(&self) -> Result<DecayCoefficients, CascadeError> {
        load_decay_coefficients(&self.file_name)
    }
}

fn read_lines(file_name: &str) -> Result<Vec<String>, CascadeError> {
    let path = Path::new(file_name);
    if !path.exists() {
        return Err(CascadeError::Configuration(format!(
            "File '{}' does not exist",
            file_name
        )));
    }
    let file = File::open(path).map_err(|e| {
        CascadeError::Configuration(format!("Failed to open file '{}': {}", file_name, e))
    })?;
    let reader = BufReader::new(file);
    Ok(reader.lines().map_while(Result::ok).collect())
}

fn is_header(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_uppercase() || c == '_')
}

/// Line range of the section below `header`, None if the header is absent
fn find_section(lines: &[String], header: &str) -> Option<(usize, usize)> {
    let start = lines
        .iter()
        .position(|line| line.trim().to_uppercase() == header)?
        + 1;
    let end = (start..lines.len())
        .find(|&i| is_header(&lines[i]))
        .unwrap_or(lines.len());
    Some((start, end))
}

/// Parses the JSON of one section, reporting errors with the position in the file
fn parse_section<T: DeserializeOwned>(
    lines: &[String],
    (start, end): (usize, usize),
    header: &str,
    file_name: &str,
) -> Result<T, CascadeError> {
    let section = lines[start..end].join("\n");
    match serde_json::from_str::<T>(&section) {
        Ok(data) => {
            info!(
                "Successfully parsed {} section from file '{}'",
                header, file_name
            );
            Ok(data)
        }
        Err(e) => {
            let error_line = e.line();
            let error_column = e.column();
            // lines are 1-based in the message
            let actual_line = start + error_line;
            let error_msg = format!(
                "Error parsing {} section at line {}, column {} (line {} in file): {}",
                header, error_line, error_column, actual_line, e
            );
            error!("{}", error_msg);
            if actual_line >= 1 && actual_line - 1 < lines.len() {
                let problem_line = &lines[actual_line - 1];
                error!("Problematic line: {}", problem_line);
                if error_column >= 1 && error_column <= problem_line.len() {
                    error!("{}", " ".repeat(error_column - 1) + "^");
                }
            }
            Err(CascadeError::Configuration(error_msg))
        }
    }
}

/// Reads the REACTOR section into a `ReactorConfig`
pub fn load_reactor_config(file_name: &str) -> Result<ReactorConfig, CascadeError> {
    let lines = read_lines(file_name)?;
    let range = find_section(&lines, "REACTOR").ok_or_else(|| {
        CascadeError::Configuration(format!(
            "No 'REACTOR' header found in file '{}'",
            file_name
        ))
    })?;
    let config: ReactorConfig = parse_section(&lines, range, "REACTOR", file_name)?;
    if config.species.is_empty() {
        warn!("Reactor section of '{}' lists no species", file_name);
    }
    Ok(config)
}

/// Reads the PROFILES section, stage defaults when the section is absent
pub fn load_profile_config(
    file_name: &str,
    enzymes: &[String],
) -> Result<ProfileConfig, CascadeError> {
    let lines = read_lines(file_name)?;
    match find_section(&lines, "PROFILES") {
        Some(range) => {
            let value: Value = parse_section(&lines, range, "PROFILES", file_name)?;
            ProfileConfig::from_value(&value, enzymes)
        }
        None => {
            info!("No 'PROFILES' section in '{}', using defaults", file_name);
            Ok(ProfileConfig::new())
        }
    }
}

/// Reads the DECAY section, an empty set when the section is absent
pub fn load_decay_coefficients(file_name: &str) -> Result<DecayCoefficients, CascadeError> {
    let lines = read_lines(file_name)?;
    match find_section(&lines, "DECAY") {
        Some(range) => {
            let rates: HashMap<String, f64> = parse_section(&lines, range, "DECAY", file_name)?;
            Ok(DecayCoefficients { rates })
        }
        None => {
            info!("No 'DECAY' section in '{}'", file_name);
            Ok(DecayCoefficients::default())
        }
    }
}
