use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde_json::Value;

use crate::error::{ConfigError, DateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateComponent {
    Day,
    Month,
    Year,
}

impl FromStr for DateComponent {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dd" => Ok(DateComponent::Day),
            "mm" => Ok(DateComponent::Month),
            "yyyy" => Ok(DateComponent::Year),
            other => Err(DateError::UnknownComponent(other.to_string())),
        }
    }
}

/// Pull one component out of an `mm-dd-yyyy` string after checking it is a real date
pub fn extract_date_component(date: &str, component: DateComponent) -> Result<i32, DateError> {
    let parts: Vec<&str> = date.split('-').collect();
    let &[month, day, year] = parts.as_slice() else {
        return Err(DateError::Format(date.to_string()));
    };

    let numeric = |s: &str| s.trim().parse::<i32>().map_err(|_| DateError::NonNumeric(date.to_string()));
    let (month, day, year) = (numeric(month)?, numeric(day)?, numeric(year)?);

    let parsed = u32::try_from(month)
        .ok()
        .zip(u32::try_from(day).ok())
        .and_then(|(m, d)| NaiveDate::from_ymd_opt(year, m, d))
        .ok_or_else(|| DateError::Impossible(date.to_string()))?;

    Ok(match component {
        DateComponent::Day => parsed.day() as i32,
        DateComponent::Month => parsed.month() as i32,
        DateComponent::Year => parsed.year(),
    })
}

/// Look up `number` (as a string key) in a JSON object file
pub fn get_details_from_json<P: AsRef<Path>>(path: P, number: impl Display) -> Result<Option<Value>, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    let data: Value = serde_json::from_str(&text)?;
    Ok(data.get(number.to_string()).cloned())
}

/// First character upper-case, the rest lower-case
pub fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub fn capitalize_labels<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    labels.iter().map(|l| capitalize(l.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_components() {
        assert_eq!(extract_date_component("12-25-2024", DateComponent::Month), Ok(12));
        assert_eq!(extract_date_component("12-25-2024", DateComponent::Day), Ok(25));
        assert_eq!(extract_date_component("12-25-2024", DateComponent::Year), Ok(2024));
        assert_eq!(extract_date_component("02-29-2024", DateComponent::Day), Ok(29));
    }

    #[test]
    fn test_component_names() {
        assert_eq!("mm".parse::<DateComponent>(), Ok(DateComponent::Month));
        assert_eq!(
            "month".parse::<DateComponent>(),
            Err(DateError::UnknownComponent("month".to_string()))
        );
    }

    #[test]
    fn test_bad_dates() {
        assert!(matches!(extract_date_component("2024-25-12", DateComponent::Day), Err(DateError::Impossible(_))));
        assert!(matches!(extract_date_component("12/25/2024", DateComponent::Day), Err(DateError::Format(_))));
        assert!(matches!(extract_date_component("12-25-20-24", DateComponent::Day), Err(DateError::Format(_))));
        assert!(matches!(extract_date_component("ab-25-2024", DateComponent::Day), Err(DateError::NonNumeric(_))));
        assert!(matches!(extract_date_component("02-30-2023", DateComponent::Day), Err(DateError::Impossible(_))));
        assert!(matches!(extract_date_component("-1-10-2023", DateComponent::Day), Err(DateError::Format(_))));
    }

    #[test]
    fn test_details_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("details.json");
        let data = json!({
            "1": { "name": "Image1", "description": "Test image 1" },
            "2": { "name": "Image2", "description": "Test image 2" }
        });
        std::fs::write(&path, data.to_string()).unwrap();

        assert_eq!(
            get_details_from_json(&path, 1).unwrap(),
            Some(json!({ "name": "Image1", "description": "Test image 1" }))
        );
        assert_eq!(get_details_from_json(&path, 3).unwrap(), None);
    }

    #[test]
    fn test_details_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(get_details_from_json(dir.path().join("none.json"), 1), Err(ConfigError::Io(_))));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ nope").unwrap();
        assert!(matches!(get_details_from_json(&broken, 1), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("hELLO"), "Hello");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("object1"), "Object1");
        assert_eq!(capitalize_labels(&["cup", "PLATE", "Fork"]), vec!["Cup", "Plate", "Fork"]);
    }
}
