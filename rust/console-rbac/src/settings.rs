use serde::{Deserialize, Serialize};

/// Tunables of the description request sent for each required resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Levels of child descriptions requested for recursive views. Capped
    /// to bound the payload size; the backend never recurses further.
    pub recursive_depth: u32,
    /// Ask for the size-reduced form of the access-control section.
    pub trim_descriptions: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recursive_depth: 2,
            trim_descriptions: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    #[test]
    fn it_fills_in_defaults() -> TestResult {
        let settings: Settings = serde_json::from_str(r#"{"recursive-depth": 1}"#)?;
        assert_eq!(settings.recursive_depth, 1);
        assert!(settings.trim_descriptions);
        assert_eq!(serde_json::from_str::<Settings>("{}")?, Settings::default());
        Ok(())
    }
}
