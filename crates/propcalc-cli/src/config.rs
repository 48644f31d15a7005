use std::path::Path;

use propcalc_core::PolicyConfig;
use tracing::debug;

use crate::input::file;

/// Policy from `--config`, JSON or YAML by file extension. Compiled-in
/// defaults when no file is given.
pub fn load_policy(path: Option<&str>) -> Result<PolicyConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(PolicyConfig::default());
    };

    let (canonical, contents) = file::read_text(path)?;
    let yaml = matches!(
        Path::new(path).extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let policy = parse_policy(&contents, yaml)
        .map_err(|e| format!("Invalid policy '{}': {}", canonical.display(), e))?;

    debug!(path = %canonical.display(), yaml, "loaded policy");
    Ok(policy)
}

fn parse_policy(contents: &str, yaml: bool) -> Result<PolicyConfig, Box<dyn std::error::Error>> {
    if yaml {
        let policy: PolicyConfig = serde_yaml::from_str(contents)?;
        policy.validate()?;
        Ok(policy)
    } else {
        Ok(PolicyConfig::from_json_str(contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_yaml_policy_overrides_one_field() {
        let yaml = "scenarios:\n  capital_gains_rate_percent: \"20\"\n";
        let policy = parse_policy(yaml, true).unwrap();
        assert_eq!(policy.scenarios.capital_gains_rate_percent, dec!(20));
        assert_eq!(policy.scenarios.default_selling_costs_percent, dec!(5));
    }

    #[test]
    fn test_yaml_policy_is_validated() {
        let yaml = "solver:\n  max_iterations: 0\n";
        assert!(parse_policy(yaml, true).is_err());
    }

    #[test]
    fn test_json_policy() {
        let policy = parse_policy(r#"{"partners": {"allocation_tolerance": "0.5"}}"#, false).unwrap();
        assert_eq!(policy.partners.allocation_tolerance, dec!(0.5));
    }
}
