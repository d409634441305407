//! Profiles baked into the binary at compile time.
//!
//! Packagers set `IDCONSOLE_DEFAULT_PROFILES` to a JSON object of profile
//! entries when building; the value is embedded with `option_env!`.

use idconsole_domain::ProfilesMap;

/// Compile-time env var holding the build-time profiles JSON.
pub const BUILD_PROFILES_VAR: &str = "IDCONSOLE_DEFAULT_PROFILES";

const EMBEDDED: Option<&str> = option_env!("IDCONSOLE_DEFAULT_PROFILES");

/// Build-time profile layer plus a parse problem, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildTimeProfiles {
    /// Parsed entries; empty when unset or invalid.
    pub profiles: ProfilesMap,
    /// Why the embedded value was discarded.
    pub problem: Option<String>,
}

/// The build-time layer compiled into this binary.
pub fn build_time_profiles() -> BuildTimeProfiles {
    parse_build_time_profiles(EMBEDDED)
}

/// Leniently parse a build-time profiles value: anything invalid yields an
/// empty layer and a problem description instead of an error.
pub fn parse_build_time_profiles(raw: Option<&str>) -> BuildTimeProfiles {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return BuildTimeProfiles::default();
    };
    match serde_json::from_str::<ProfilesMap>(raw) {
        Ok(profiles) => BuildTimeProfiles {
            profiles,
            problem: None,
        },
        Err(error) => BuildTimeProfiles {
            profiles: ProfilesMap::new(),
            problem: Some(format!("{BUILD_PROFILES_VAR} is not a profiles object: {error}")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_or_blank_is_empty_without_problem() {
        assert_eq!(parse_build_time_profiles(None), BuildTimeProfiles::default());
        assert_eq!(
            parse_build_time_profiles(Some("  ")),
            BuildTimeProfiles::default()
        );
    }

    #[test]
    fn valid_json_keeps_order() {
        let parsed = parse_build_time_profiles(Some(
            r#"{"dev":{"adminBaseURL":"http://dev:4434"},"qa":{}}"#,
        ));
        assert_eq!(parsed.problem, None);
        assert_eq!(parsed.profiles.keys().collect::<Vec<_>>(), vec!["dev", "qa"]);
    }

    #[test]
    fn invalid_json_is_reported_not_raised() {
        let parsed = parse_build_time_profiles(Some("[1,2]"));
        assert!(parsed.profiles.is_empty());
        assert!(
            parsed
                .problem
                .is_some_and(|problem| problem.contains(BUILD_PROFILES_VAR))
        );
    }
}
