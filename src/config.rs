//! Typed agent configuration, parsed once from `key=value` option strings.

use std::path::PathBuf;

use crate::ntuple::default_patterns;

/// Which side of the game an agent plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Slider,
    Placer,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("malformed option '{0}' (expected key=value)")]
    MalformedOption(String),
    #[error("unrecognized option key '{0}'")]
    UnknownKey(String),
    #[error("invalid value '{value}' for '{key}': {reason}")]
    InvalidValue { key: &'static str, value: String, reason: String },
}

pub const DEFAULT_ALPHA: f32 = 0.1;

/// The recognized agent options, validated at parse time.
///
/// `seed` only feeds the random agents; `alpha`, `init`, `load` and `save`
/// only matter to the learning slider. Absent `load`/`save` is not an error:
/// the agent runs on fresh weights and never persists.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub name: String,
    pub role: Role,
    pub seed: Option<u64>,
    pub alpha: f32,
    pub init: Vec<Vec<usize>>,
    pub load: Option<PathBuf>,
    pub save: Option<PathBuf>,
}

impl AgentConfig {
    /// Parse whitespace-separated `key=value` options on top of the
    /// defaults for `role`. Any unknown key or malformed value rejects the
    /// whole string.
    pub fn parse(role: Role, options: &str) -> Result<Self, ConfigError> {
        let mut cfg = AgentConfig {
            name: match role {
                Role::Slider => "tdl".to_string(),
                Role::Placer => "place".to_string(),
            },
            role,
            seed: None,
            alpha: DEFAULT_ALPHA,
            init: default_patterns(),
            load: None,
            save: None,
        };
        for pair in options.split_whitespace() {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(ConfigError::MalformedOption(pair.to_string()));
            };
            match key {
                "name" => cfg.name = value.to_string(),
                "role" => cfg.role = parse_role(value)?,
                "seed" => {
                    cfg.seed = Some(value.parse().map_err(|e| ConfigError::InvalidValue {
                        key: "seed",
                        value: value.to_string(),
                        reason: format!("{}", e),
                    })?)
                }
                "alpha" => cfg.alpha = parse_alpha(value)?,
                "init" => cfg.init = parse_patterns(value)?,
                "load" => cfg.load = Some(PathBuf::from(value)),
                "save" => cfg.save = Some(PathBuf::from(value)),
                _ => return Err(ConfigError::UnknownKey(key.to_string())),
            }
        }
        Ok(cfg)
    }
}

fn parse_role(value: &str) -> Result<Role, ConfigError> {
    match value {
        "slider" | "player" => Ok(Role::Slider),
        "placer" => Ok(Role::Placer),
        _ => Err(ConfigError::InvalidValue {
            key: "role",
            value: value.to_string(),
            reason: "expected 'slider', 'player' or 'placer'".to_string(),
        }),
    }
}

fn parse_alpha(value: &str) -> Result<f32, ConfigError> {
    let alpha: f32 = value.parse().map_err(|e| ConfigError::InvalidValue {
        key: "alpha",
        value: value.to_string(),
        reason: format!("{}", e),
    })?;
    if !alpha.is_finite() || alpha < 0.0 {
        return Err(ConfigError::InvalidValue {
            key: "alpha",
            value: value.to_string(),
            reason: "learning rate must be finite and non-negative".to_string(),
        });
    }
    Ok(alpha)
}

/// Pattern-set token: `4x6` for the default four 6-cell patterns, or an
/// explicit `;`-separated list of `,`-separated cell indices, e.g.
/// `0,1,2,3;4,5,6,7`.
fn parse_patterns(token: &str) -> Result<Vec<Vec<usize>>, ConfigError> {
    if token == "4x6" {
        return Ok(default_patterns());
    }
    let invalid = |reason: String| ConfigError::InvalidValue {
        key: "init",
        value: token.to_string(),
        reason,
    };
    let mut patterns = Vec::new();
    for group in token.split(';') {
        let cells = group
            .split(',')
            .map(|cell| cell.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| invalid(format!("{}", e)))?;
        if cells.is_empty() || cells.len() > 8 {
            return Err(invalid("patterns must have 1 to 8 cells".to_string()));
        }
        if cells.iter().any(|&c| c >= 16) {
            return Err(invalid("cells must be board indices 0..16".to_string()));
        }
        patterns.push(cells);
    }
    if patterns.is_empty() {
        return Err(invalid("at least one pattern is required".to_string()));
    }
    Ok(patterns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_by_role() {
        let cfg = AgentConfig::parse(Role::Slider, "").unwrap();
        assert_eq!(cfg.name, "tdl");
        assert_eq!(cfg.role, Role::Slider);
        assert_eq!(cfg.alpha, DEFAULT_ALPHA);
        assert_eq!(cfg.init, default_patterns());
        assert!(cfg.seed.is_none() && cfg.load.is_none() && cfg.save.is_none());

        let cfg = AgentConfig::parse(Role::Placer, "").unwrap();
        assert_eq!(cfg.name, "place");
        assert_eq!(cfg.role, Role::Placer);
    }

    #[test]
    fn parses_full_option_string() {
        let cfg = AgentConfig::parse(
            Role::Slider,
            "name=tdl alpha=0.0025 seed=42 init=4x6 load=in.bin save=out.bin",
        )
        .unwrap();
        assert_eq!(cfg.alpha, 0.0025);
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.load, Some(PathBuf::from("in.bin")));
        assert_eq!(cfg.save, Some(PathBuf::from("out.bin")));
    }

    #[test]
    fn parses_explicit_patterns() {
        let cfg = AgentConfig::parse(Role::Slider, "init=0,1,2,3;12,13,14,15").unwrap();
        assert_eq!(cfg.init, vec![vec![0, 1, 2, 3], vec![12, 13, 14, 15]]);
    }

    #[test]
    fn rejects_unknown_key() {
        assert!(matches!(
            AgentConfig::parse(Role::Slider, "gamma=0.9"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn rejects_malformed_pair() {
        assert!(matches!(
            AgentConfig::parse(Role::Slider, "alpha"),
            Err(ConfigError::MalformedOption(_))
        ));
    }

    #[test]
    fn rejects_bad_alpha() {
        for options in ["alpha=-0.5", "alpha=nan", "alpha=inf", "alpha=fast"] {
            assert!(
                matches!(
                    AgentConfig::parse(Role::Slider, options),
                    Err(ConfigError::InvalidValue { key: "alpha", .. })
                ),
                "expected {} to be rejected",
                options
            );
        }
    }

    #[test]
    fn rejects_bad_patterns() {
        for options in ["init=", "init=0,1,16", "init=0,1,2,3,4,5,6,7,8", "init=a,b"] {
            assert!(
                matches!(
                    AgentConfig::parse(Role::Slider, options),
                    Err(ConfigError::InvalidValue { key: "init", .. })
                ),
                "expected {} to be rejected",
                options
            );
        }
    }

    #[test]
    fn role_override() {
        let cfg = AgentConfig::parse(Role::Slider, "role=placer").unwrap();
        assert_eq!(cfg.role, Role::Placer);
        assert!(matches!(
            AgentConfig::parse(Role::Slider, "role=spectator"),
            Err(ConfigError::InvalidValue { key: "role", .. })
        ));
    }
}
