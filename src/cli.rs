use crate::config::GameConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

/// Command line of the encounter harness binary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HarnessArgs {
    pub fixture: Option<PathBuf>,
    pub write_output: Option<PathBuf>,
    pub golden: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub help: bool,
    max_frame_delta: Option<f32>,
    fabrik_iterations: Option<usize>,
}

impl HarnessArgs {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = HarnessArgs::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if flag == "--help" || flag == "-h" {
                parsed.help = true;
                continue;
            }
            if !flag.starts_with('-') {
                bail!("Unexpected argument '{flag}'. Use --help for the list of flags.");
            }
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match flag {
                "--fixture" | "-f" => parsed.fixture = Some(PathBuf::from(value)),
                "--write-output" | "-o" => parsed.write_output = Some(PathBuf::from(value)),
                "--golden" | "-g" => parsed.golden = Some(PathBuf::from(value)),
                "--config" | "-c" => parsed.config = Some(PathBuf::from(value)),
                "--max-frame-delta" => {
                    let delta =
                        value.parse::<f32>().with_context(|| format!("Invalid max frame delta '{value}'"))?;
                    if !(delta > 0.0) {
                        bail!("Invalid max frame delta '{value}'. It must be positive.");
                    }
                    parsed.max_frame_delta = Some(delta);
                }
                "--fabrik-iterations" => {
                    parsed.fabrik_iterations = Some(
                        value.parse::<usize>().with_context(|| format!("Invalid fabrik iterations '{value}'"))?,
                    );
                }
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --fixture, --write-output, --golden, --config, \
                     --max-frame-delta, --fabrik-iterations."
                ),
            }
        }
        Ok(parsed)
    }

    pub fn config_overrides(&self) -> GameConfigOverrides {
        GameConfigOverrides { max_frame_delta: self.max_frame_delta, fabrik_iterations: self.fabrik_iterations }
    }

    pub fn usage() -> &'static str {
        "Usage: encounter_harness --fixture <path> [--golden <path>] [--write-output <path>] [--config <path>]\n\
         \x20 -f, --fixture             Path to a harness fixture JSON file\n\
         \x20 -g, --golden              Optional golden output file to compare against\n\
         \x20 -o, --write-output        Optional path to write the actual output JSON\n\
         \x20 -c, --config              Optional game config JSON\n\
         \x20     --max-frame-delta     Override the per-tick delta clamp in seconds\n\
         \x20     --fabrik-iterations   Override the FABRIK solver pass count"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_paths_and_overrides() {
        let args = [
            "encounter_harness",
            "--fixture",
            "fixtures/warden.json",
            "-o",
            "out.json",
            "--max-frame-delta",
            "0.02",
            "--fabrik-iterations",
            "4",
        ];
        let parsed = HarnessArgs::parse(args).expect("parse args");
        assert_eq!(parsed.fixture, Some(PathBuf::from("fixtures/warden.json")));
        assert_eq!(parsed.write_output, Some(PathBuf::from("out.json")));
        let overrides = parsed.config_overrides();
        assert_eq!(overrides.max_frame_delta, Some(0.02));
        assert_eq!(overrides.fabrik_iterations, Some(4));
    }

    #[test]
    fn latest_flag_wins() {
        let args = ["app", "--fabrik-iterations", "3", "--fabrik-iterations", "12"];
        let parsed = HarnessArgs::parse(args).expect("parse args");
        assert_eq!(parsed.config_overrides().fabrik_iterations, Some(12));
        assert!(parsed.config_overrides().max_frame_delta.is_none());
    }

    #[test]
    fn missing_value_errors() {
        let err = HarnessArgs::parse(["app", "--fixture"]).unwrap_err();
        assert!(err.to_string().contains("Expected a value"), "error should mention missing value");
    }

    #[test]
    fn rejects_unknown_flags_and_bad_deltas() {
        let err = HarnessArgs::parse(["app", "--foo", "bar"]).unwrap_err();
        assert!(err.to_string().contains("Unknown flag"), "unknown flags should error");
        let err = HarnessArgs::parse(["app", "--max-frame-delta", "-1"]).unwrap_err();
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn help_needs_no_value() {
        let parsed = HarnessArgs::parse(["app", "--help"]).expect("parse args");
        assert!(parsed.help);
    }
}
