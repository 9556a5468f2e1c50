//! Launch-script templates.
//!
//! Templates use `{Key}` placeholders. Substitution only touches the keys it
//! is given, so the Python braces of the script body (`D = {}`, `{0}`) pass
//! through untouched and a template can be filled in two stages: run-wide
//! keys once at startup, per-item keys right before launch.

use std::path::Path;

use crate::error::RunnerError;

/// Script written for each item when no `--template-file` is given.
pub const DEFAULT_TEMPLATE: &str = r#"#! /usr/bin/env python
## Automatically generated by {ScriptName}

# Set up the paths
D = {}
D['InputDirectory'] = '{TopLevelInputDir}/{Subdirectory}'
D['OutputDirectory'] = '{TopLevelOutputDir}/{Subdirectory}'
D['DataFile'] = '{DataFile}'

# Find ChMass from metadata.txt
import re
ChMass = 0.0
try :
    with open('{TopLevelInputDir}/{Subdirectory}/metadata.txt', 'r') as file :
        for line in file :
            m = re.match(r'\s*relaxed-mass[12]\s*=\s*([0-9.]*)', line)
            if(m) : ChMass += float(m.group(1))
    D['ChMass'] = ChMass
except :
    print("WARNING: Could not find metadata.txt in '{TopLevelInputDir}/{Subdirectory}'")

# Now run the actual extrapolation
import GWFrames.Extrapolation
try :
    GWFrames.Extrapolation.Extrapolate(**D)
except Exception as e : # Pass exceptions to shell as failures
    from sys import exit
    print(e)
    exit(1)
"#;

/// Reads a template from disk. Failure is a setup error.
pub fn load(path: &Path) -> Result<String, RunnerError> {
    std::fs::read_to_string(path).map_err(|source| RunnerError::TemplateNotFound {
        path: path.to_path_buf(),
        source,
    })
}

/// Replaces every `{key}` for the given pairs and leaves all other text as is.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in values {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_replaces_known_keys_only() {
        let rendered = render(
            "D = {}; x = '{DataFile}' {0} {Unknown}",
            &[("DataFile", "rh.h5")],
        );
        assert_eq!(rendered, "D = {}; x = 'rh.h5' {0} {Unknown}");
    }

    #[test]
    fn render_in_two_stages() {
        let stage1 = render(
            DEFAULT_TEMPLATE,
            &[
                ("ScriptName", "waverun"),
                ("TopLevelInputDir", "/in"),
                ("TopLevelOutputDir", "/out"),
            ],
        );
        assert!(stage1.contains("{Subdirectory}"));
        let stage2 = render(&stage1, &[("Subdirectory", "q1/Lev5"), ("DataFile", "rh.h5")]);
        assert!(stage2.contains("D['InputDirectory'] = '/in/q1/Lev5'"));
        assert!(stage2.contains("D['OutputDirectory'] = '/out/q1/Lev5'"));
        assert!(stage2.contains("D['DataFile'] = 'rh.h5'"));
        assert!(stage2.contains("## Automatically generated by waverun"));
        assert!(stage2.contains("D = {}"));
    }

    #[test]
    fn load_missing_file_is_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("nope.py")).unwrap_err();
        assert!(matches!(err, RunnerError::TemplateNotFound { .. }));
        assert!(err.is_setup());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.py");
        std::fs::write(&path, "print('{DataFile}')").unwrap();
        assert_eq!(load(&path).unwrap(), "print('{DataFile}')");
    }
}
