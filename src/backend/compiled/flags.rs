use crate::{
    backend::c_str,
    config::{FeatureFlags, ToolchainSettings},
};
use std::fmt::Write;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feature {
    Sanitizer,
    Coverage,
    Libdl,
    MathLib,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagSet {
    Compile,
    Link,
}

impl FlagSet {
    fn c_field(self) -> &'static str {
        match self {
            FlagSet::Compile => "cflags",
            FlagSet::Link => "ldflags",
        }
    }
}

/// One optional toolchain feature: the macro that enables it in the
/// generated suite and the flags it adds.
///
/// A gate with a `value_prefix` takes its value from the macro itself,
/// e.g. `-fsanitize=` followed by `AU_SANITIZER`.
#[derive(Clone, Copy, Debug)]
pub struct Gate {
    pub feature: Feature,
    pub macro_name: &'static str,
    pub set: FlagSet,
    pub flags: &'static [&'static str],
    pub value_prefix: Option<&'static str>,
}

pub const GATES: &[Gate] = &[
    Gate {
        feature: Feature::Sanitizer,
        macro_name: "AU_SANITIZER",
        set: FlagSet::Compile,
        flags: &[],
        value_prefix: Some("-fsanitize="),
    },
    Gate {
        feature: Feature::Coverage,
        macro_name: "AU_COVERAGE",
        set: FlagSet::Compile,
        flags: &["-fprofile-arcs", "-ftest-coverage"],
        value_prefix: None,
    },
    Gate {
        feature: Feature::Libdl,
        macro_name: "AU_FEAT_LIBDL",
        set: FlagSet::Link,
        flags: &["-ldl"],
        value_prefix: None,
    },
    Gate {
        feature: Feature::MathLib,
        macro_name: "AU_FEAT_MATH_LIB",
        set: FlagSet::Link,
        flags: &["-lm"],
        value_prefix: None,
    },
];

impl Gate {
    /// `None` when the feature is off; otherwise the macro's value, if any.
    fn state<'f>(&self, features: &'f FeatureFlags) -> Option<Option<&'f str>> {
        match self.feature {
            Feature::Sanitizer => features.sanitizer.as_deref().map(Some),
            Feature::Coverage => features.coverage.then_some(None),
            Feature::Libdl => features.libdl.then_some(None),
            Feature::MathLib => features.math_lib.then_some(None),
        }
    }

    fn host_flags(&self, value: Option<&str>) -> Vec<String> {
        let mut flags: Vec<String> = self.flags.iter().map(|flag| flag.to_string()).collect();
        if let (Some(prefix), Some(value)) = (self.value_prefix, value) {
            flags.push(format!("{prefix}{value}"));
        }
        flags
    }
}

/// Flags passed to the host compiler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolchainFlags {
    pub cflags: Vec<String>,
    pub ldflags: Vec<String>,
}

impl ToolchainFlags {
    pub fn from_features(features: &FeatureFlags) -> Self {
        let mut flags = Self::default();
        for gate in GATES {
            let Some(value) = gate.state(features) else {
                continue;
            };
            let target = match gate.set {
                FlagSet::Compile => &mut flags.cflags,
                FlagSet::Link => &mut flags.ldflags,
            };
            target.extend(gate.host_flags(value));
        }
        flags
    }

    /// Feature flags plus the configured extras, with include dirs as `-I`.
    pub fn for_toolchain(settings: &ToolchainSettings, features: &FeatureFlags) -> Self {
        let mut flags = Self::from_features(features);
        let includes = settings
            .include_dirs
            .iter()
            .map(|dir| format!("-I{}", dir.display()));
        flags.cflags.splice(0..0, includes);
        flags.cflags.extend(settings.cflags.iter().cloned());
        flags.ldflags.extend(settings.ldflags.iter().cloned());
        flags
    }
}

/// Default definitions for gates enabled in configuration. The build can
/// still define or override them on its command line.
pub(crate) fn write_defaults(out: &mut String, features: &FeatureFlags) {
    let mut any = false;
    for gate in GATES {
        let Some(value) = gate.state(features) else {
            continue;
        };
        any = true;
        let _ = writeln!(out, "#ifndef {}", gate.macro_name);
        match value {
            Some(value) => {
                let _ = writeln!(out, "#define {} {}", gate.macro_name, c_str(value));
            }
            None => {
                let _ = writeln!(out, "#define {}", gate.macro_name);
            }
        }
        out.push_str("#endif\n");
    }
    if any {
        out.push('\n');
    }
}

/// `#ifdef` blocks that append each gate's flags to `cc` in the suite.
pub(crate) fn write_gates(out: &mut String, indent: &str) {
    for gate in GATES {
        let _ = writeln!(out, "#ifdef {}", gate.macro_name);
        let field = gate.set.c_field();
        if let Some(prefix) = gate.value_prefix {
            let _ = writeln!(
                out,
                "{indent}au_str_array_add(&cc.{field}, \"{prefix}\" {});",
                gate.macro_name
            );
        }
        for flag in gate.flags {
            let _ = writeln!(out, "{indent}au_str_array_add(&cc.{field}, \"{flag}\");");
        }
        out.push_str("#endif\n");
    }
}
